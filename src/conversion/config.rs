//! conversion::config — validated configuration for rate estimation.
//!
//! Purpose
//! -------
//! Replace the loose keyword flags of the legacy conversion interface
//! (`truncate`, `tapering`, `min_tapering`, `lsq_method`) with one
//! explicit immutable [`RegressionConfig`] value validated at
//! construction. The edge behavior is a tagged variant ([`EdgePolicy`]),
//! so the contradictory truncate+taper combination cannot be represented
//! once a config exists; the flags-style constructor still rejects it
//! explicitly for callers arriving from the legacy interface.
//!
//! Key behaviors
//! -------------
//! - Validate `window_width` and the taper minimum half-width once;
//!   the estimator never re-checks them per call.
//! - [`RegressionConfig::default`] mirrors the production conversion
//!   settings of the reference pipeline: a 3-year window, error-weighted
//!   fitting, and tapered edges with a 0.75-year minimum half-width.
//!
//! Invariants & assumptions
//! ------------------------
//! - `window_width` is finite and strictly positive.
//! - `EdgePolicy::Taper { min_width }` carries a finite, strictly
//!   positive minimum half-width.
//!
//! Downstream usage
//! ----------------
//! - [`crate::conversion::dm_to_dmdt::estimate_dmdt`] consumes the config
//!   by reference; it is cheap to copy and reusable across series.

use crate::conversion::errors::{ConversionError, ConversionResult};

/// Window width, in decimal years, used by the reference pipeline.
pub const DEFAULT_WINDOW_WIDTH: f64 = 3.0;

/// Minimum tapered half-width, in decimal years, used by the reference
/// pipeline.
pub const DEFAULT_MIN_TAPER_WIDTH: f64 = 0.75;

/// Observation weighting for the local linear fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Ordinary least squares (identity observation covariance).
    #[default]
    Ordinary,
    /// Weighted least squares with `V = diag(sigma^2)`.
    Weighted,
}

/// Behavior of the regression window where it crosses a domain boundary.
///
/// The taper minimum half-width travels with its variant, so a config can
/// never carry a taper width without tapering being selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgePolicy {
    /// Intersect the nominal window with the data domain (default).
    Clip,
    /// Emit NaN for any epoch whose nominal window crosses a boundary.
    Truncate,
    /// Shrink the half-width symmetrically near the boundaries, floored
    /// at `min_width`, and post-average the leading/trailing blocks.
    Taper { min_width: f64 },
}

/// RegressionConfig — immutable settings for one windowed estimation.
///
/// Purpose
/// -------
/// Bundle the window width, weighting mode, and edge policy of the
/// windowed rate estimator, validated once at construction.
///
/// Invariants
/// ----------
/// - `window_width` is finite and `> 0`.
/// - A `Taper` edge policy carries a finite `min_width > 0`.
///
/// Notes
/// -----
/// - `Default` reproduces the settings the reference pipeline applies
///   when deriving rate series for reports (3-year window, weighted,
///   tapered with 0.75-year minimum).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionConfig {
    window_width: f64,
    weighting: Weighting,
    edge: EdgePolicy,
}

impl RegressionConfig {
    /// Build a validated configuration.
    ///
    /// Parameters
    /// ----------
    /// - `window_width`: `f64`
    ///   Full width of the nominal fitting window, in decimal years.
    /// - `weighting`: [`Weighting`]
    ///   Ordinary or error-weighted local fits.
    /// - `edge`: [`EdgePolicy`]
    ///   Boundary behavior; a `Taper` variant carries its own minimum
    ///   half-width.
    ///
    /// Returns
    /// -------
    /// `ConversionResult<RegressionConfig>`
    ///   The validated configuration.
    ///
    /// Errors
    /// ------
    /// - `ConversionError::InvalidWindowWidth` when `window_width` is not
    ///   finite or not strictly positive.
    /// - `ConversionError::InvalidTaperWidth` when a `Taper` policy
    ///   carries a non-finite or non-positive `min_width`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use masschange::conversion::config::{EdgePolicy, RegressionConfig, Weighting};
    /// let config =
    ///     RegressionConfig::new(2.0, Weighting::Ordinary, EdgePolicy::Clip).unwrap();
    /// assert_eq!(config.window_width(), 2.0);
    ///
    /// assert!(RegressionConfig::new(0.0, Weighting::Ordinary, EdgePolicy::Clip).is_err());
    /// ```
    pub fn new(
        window_width: f64, weighting: Weighting, edge: EdgePolicy,
    ) -> ConversionResult<RegressionConfig> {
        if !window_width.is_finite() || window_width <= 0.0 {
            return Err(ConversionError::InvalidWindowWidth(window_width));
        }
        if let EdgePolicy::Taper { min_width } = edge {
            if !min_width.is_finite() || min_width <= 0.0 {
                return Err(ConversionError::InvalidTaperWidth(min_width));
            }
        }
        Ok(RegressionConfig { window_width, weighting, edge })
    }

    /// Build a configuration from legacy-style boolean flags.
    ///
    /// Mirrors the keyword interface of the reference pipeline
    /// (`truncate=..., tapering=..., min_tapering=...`). Requesting both
    /// truncation and tapering is rejected here — the resulting
    /// [`EdgePolicy`] cannot express the combination at all. When neither
    /// flag is set the window is clipped to the domain.
    ///
    /// Errors
    /// ------
    /// - `ConversionError::ConflictingEdgePolicies` when `truncate` and
    ///   `tapering` are both `true`.
    /// - Everything [`RegressionConfig::new`] rejects.
    pub fn from_flags(
        window_width: f64, weighted: bool, truncate: bool, tapering: bool,
        min_tapering: Option<f64>,
    ) -> ConversionResult<RegressionConfig> {
        if truncate && tapering {
            return Err(ConversionError::ConflictingEdgePolicies);
        }
        let edge = if truncate {
            EdgePolicy::Truncate
        } else if tapering {
            EdgePolicy::Taper { min_width: min_tapering.unwrap_or(DEFAULT_MIN_TAPER_WIDTH) }
        } else {
            EdgePolicy::Clip
        };
        let weighting = if weighted { Weighting::Weighted } else { Weighting::Ordinary };
        RegressionConfig::new(window_width, weighting, edge)
    }

    /// Full width of the nominal fitting window, in decimal years.
    pub fn window_width(&self) -> f64 {
        self.window_width
    }

    /// Observation weighting for the local fits.
    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Boundary behavior of the fitting window.
    pub fn edge(&self) -> EdgePolicy {
        self.edge
    }
}

impl Default for RegressionConfig {
    /// Production conversion settings of the reference pipeline.
    fn default() -> Self {
        RegressionConfig {
            window_width: DEFAULT_WINDOW_WIDTH,
            weighting: Weighting::Weighted,
            edge: EdgePolicy::Taper { min_width: DEFAULT_MIN_TAPER_WIDTH },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation branches of `new` (window width, taper width).
    // - Flag translation and the conflicting-flags rejection in
    //   `from_flags`.
    // - The documented defaults.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that invalid window widths are rejected at construction.
    //
    // Given
    // -----
    // - Zero, negative, NaN, and infinite window widths.
    //
    // Expect
    // ------
    // - Every case fails with `InvalidWindowWidth` carrying the input.
    fn new_invalid_window_width_rejected() {
        // Arrange / Act / Assert
        for width in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            match RegressionConfig::new(width, Weighting::Ordinary, EdgePolicy::Clip) {
                Err(ConversionError::InvalidWindowWidth(_)) => (),
                other => panic!("expected InvalidWindowWidth for {width}, got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that a taper policy with a degenerate minimum half-width is
    // rejected while a valid one constructs.
    //
    // Given
    // -----
    // - Taper policies with min_width of 0.75, 0.0, and NaN.
    //
    // Expect
    // ------
    // - The first constructs; the others fail with `InvalidTaperWidth`.
    fn new_taper_width_validated() {
        // Arrange / Act / Assert
        assert!(
            RegressionConfig::new(
                3.0,
                Weighting::Weighted,
                EdgePolicy::Taper { min_width: 0.75 }
            )
            .is_ok()
        );
        for min_width in [0.0, f64::NAN] {
            match RegressionConfig::new(
                3.0,
                Weighting::Weighted,
                EdgePolicy::Taper { min_width },
            ) {
                Err(ConversionError::InvalidTaperWidth(_)) => (),
                other => panic!("expected InvalidTaperWidth for {min_width}, got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the legacy flag translation, including the conflicting
    // truncate+taper rejection and the clip default.
    //
    // Given
    // -----
    // - Flag combinations covering all four truncate/tapering cases.
    //
    // Expect
    // ------
    // - truncate → `Truncate`; tapering → `Taper` with the default
    //   minimum when none is given; neither → `Clip`; both → error.
    fn from_flags_translates_legacy_interface() {
        // Act
        let truncated = RegressionConfig::from_flags(2.0, false, true, false, None).unwrap();
        let tapered = RegressionConfig::from_flags(2.0, true, false, true, None).unwrap();
        let clipped = RegressionConfig::from_flags(2.0, false, false, false, None).unwrap();
        let conflicting = RegressionConfig::from_flags(2.0, false, true, true, None);

        // Assert
        assert_eq!(truncated.edge(), EdgePolicy::Truncate);
        assert_eq!(tapered.edge(), EdgePolicy::Taper { min_width: DEFAULT_MIN_TAPER_WIDTH });
        assert_eq!(tapered.weighting(), Weighting::Weighted);
        assert_eq!(clipped.edge(), EdgePolicy::Clip);
        match conflicting {
            Err(ConversionError::ConflictingEdgePolicies) => (),
            other => panic!("expected ConflictingEdgePolicies, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that `Default` matches the documented reference-pipeline
    // settings.
    //
    // Given
    // -----
    // - No inputs; call `RegressionConfig::default()`.
    //
    // Expect
    // ------
    // - 3-year window, weighted fits, taper with 0.75-year minimum.
    fn default_matches_reference_settings() {
        // Act
        let config = RegressionConfig::default();

        // Assert
        assert_eq!(config.window_width(), DEFAULT_WINDOW_WIDTH);
        assert_eq!(config.weighting(), Weighting::Weighted);
        assert_eq!(config.edge(), EdgePolicy::Taper { min_width: DEFAULT_MIN_TAPER_WIDTH });
    }
}
