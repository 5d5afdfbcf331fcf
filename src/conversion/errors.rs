//! conversion::errors — error types for the conversion engine.
//!
//! Purpose
//! -------
//! Define the two error surfaces of the conversion engine: [`LscovError`]
//! for the generalized least-squares solver, and [`ConversionError`] for
//! the conversion entry points (`estimate_dmdt`, `integrate_dmdt`,
//! `integrate_bracketed`) and for [`RegressionConfig`] construction.
//! Result aliases standardize signatures across conversion code.
//!
//! Key behaviors
//! -------------
//! - Keep solver-local failures ([`LscovError::SingularSystem`],
//!   [`LscovError::Underdetermined`]) distinct from fatal conversion
//!   errors, so the estimator can recover a failed window as a NaN
//!   sample without weakening the fatal-error contract.
//! - Wrap series construction errors via `From<SeriesError>` so `?`
//!   composes across subtrees.
//! - Provide an `anyhow` catchall and, under the `python-bindings`
//!   feature, a `From<ConversionError> for PyErr` mapping to
//!   `ValueError`.
//!
//! Conventions
//! -----------
//! - Configuration errors are raised once at [`RegressionConfig`]
//!   construction, never mid-computation.
//! - Callers observe either a complete output series (possibly holding
//!   NaN samples) or an error — never a partially filled result.
//!
//! [`RegressionConfig`]: crate::conversion::config::RegressionConfig

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::series::{data::DataFormat, errors::SeriesError};

pub type ConversionResult<T> = Result<T, ConversionError>;
pub type LscovResult<T> = Result<T, LscovError>;

/// Error conditions of the generalized least-squares solver.
///
/// `Underdetermined` and `CovarianceShape` describe structurally invalid
/// solver inputs; `SingularSystem` reports a rank-deficient design matrix
/// or a covariance model without a Cholesky factor. The windowed
/// estimator recovers all three locally as NaN output samples.
#[derive(Debug, Clone, PartialEq)]
pub enum LscovError {
    /// The system has fewer rows than unknowns (`m < n`).
    Underdetermined {
        rows: usize,
        cols: usize,
    },

    /// The observation covariance is not `m`-by-`m`.
    CovarianceShape {
        rows: usize,
        cols: usize,
        expected: usize,
    },

    /// The design matrix is rank deficient, or the covariance is not
    /// positive definite.
    SingularSystem,
}

impl std::error::Error for LscovError {}

impl std::fmt::Display for LscovError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LscovError::Underdetermined { rows, cols } => write!(
                f,
                "Lscov Error: problem must be over-determined so that M >= N ({}, {})",
                rows, cols
            ),
            LscovError::CovarianceShape { rows, cols, expected } => write!(
                f,
                "Lscov Error: v must be a {0}-by-{0} matrix (got {1}-by-{2})",
                expected, rows, cols
            ),
            LscovError::SingularSystem => {
                write!(f, "Lscov Error: design matrix is singular to working precision")
            }
        }
    }
}

/// Unified error type for representation conversions.
///
/// Covers configuration validation, global dimension checks,
/// representation guards, and wrapped series-construction failures.
/// Designed to integrate with `anyhow::Error` via `From` and to provide
/// readable diagnostics through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    // ---- Configuration ----
    /// Window width is non-finite or not strictly positive.
    InvalidWindowWidth(f64),

    /// Taper minimum half-width is non-finite or not strictly positive.
    InvalidTaperWidth(f64),

    /// Truncation and tapering were both requested.
    ConflictingEdgePolicies,

    // ---- Dimensions ----
    /// The whole input series holds fewer observations than regression
    /// parameters.
    InsufficientObservations {
        n_obs: usize,
        n_params: usize,
    },

    // ---- Representation ----
    /// The series is already in the requested representation.
    AlreadyConverted(DataFormat),

    /// A series construction error surfaced during conversion.
    Series(SeriesError),

    // ---- Anyhow catchall ----
    Anyhow(String),
}

impl std::error::Error for ConversionError {}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            ConversionError::InvalidWindowWidth(w) => {
                write!(f, "Conversion Error: window width must be finite and positive (got {})", w)
            }
            ConversionError::InvalidTaperWidth(w) => write!(
                f,
                "Conversion Error: taper minimum width must be finite and positive (got {})",
                w
            ),
            ConversionError::ConflictingEdgePolicies => {
                write!(f, "Conversion Error: conflicting edge policies (truncate and taper)")
            }

            // ---- Dimensions ----
            ConversionError::InsufficientObservations { n_obs, n_params } => write!(
                f,
                "Conversion Error: series holds {} observations but the regression needs {}",
                n_obs, n_params
            ),

            // ---- Representation ----
            ConversionError::AlreadyConverted(format) => write!(
                f,
                "Conversion Error: series already contains {} data",
                format
            ),
            ConversionError::Series(err) => write!(f, "Conversion Error: {}", err),

            // ---- Anyhow catchall ----
            ConversionError::Anyhow(msg) => write!(f, "Conversion Error: {}", msg),
        }
    }
}

impl From<SeriesError> for ConversionError {
    fn from(err: SeriesError) -> Self {
        ConversionError::Series(err)
    }
}

impl From<anyhow::Error> for ConversionError {
    fn from(err: anyhow::Error) -> Self {
        ConversionError::Anyhow(err.to_string())
    }
}

impl From<LscovError> for ConversionError {
    fn from(err: LscovError) -> Self {
        match err {
            // A globally underdetermined fit maps onto the dimension error;
            // the other solver faults cannot escape the estimator and are
            // surfaced verbatim if they ever do.
            LscovError::Underdetermined { rows, cols } => {
                ConversionError::InsufficientObservations { n_obs: rows, n_params: cols }
            }
            other => ConversionError::Anyhow(other.to_string()),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ConversionError> for PyErr {
    fn from(err: ConversionError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Display messages embedding variant payloads.
    // - The `From` conversions between error surfaces.
    //
    // They intentionally DO NOT cover:
    // - PyErr conversion (exercised by Python-level tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `Display` messages carry the offending payloads.
    //
    // Given
    // -----
    // - One instance of each payload-carrying variant.
    //
    // Expect
    // ------
    // - The formatted messages contain the payload values.
    fn display_messages_embed_payloads() {
        // Arrange / Act / Assert
        assert!(
            ConversionError::InvalidWindowWidth(-1.0).to_string().contains("-1"),
            "window width payload missing"
        );
        assert!(
            ConversionError::InsufficientObservations { n_obs: 1, n_params: 2 }
                .to_string()
                .contains("1 observations"),
            "observation count payload missing"
        );
        assert!(
            ConversionError::AlreadyConverted(DataFormat::Dmdt).to_string().contains("dmdt"),
            "format payload missing"
        );
        assert!(
            LscovError::Underdetermined { rows: 1, cols: 2 }.to_string().contains("(1, 2)"),
            "dimension payload missing"
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify the cross-surface `From` conversions used by `?`.
    //
    // Given
    // -----
    // - A `SeriesError` and both relevant `LscovError` variants.
    //
    // Expect
    // ------
    // - `SeriesError` wraps into `Series`; `Underdetermined` maps onto
    //   `InsufficientObservations`; `SingularSystem` falls back to the
    //   catchall.
    fn from_conversions_map_variants() {
        // Act
        let wrapped: ConversionError = SeriesError::EmptySeries.into();
        let dims: ConversionError = LscovError::Underdetermined { rows: 1, cols: 2 }.into();
        let singular: ConversionError = LscovError::SingularSystem.into();

        // Assert
        assert_eq!(wrapped, ConversionError::Series(SeriesError::EmptySeries));
        assert_eq!(dims, ConversionError::InsufficientObservations { n_obs: 1, n_params: 2 });
        match singular {
            ConversionError::Anyhow(msg) => assert!(msg.contains("singular")),
            other => panic!("expected Anyhow catchall, got {other:?}"),
        }
    }
}
