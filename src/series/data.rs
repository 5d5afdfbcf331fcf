//! series::data — immutable mass-change series value objects.
//!
//! Purpose
//! -------
//! Define the core data model for mass-change time series: [`MassSeries`]
//! for point observations `(epoch, value, sigma)` tagged with a
//! representation [`DataFormat`], and [`BracketedSeries`] for rate records
//! defined over discrete `[start, end]` intervals. Both are immutable value
//! objects validated once at construction and consumed by the conversion
//! routines without re-checking.
//!
//! Key behaviors
//! -------------
//! - Validate shape and time-coordinate invariants (non-empty, equal
//!   lengths, finite epochs, ascending order) when a series is built from
//!   caller-supplied arrays.
//! - Tag each series with its representation (`dm` cumulative mass change
//!   or `dmdt` rate of mass change) and whether it was derived by a
//!   conversion rather than read from source data.
//! - Offer `to_dmdt` / `to_dm` entry points that reject conversion into
//!   the representation the series already carries.
//!
//! Invariants & assumptions
//! ------------------------
//! - `epochs`, `values`, and `sigmas` always share one length `n ≥ 1`.
//! - Epochs are finite and non-decreasing. Duplicate epochs are permitted;
//!   a window consisting solely of duplicates produces a rank-deficient
//!   local fit, which the estimator recovers as a NaN sample.
//! - Values and sigmas may be NaN — NaN marks "no data at this epoch",
//!   not an error.
//! - Bracketed records satisfy `end > start` element-wise.
//!
//! Conventions
//! -----------
//! - Epochs are continuous decimal-year coordinates (e.g. `2007.5`).
//! - Cumulative values (`dm`) are relative to an arbitrary reference
//!   epoch; rates (`dmdt`) are mass per year.
//! - Arrays are stored as `ndarray::Array1<f64>`, matching the rest of
//!   the numerical code in this crate.
//!
//! Downstream usage
//! ----------------
//! - [`crate::conversion::dm_to_dmdt::estimate_dmdt`] consumes a `Dm`
//!   series and produces a derived `Dmdt` series.
//! - [`crate::conversion::dmdt_to_dm`] integrates `Dmdt` point series and
//!   bracketed series back into derived `Dm` series.
//! - [`crate::series::statistics`] summarizes either representation.
//!
//! Testing notes
//! -------------
//! - Unit tests cover each construction error branch, the representation
//!   guards on `to_dmdt` / `to_dm`, and the derived flag on conversion
//!   outputs.

use ndarray::Array1;

use crate::{
    conversion::{
        config::RegressionConfig,
        dm_to_dmdt::estimate_dmdt,
        dmdt_to_dm::{integrate_bracketed, integrate_dmdt},
        errors::ConversionResult,
    },
    series::errors::{SeriesError, SeriesResult},
};

/// Representation tag for a mass-change series.
///
/// `Dm` is cumulative mass change relative to an arbitrary reference
/// epoch; `Dmdt` is the rate of mass change. The `Display` form matches
/// the `data_format` strings used by tabular submission files ("dm",
/// "dmdt").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Dm,
    Dmdt,
}

impl DataFormat {
    /// The representation a conversion out of `self` produces.
    pub fn opposite(&self) -> DataFormat {
        match self {
            DataFormat::Dm => DataFormat::Dmdt,
            DataFormat::Dmdt => DataFormat::Dm,
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::Dm => write!(f, "dm"),
            DataFormat::Dmdt => write!(f, "dmdt"),
        }
    }
}

/// MassSeries — one validated mass-change time series.
///
/// Purpose
/// -------
/// Hold an ordered sequence of `(epoch, value, sigma)` observations
/// sharing one representation tag, ready for windowed rate estimation or
/// numerical integration.
///
/// Fields
/// ------
/// - `epochs`: `Array1<f64>`
///   Decimal-year time coordinates, finite and non-decreasing.
/// - `values`: `Array1<f64>`
///   Cumulative mass change (`Dm`) or rate (`Dmdt`); NaN marks missing.
/// - `sigmas`: `Array1<f64>`
///   One-sigma uncertainties on `values`.
/// - `format`: [`DataFormat`]
///   Which representation `values` carries.
/// - `derived`: `bool`
///   `true` when this series was produced by a conversion rather than
///   constructed from source data.
///
/// Invariants
/// ----------
/// - All three arrays share one length `n ≥ 1`.
/// - Epochs are finite and sorted ascending (ties allowed).
///
/// Notes
/// -----
/// - The struct is immutable after construction; conversions return new
///   series rather than mutating in place.
#[derive(Debug, Clone, PartialEq)]
pub struct MassSeries {
    epochs: Array1<f64>,
    values: Array1<f64>,
    sigmas: Array1<f64>,
    format: DataFormat,
    derived: bool,
}

impl MassSeries {
    /// Build a series from caller-supplied arrays, validating invariants.
    ///
    /// Parameters
    /// ----------
    /// - `epochs`: `Array1<f64>`
    ///   Decimal-year coordinates, finite and non-decreasing, length ≥ 1.
    /// - `values`: `Array1<f64>`
    ///   Observed values in the representation named by `format`.
    /// - `sigmas`: `Array1<f64>`
    ///   One-sigma uncertainties, same length as `values`.
    /// - `format`: [`DataFormat`]
    ///   Representation tag of `values`.
    ///
    /// Returns
    /// -------
    /// `SeriesResult<MassSeries>`
    ///   The validated series with `derived = false`, or a `SeriesError`
    ///   naming the first violated invariant.
    ///
    /// Errors
    /// ------
    /// - `SeriesError::EmptySeries` when `epochs` is empty.
    /// - `SeriesError::LengthMismatch` when the arrays disagree in length.
    /// - `SeriesError::NonFiniteEpoch` when an epoch is NaN or infinite.
    /// - `SeriesError::UnsortedEpochs` when epochs decrease.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use masschange::series::data::{DataFormat, MassSeries};
    /// let series = MassSeries::new(
    ///     array![2005.0, 2005.5, 2006.0],
    ///     array![0.0, -12.5, -25.0],
    ///     array![1.0, 1.0, 1.0],
    ///     DataFormat::Dm,
    /// )
    /// .unwrap();
    /// assert_eq!(series.len(), 3);
    /// assert!(!series.is_derived());
    /// ```
    pub fn new(
        epochs: Array1<f64>, values: Array1<f64>, sigmas: Array1<f64>, format: DataFormat,
    ) -> SeriesResult<MassSeries> {
        validate_epochs(&epochs)?;
        if values.len() != epochs.len() || sigmas.len() != epochs.len() {
            return Err(SeriesError::LengthMismatch {
                epochs: epochs.len(),
                values: values.len(),
                sigmas: sigmas.len(),
            });
        }
        Ok(MassSeries { epochs, values, sigmas, format, derived: false })
    }

    /// Build a conversion output without re-validation.
    ///
    /// The epochs are either the (already validated) input epochs or a
    /// caller-supplied output grid validated by the estimator; values and
    /// sigmas may legitimately contain NaN samples.
    pub(crate) fn derived(
        epochs: Array1<f64>, values: Array1<f64>, sigmas: Array1<f64>, format: DataFormat,
    ) -> MassSeries {
        MassSeries { epochs, values, sigmas, format, derived: true }
    }

    /// Number of observations in the series.
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Always `false` for a successfully constructed series; provided for
    /// API completeness.
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Decimal-year time coordinates.
    pub fn epochs(&self) -> &Array1<f64> {
        &self.epochs
    }

    /// Observed values in the representation named by [`Self::format`].
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// One-sigma uncertainties on the values.
    pub fn sigmas(&self) -> &Array1<f64> {
        &self.sigmas
    }

    /// Representation tag of this series.
    pub fn format(&self) -> DataFormat {
        self.format
    }

    /// Whether this series was produced by a conversion.
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// First (earliest) epoch of the series.
    pub fn first_epoch(&self) -> f64 {
        self.epochs[0]
    }

    /// Last (latest) epoch of the series.
    pub fn last_epoch(&self) -> f64 {
        self.epochs[self.epochs.len() - 1]
    }

    /// Convert a cumulative series into a rate series.
    ///
    /// Runs the windowed rate estimator over the input epochs. Rejects
    /// series already in the `Dmdt` representation with
    /// [`ConversionError::AlreadyConverted`](crate::conversion::errors::ConversionError)
    /// rather than silently re-deriving.
    pub fn to_dmdt(&self, config: &RegressionConfig) -> ConversionResult<MassSeries> {
        estimate_dmdt(self, config, None)
    }

    /// Convert a rate series into a cumulative series by integration.
    ///
    /// Rejects series already in the `Dm` representation with
    /// [`ConversionError::AlreadyConverted`](crate::conversion::errors::ConversionError).
    pub fn to_dm(&self) -> ConversionResult<MassSeries> {
        integrate_dmdt(self)
    }
}

/// BracketedSeries — rate records over discrete time intervals.
///
/// Purpose
/// -------
/// Represent submissions that report one rate value per `[start, end]`
/// interval rather than per instant (two-epoch records). The only
/// operation on a bracketed series is reconstruction of the cumulative
/// series via [`Self::to_dm`].
///
/// Invariants
/// ----------
/// - All four arrays share one length `n ≥ 1`.
/// - Start and end epochs are finite, with `end > start` per record.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketedSeries {
    start_epochs: Array1<f64>,
    end_epochs: Array1<f64>,
    values: Array1<f64>,
    sigmas: Array1<f64>,
}

impl BracketedSeries {
    /// Build a bracketed rate series, validating interval invariants.
    ///
    /// Errors
    /// ------
    /// - `SeriesError::EmptySeries` when no records are supplied.
    /// - `SeriesError::BracketLengthMismatch` when the arrays disagree in
    ///   length.
    /// - `SeriesError::NonFiniteEpoch` when a start or end epoch is NaN
    ///   or infinite (the index reported is into the offending array).
    /// - `SeriesError::InvalidBracket` when a record has `end <= start`.
    pub fn new(
        start_epochs: Array1<f64>, end_epochs: Array1<f64>, values: Array1<f64>,
        sigmas: Array1<f64>,
    ) -> SeriesResult<BracketedSeries> {
        if start_epochs.is_empty() {
            return Err(SeriesError::EmptySeries);
        }
        let n = start_epochs.len();
        if end_epochs.len() != n || values.len() != n || sigmas.len() != n {
            return Err(SeriesError::BracketLengthMismatch {
                starts: n,
                ends: end_epochs.len(),
                values: values.len(),
                sigmas: sigmas.len(),
            });
        }
        for (i, (&start, &end)) in start_epochs.iter().zip(end_epochs.iter()).enumerate() {
            if !start.is_finite() {
                return Err(SeriesError::NonFiniteEpoch { index: i, value: start });
            }
            if !end.is_finite() {
                return Err(SeriesError::NonFiniteEpoch { index: i, value: end });
            }
            if end <= start {
                return Err(SeriesError::InvalidBracket { index: i, start, end });
            }
        }
        Ok(BracketedSeries { start_epochs, end_epochs, values, sigmas })
    }

    /// Number of rate intervals.
    pub fn len(&self) -> usize {
        self.start_epochs.len()
    }

    /// Always `false` for a successfully constructed series.
    pub fn is_empty(&self) -> bool {
        self.start_epochs.is_empty()
    }

    /// Interval start epochs.
    pub fn start_epochs(&self) -> &Array1<f64> {
        &self.start_epochs
    }

    /// Interval end epochs.
    pub fn end_epochs(&self) -> &Array1<f64> {
        &self.end_epochs
    }

    /// Interval-averaged rate values.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// One-sigma uncertainties on the rate values.
    pub fn sigmas(&self) -> &Array1<f64> {
        &self.sigmas
    }

    /// Reconstruct the cumulative series from these interval rates.
    ///
    /// The output has `len() + 1` epochs: the first interval's start
    /// anchors the series at zero and each interval contributes its end
    /// epoch. See [`crate::conversion::dmdt_to_dm::integrate_bracketed`].
    pub fn to_dm(&self) -> ConversionResult<MassSeries> {
        integrate_bracketed(self)
    }
}

/// Check that an epoch array is non-empty, finite, and sorted ascending.
pub(crate) fn validate_epochs(epochs: &Array1<f64>) -> SeriesResult<()> {
    if epochs.is_empty() {
        return Err(SeriesError::EmptySeries);
    }
    for (i, &epoch) in epochs.iter().enumerate() {
        if !epoch.is_finite() {
            return Err(SeriesError::NonFiniteEpoch { index: i, value: epoch });
        }
        if i > 0 && epoch < epochs[i - 1] {
            return Err(SeriesError::UnsortedEpochs { index: i });
        }
    }
    Ok(())
}
