//! conversion::dmdt_to_dm — cumulative reconstruction from rates.
//!
//! Purpose
//! -------
//! Rebuild a cumulative mass-change series from a rate series by
//! numerical integration. Two input shapes are supported: point rate
//! series (one rate per epoch, integrated over the gaps between
//! consecutive epochs) and bracketed rate series (one rate per
//! `[start, end]` interval, integrated over the interval widths).
//!
//! Key behaviors
//! -------------
//! - Anchor every reconstruction at zero: the cumulative value at the
//!   first output epoch is 0 with sigma 0, since the reference level of
//!   a cumulative series is arbitrary.
//! - Accumulate uncertainty as the square root of the running sum of
//!   `sigma² · Δt` over the integrated intervals.
//! - Propagate NaN: a NaN rate (or sigma) poisons every later cumulative
//!   sample, because each sample depends on the full running sum. NaN is
//!   data absence, not an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - Point inputs are validated `Dmdt` series; the rate at epoch `i`
//!   is taken to hold over `(t[i-1], t[i]]`.
//! - Bracketed records are assumed chronological; construction already
//!   guarantees `end > start` per record.
//!
//! Downstream usage
//! ----------------
//! - [`MassSeries::to_dm`](crate::series::data::MassSeries::to_dm) and
//!   [`BracketedSeries::to_dm`](crate::series::data::BracketedSeries::to_dm)
//!   are thin wrappers over the two entry points here.

use ndarray::Array1;

use crate::{
    conversion::errors::{ConversionError, ConversionResult},
    series::data::{BracketedSeries, DataFormat, MassSeries},
};

/// Integrate a point rate series into a cumulative series.
///
/// Parameters
/// ----------
/// - `series`: `&MassSeries`
///   Rate series in the `Dmdt` representation.
///
/// Returns
/// -------
/// `ConversionResult<MassSeries>`
///   A derived `Dm` series on the same epochs, anchored at zero.
///
/// Errors
/// ------
/// - `ConversionError::AlreadyConverted` when the input is already a
///   cumulative series.
///
/// Notes
/// -----
/// - `dm[0] = 0`; `dm[i] = dm[i-1] + dmdt[i] · (t[i] - t[i-1])`.
/// - `sigma[0] = 0`; `sigma[i] = sqrt(Σ_{j≤i} sigma[j]² · (t[j] - t[j-1]))`.
/// - The rate at the first epoch is never consumed; there is no interval
///   before it.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use masschange::conversion::dmdt_to_dm::integrate_dmdt;
/// # use masschange::series::data::{DataFormat, MassSeries};
/// let rates = MassSeries::new(
///     array![2005.0, 2006.0, 2007.0],
///     array![-10.0, -10.0, -10.0],
///     array![1.0, 1.0, 1.0],
///     DataFormat::Dmdt,
/// )
/// .unwrap();
/// let cumulative = integrate_dmdt(&rates).unwrap();
/// assert_eq!(cumulative.values()[0], 0.0);
/// assert!((cumulative.values()[2] + 20.0).abs() < 1e-12);
/// ```
pub fn integrate_dmdt(series: &MassSeries) -> ConversionResult<MassSeries> {
    if series.format() == DataFormat::Dm {
        return Err(ConversionError::AlreadyConverted(DataFormat::Dm));
    }
    let n = series.len();
    let mut dm = Array1::zeros(n);
    let mut sigma_dm = Array1::zeros(n);
    let mut variance = 0.0;
    for i in 1..n {
        let dt = series.epochs()[i] - series.epochs()[i - 1];
        dm[i] = dm[i - 1] + series.values()[i] * dt;
        variance += series.sigmas()[i].powi(2) * dt;
        sigma_dm[i] = variance.sqrt();
    }
    Ok(MassSeries::derived(series.epochs().clone(), dm, sigma_dm, series.format().opposite()))
}

/// Integrate a bracketed rate series into a cumulative series.
///
/// Parameters
/// ----------
/// - `series`: `&BracketedSeries`
///   One rate per `[start, end]` interval, in chronological order.
///
/// Returns
/// -------
/// `ConversionResult<MassSeries>`
///   A derived `Dm` series with `series.len() + 1` epochs: the first
///   interval's start (anchored at zero) followed by each interval's end.
///
/// Notes
/// -----
/// - `dm[i+1] = dm[i] + dmdt[i] · (end[i] - start[i])`; gaps between an
///   interval's end and the next interval's start contribute nothing.
/// - The sigma accumulation mirrors [`integrate_dmdt`], with the interval
///   widths as `Δt`.
pub fn integrate_bracketed(series: &BracketedSeries) -> ConversionResult<MassSeries> {
    let n = series.len();
    let mut epochs = Array1::zeros(n + 1);
    let mut dm = Array1::zeros(n + 1);
    let mut sigma_dm = Array1::zeros(n + 1);
    epochs[0] = series.start_epochs()[0];
    let mut variance = 0.0;
    for i in 0..n {
        let width = series.end_epochs()[i] - series.start_epochs()[i];
        epochs[i + 1] = series.end_epochs()[i];
        dm[i + 1] = dm[i] + series.values()[i] * width;
        variance += series.sigmas()[i].powi(2) * width;
        sigma_dm[i + 1] = variance.sqrt();
    }
    Ok(MassSeries::derived(epochs, dm, sigma_dm, DataFormat::Dm))
}
