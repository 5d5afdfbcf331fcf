//! conversion::dm_to_dmdt — windowed rate estimation.
//!
//! Purpose
//! -------
//! Convert a cumulative mass-change series into a rate series by sliding
//! a fitting window across the record and fitting a straight line to the
//! observations inside each window with the generalized least-squares
//! solver. The slope of each local fit is the rate at that output epoch;
//! its uncertainty combines the slope's standard error with the RMS of
//! the input uncertainties inside the window.
//!
//! Key behaviors
//! -------------
//! - Produce one output sample per requested output epoch (the input
//!   epochs when no output grid is given); the output length never
//!   depends on how many windows could actually be fitted.
//! - Apply the configured [`EdgePolicy`] where the nominal window crosses
//!   the data domain: clip it to the domain, truncate the output to NaN,
//!   or taper the half-width symmetrically (floored at the configured
//!   minimum) and post-average the leading/trailing blocks.
//! - Recover every per-window solver failure — rank-deficient designs
//!   from duplicate epochs, windows with fewer observations than fit
//!   parameters — as a NaN sample. NaN is "rate undefined here", not an
//!   error.
//!
//! Invariants & assumptions
//! ------------------------
//! - The input series is validated (sorted, finite epochs) by
//!   construction; the output grid, when supplied, is validated here.
//! - Window membership is lower-inclusive, upper-exclusive:
//!   `epoch ∈ [wmin, wmax)`.
//! - The uncertainty in step (g) always uses the window's own sigmas,
//!   never the post-pass-replaced ones.
//! - The per-epoch loop carries no data dependency between iterations;
//!   under the `parallel` feature the main pass is distributed with
//!   `rayon` and the taper post-pass runs after the join, so serial and
//!   parallel output are identical.
//!
//! Conventions
//! -----------
//! - Error-weighted fits pass `V = diag(sigma²)` to the solver; ordinary
//!   fits pass the identity.
//! - Epochs outside `[tmin, tmax]` yield NaN under every edge policy.
//!
//! Downstream usage
//! ----------------
//! - [`MassSeries::to_dmdt`](crate::series::data::MassSeries::to_dmdt)
//!   wraps [`estimate_dmdt`] with the input epochs as output grid.
//! - The report layer treats NaN samples as "no data for that epoch".
//!
//! Testing notes
//! -------------
//! - Unit tests cover the representation guard, the global dimension
//!   guard, the unit-rate scenarios for each edge policy, deterministic
//!   NaN placement under truncation, the taper post-pass block values,
//!   and the weighted/ordinary degeneracy for uniform sigmas.
//! - `tests/integration_conversion_pipeline.rs` adds the round-trip
//!   property against the reconstructor.

use nalgebra::{DMatrix, DVector};
use ndarray::Array1;

use crate::{
    conversion::{
        config::{EdgePolicy, RegressionConfig, Weighting},
        errors::{ConversionError, ConversionResult, LscovResult},
        lscov::lscov_se,
    },
    series::{
        data::{validate_epochs, DataFormat, MassSeries},
        statistics::nanmean,
    },
};

/// Result of one local linear fit, consumed immediately to build one
/// output sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Slope of the fitted line — the rate estimate.
    pub slope: f64,
    /// Standard error of the slope (NaN with zero residual degrees of
    /// freedom).
    pub slope_stderr: f64,
    /// Number of observations inside the window.
    pub n_observations: usize,
}

/// Convert a cumulative series into a rate series by windowed regression.
///
/// Parameters
/// ----------
/// - `series`: `&MassSeries`
///   Input series in the `Dm` representation with at least two
///   observations.
/// - `config`: `&RegressionConfig`
///   Window width, weighting mode, and edge policy (validated at
///   construction).
/// - `output_epochs`: `Option<&Array1<f64>>`
///   Output grid; the input epochs are reused when omitted. Must be
///   finite and sorted ascending.
///
/// Returns
/// -------
/// `ConversionResult<MassSeries>`
///   A derived `Dmdt` series with exactly one sample per output epoch.
///   Samples where no rate could be derived are NaN.
///
/// Errors
/// ------
/// - `ConversionError::AlreadyConverted` when the input is already a
///   rate series.
/// - `ConversionError::InsufficientObservations` when the whole series
///   holds fewer than two observations.
/// - `ConversionError::Series` when a supplied output grid is malformed.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use masschange::conversion::config::{EdgePolicy, RegressionConfig, Weighting};
/// # use masschange::conversion::dm_to_dmdt::estimate_dmdt;
/// # use masschange::series::data::{DataFormat, MassSeries};
/// let series = MassSeries::new(
///     array![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0],
///     array![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0],
///     array![0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1],
///     DataFormat::Dm,
/// )
/// .unwrap();
/// let config =
///     RegressionConfig::new(1.5, Weighting::Ordinary, EdgePolicy::Clip).unwrap();
/// let rates = estimate_dmdt(&series, &config, None).unwrap();
/// assert_eq!(rates.len(), series.len());
/// assert!((rates.values()[3] - 1.0).abs() < 1e-9);
/// ```
pub fn estimate_dmdt(
    series: &MassSeries, config: &RegressionConfig, output_epochs: Option<&Array1<f64>>,
) -> ConversionResult<MassSeries> {
    if series.format() == DataFormat::Dmdt {
        return Err(ConversionError::AlreadyConverted(DataFormat::Dmdt));
    }
    if series.len() < 2 {
        return Err(ConversionError::InsufficientObservations {
            n_obs: series.len(),
            n_params: 2,
        });
    }
    let tout = match output_epochs {
        Some(epochs) => {
            validate_epochs(epochs)?;
            epochs.clone()
        }
        None => series.epochs().clone(),
    };

    let tmin = series.first_epoch();
    let tmax = series.last_epoch();

    let samples = main_pass(&tout, series, config, tmin, tmax);
    let mut dmdt = Array1::from_iter(samples.iter().map(|s| s.0));
    let mut sigma_dmdt = Array1::from_iter(samples.iter().map(|s| s.1));

    if let EdgePolicy::Taper { min_width } = config.edge() {
        apply_taper_post_pass(&tout, &mut dmdt, &mut sigma_dmdt, tmin, tmax, min_width);
    }

    Ok(MassSeries::derived(tout, dmdt, sigma_dmdt, series.format().opposite()))
}

// ---- Helper methods ----

/// Run the per-epoch fitting loop sequentially.
#[cfg(not(feature = "parallel"))]
fn main_pass(
    tout: &Array1<f64>, series: &MassSeries, config: &RegressionConfig, tmin: f64, tmax: f64,
) -> Vec<(f64, f64)> {
    tout.iter().map(|&it| fit_epoch(it, series, config, tmin, tmax)).collect()
}

/// Run the per-epoch fitting loop across worker threads. Each epoch
/// writes to its own output slot, so no synchronization is needed beyond
/// the implicit join before the taper post-pass.
#[cfg(feature = "parallel")]
fn main_pass(
    tout: &Array1<f64>, series: &MassSeries, config: &RegressionConfig, tmin: f64, tmax: f64,
) -> Vec<(f64, f64)> {
    use rayon::prelude::*;

    let epochs: Vec<f64> = tout.to_vec();
    epochs.par_iter().map(|&it| fit_epoch(it, series, config, tmin, tmax)).collect()
}

/// Derive one `(dmdt, dmdt_sigma)` sample for the output epoch `it`.
fn fit_epoch(
    it: f64, series: &MassSeries, config: &RegressionConfig, tmin: f64, tmax: f64,
) -> (f64, f64) {
    const NO_FIT: (f64, f64) = (f64::NAN, f64::NAN);

    if it < tmin || it > tmax {
        return NO_FIT;
    }

    let w_half = config.window_width() / 2.0;
    let mut wmin = it - w_half;
    let mut wmax = it + w_half;

    if wmin < tmin || wmax > tmax {
        match config.edge() {
            EdgePolicy::Truncate => return NO_FIT,
            EdgePolicy::Taper { min_width } => {
                let tapered = (it - tmin).min(tmax - it).max(min_width);
                wmin = it - tapered;
                wmax = it + tapered;
                if count_in_window(series.epochs(), wmin, wmax) < 2 {
                    return NO_FIT;
                }
            }
            EdgePolicy::Clip => {
                wmin = wmin.max(tmin);
                wmax = wmax.min(tmax);
            }
        }
    }

    match fit_window(series, wmin, wmax, config.weighting()) {
        Ok((fit, mean_sq_sigma)) => {
            let dmdt_sigma = (fit.slope_stderr.powi(2) + mean_sq_sigma).sqrt();
            (fit.slope, dmdt_sigma)
        }
        // Rank-deficient or underpopulated windows mark the rate as
        // undefined at this epoch; they are never fatal.
        Err(_) => NO_FIT,
    }
}

/// Fit a straight line to the observations with `epoch ∈ [wmin, wmax)`.
///
/// Returns the fit together with the mean squared sigma of the window,
/// which the caller folds into the output uncertainty.
fn fit_window(
    series: &MassSeries, wmin: f64, wmax: f64, weighting: Weighting,
) -> LscovResult<(LinearFit, f64)> {
    let in_window: Vec<usize> = series
        .epochs()
        .iter()
        .enumerate()
        .filter(|(_, &epoch)| epoch >= wmin && epoch < wmax)
        .map(|(i, _)| i)
        .collect();
    let m = in_window.len();

    let a = DMatrix::from_fn(m, 2, |row, col| {
        if col == 0 { 1.0 } else { series.epochs()[in_window[row]] }
    });
    let b = DVector::from_iterator(m, in_window.iter().map(|&i| series.values()[i]));

    let v = match weighting {
        Weighting::Weighted => Some(DMatrix::from_diagonal(&DVector::from_iterator(
            m,
            in_window.iter().map(|&i| series.sigmas()[i].powi(2)),
        ))),
        Weighting::Ordinary => None,
    };

    let (coef, se) = lscov_se(&a, &b, v.as_ref())?;
    let mean_sq_sigma = nanmean(in_window.iter().map(|&i| series.sigmas()[i].powi(2)));
    Ok((
        LinearFit {
            intercept: coef[0],
            slope: coef[1],
            slope_stderr: se[1],
            n_observations: m,
        },
        mean_sq_sigma,
    ))
}

/// Count observations with `epoch ∈ [wmin, wmax)`.
fn count_in_window(epochs: &Array1<f64>, wmin: f64, wmax: f64) -> usize {
    epochs.iter().filter(|&&epoch| epoch >= wmin && epoch < wmax).count()
}

/// Replace the leading and trailing `min_width` blocks of a tapered
/// output with local averages.
///
/// Single-sided tapered windows near the domain edges are statistically
/// noisier than interior fits; each edge block is overwritten with the
/// NaN-ignoring mean of the computed values over twice the block width,
/// leading edge first, mirrored at the trailing edge.
fn apply_taper_post_pass(
    tout: &Array1<f64>, dmdt: &mut Array1<f64>, sigma_dmdt: &mut Array1<f64>, tmin: f64,
    tmax: f64, min_width: f64,
) {
    let leading = |epoch: f64| epoch <= tmin + min_width;
    let leading_avg = |epoch: f64| epoch <= tmin + 2.0 * min_width;
    overwrite_block(tout, dmdt, sigma_dmdt, leading, leading_avg);

    let trailing = |epoch: f64| epoch >= tmax - min_width;
    let trailing_avg = |epoch: f64| epoch >= tmax - 2.0 * min_width;
    overwrite_block(tout, dmdt, sigma_dmdt, trailing, trailing_avg);
}

fn overwrite_block(
    tout: &Array1<f64>, dmdt: &mut Array1<f64>, sigma_dmdt: &mut Array1<f64>,
    overwrite: impl Fn(f64) -> bool, average: impl Fn(f64) -> bool,
) {
    let mean_dmdt = nanmean(
        tout.iter().zip(dmdt.iter()).filter(|(&t, _)| average(t)).map(|(_, &v)| v),
    );
    let mean_sigma = nanmean(
        tout.iter().zip(sigma_dmdt.iter()).filter(|(&t, _)| average(t)).map(|(_, &v)| v),
    );
    for (i, &t) in tout.iter().enumerate() {
        if overwrite(t) {
            dmdt[i] = mean_dmdt;
            sigma_dmdt[i] = mean_sigma;
        }
    }
}
