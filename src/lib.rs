//! masschange — mass-change time-series conversion with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the conversion engine to Python via the `_masschange` extension
//! module. The crate converts geophysical mass-change records between their
//! two representations: cumulative mass change (`dm`) and rate of mass
//! change (`dmdt`).
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`series` and `conversion`) as the
//!   public crate surface.
//! - Define `#[pyfunction]` wrappers and the `#[pymodule]` initializer for
//!   the `_masschange` Python extension, mirroring the keyword interface of
//!   the legacy conversion helpers (`wsize`, `tout`, `weighted`, `truncate`,
//!   `tapering`, `min_tapering`).
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion, and error mapping.
//! - On successful conversion from Python objects to Rust types, the
//!   invariants documented in the core modules are assumed to hold.
//!
//! Conventions
//! -----------
//! - Epochs are decimal years; NaN output samples mean "no rate derivable at
//!   this epoch" and are returned to Python as NaN, never raised.
//! - Errors from core Rust code are propagated as rich error types
//!   internally and converted to `PyErr` values (`ValueError`) at the PyO3
//!   boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on [`series`] and
//!   [`conversion`] and can ignore the PyO3 items guarded by the
//!   `python-bindings` feature.
//! - The Python packaging layer imports the `_masschange` module defined
//!   here and wraps its functions in user-facing APIs.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules
//!   and by `tests/integration_conversion_pipeline.rs`; Python-level smoke
//!   tests exercise the `_masschange` module.

pub mod conversion;
pub mod series;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    conversion::{
        config::RegressionConfig,
        dm_to_dmdt::estimate_dmdt,
        dmdt_to_dm::{integrate_bracketed, integrate_dmdt},
    },
    series::data::{BracketedSeries, DataFormat},
    utils::{extract_mass_series, extract_owned_array},
};

/// Derive a rate series from a cumulative series by windowed regression.
///
/// Mirrors the legacy conversion helper: returns
/// `(tout, dmdt, sigma_dmdt)` where `tout` echoes the output epochs (the
/// supplied grid when given, the input epochs otherwise). Samples where
/// no rate could be derived are NaN.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (
        t,
        dm,
        sigma_dm,
        wsize,
        tout = None,
        weighted = false,
        truncate = true,
        tapering = false,
        min_tapering = None,
    ),
    text_signature = "(t, dm, sigma_dm, wsize, /, tout=None, weighted=False, \
                      truncate=True, tapering=False, min_tapering=None)"
)]
#[allow(clippy::too_many_arguments)]
fn dm_to_dmdt<'py>(
    py: Python<'py>, t: &Bound<'py, PyAny>, dm: &Bound<'py, PyAny>,
    sigma_dm: &Bound<'py, PyAny>, wsize: f64, tout: Option<&Bound<'py, PyAny>>,
    weighted: bool, truncate: bool, tapering: bool, min_tapering: Option<f64>,
) -> PyResult<(
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
)> {
    let series = extract_mass_series(py, t, dm, sigma_dm, DataFormat::Dm)?;
    let config =
        RegressionConfig::from_flags(wsize, weighted, truncate, tapering, min_tapering)?;
    let output_epochs = match tout {
        Some(raw) => Some(extract_owned_array(py, raw, "tout")?),
        None => None,
    };

    let rates = estimate_dmdt(&series, &config, output_epochs.as_ref())?;
    Ok((
        rates.epochs().to_vec().into_pyarray(py),
        rates.values().to_vec().into_pyarray(py),
        rates.sigmas().to_vec().into_pyarray(py),
    ))
}

/// Reconstruct a cumulative series from a point rate series.
///
/// Returns `(dm, sigma_dm)` on the input epochs, anchored at zero.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(t, dmdt, dmdt_sd, /)")]
fn dmdt_to_dm<'py>(
    py: Python<'py>, t: &Bound<'py, PyAny>, dmdt: &Bound<'py, PyAny>,
    dmdt_sd: &Bound<'py, PyAny>,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
    let series = extract_mass_series(py, t, dmdt, dmdt_sd, DataFormat::Dmdt)?;
    let cumulative = integrate_dmdt(&series)?;
    Ok((
        cumulative.values().to_vec().into_pyarray(py),
        cumulative.sigmas().to_vec().into_pyarray(py),
    ))
}

/// Reconstruct a cumulative series from bracketed interval rates.
///
/// Returns `(t, dm, sigma_dm)` with one more epoch than input intervals:
/// the first interval's start followed by every interval's end.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(t_start, t_end, dmdt, dmdt_sd, /)")]
fn dmdt_to_dm_bracketed<'py>(
    py: Python<'py>, t_start: &Bound<'py, PyAny>, t_end: &Bound<'py, PyAny>,
    dmdt: &Bound<'py, PyAny>, dmdt_sd: &Bound<'py, PyAny>,
) -> PyResult<(
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
)> {
    let starts = extract_owned_array(py, t_start, "t_start")?;
    let ends = extract_owned_array(py, t_end, "t_end")?;
    let values = extract_owned_array(py, dmdt, "dmdt")?;
    let sigmas = extract_owned_array(py, dmdt_sd, "dmdt_sd")?;
    let series = BracketedSeries::new(starts, ends, values, sigmas)?;

    let cumulative = integrate_bracketed(&series)?;
    Ok((
        cumulative.epochs().to_vec().into_pyarray(py),
        cumulative.values().to_vec().into_pyarray(py),
        cumulative.sigmas().to_vec().into_pyarray(py),
    ))
}

/// _masschange — PyO3 module initializer for the Python extension.
///
/// Registers the conversion entry points on the `_masschange` module. This
/// function is invoked automatically by Python when importing the compiled
/// extension; it is not called directly by user code.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _masschange<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(dm_to_dmdt, m)?)?;
    m.add_function(wrap_pyfunction!(dmdt_to_dm, m)?)?;
    m.add_function(wrap_pyfunction!(dmdt_to_dm_bracketed, m)?)?;
    Ok(())
}
