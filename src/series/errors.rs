//! Unified error handling for series construction.
//!
//! This module defines `SeriesError`, the central error type raised when a
//! [`MassSeries`](crate::series::data::MassSeries) or
//! [`BracketedSeries`](crate::series::data::BracketedSeries) is built from
//! caller-supplied arrays. It groups together shape mismatches, ordering
//! violations, and non-finite time coordinates. An alias `SeriesResult<T>`
//! standardizes the return type across series code.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type SeriesResult<T> = Result<T, SeriesError>;

/// Unified error type for series construction.
///
/// Covers structural defects in the arrays a series is built from. All
/// variants are raised at construction time, never mid-computation, so a
/// successfully constructed series can be consumed by the conversion
/// routines without re-validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesError {
    // ---- Shape ----
    /// The series contains no observations.
    EmptySeries,

    /// The epoch, value, and sigma arrays disagree in length.
    LengthMismatch {
        epochs: usize,
        values: usize,
        sigmas: usize,
    },

    /// The arrays of a bracketed series disagree in length.
    BracketLengthMismatch {
        starts: usize,
        ends: usize,
        values: usize,
        sigmas: usize,
    },

    // ---- Time coordinates ----
    /// An epoch is NaN or infinite.
    NonFiniteEpoch {
        index: usize,
        value: f64,
    },

    /// Epochs are not sorted in ascending order.
    UnsortedEpochs {
        index: usize,
    },

    /// A bracketed record has `end <= start`.
    InvalidBracket {
        index: usize,
        start: f64,
        end: f64,
    },

    /// A decimal-year epoch cannot be represented as a calendar date.
    EpochOutOfRange {
        value: f64,
    },
}

impl std::error::Error for SeriesError {}

impl std::fmt::Display for SeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shape ----
            SeriesError::EmptySeries => {
                write!(f, "Series Error: series must contain at least one observation")
            }
            SeriesError::LengthMismatch { epochs, values, sigmas } => write!(
                f,
                "Series Error: array lengths disagree (epochs = {}, values = {}, sigmas = {})",
                epochs, values, sigmas
            ),

            SeriesError::BracketLengthMismatch { starts, ends, values, sigmas } => write!(
                f,
                "Series Error: bracketed array lengths disagree (starts = {}, ends = {}, \
                 values = {}, sigmas = {})",
                starts, ends, values, sigmas
            ),

            // ---- Time coordinates ----
            SeriesError::NonFiniteEpoch { index, value } => {
                write!(f, "Series Error: epoch at index {} is not finite ({})", index, value)
            }
            SeriesError::UnsortedEpochs { index } => write!(
                f,
                "Series Error: epochs must be sorted ascending (violation at index {})",
                index
            ),
            SeriesError::InvalidBracket { index, start, end } => write!(
                f,
                "Series Error: bracketed record {} has end <= start ({} <= {})",
                index, end, start
            ),
            SeriesError::EpochOutOfRange { value } => write!(
                f,
                "Series Error: decimal year {} is outside the representable calendar range",
                value
            ),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<SeriesError> for PyErr {
    fn from(err: SeriesError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
