//! conversion — mass-change representation conversion engine.
//!
//! Purpose
//! -------
//! Convert between the two representations of a mass-change record:
//! windowed regression from cumulative series to rates
//! ([`dm_to_dmdt::estimate_dmdt`]) and numerical integration from rates
//! back to cumulative series ([`dmdt_to_dm::integrate_dmdt`],
//! [`dmdt_to_dm::integrate_bracketed`]), on top of a generalized
//! least-squares solver ([`lscov`]).
//!
//! Key behaviors
//! -------------
//! - One output sample per requested epoch; samples that cannot be
//!   derived are NaN, never dropped.
//! - Fatal errors are reserved for structurally invalid calls
//!   (malformed configuration, a globally too-short series, converting
//!   into the representation the series already has).
//! - All estimation behavior is carried by an explicit
//!   [`config::RegressionConfig`]; nothing is keyed off global state.
//!
//! Downstream usage
//! ----------------
//! - [`crate::series::data::MassSeries::to_dmdt`] /
//!   [`crate::series::data::MassSeries::to_dm`] are the ergonomic entry
//!   points; the free functions here add the output-grid parameter and
//!   the bracketed shape.
//!
//! Testing notes
//! -------------
//! - Unit tests live alongside each module;
//!   `tests/integration_conversion_pipeline.rs` exercises the full
//!   estimate-then-integrate pipeline.

pub mod config;
pub mod dm_to_dmdt;
pub mod dmdt_to_dm;
pub mod errors;
pub mod lscov;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::config::{EdgePolicy, RegressionConfig, Weighting};
pub use self::dm_to_dmdt::{estimate_dmdt, LinearFit};
pub use self::dmdt_to_dm::{integrate_bracketed, integrate_dmdt};
pub use self::errors::{ConversionError, ConversionResult, LscovError, LscovResult};
pub use self::lscov::{lscov, lscov_se};
