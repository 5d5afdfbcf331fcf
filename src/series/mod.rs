//! series — mass-change series data model and summaries.
//!
//! Purpose
//! -------
//! Collect the immutable value objects that flow through the conversion
//! engine: point series ([`MassSeries`]), interval-rate series
//! ([`BracketedSeries`]), their representation tag ([`DataFormat`]), the
//! calendar helpers used for human-readable summaries, and the shared
//! error type for series construction.
//!
//! Key behaviors
//! -------------
//! - Validate caller-supplied arrays once at construction
//!   ([`data::MassSeries::new`], [`data::BracketedSeries::new`]) so the
//!   numerical routines can assume shape and ordering invariants.
//! - Provide representation-aware conversion entry points
//!   (`to_dmdt` / `to_dm`) that delegate to [`crate::conversion`].
//! - Reduce a series to report-ready scalars via
//!   [`statistics::SeriesStatistics`].
//!
//! Conventions
//! -----------
//! - Epochs are decimal years; values are Gt (cumulative) or Gt/yr
//!   (rate); sigmas are one-sigma uncertainties.
//! - NaN in values/sigmas means "no data at this epoch", never an error.
//!
//! Downstream usage
//! ----------------
//! - The schema/CSV layer of the surrounding validator constructs these
//!   series from parsed tables; the report layer consumes statistics and
//!   converted series. Neither concern lives in this crate.
//!
//! Testing notes
//! -------------
//! - Unit tests live alongside each module; conversion round trips are
//!   exercised in `tests/integration_conversion_pipeline.rs`.

pub mod data;
pub mod epoch;
pub mod errors;
pub mod statistics;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::{BracketedSeries, DataFormat, MassSeries};
pub use self::errors::{SeriesError, SeriesResult};
pub use self::statistics::SeriesStatistics;
