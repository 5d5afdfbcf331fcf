//! series::epoch — decimal-year / calendar conversions.
//!
//! Purpose
//! -------
//! Translate between the continuous decimal-year coordinate used by the
//! numerical core and calendar datetimes used for human-readable series
//! summaries. The decimal-year convention treats the fractional part as a
//! fraction of the civil year's actual length (366 days in leap years),
//! while elapsed durations are scaled by a fixed 365-day year.
//!
//! Key behaviors
//! -------------
//! - [`decimal_year_to_datetime`] maps e.g. `2007.5` to the instant
//!   `2007-01-01 00:00 + 0.5 * 365 days` (leap-aware).
//! - [`duration_to_decimal_years`] maps an elapsed [`TimeDelta`] back to
//!   fractional years with the fixed 365-day convention.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs have already been validated finite by series construction;
//!   out-of-range years (beyond chrono's representable span) are still
//!   reported as [`SeriesError::EpochOutOfRange`] rather than panicking.
//! - The two conventions (leap-aware expansion, fixed-year contraction)
//!   intentionally mirror the reference pipeline and are not exact
//!   inverses of each other.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::series::errors::{SeriesError, SeriesResult};

/// Seconds per fixed 365-day year, used when contracting durations.
const SECONDS_PER_YEAR: f64 = 60.0 * 60.0 * 24.0 * 365.0;

/// Convert a decimal-year coordinate to a calendar datetime.
///
/// Parameters
/// ----------
/// - `year`: `f64`
///   Decimal-year coordinate, e.g. `2007.5`. The integer part selects the
///   civil year; the fraction is scaled by that year's actual day count.
///
/// Returns
/// -------
/// `SeriesResult<NaiveDateTime>`
///   The corresponding instant at millisecond resolution.
///
/// Errors
/// ------
/// - `SeriesError::EpochOutOfRange` when `year` is not finite or falls
///   outside chrono's representable calendar span.
///
/// Examples
/// --------
/// ```rust
/// # use masschange::series::epoch::decimal_year_to_datetime;
/// let start_of_year = decimal_year_to_datetime(2007.0).unwrap();
/// assert_eq!(start_of_year.to_string(), "2007-01-01 00:00:00");
/// ```
pub fn decimal_year_to_datetime(year: f64) -> SeriesResult<NaiveDateTime> {
    if !year.is_finite() || year.abs() > i32::MAX as f64 {
        return Err(SeriesError::EpochOutOfRange { value: year });
    }
    let int_year = year.trunc() as i32;
    let year_fraction = year - int_year as f64;

    let jan_first = NaiveDate::from_ymd_opt(int_year, 1, 1)
        .ok_or(SeriesError::EpochOutOfRange { value: year })?;
    let year_days = if jan_first.leap_year() { 366.0 } else { 365.0 };

    let offset_millis = (year_fraction * year_days * 86_400_000.0).round() as i64;
    jan_first
        .and_hms_opt(0, 0, 0)
        .and_then(|start| start.checked_add_signed(TimeDelta::milliseconds(offset_millis)))
        .ok_or(SeriesError::EpochOutOfRange { value: year })
}

/// Convert an elapsed duration to decimal years (fixed 365-day year).
pub fn duration_to_decimal_years(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_YEAR
}
