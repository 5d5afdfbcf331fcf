//! series::statistics — summary statistics for a mass-change series.
//!
//! Purpose
//! -------
//! Reduce a [`MassSeries`] to the handful of scalars a report row needs:
//! calendar start/stop dates, the mean posting interval, the total mass
//! change over the record, and the mean rate. The reduction is
//! representation-aware: a rate series is averaged and scaled by the
//! record span, while a cumulative series is differenced end-to-end.
//!
//! Key behaviors
//! -------------
//! - For `Dmdt` input: `mean_dmdt = nanmean(values)` and
//!   `total_dm = mean_dmdt * span_years`.
//! - For `Dm` input: `total_dm = last - first` and
//!   `mean_dmdt = total_dm / span_years`.
//! - NaN samples (e.g. truncated edge epochs of a derived rate series)
//!   are ignored by the mean, matching how the report layer treats them.
//!
//! Invariants & assumptions
//! ------------------------
//! - The record span is measured between the calendar datetimes of the
//!   first and last epochs and contracted with a fixed 365-day year (see
//!   [`crate::series::epoch`]); a single-observation series has zero span
//!   and produces a NaN mean rate for `Dm` input.

use chrono::NaiveDateTime;

use crate::series::{
    data::{DataFormat, MassSeries},
    epoch::{decimal_year_to_datetime, duration_to_decimal_years},
    errors::SeriesResult,
};

/// Summary scalars for one mass-change series.
///
/// `computed` records whether the summarized series was itself derived by
/// a representation conversion, so reports can flag reprocessed values.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStatistics {
    /// Calendar datetime of the first epoch.
    pub start_date: NaiveDateTime,
    /// Calendar datetime of the last epoch.
    pub stop_date: NaiveDateTime,
    /// Mean posting interval in decimal years.
    pub interval_years: f64,
    /// Total mass change over the record (Gt).
    pub total_dm: f64,
    /// Mean rate of mass change over the record (Gt/yr).
    pub mean_dmdt: f64,
    /// Whether the series was produced by a conversion.
    pub computed: bool,
}

impl MassSeries {
    /// Summarize this series into a [`SeriesStatistics`] value.
    ///
    /// Returns
    /// -------
    /// `SeriesResult<SeriesStatistics>`
    ///   The summary, or `SeriesError::EpochOutOfRange` when an epoch
    ///   cannot be expressed as a calendar date.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use masschange::series::data::{DataFormat, MassSeries};
    /// let series = MassSeries::new(
    ///     array![2005.0, 2006.0, 2007.0],
    ///     array![0.0, -10.0, -20.0],
    ///     array![1.0, 1.0, 1.0],
    ///     DataFormat::Dm,
    /// )
    /// .unwrap();
    /// let stats = series.statistics().unwrap();
    /// assert_eq!(stats.total_dm, -20.0);
    /// assert!(!stats.computed);
    /// ```
    pub fn statistics(&self) -> SeriesResult<SeriesStatistics> {
        let start_date = decimal_year_to_datetime(self.first_epoch())?;
        let stop_date = decimal_year_to_datetime(self.last_epoch())?;
        let span_years = duration_to_decimal_years(stop_date - start_date);
        let interval_years = span_years / self.len() as f64;

        let (total_dm, mean_dmdt) = match self.format() {
            DataFormat::Dmdt => {
                let mean = nanmean(self.values().iter().copied());
                (mean * span_years, mean)
            }
            DataFormat::Dm => {
                let total = self.values()[self.len() - 1] - self.values()[0];
                (total, total / span_years)
            }
        };

        Ok(SeriesStatistics {
            start_date,
            stop_date,
            interval_years,
            total_dm,
            mean_dmdt,
            computed: self.is_derived(),
        })
    }
}

/// Mean of the non-NaN entries; NaN when every entry is NaN.
pub(crate) fn nanmean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        if !value.is_nan() {
            sum += value;
            count += 1;
        }
    }
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Representation-aware totals and means for `Dm` and `Dmdt` input.
    // - NaN handling in the rate mean.
    // - `nanmean` edge cases.
    //
    // They intentionally DO NOT cover:
    // - Calendar conversion details (tested in `series::epoch`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the cumulative-series reduction: end-to-end difference and
    // span-scaled mean rate.
    //
    // Given
    // -----
    // - A three-epoch `Dm` series losing 10 Gt per year over 2005-2007.
    //
    // Expect
    // ------
    // - `total_dm = -20`; `mean_dmdt` close to -10 (the calendar span of
    //   two civil years differs from 2.0 fixed years only via leap days).
    fn statistics_dm_series_differences_endpoints() {
        // Arrange
        let series = MassSeries::new(
            array![2005.0, 2006.0, 2007.0],
            array![0.0, -10.0, -20.0],
            array![1.0, 1.0, 1.0],
            DataFormat::Dm,
        )
        .unwrap();

        // Act
        let stats = series.statistics().unwrap();

        // Assert
        assert_relative_eq!(stats.total_dm, -20.0, epsilon = 1e-12);
        assert_relative_eq!(stats.mean_dmdt, -10.0, max_relative = 1e-2);
        assert!(!stats.computed);
        assert_eq!(stats.start_date.to_string(), "2005-01-01 00:00:00");
    }

    #[test]
    // Purpose
    // -------
    // Verify the rate-series reduction: NaN-ignoring mean scaled by the
    // record span.
    //
    // Given
    // -----
    // - A `Dmdt` series with one NaN sample among constant -10 Gt/yr
    //   rates, spanning two years.
    //
    // Expect
    // ------
    // - `mean_dmdt = -10`; `total_dm` close to -20.
    fn statistics_dmdt_series_ignores_nan_samples() {
        // Arrange
        let series = MassSeries::new(
            array![2005.0, 2006.0, 2007.0],
            array![-10.0, f64::NAN, -10.0],
            array![1.0, 1.0, 1.0],
            DataFormat::Dmdt,
        )
        .unwrap();

        // Act
        let stats = series.statistics().unwrap();

        // Assert
        assert_relative_eq!(stats.mean_dmdt, -10.0, epsilon = 1e-12);
        assert_relative_eq!(stats.total_dm, -20.0, max_relative = 1e-2);
    }

    #[test]
    // Purpose
    // -------
    // Verify `nanmean` over mixed, all-NaN, and empty inputs.
    //
    // Given
    // -----
    // - Three iterators: mixed values with NaN, only NaN, and empty.
    //
    // Expect
    // ------
    // - Mixed ignores the NaN; the other two return NaN.
    fn nanmean_handles_degenerate_inputs() {
        // Act / Assert
        assert_relative_eq!(
            nanmean([1.0, f64::NAN, 3.0].into_iter()),
            2.0,
            epsilon = 1e-12
        );
        assert!(nanmean([f64::NAN, f64::NAN].into_iter()).is_nan());
        assert!(nanmean(std::iter::empty()).is_nan());
    }
}
