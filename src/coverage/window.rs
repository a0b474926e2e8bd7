use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use super::error::CoverageError;

const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range a visit must fall in to be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoverageError> {
        if start > end {
            return Err(CoverageError::InvalidParameter(format!(
                "window start {} is after window end {}",
                start.format(DISPLAY_DATE_FORMAT),
                end.format(DISPLAY_DATE_FORMAT)
            )));
        }

        Ok(Self { start, end })
    }

    /// The monthly billing period around `today`: the 15th of the previous
    /// month through the 14th of the current one.
    pub fn billing_period(today: NaiveDate) -> Self {
        let first_of_month = today - Days::new(u64::from(today.day0()));
        let end = first_of_month + Days::new(13);

        let last_of_previous = first_of_month - Days::new(1);
        let start = last_of_previous - Days::new(u64::from(last_of_previous.day() - 15));

        Self { start, end }
    }

    /// Builds a window from optional user input, filling gaps from the
    /// billing period of `today`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, CoverageError> {
        let defaults = Self::billing_period(today);
        let start = match start {
            Some(raw) => parse_window_date(raw)?,
            None => defaults.start,
        };
        let end = match end {
            Some(raw) => parse_window_date(raw)?,
            None => defaults.end,
        };

        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format(DISPLAY_DATE_FORMAT),
            self.end.format(DISPLAY_DATE_FORMAT)
        )
    }
}

/// Accepts `DD/MM/YYYY` as printed in the reports, or ISO `YYYY-MM-DD`.
pub fn parse_window_date(raw: &str) -> Result<NaiveDate, CoverageError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DISPLAY_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT))
        .map_err(|_| {
            CoverageError::InvalidParameter(format!(
                "'{trimmed}' is not a valid date (expected DD/MM/YYYY)"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn billing_period_spans_previous_fifteenth_to_current_fourteenth() {
        let window = ReportingWindow::billing_period(date(2024, 6, 20));
        assert_eq!(window.start, date(2024, 5, 15));
        assert_eq!(window.end, date(2024, 6, 14));
    }

    #[test]
    fn billing_period_rolls_back_across_year_boundary() {
        let window = ReportingWindow::billing_period(date(2025, 1, 3));
        assert_eq!(window.start, date(2024, 12, 15));
        assert_eq!(window.end, date(2025, 1, 14));
    }

    #[test]
    fn billing_period_handles_march_after_short_february() {
        let window = ReportingWindow::billing_period(date(2023, 3, 31));
        assert_eq!(window.start, date(2023, 2, 15));
        assert_eq!(window.end, date(2023, 3, 14));
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let window = ReportingWindow::new(date(2024, 5, 15), date(2024, 6, 14)).unwrap();
        assert!(window.contains(date(2024, 5, 15)));
        assert!(window.contains(date(2024, 6, 14)));
        assert!(!window.contains(date(2024, 5, 14)));
        assert!(!window.contains(date(2024, 6, 15)));
    }

    #[test]
    fn new_rejects_start_after_end() {
        let error = ReportingWindow::new(date(2024, 6, 15), date(2024, 6, 14)).unwrap_err();
        assert_eq!(error.kind(), "invalid_parameter");
    }

    #[test]
    fn resolve_parses_both_accepted_formats_and_fills_defaults() {
        let window =
            ReportingWindow::resolve(Some("01/06/2024"), None, date(2024, 6, 20)).unwrap();
        assert_eq!(window.start, date(2024, 6, 1));
        assert_eq!(window.end, date(2024, 6, 14));

        let window =
            ReportingWindow::resolve(None, Some("2024-06-30"), date(2024, 6, 20)).unwrap();
        assert_eq!(window.start, date(2024, 5, 15));
        assert_eq!(window.end, date(2024, 6, 30));
    }

    #[test]
    fn resolve_rejects_unparseable_dates() {
        let error = ReportingWindow::resolve(Some("31/02/2024"), None, date(2024, 6, 20))
            .unwrap_err();
        assert!(matches!(error, CoverageError::InvalidParameter(_)));
    }
}
