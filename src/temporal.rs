// ⏰ Temporal Model - the two notions of "recent" the detector relies on
//
// 1. Bulk cutoff: start of the current UTC day minus one day. Recomputed every
//    cycle, so the lookback covers between 24 and 48 hours.
// 2. Streaming window: the parsed death date must fall in the current UTC
//    year and month, with a day no more than `trailing_days` before today.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};

// ============================================================================
// BULK CUTOFF
// ============================================================================

/// Lower bound for the bulk query: yesterday at 00:00:00 UTC
pub fn lookback_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    let yesterday = now.date_naive() - Duration::days(1);
    yesterday.and_time(NaiveTime::MIN).and_utc()
}

/// Cutoff rendered the way the query endpoint expects an xsd:dateTime
pub fn format_cutoff(cutoff: DateTime<Utc>) -> String {
    cutoff.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// STREAMING RECENCY WINDOW
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    /// Days before today still accepted; today itself is always in
    pub trailing_days: u32,
}

impl RecencyWindow {
    /// On the 10th this accepts the 7th through the 10th
    pub fn new() -> Self {
        RecencyWindow { trailing_days: 3 }
    }

    pub fn with_trailing_days(trailing_days: u32) -> Self {
        RecencyWindow { trailing_days }
    }

    /// Whether `date` counts as recent on `today`.
    ///
    /// The comparison is calendar-month bound: on the 1st of a month, deaths
    /// dated the last days of the previous month are rejected.
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        if date.year() != today.year() || date.month() != today.month() {
            return false;
        }

        let earliest = today.day().saturating_sub(self.trailing_days);
        date.day() >= earliest && date.day() <= today.day()
    }

    /// First calendar day still inside the window; used to prune the ledger
    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(i64::from(self.trailing_days))
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lookback_cutoff_is_yesterday_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 17, 45, 12).unwrap();
        let cutoff = lookback_cutoff(now);

        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_lookback_cutoff_crosses_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 5, 0).unwrap();

        assert_eq!(
            lookback_cutoff(now),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_format_cutoff() {
        let cutoff = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        assert_eq!(format_cutoff(cutoff), "2024-03-09T00:00:00.000Z");
    }

    #[test]
    fn test_window_accepts_trailing_days() {
        let window = RecencyWindow::new();
        let today = date(2024, 3, 10);

        assert!(window.contains(date(2024, 3, 10), today));
        assert!(window.contains(date(2024, 3, 8), today));
        assert!(window.contains(date(2024, 3, 7), today));
        assert!(!window.contains(date(2024, 3, 6), today));
    }

    #[test]
    fn test_window_custom_width() {
        let window = RecencyWindow::with_trailing_days(2);
        let today = date(2024, 3, 10);

        assert!(window.contains(date(2024, 3, 8), today));
        assert!(!window.contains(date(2024, 3, 7), today));
    }

    #[test]
    fn test_window_rejects_future_and_other_months() {
        let window = RecencyWindow::new();
        let today = date(2024, 3, 10);

        assert!(!window.contains(date(2024, 3, 11), today));
        assert!(!window.contains(date(2024, 2, 10), today));
        assert!(!window.contains(date(2023, 3, 10), today));
    }

    #[test]
    fn test_window_early_in_month() {
        let window = RecencyWindow::new();
        let today = date(2024, 3, 1);

        assert!(window.contains(date(2024, 3, 1), today));
        assert!(!window.contains(date(2024, 2, 29), today));
    }

    #[test]
    fn test_window_start() {
        let window = RecencyWindow::new();
        assert_eq!(window.start(date(2024, 3, 10)), date(2024, 3, 7));
        assert_eq!(window.start(date(2024, 3, 1)), date(2024, 2, 27));
    }
}
