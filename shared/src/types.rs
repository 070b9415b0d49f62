//! Common types used across the platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range for dashboard and report queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Single-day range
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, counting both endpoints
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterate every calendar day in the range, oldest first
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |d| *d <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn num_days_counts_both_endpoints() {
        assert_eq!(DateRange::day(date(2025, 6, 1)).num_days(), 1);
        assert_eq!(DateRange::new(date(2025, 6, 1), date(2025, 6, 30)).num_days(), 30);
        assert_eq!(DateRange::new(date(2025, 1, 1), date(2025, 12, 31)).num_days(), 365);
    }

    #[test]
    fn days_matches_num_days() {
        let range = DateRange::new(date(2025, 2, 26), date(2025, 3, 3));
        let days: Vec<NaiveDate> = range.days().collect();
        assert_eq!(days.len() as i64, range.num_days());
        assert_eq!(days.first(), Some(&date(2025, 2, 26)));
        assert_eq!(days.last(), Some(&date(2025, 3, 3)));
    }
}
