//! Assignment of `(week, day)` coordinates to date-ordered rows.
//!
//! Both policies are a single forward pass over the rows and return a new
//! `Vec<Bucket>` aligned index-for-index with the input.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::analyzers::types::{ActivityRow, Bucket};
use crate::error::AggregateError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketPolicy {
    /// `day` is the record's weekday (Mon = 0 .. Sun = 6). `week` starts at
    /// 0 and moves up by one whenever a row falls in a later Monday-started
    /// calendar week than the row before it. Repeated rows for the same
    /// Monday stay in one week.
    #[default]
    WeekdayAnchored,
    /// `day` follows row position, `(start_day + i) % 7`, whatever the actual
    /// weekday. `week` moves up by one each time `day` wraps back to 0.
    Sequential { start_day: u8 },
}

impl BucketPolicy {
    pub fn sequential(start_day: u8) -> Result<Self, AggregateError> {
        if start_day > 6 {
            return Err(AggregateError::InvalidStartDay(start_day));
        }
        Ok(Self::Sequential { start_day })
    }
}

/// Days since CE of the Monday that starts `date`'s week.
fn week_key(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - i64::from(date.weekday().num_days_from_monday())
}

/// Buckets `rows`, which must already be sorted ascending by date.
pub fn assign_buckets(rows: &[ActivityRow], policy: BucketPolicy) -> Vec<Bucket> {
    match policy {
        BucketPolicy::WeekdayAnchored => rows
            .iter()
            .scan((0u32, None::<i64>), |(week, previous), row| {
                let date = row.date.date();
                let key = week_key(date);
                if previous.is_some_and(|p| p != key) {
                    *week += 1;
                }
                *previous = Some(key);
                Some(Bucket {
                    week: *week,
                    day: date.weekday().num_days_from_monday() as u8,
                })
            })
            .collect(),
        BucketPolicy::Sequential { start_day } => {
            let start = usize::from(start_day % 7);
            (0..rows.len())
                .map(|i| {
                    let slot = start + i;
                    Bucket {
                        week: (slot / 7) as u32,
                        day: (slot % 7) as u8,
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::window::parse_date;

    fn rows(dates: &[&str]) -> Vec<ActivityRow> {
        dates
            .iter()
            .map(|d| ActivityRow {
                date: parse_date(d).unwrap(),
                user_count: Some(1.0),
            })
            .collect()
    }

    fn coords(buckets: &[Bucket]) -> Vec<(u32, u8)> {
        buckets.iter().map(|b| (b.week, b.day)).collect()
    }

    #[test]
    fn test_weekday_anchored_example() {
        let rows = rows(&["2024-01-01", "2024-01-02", "2024-01-08"]);
        let buckets = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        assert_eq!(coords(&buckets), vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_weekday_anchored_starts_mid_week() {
        // Thu, Fri, Sat, Sun, Mon
        let rows = rows(&[
            "2024-01-04",
            "2024-01-05",
            "2024-01-06",
            "2024-01-07",
            "2024-01-08",
        ]);
        let buckets = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        assert_eq!(coords(&buckets), vec![(0, 3), (0, 4), (0, 5), (0, 6), (1, 0)]);
    }

    #[test]
    fn test_weekday_anchored_same_day_rows_share_bucket() {
        let rows = rows(&["2024-01-08", "2024-01-08", "2024-01-09"]);
        let buckets = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        assert_eq!(coords(&buckets), vec![(0, 0), (0, 0), (0, 1)]);
    }

    #[test]
    fn test_weekday_anchored_gap_without_monday_still_crosses() {
        // Sunday, then the Tuesday after.
        let rows = rows(&["2024-01-07", "2024-01-09"]);
        let buckets = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        assert_eq!(coords(&buckets), vec![(0, 6), (1, 1)]);
    }

    #[test]
    fn test_sequential_ignores_weekday() {
        // Starts on a Monday, but the policy is told day 5.
        let rows = rows(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"]);
        let policy = BucketPolicy::sequential(5).unwrap();
        let buckets = assign_buckets(&rows, policy);
        assert_eq!(coords(&buckets), vec![(0, 5), (0, 6), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_sequential_from_zero_fills_whole_weeks() {
        let dates: Vec<String> = (1..=15).map(|d| format!("2024-01-{d:02}")).collect();
        let refs: Vec<&str> = dates.iter().map(String::as_str).collect();
        let buckets = assign_buckets(&rows(&refs), BucketPolicy::sequential(0).unwrap());

        assert_eq!(buckets[6], Bucket { week: 0, day: 6 });
        assert_eq!(buckets[7], Bucket { week: 1, day: 0 });
        assert_eq!(buckets[14], Bucket { week: 2, day: 0 });
    }

    #[test]
    fn test_policies_disagree_on_same_input() {
        let rows = rows(&["2024-01-03", "2024-01-04"]);
        let anchored = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        let sequential = assign_buckets(&rows, BucketPolicy::sequential(0).unwrap());
        assert_ne!(anchored, sequential);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let rows = rows(&["2024-02-26", "2024-02-29", "2024-03-04", "2024-03-10"]);
        for policy in [BucketPolicy::WeekdayAnchored, BucketPolicy::Sequential { start_day: 3 }] {
            assert_eq!(assign_buckets(&rows, policy), assign_buckets(&rows, policy));
        }
    }

    #[test]
    fn test_sequential_rejects_out_of_range_start() {
        assert!(matches!(
            BucketPolicy::sequential(7),
            Err(AggregateError::InvalidStartDay(7))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(assign_buckets(&[], BucketPolicy::WeekdayAnchored).is_empty());
        assert!(assign_buckets(&[], BucketPolicy::Sequential { start_day: 2 }).is_empty());
    }
}
