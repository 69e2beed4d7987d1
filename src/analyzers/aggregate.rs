use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};

use crate::analyzers::bucket::{BucketPolicy, assign_buckets};
use crate::analyzers::types::{
    ActivityAggregate, ActivityRow, Bucket, DayMean, GridCell, MonthTick, Window,
};
use crate::analyzers::utility::{day_label, mean, round2};
use crate::analyzers::window::trailing_window;

pub const SCHEMA_VERSION: u8 = 1;

/// Sums `user_count` per `(week, day)`, ordered by week then day.
pub fn grid_cells(rows: &[ActivityRow], buckets: &[Bucket]) -> Vec<GridCell> {
    let mut cells: BTreeMap<Bucket, GridCell> = BTreeMap::new();

    for (row, bucket) in rows.iter().zip(buckets) {
        let cell = cells.entry(*bucket).or_insert_with(|| GridCell {
            week: bucket.week,
            day: bucket.day,
            value: 0.0,
            date: row.date.date(),
        });
        if let Some(count) = row.user_count {
            cell.value += count;
        }
    }

    cells.into_values().collect()
}

/// Averages `user_count` per day index, rounded to two decimals. Days with
/// no counted rows are left out.
pub fn daily_means(rows: &[ActivityRow], buckets: &[Bucket]) -> Vec<DayMean> {
    let mut by_day: BTreeMap<u8, Vec<f64>> = BTreeMap::new();

    for (row, bucket) in rows.iter().zip(buckets) {
        if let Some(count) = row.user_count {
            by_day.entry(bucket.day).or_default().push(count);
        }
    }

    by_day
        .into_iter()
        .map(|(day, values)| DayMean {
            day,
            label: day_label(day).to_string(),
            mean: round2(mean(&values)),
        })
        .collect()
}

/// One tick per first-of-month in `[start, end]`, positioned at whole weeks
/// since `start`.
pub fn month_ticks(start: NaiveDate, end: NaiveDate) -> Vec<MonthTick> {
    let first = start.with_day0(0).and_then(|d| {
        if d == start {
            Some(d)
        } else {
            d.checked_add_months(Months::new(1))
        }
    });

    std::iter::successors(first, |d| d.checked_add_months(Months::new(1)))
        .take_while(|d| *d <= end)
        .map(|d| MonthTick {
            week_offset: ((d - start).num_days() / 7) as u32,
            label: d.format("%b").to_string(),
        })
        .collect()
}

/// Windows, orders, buckets and aggregates `rows`.
///
/// Returns `None` when there are no rows to aggregate.
pub fn aggregate_activity(rows: Vec<ActivityRow>, policy: BucketPolicy) -> Option<ActivityAggregate> {
    let rows = trailing_window(rows);
    let start = rows.first()?.date.date();
    let end = rows.last()?.date.date();

    let buckets = assign_buckets(&rows, policy);

    Some(ActivityAggregate {
        schema_version: SCHEMA_VERSION,
        policy,
        window: Window {
            start,
            end,
            rows: rows.len(),
        },
        grid: grid_cells(&rows, &buckets),
        daily_means: daily_means(&rows, &buckets),
        month_ticks: month_ticks(start, end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::window::parse_date;

    fn row(date: &str, count: f64) -> ActivityRow {
        ActivityRow {
            date: parse_date(date).unwrap(),
            user_count: Some(count),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_grid_example() {
        let rows = vec![
            row("2024-01-01", 5.0),
            row("2024-01-02", 3.0),
            row("2024-01-08", 7.0),
        ];
        let agg = aggregate_activity(rows, BucketPolicy::WeekdayAnchored).unwrap();

        let cells: Vec<(u32, u8, f64)> = agg.grid.iter().map(|c| (c.week, c.day, c.value)).collect();
        assert_eq!(cells, vec![(0, 0, 5.0), (0, 1, 3.0), (1, 0, 7.0)]);
    }

    #[test]
    fn test_daily_mean_example() {
        let rows = vec![
            row("2024-01-01", 5.0),
            row("2024-01-02", 3.0),
            row("2024-01-08", 7.0),
        ];
        let agg = aggregate_activity(rows, BucketPolicy::WeekdayAnchored).unwrap();

        assert_eq!(
            agg.daily_means,
            vec![
                DayMean {
                    day: 0,
                    label: "Mon".to_string(),
                    mean: 6.0
                },
                DayMean {
                    day: 1,
                    label: "Tue".to_string(),
                    mean: 3.0
                },
            ]
        );
    }

    #[test]
    fn test_grid_sums_rows_sharing_a_cell() {
        let rows = vec![
            row("2024-01-01", 5.0),
            row("2024-01-01", 2.5),
            ActivityRow {
                date: parse_date("2024-01-01").unwrap(),
                user_count: None,
            },
        ];
        let buckets = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        let grid = grid_cells(&rows, &buckets);

        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].value, 7.5);
        assert_eq!(grid[0].date, date("2024-01-01"));
    }

    #[test]
    fn test_daily_means_round_to_two_places() {
        let rows = vec![
            row("2024-01-01", 1.0),
            row("2024-01-08", 1.0),
            row("2024-01-15", 2.0),
        ];
        let buckets = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        let means = daily_means(&rows, &buckets);
        assert_eq!(means[0].mean, 1.33);
    }

    #[test]
    fn test_daily_means_skip_days_without_counts() {
        let rows = vec![
            row("2024-01-01", 4.0),
            ActivityRow {
                date: parse_date("2024-01-02").unwrap(),
                user_count: None,
            },
        ];
        let buckets = assign_buckets(&rows, BucketPolicy::WeekdayAnchored);
        let means = daily_means(&rows, &buckets);
        assert_eq!(means.len(), 1);
        assert_eq!(means[0].day, 0);
    }

    #[test]
    fn test_month_ticks_from_mid_month() {
        let ticks = month_ticks(date("2023-01-15"), date("2023-04-01"));
        assert_eq!(
            ticks,
            vec![
                MonthTick {
                    week_offset: 2,
                    label: "Feb".to_string()
                },
                MonthTick {
                    week_offset: 6,
                    label: "Mar".to_string()
                },
                MonthTick {
                    week_offset: 10,
                    label: "Apr".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_month_ticks_include_start_on_first() {
        let ticks = month_ticks(date("2024-03-01"), date("2024-03-31"));
        assert_eq!(
            ticks,
            vec![MonthTick {
                week_offset: 0,
                label: "Mar".to_string()
            }]
        );
    }

    #[test]
    fn test_month_ticks_empty_within_one_month() {
        assert!(month_ticks(date("2024-03-02"), date("2024-03-30")).is_empty());
    }

    #[test]
    fn test_window_and_ticks_cover_trailing_year() {
        let rows = vec![
            row("2022-06-01", 100.0),
            row("2023-01-02", 1.0),
            row("2023-12-31", 2.0),
        ];
        let agg = aggregate_activity(rows, BucketPolicy::WeekdayAnchored).unwrap();

        assert_eq!(
            agg.window,
            Window {
                start: date("2023-01-02"),
                end: date("2023-12-31"),
                rows: 2
            }
        );
        assert_eq!(agg.month_ticks.len(), 11);
        assert_eq!(agg.month_ticks[0].label, "Feb");
        assert!(agg.grid.iter().all(|c| c.value < 100.0));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let rows = vec![
            row("2024-01-03", 4.0),
            row("2024-01-01", 5.0),
            row("2024-02-14", 9.0),
        ];
        let first = aggregate_activity(rows.clone(), BucketPolicy::Sequential { start_day: 2 });
        let second = aggregate_activity(rows, BucketPolicy::Sequential { start_day: 2 });
        assert_eq!(first, second);
    }

    #[test]
    fn test_aggregate_of_nothing_is_none() {
        assert!(aggregate_activity(Vec::new(), BucketPolicy::WeekdayAnchored).is_none());
    }
}
