//! Data types used by the aggregation pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::analyzers::bucket::BucketPolicy;

/// The two columns of a stored record the aggregates need, as read from CSV.
#[derive(Debug, Deserialize)]
pub(crate) struct RawActivityRow {
    pub(crate) date: String,
    pub(crate) user_count: Option<f64>,
}

/// One dated activity measurement. Empty `user_count` cells load as `None`
/// and are skipped by the sums and means.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub date: NaiveDateTime,
    pub user_count: Option<f64>,
}

/// Calendar coordinate of a row: `day` is 0..=6, `week` counts from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Bucket {
    pub week: u32,
    pub day: u8,
}

/// Summed activity for one `(week, day)` cell of the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub week: u32,
    pub day: u8,
    pub value: f64,
    /// Date of the first row that landed in this cell.
    pub date: NaiveDate,
}

/// Mean activity per day index, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayMean {
    pub day: u8,
    pub label: String,
    pub mean: f64,
}

/// Month boundary on the week axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTick {
    pub week_offset: u32,
    pub label: String,
}

/// Date span and size of the trailing window that was aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: usize,
}

/// Everything the chart renderer needs, written out as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityAggregate {
    pub schema_version: u8,
    pub policy: BucketPolicy,
    pub window: Window,
    pub grid: Vec<GridCell>,
    pub daily_means: Vec<DayMean>,
    pub month_ticks: Vec<MonthTick>,
}
