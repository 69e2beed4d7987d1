//! Activity aggregation over the stored dataset.
//!
//! This module loads the CSV written by the fetcher, keeps the trailing
//! year, assigns each row a `(week, day)` bucket, and computes the heatmap
//! sums, per-day means and month ticks handed to the chart renderer.

pub mod aggregate;
pub mod analyzer;
pub mod bucket;
pub mod types;
pub mod utility;
pub mod window;

pub use analyzer::{analyze, load_rows};
pub use bucket::{BucketPolicy, assign_buckets};
pub use types::{ActivityAggregate, ActivityRow, Bucket, DayMean, GridCell, MonthTick, Window};
