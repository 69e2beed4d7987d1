use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::analyzers::aggregate::aggregate_activity;
use crate::analyzers::bucket::BucketPolicy;
use crate::analyzers::types::{ActivityAggregate, ActivityRow, RawActivityRow};
use crate::analyzers::window::parse_date;
use crate::error::AggregateError;
use crate::report::{Event, Reporter};

const REQUIRED_COLUMNS: [&str; 2] = ["date", "user_count"];

/// Reads the `date` and `user_count` columns of a stored dataset.
///
/// # Errors
///
/// I/O failures, malformed CSV, a missing `date` or `user_count` column, or
/// a `date` cell that [`parse_date`] does not accept. An empty file loads as
/// no rows.
pub fn load_rows(path: &Path) -> Result<Vec<ActivityRow>, AggregateError> {
    let file = File::open(path).map_err(|source| AggregateError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    let headers = rdr.headers()?;
    if headers.is_empty() {
        return Ok(rows);
    }
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(AggregateError::MissingColumn {
                path: path.display().to_string(),
                column,
            });
        }
    }

    for (index, result) in rdr.deserialize::<RawActivityRow>().enumerate() {
        let raw = result?;
        // Line 1 is the header.
        let line = index as u64 + 2;
        let date = parse_date(&raw.date).ok_or(AggregateError::InvalidDate {
            line,
            value: raw.date.clone(),
        })?;
        rows.push(ActivityRow {
            date,
            user_count: raw.user_count,
        });
    }

    debug!(path = %path.display(), rows = rows.len(), "Dataset loaded");
    Ok(rows)
}

/// Loads the dataset at `path` and builds the aggregates over its trailing year.
///
/// # Errors
///
/// Everything [`load_rows`] reports, plus [`AggregateError::EmptyDataset`]
/// when the file holds no records.
#[tracing::instrument(skip_all, fields(path = %path.display(), ?policy))]
pub fn analyze<R: Reporter>(
    path: &Path,
    policy: BucketPolicy,
    reporter: R,
) -> Result<ActivityAggregate, AggregateError> {
    let rows = load_rows(path)?;
    let loaded = rows.len();

    let aggregate =
        aggregate_activity(rows, policy).ok_or_else(|| AggregateError::EmptyDataset {
            path: path.display().to_string(),
        })?;

    reporter.report(Event::WindowApplied {
        start: aggregate.window.start,
        end: aggregate.window.end,
        kept: aggregate.window.rows,
        dropped: loaded - aggregate.window.rows,
    });
    reporter.report(Event::AggregatesBuilt {
        cells: aggregate.grid.len(),
        days: aggregate.daily_means.len(),
        month_ticks: aggregate.month_ticks.len(),
    });

    Ok(aggregate)
}
