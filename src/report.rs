//! Progress and failure reporting for the ingestion and aggregation stages.
//!
//! The core never writes to the global subscriber itself. It hands [`Event`]s
//! to a [`Reporter`]; the binary plugs in [`TracingReporter`], tests use
//! [`MemoryReporter`] to assert on what was reported.

use std::cell::RefCell;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{Level, error, info};

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// First page carried the datastore's total row count.
    DatasetTotal { total: u64 },
    PageFetched { offset: usize, records: usize },
    HeaderWritten { columns: usize },
    /// A request failed; `retry_in` is `None` when no attempts remain.
    RequestFailed {
        url: String,
        attempt: u32,
        reason: String,
        retry_in: Option<Duration>,
    },
    RetriesExhausted { offset: usize, attempts: u32 },
    IngestComplete { pages: usize, records: usize },
    WindowApplied {
        start: NaiveDate,
        end: NaiveDate,
        kept: usize,
        dropped: usize,
    },
    AggregatesBuilt {
        cells: usize,
        days: usize,
        month_ticks: usize,
    },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::RequestFailed { .. } | Event::RetriesExhausted { .. } => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

pub trait Reporter {
    fn report(&self, event: Event);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, event: Event) {
        (**self).report(event);
    }
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: Event) {
        match event {
            Event::DatasetTotal { total } => info!(total, "Datastore reports total records"),
            Event::PageFetched { offset, records } => {
                info!(offset, records, "Page fetched successfully")
            }
            Event::HeaderWritten { columns } => info!(columns, "Header written to CSV"),
            Event::RequestFailed {
                url,
                attempt,
                reason,
                retry_in,
            } => match retry_in {
                Some(delay) => error!(
                    url = %url,
                    attempt,
                    error = %reason,
                    retry_in_secs = delay.as_secs_f64(),
                    "Request failed, retrying"
                ),
                None => error!(url = %url, attempt, error = %reason, "Request failed"),
            },
            Event::RetriesExhausted { offset, attempts } => {
                error!(offset, attempts, "Max retries reached, aborting fetch")
            }
            Event::IngestComplete { pages, records } => {
                info!(pages, records, "Dataset fetched")
            }
            Event::WindowApplied {
                start,
                end,
                kept,
                dropped,
            } => info!(%start, %end, kept, dropped, "Trailing window applied"),
            Event::AggregatesBuilt {
                cells,
                days,
                month_ticks,
            } => info!(cells, days, month_ticks, "Aggregates built"),
        }
    }
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: RefCell<Vec<Event>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Events at `level`, e.g. `Level::ERROR`.
    pub fn at_level(&self, level: Level) -> Vec<Event> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.level() == level)
            .cloned()
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}
