//! Paginated ingestion from the CKAN datastore.
//!
//! [`Fetcher::run`] walks the dataset by `offset`, one page of `limit`
//! records at a time, appending every page to a [`DatasetWriter`] as soon as
//! it arrives. A page that still fails after [`RetryPolicy::max_attempts`]
//! aborts the whole run; pages already written are left in place.

mod basic;
mod client;
mod datastore;
mod retry;

pub use basic::BasicClient;
pub use client::{HttpClient, HttpResponse};
pub use datastore::{Page, Record, page_url, parse_page};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};

use std::io::Write;
use std::time::Duration;

use crate::error::FetchError;
use crate::output::DatasetWriter;
use crate::report::{Event, Reporter, TracingReporter};

pub const DEFAULT_ENDPOINT: &str = "https://data.boston.gov/api/3/action/datastore_search";
/// Boston Public Library daily user activity.
pub const DEFAULT_RESOURCE_ID: &str = "c13199bf-49a1-488d-b8e9-55e49523ef81";

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub endpoint: String,
    pub resource_id: String,
    /// Records requested per page.
    pub limit: usize,
    pub retry: RetryPolicy,
    /// Pause between successful page fetches.
    pub page_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            resource_id: DEFAULT_RESOURCE_ID.to_string(),
            limit: 1000,
            retry: RetryPolicy::default(),
            page_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Non-empty pages written.
    pub pages: usize,
    pub records: usize,
    /// HTTP requests sent, retries and the closing empty page included.
    pub requests: usize,
}

pub struct Fetcher<C, S = ThreadSleeper, R = TracingReporter> {
    client: C,
    config: FetchConfig,
    sleeper: S,
    reporter: R,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, config: FetchConfig) -> Self {
        Self {
            client,
            config,
            sleeper: ThreadSleeper,
            reporter: TracingReporter,
        }
    }
}

impl<C, S, R> Fetcher<C, S, R> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Fetcher<C, S2, R> {
        Fetcher {
            client: self.client,
            config: self.config,
            sleeper,
            reporter: self.reporter,
        }
    }

    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> Fetcher<C, S, R2> {
        Fetcher {
            client: self.client,
            config: self.config,
            sleeper: self.sleeper,
            reporter,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

impl<C: HttpClient, S: Sleeper, R: Reporter> Fetcher<C, S, R> {
    /// Fetches the page starting at `offset`.
    ///
    /// Transport errors and non-success statuses are retried per the
    /// configured [`RetryPolicy`]; a body that does not decode is not.
    ///
    /// # Errors
    ///
    /// - [`FetchError::RetriesExhausted`] when every attempt failed.
    /// - [`FetchError::Deserialize`] when a success body lacks `result.records`.
    /// - [`FetchError::InvalidEndpoint`] when the endpoint is not a URL.
    pub fn fetch_page(&self, offset: usize) -> Result<Page, FetchError> {
        self.request_page(offset, &mut 0)
    }

    /// [`Fetcher::fetch_page`], adding every request sent to `requests`.
    fn request_page(&self, offset: usize, requests: &mut usize) -> Result<Page, FetchError> {
        let url = page_url(
            &self.config.endpoint,
            &self.config.resource_id,
            self.config.limit,
            offset,
        )?;
        let policy = &self.config.retry;
        let mut reason = String::from("no attempts permitted");

        for attempt in 0..policy.max_attempts {
            *requests += 1;
            let failure = match self.client.get(&url) {
                Ok(resp) if resp.status.is_success() => return parse_page(&resp.body, offset),
                Ok(resp) => FetchError::Status {
                    status: resp.status.as_u16(),
                    url: url.to_string(),
                },
                Err(e) => FetchError::Http(e),
            };
            reason = failure.to_string();

            let retry_in = (attempt + 1 < policy.max_attempts).then(|| policy.next_delay(attempt));
            self.reporter.report(Event::RequestFailed {
                url: url.to_string(),
                attempt,
                reason: reason.clone(),
                retry_in,
            });
            if let Some(delay) = retry_in {
                self.sleeper.sleep(delay);
            }
        }

        self.reporter.report(Event::RetriesExhausted {
            offset,
            attempts: policy.max_attempts,
        });
        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: policy.max_attempts,
            reason,
        })
    }

    /// Fetches every page and appends it to `writer`.
    ///
    /// Stops on an empty page or on a page shorter than the configured limit.
    #[tracing::instrument(
        skip_all,
        fields(endpoint = %self.config.endpoint, resource_id = %self.config.resource_id, limit = self.config.limit)
    )]
    pub fn run<W: Write>(&self, writer: &mut DatasetWriter<W>) -> Result<IngestSummary, FetchError> {
        let limit = self.config.limit.max(1);
        let mut offset = 0;
        let mut summary = IngestSummary::default();

        loop {
            let page = self.request_page(offset, &mut summary.requests)?;
            if offset == 0
                && let Some(total) = page.total
            {
                self.reporter.report(Event::DatasetTotal { total });
            }

            let fetched = page.records.len();
            if fetched == 0 {
                break;
            }

            let had_header = writer.has_header();
            writer.append(&page.records)?;
            if !had_header {
                let columns = writer.columns().map_or(0, <[String]>::len);
                self.reporter.report(Event::HeaderWritten { columns });
            }
            self.reporter.report(Event::PageFetched {
                offset,
                records: fetched,
            });

            summary.pages += 1;
            summary.records += fetched;
            offset += limit;

            if fetched < limit {
                break;
            }
            self.sleeper.sleep(self.config.page_delay);
        }

        self.reporter.report(Event::IngestComplete {
            pages: summary.pages,
            records: summary.records,
        });
        Ok(summary)
    }
}
