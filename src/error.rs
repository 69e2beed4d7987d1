use thiserror::Error;

/// Failures raised while paging through the source API and persisting records.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("giving up on {url} after {attempts} attempt(s): {reason}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint \"{endpoint}\": {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised while loading the stored dataset and building aggregates.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset {path} has no \"{column}\" column")]
    MissingColumn { path: String, column: &'static str },

    #[error("dataset {path} contains no records")]
    EmptyDataset { path: String },

    #[error("unparsable date \"{value}\" on line {line}")]
    InvalidDate { line: u64, value: String },

    #[error("start day must be in 0..=6, got {0}")]
    InvalidStartDay(u8),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
