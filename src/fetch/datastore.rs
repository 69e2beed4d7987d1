//! Request and response shapes of the CKAN `datastore_search` action.

use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FetchError;

/// One row as returned by the API, fields in the order the API sent them.
pub type Record = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct DatastoreResponse {
    result: DatastoreResult,
}

#[derive(Debug, Deserialize)]
struct DatastoreResult {
    records: Vec<Record>,
    #[serde(default)]
    total: Option<u64>,
}

/// A decoded page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    /// Total row count, when the datastore reports one.
    pub total: Option<u64>,
}

/// Builds `endpoint?resource_id=..&limit=..&offset=..`.
pub fn page_url(
    endpoint: &str,
    resource_id: &str,
    limit: usize,
    offset: usize,
) -> Result<Url, FetchError> {
    Url::parse_with_params(
        endpoint,
        [
            ("resource_id", resource_id.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ],
    )
    .map_err(|e| FetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Decodes a success body. Anything without `result.records` is rejected.
pub fn parse_page(body: &str, offset: usize) -> Result<Page, FetchError> {
    let parsed: DatastoreResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Deserialize {
            context: format!("datastore page at offset {offset}"),
            source,
        })?;

    Ok(Page {
        records: parsed.result.records,
        total: parsed.result.total,
    })
}
