pub mod analyzers;
pub mod error;
pub mod fetch;
pub mod output;
pub mod report;

pub use error::{AggregateError, FetchError};
