//! Transport layer
//!
//! The scheduler only depends on the [`Transport`] trait: given a request it
//! performs one asynchronous fetch and resolves to exactly one outcome.

use async_trait::async_trait;

mod error;
mod http;
mod request;

pub use error::FetchError;
pub use http::HttpTransport;
pub use request::{DEFAULT_URL, FetchRequest, FetchResponse, Method};

/// Performs fetches for jobs
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one fetch
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}
