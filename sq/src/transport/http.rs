//! HTTP transport backed by reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{FetchError, FetchRequest, FetchResponse, Method, Transport};
use crate::config::TransportConfig;

/// Performs fetches against a stats server over HTTP
pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl HttpTransport {
    /// Create a new transport from configuration
    pub fn from_config(config: &TransportConfig) -> Result<Self, FetchError> {
        debug!(?config, "HttpTransport::from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::from_reqwest(e, timeout))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        let err = FetchError::from_reqwest(err, self.timeout);
        debug!(error = %err, "HttpTransport::map_error: request failed");
        err
    }

    /// Resolve a request url against the base url
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            debug!(%url, "HttpTransport::resolve: absolute url");
            return url.to_string();
        }
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = self.resolve(&request.url);
        debug!(%url, method = %request.method, "HttpTransport::fetch: called");

        let pairs = request.query_pairs();
        let builder = match request.method {
            Method::Get => self.http.get(&url).query(&pairs),
            Method::Post => self.http.post(&url).form(&pairs),
        };

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        if !(200..300).contains(&status) {
            warn!(%url, status, "HttpTransport::fetch: non-success status");
            return Err(FetchError::from_status(status, body));
        }

        debug!(%url, status, body_len = body.len(), "HttpTransport::fetch: success");
        Ok(FetchResponse::new(status, body))
    }
}
