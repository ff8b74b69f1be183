//! Outbound HTTP plumbing shared by the adapters.
//!
//! One attempt per call. Timeouts are configured on the client, so a slow source
//! surfaces as a `reqwest` timeout error and maps to `SourceUnavailable`.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, Url};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::sources::SourceError;

const ERROR_BODY_SNIPPET: usize = 200;

/// Builds the HTTP client an adapter owns for its lifetime.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Scraping gateway: fetches `url` on our behalf, authenticated by `api_key`.
#[derive(Debug, Clone)]
pub struct ScraperGateway {
    endpoint: String,
    api_key: String,
}

impl ScraperGateway {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// `{endpoint}?api_key=<key>&url=<percent-encoded target>`
    pub fn wrap(&self, target: &str) -> Result<String, String> {
        Url::parse_with_params(
            &self.endpoint,
            &[("api_key", self.api_key.as_str()), ("url", target)],
        )
        .map(String::from)
        .map_err(|e| format!("invalid gateway endpoint '{}': {e}", self.endpoint))
    }
}

impl From<&GatewayConfig> for ScraperGateway {
    fn from(config: &GatewayConfig) -> Self {
        Self::new(config.endpoint.clone(), config.api_key.clone())
    }
}

/// Maps a non-2xx response to `SourceUnavailable` carrying the status and a body snippet.
pub async fn ensure_success(response: Response, source_name: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(ERROR_BODY_SNIPPET).collect();
    Err(SourceError::unavailable(
        source_name,
        format!("{url} returned {status}: {snippet}"),
    ))
}

/// GET `url` (through the gateway when one is configured) and return the body text.
pub async fn fetch_html(
    client: &Client,
    gateway: Option<&ScraperGateway>,
    url: &str,
    headers: &HeaderMap,
    source_name: &str,
) -> Result<String, SourceError> {
    let request_url = match gateway {
        Some(gateway) => gateway
            .wrap(url)
            .map_err(|e| SourceError::unavailable(source_name, e))?,
        None => url.to_string(),
    };
    debug!("GET {url}");

    let response = client
        .get(&request_url)
        .headers(headers.clone())
        .send()
        .await
        .map_err(|e| SourceError::from_transport(source_name, e))?;
    let response = ensure_success(response, source_name).await?;

    response
        .text()
        .await
        .map_err(|e| SourceError::from_transport(source_name, e))
}
