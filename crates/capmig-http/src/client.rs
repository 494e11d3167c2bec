//! Thin reqwest wrapper shared by the Okapi and Eureka clients

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{HttpError, Result};

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("capmig/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Shared JSON-over-HTTP plumbing. Requests are single-shot: resilience
/// against flaky upstreams is out of scope for the migration tool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .execute(Method::GET, url, headers, query, None::<&()>)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<Response> {
        self.execute(Method::POST, url, headers, &[], Some(body))
            .await
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response> {
        let url = url
            .parse::<url::Url>()
            .map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        debug!(%method, %url, "http request");

        let mut request = self.inner.request(method, url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(HttpError::HttpStatus { status, message });
        }
        Ok(response)
    }
}
