//! Usage: Transport seam (one HTTP exchange) and the default reqwest-backed implementation.

use super::request::{ApiRequest, ApiResponse};
use crate::infra::config::ClientConfig;
use crate::shared::error::{ClientError, ClientResult};
use async_trait::async_trait;
use std::time::Duration;

/// Performs a single HTTP exchange.
///
/// Every HTTP answer, whatever its status, is returned as `Ok`; only failures
/// to obtain a response are errors. Dropping the returned future must abort
/// the exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if config.request_timeout_seconds > 0 {
            builder =
                builder.timeout(Duration::from_secs(config.request_timeout_seconds.into()));
        }
        if config.connect_timeout_seconds > 0 {
            builder = builder
                .connect_timeout(Duration::from_secs(config.connect_timeout_seconds.into()));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self::with_client(client, config.base_url.as_str()))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// `base_url` and `path` are concatenated, not RFC-3986 resolved, so a base
    /// URL with a path prefix (`https://host/api`) keeps its prefix.
    pub(crate) fn url_for(&self, request: &ApiRequest) -> ClientResult<reqwest::Url> {
        let path = request.path.trim();
        let joined = if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        };

        let mut url = reqwest::Url::parse(&joined).map_err(|e| {
            ClientError::InvalidRequest(format!("invalid request url {joined}: {e}"))
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let url = self.url_for(request)?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = request.body.clone() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
