//! HTTP binding of the dashboard API.
//!
//! Implements both the mutation effect interface ([`ModerationBackend`]) and
//! the fetch interface ([`DashboardSource`]) over a single `reqwest::Client`.
//! The client is the only place a timeout applies; the core itself never
//! times out a mutation.

use std::time::Duration;

use async_trait::async_trait;
use modcon_core::action::{ModerationBackend, Mutation};
use modcon_core::collection::{DashboardData, DashboardSource, FetchKey};
use modcon_core::config::ApiConfig;
use modcon_core::error::{ModconError, Result};
use reqwest::{Method, StatusCode};

use crate::dto::{DashboardPayload, DenyBody, ErrorBody, FetchBody};

#[derive(Debug, Clone)]
pub struct HttpDashboardClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDashboardClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Method and URL a mutation is sent to.
    pub fn endpoint(&self, mutation: &Mutation) -> (Method, String) {
        let scope = mutation
            .parent()
            .map(|p| format!("/{}/{}", p.kind, p.id))
            .unwrap_or_default();
        let target = format!(
            "{}/dashboard{}/{}/{}",
            self.base_url,
            scope,
            mutation.resource().path_segment(),
            mutation.target_id()
        );
        match mutation {
            Mutation::Approve { .. } => (Method::POST, format!("{target}/approve")),
            Mutation::Deny { .. } => (Method::POST, format!("{target}/deny")),
            Mutation::Delete { .. } => (Method::DELETE, target),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(http_error(status, &body))
    }
}

#[async_trait]
impl ModerationBackend for HttpDashboardClient {
    async fn apply(&self, mutation: &Mutation) -> Result<()> {
        let (method, url) = self.endpoint(mutation);
        tracing::debug!("[Http] {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(reason) = mutation.reason() {
            request = request.json(&DenyBody { reason });
        }

        let response = request.send().await.map_err(transport_error)?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DashboardSource for HttpDashboardClient {
    async fn fetch(&self, keys: &[FetchKey]) -> Result<DashboardData> {
        let url = format!("{}/dashboard", self.base_url);
        tracing::debug!("[Http] POST {} keys={:?}", url, keys);

        let response = self
            .client
            .post(&url)
            .json(&FetchBody { keys })
            .send()
            .await
            .map_err(transport_error)?;
        let payload: DashboardPayload = Self::check(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        payload.into_domain(keys)
    }
}

/// Maps a non-success response to a domain error.
///
/// The body's `error` (or `message`) field is used when present, falling back
/// to the status text.
pub fn http_error(status: StatusCode, body: &str) -> ModconError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("status {}", status.as_u16()));

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("[Http] Rate limited: {}", message);
        return ModconError::http(status.as_u16(), format!("rate limited: {message}"));
    }
    ModconError::http(status.as_u16(), message)
}

/// Maps a reqwest failure (connect, timeout, body decode) to a domain error.
pub fn transport_error(error: reqwest::Error) -> ModconError {
    if error.is_decode() {
        return ModconError::Serialization {
            format: "JSON".to_string(),
            message: error.to_string(),
        };
    }
    if error.is_timeout() {
        return ModconError::transport(format!("request timed out: {error}"));
    }
    ModconError::transport(error.to_string())
}
