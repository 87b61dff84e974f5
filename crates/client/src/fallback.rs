// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response fallback used when the stream cannot deliver.
//!
//! - `GET {api}/resource/{id}` returns a [`Snapshot`]
//! - `POST {api}/resource/{id}/mutate` takes an intent frame
//!
//! Both send `Authorization: Bearer <credential>` when a credential is set.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sl_core::{ClientFrame, ResourceId};

use crate::config::SyncConfig;
use crate::credential::Credential;
use crate::error::Result;
use crate::transport::BoxFuture;

/// Error type for fallback requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FallbackError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FallbackError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FallbackError::Status(status.as_u16())
        } else if e.is_decode() {
            FallbackError::Decode(e.to_string())
        } else {
            FallbackError::Request(e.to_string())
        }
    }
}

/// Body of `GET /resource/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(default)]
    pub data: Value,
}

/// Request/response endpoints of the server.
///
/// Futures are `'static` so the session can run them on spawned tasks.
pub trait Fallback: Send + Sync + 'static {
    fn fetch_snapshot(
        &self,
        resource_id: &ResourceId,
        credential: Option<&Credential>,
    ) -> BoxFuture<'static, std::result::Result<Snapshot, FallbackError>>;

    fn post_mutation(
        &self,
        resource_id: &ResourceId,
        credential: Option<&Credential>,
        frame: &ClientFrame,
    ) -> BoxFuture<'static, std::result::Result<(), FallbackError>>;
}

/// HTTP fallback using reqwest.
#[derive(Debug, Clone)]
pub struct HttpFallback {
    client: reqwest::Client,
    config: SyncConfig,
}

impl HttpFallback {
    /// Builds a client from the session config. Fails if the API URL is invalid.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        config.api_base()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| crate::error::Error::Config(format!("http client: {}", e)))?;
        Ok(HttpFallback {
            client,
            config: config.clone(),
        })
    }

    fn request(
        &self,
        method: reqwest::Method,
        resource_id: &ResourceId,
        rest: &[&str],
        credential: Option<&Credential>,
    ) -> std::result::Result<reqwest::RequestBuilder, FallbackError> {
        let url = self
            .config
            .resource_url(resource_id, rest)
            .map_err(|e| FallbackError::Request(e.to_string()))?;
        let mut request = self.client.request(method, url);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.expose());
        }
        Ok(request)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config.request_timeout()
    }
}

impl Fallback for HttpFallback {
    fn fetch_snapshot(
        &self,
        resource_id: &ResourceId,
        credential: Option<&Credential>,
    ) -> BoxFuture<'static, std::result::Result<Snapshot, FallbackError>> {
        let request = self.request(reqwest::Method::GET, resource_id, &[], credential);
        Box::pin(async move {
            let response = request?.send().await?.error_for_status()?;
            Ok(response.json::<Snapshot>().await?)
        })
    }

    fn post_mutation(
        &self,
        resource_id: &ResourceId,
        credential: Option<&Credential>,
        frame: &ClientFrame,
    ) -> BoxFuture<'static, std::result::Result<(), FallbackError>> {
        let request = self
            .request(reqwest::Method::POST, resource_id, &["mutate"], credential)
            .map(|r| r.json(frame));
        Box::pin(async move {
            request?.send().await?.error_for_status()?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "fallback_tests.rs"]
mod tests;
