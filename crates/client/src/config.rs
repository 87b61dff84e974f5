// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session configuration.
//!
//! Every field has a default, so an empty TOML file is a valid config:
//!
//! ```toml
//! stream_url = "wss://dash.example.com"
//! heartbeat_interval_ms = 30000
//! offline_policy = "queue"
//!
//! [reconnect]
//! max_attempts = 8
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use sl_core::{ReconnectionConfig, ResourceId, StalePolicy};

use crate::credential::Credential;
use crate::error::{Error, Result};

/// What to do with an intent while the connection is down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfflinePolicy {
    /// Keep the local change and forget the mutation.
    #[default]
    KeepLocal,
    /// Send the intent through the HTTP fallback instead.
    PostFallback,
    /// Hold the frame and send it after the next successful connect.
    Queue,
}

/// Configuration for a sync session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the event stream (`ws://` or `wss://`).
    pub stream_url: String,
    /// Base URL of the request/response API. Derived from `stream_url` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Heartbeat ping interval in milliseconds. 0 = disabled.
    pub heartbeat_interval_ms: u64,
    /// Max time to wait for any frame after a ping, in milliseconds. 0 = no limit.
    pub heartbeat_timeout_ms: u64,
    /// How often unconfirmed mutations are checked, in milliseconds.
    pub sweep_interval_ms: u64,
    /// Age after which an unconfirmed mutation is stale, in milliseconds.
    pub staleness_ms: u64,
    pub stale_policy: StalePolicy,
    pub offline_policy: OfflinePolicy,
    /// Max wait for `full_sync` after a sync request before falling back, in milliseconds.
    pub snapshot_timeout_ms: u64,
    /// Max time for the WebSocket handshake, in milliseconds. 0 = no limit.
    pub connect_timeout_ms: u64,
    /// Timeout for fallback HTTP requests, in milliseconds.
    pub request_timeout_ms: u64,
    pub reconnect: ReconnectionConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            stream_url: "ws://localhost:8080".to_string(),
            api_url: None,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 10_000,
            sweep_interval_ms: 10_000,
            staleness_ms: 30_000,
            stale_policy: StalePolicy::Discard,
            offline_policy: OfflinePolicy::KeepLocal,
            snapshot_timeout_ms: 10_000,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 10_000,
            reconnect: ReconnectionConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Loads a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Serializes the config to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Checks URLs and timing parameters.
    pub fn validate(&self) -> Result<()> {
        self.stream_base()?;
        self.api_base()?;
        self.reconnect.validate()?;
        if self.sweep_interval_ms == 0 {
            return Err(Error::Config("sweep_interval_ms must be positive".to_string()));
        }
        if self.staleness_ms == 0 {
            return Err(Error::Config("staleness_ms must be positive".to_string()));
        }
        if self.snapshot_timeout_ms == 0 {
            return Err(Error::Config("snapshot_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    fn stream_base(&self) -> Result<Url> {
        let url = Url::parse(&self.stream_url)
            .map_err(|e| Error::Config(format!("invalid stream_url '{}': {}", self.stream_url, e)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(Error::Config(format!(
                "invalid stream_url '{}': scheme must be ws or wss, not {}",
                self.stream_url, other
            ))),
        }
    }

    /// Base URL of the fallback API.
    ///
    /// Defaults to the stream URL with `ws` mapped to `http` and `wss` to `https`.
    pub fn api_base(&self) -> Result<Url> {
        if let Some(api_url) = &self.api_url {
            let url = Url::parse(api_url)
                .map_err(|e| Error::Config(format!("invalid api_url '{}': {}", api_url, e)))?;
            return match url.scheme() {
                "http" | "https" => Ok(url),
                other => Err(Error::Config(format!(
                    "invalid api_url '{}': scheme must be http or https, not {}",
                    api_url, other
                ))),
            };
        }
        let mut url = self.stream_base()?;
        let scheme = if url.scheme() == "wss" { "https" } else { "http" };
        url.set_scheme(scheme)
            .map_err(|_| Error::Config(format!("cannot derive api url from '{}'", self.stream_url)))?;
        Ok(url)
    }

    /// `{stream_url}/stream/{resource_id}?token={credential}`.
    pub fn stream_url_for(
        &self,
        resource_id: &ResourceId,
        credential: Option<&Credential>,
    ) -> Result<Url> {
        let mut url = join(self.stream_base()?, &["stream", resource_id.as_str()])?;
        if let Some(credential) = credential {
            url.query_pairs_mut().append_pair("token", credential.expose());
        }
        Ok(url)
    }

    /// `{api_url}/resource/{resource_id}` plus optional trailing segments.
    pub fn resource_url(&self, resource_id: &ResourceId, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["resource", resource_id.as_str()];
        segments.extend_from_slice(rest);
        join(self.api_base()?, &segments)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        nonzero_ms(self.heartbeat_interval_ms)
    }

    pub fn heartbeat_timeout(&self) -> Option<Duration> {
        nonzero_ms(self.heartbeat_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn staleness(&self) -> Duration {
        Duration::from_millis(self.staleness_ms)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.snapshot_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        nonzero_ms(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        nonzero_ms(self.request_timeout_ms)
    }
}

fn nonzero_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Appends path segments, keeping any base path.
fn join(mut base: Url, segments: &[&str]) -> Result<Url> {
    let display = base.to_string();
    base.path_segments_mut()
        .map_err(|_| Error::Config(format!("'{}' cannot be a base url", display)))?
        .pop_if_empty()
        .extend(segments);
    Ok(base)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
