// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection backoff policy.
//!
//! The policy is a pure function from the retry attempt number to the wait
//! before that attempt:
//!
//! ```text
//! delay(attempt) = min(initial_delay * multiplier^attempt, max_delay)
//! ```
//!
//! `attempt` starts at 0 for the first retry after a connection drops.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters of the reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectionConfig {
    /// Delay before the first retry (milliseconds).
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay (milliseconds).
    pub max_delay_ms: u64,
    /// Growth factor applied per attempt. Must be >= 1.
    pub multiplier: f64,
    /// Number of retries before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        ReconnectionConfig {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl ReconnectionConfig {
    /// Checks that the parameters describe a non-decreasing, bounded policy.
    pub fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "multiplier must be a finite number >= 1, got {}",
                self.multiplier
            )));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "initial_delay_ms ({}) exceeds max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// Maps retry attempts to wait delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectionPolicy {
    config: ReconnectionConfig,
}

impl ReconnectionPolicy {
    /// Creates a policy from validated parameters.
    pub fn new(config: ReconnectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(ReconnectionPolicy { config })
    }

    /// Returns the parameters of this policy.
    pub fn config(&self) -> &ReconnectionConfig {
        &self.config
    }

    /// Returns the wait before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.config.initial_delay_ms as f64 * self.config.multiplier.powi(exponent);
        // powi saturates to infinity, which min() folds back to the cap.
        let capped = raw.min(self.config.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Returns true if another retry is allowed after `attempt` retries.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.config.max_attempts
    }

    /// Returns the retry budget.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        ReconnectionPolicy {
            config: ReconnectionConfig::default(),
        }
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
