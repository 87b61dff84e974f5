// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Validated identifiers for synchronized resources.
//!
//! A resource id ends up as a path segment of both the stream URL and the
//! fallback endpoints, so it is validated once, at construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum accepted resource id length in bytes.
pub const MAX_RESOURCE_ID_LEN: usize = 128;

/// Identifier of one synchronized resource (a chat, a board, a trace, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Validates and wraps a resource id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResourceId`] if the id is empty, longer than
    /// [`MAX_RESOURCE_ID_LEN`], or contains characters outside
    /// `[A-Za-z0-9._:-]`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if is_valid(&id) {
            Ok(ResourceId(id))
        } else {
            Err(Error::InvalidResourceId(id))
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_RESOURCE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ResourceId::new(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        ResourceId::new(s)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResourceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
