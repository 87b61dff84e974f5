// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locating and loading the configuration file.
//!
//! Precedence: `--config`, then `$SYNCLINE_CONFIG`, then
//! `<config dir>/syncline/config.toml` if it exists, then built-in defaults.
//! `--url` and `--token` override whatever was loaded.

use std::fmt;
use std::path::{Path, PathBuf};

use sl_client::{Credential, SyncConfig};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::env;
use crate::error::{Error, Result};

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Flag(PathBuf),
    Env(PathBuf),
    User(PathBuf),
    Defaults,
}

impl Source {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::Flag(p) | Source::Env(p) | Source::User(p) => Some(p),
            Source::Defaults => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Flag(p) => write!(f, "{} (--config)", p.display()),
            Source::Env(p) => write!(f, "{} ($SYNCLINE_CONFIG)", p.display()),
            Source::User(p) => write!(f, "{}", p.display()),
            Source::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Effective settings for one invocation.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: SyncConfig,
    pub source: Source,
    pub credential: Option<Credential>,
}

/// `<config dir>/syncline/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("syncline").join("config.toml"))
}

/// Picks the config source. Explicit paths win even if they do not exist,
/// so a typo is reported instead of silently falling back.
pub fn locate(flag: Option<&Path>, env: Option<PathBuf>, user: Option<PathBuf>) -> Source {
    if let Some(path) = flag {
        return Source::Flag(path.to_path_buf());
    }
    if let Some(path) = env {
        return Source::Env(path);
    }
    match user {
        Some(path) if path.is_file() => Source::User(path),
        _ => Source::Defaults,
    }
}

/// Reads the config for `source`.
pub fn load(source: &Source) -> Result<SyncConfig> {
    match source.path() {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.display().to_string()));
            }
            debug!("loading config from {}", source);
            Ok(SyncConfig::load(path)?)
        }
        None => Ok(SyncConfig::default()),
    }
}

/// Resolves the configuration from the command line and the environment.
pub fn resolve(args: &GlobalArgs) -> Result<Resolved> {
    let source = locate(args.config.as_deref(), env::config_path(), user_config_path());
    let mut resolved = apply_overrides(load(&source)?, args);
    if resolved.credential.is_none() {
        resolved.credential = env::token().map(Credential::new);
    }
    resolved.source = source;
    Ok(resolved)
}

fn apply_overrides(mut config: SyncConfig, args: &GlobalArgs) -> Resolved {
    if let Some(url) = &args.url {
        config.stream_url = url.clone();
    }
    Resolved {
        config,
        source: Source::Defaults,
        credential: args.token.clone().map(Credential::new),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
