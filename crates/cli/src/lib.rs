// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! syncline - command-line front end for `sl-client`.
//!
//! # Main Components
//!
//! - [`Cli`] - argument parsing (clap derive)
//! - [`config`] - locating and loading `SyncConfig` files
//! - [`commands`] - `watch`, `fetch` and `config`
//! - [`logging`] - tracing setup, stderr only

mod cli;
pub mod commands;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command, GlobalArgs};
pub use error::{Error, Result};

/// Runs one parsed invocation.
pub fn run(cli: Cli) -> Result<()> {
    let resolved = config::resolve(&cli.global)?;
    match cli.command {
        Command::Config { check } => commands::config::run(&resolved, check),
        Command::Fetch { kind, id } => {
            runtime()?.block_on(commands::fetch_kind(kind, &id, resolved))
        }
        Command::Watch { kind, id, once } => {
            runtime()?.block_on(commands::watch_kind(kind, &id, resolved, once))
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
