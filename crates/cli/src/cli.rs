// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sl_core::ResourceKind;

// Custom help template that lists commands before options
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Commands:
  watch       Keep a resource in sync and print every change
  fetch       Fetch one snapshot over HTTP
  config      Show or check the effective configuration";

const QUICKSTART_HELP: &str = "\
Get started:
  syncline config                         Show the effective configuration
  syncline fetch board b1                 Print the current state of board b1
  syncline watch board b1 --token $TOKEN  Follow board b1 and send intents on stdin";

#[derive(Parser)]
#[command(name = "syncline")]
#[command(version)]
#[command(about = "Real-time sync client for boards, transcripts, traces and interviews")]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: $SYNCLINE_CONFIG, then <config dir>/syncline/config.toml)
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stream URL, overriding the config file (e.g. wss://sync.example.com)
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Bearer token (default: $SYNCLINE_TOKEN)
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Keep a resource in sync and print every change
    #[command(after_help = "Each state change is printed as one JSON line on stdout.\n\
        Intents are read as JSON lines on stdin, for example:\n  \
        {\"type\":\"move\",\"task_id\":\"T1\",\"column\":\"done\"}\n  \
        {\"type\":\"send\",\"id\":\"m7\",\"content\":\"hello\"}\n  \
        {\"type\":\"answer\",\"question_id\":\"q1\",\"answer\":\"yes\"}")]
    Watch {
        /// Resource kind: transcript, board, trace or interview
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Resource id
        id: String,

        /// Exit after the first authoritative snapshot
        #[arg(long)]
        once: bool,
    },

    /// Fetch one snapshot over HTTP
    Fetch {
        /// Resource kind: transcript, board, trace or interview
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Resource id
        id: String,
    },

    /// Show or check the effective configuration
    Config {
        /// Validate the configuration instead of printing it
        #[arg(long)]
        check: bool,
    },
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    s.parse().map_err(|e: sl_core::Error| e.to_string())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
