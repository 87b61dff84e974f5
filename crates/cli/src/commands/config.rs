// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::Resolved;
use crate::error::Result;

/// Prints the effective configuration, or validates it with `check`.
pub fn run(resolved: &Resolved, check: bool) -> Result<()> {
    print!("{}", render(resolved, check)?);
    Ok(())
}

pub(crate) fn render(resolved: &Resolved, check: bool) -> Result<String> {
    if check {
        resolved.config.validate()?;
        return Ok(format!("ok: {}\n", resolved.source));
    }
    Ok(format!(
        "# source: {}\n{}",
        resolved.source,
        resolved.config.to_toml()?
    ))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
