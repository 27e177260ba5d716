// src/config/validate.rs

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};

use crate::config::model::ConfigFile;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one command
/// - command names are unique within the queue
/// - every `cmd` splits into a non-empty executable + arguments list
///
/// Launch-time conditions (missing executable, bad working directory) are
/// deliberately *not* checked here; they surface as per-command errors at
/// execution time without aborting the rest of the queue.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_commands(cfg)?;
    validate_unique_names(cfg)?;
    validate_command_lines(cfg)?;
    Ok(())
}

fn ensure_has_commands(cfg: &ConfigFile) -> Result<()> {
    if cfg.command.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [[command]] entry"
        ));
    }
    Ok(())
}

fn validate_unique_names(cfg: &ConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for cmd in cfg.command.iter() {
        if cmd.name.trim().is_empty() {
            return Err(anyhow!("command names must not be empty"));
        }
        if !seen.insert(cmd.name.as_str()) {
            return Err(anyhow!(
                "duplicate command name '{}' (names must be unique within a queue)",
                cmd.name
            ));
        }
    }
    Ok(())
}

fn validate_command_lines(cfg: &ConfigFile) -> Result<()> {
    for cmd in cfg.command.iter() {
        let parts = shell_words::split(&cmd.cmd)
            .with_context(|| format!("invalid cmd for command '{}'", cmd.name))?;
        if parts.is_empty() {
            return Err(anyhow!("command '{}' has an empty cmd", cmd.name));
        }
    }
    Ok(())
}
