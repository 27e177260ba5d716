// src/errors.rs

//! Crate-wide error aliases.
//!
//! Per-command and per-entry outcomes are ordinary values (see
//! `engine::CommandOutcome` and `control::kill::KillOutcome`); `Result` is
//! reserved for failures that abort a whole operation.

pub use anyhow::{Error, Result};
