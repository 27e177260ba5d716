// src/engine/mod.rs

//! The execution engine: consumes an ordered list of Command Descriptors and
//! drives them group by group.

pub mod runner;

pub use runner::{CommandOutcome, CommandResult, Engine, EngineOptions, QueueReport};
