// src/config/mod.rs

//! Configuration: TOML model, loading, and semantic validation.
//!
//! The config file is the only source of Command Descriptors; everything
//! downstream of [`loader::load_and_validate`] works with already-validated
//! data.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate};
pub use model::{CommandConfig, ConfigFile, Settings};
