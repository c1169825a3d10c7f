//! Shared types, error model, and configuration for jaarverslag.
//!
//! This crate is the foundation depended on by all other jaarverslag crates.
//! It provides:
//! - [`JaarverslagError`]: the unified error type
//! - Domain types ([`CollectedPair`], [`Record`], [`FetchStatus`])
//! - Configuration ([`AppConfig`], [`FetchOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_NOISE_WORDS, DefaultsConfig, FetchConfig, FetchOptions, NormalizeConfig,
    OutputConfig, VlaanderenConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_config,
};
pub use error::{JaarverslagError, Result};
pub use types::{CollectedPair, FetchStatus, Record};
