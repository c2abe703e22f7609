//! Configuration system for the Horizon clipmap renderer.
//!
//! Settings live in `config.ron` inside the config directory. Missing
//! sections and fields fall back to their defaults and unknown fields are
//! ignored. Command-line flags override the loaded values.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, default_config_dir};

pub use config::{
    CONFIG_FILE_NAME, ClipmapConfig, Config, ConnectorCoverage, DebugConfig, RenderConfig, StripStitching,
};
pub use error::ConfigError;
