//! Command-line argument parsing for the Horizon tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Horizon command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "horizon", about = "Geometric clipmap terrain renderer")]
pub struct CliArgs {
    /// Segments along one side of a tile.
    #[arg(long)]
    pub segments: Option<u32>,

    /// World-space segment size at the finest level.
    #[arg(long)]
    pub segment_size: Option<f32>,

    /// Index of the coarsest level.
    #[arg(long)]
    pub levels: Option<u32>,

    /// Index of the finest level drawn.
    #[arg(long)]
    pub min_level: Option<u32>,

    /// Draw rings as lines.
    #[arg(long)]
    pub wireframe: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(segments) = args.segments {
            self.clipmap.segments = segments;
        }
        if let Some(size) = args.segment_size {
            self.clipmap.segment_size = size;
        }
        if let Some(levels) = args.levels {
            self.clipmap.levels = levels;
        }
        if let Some(min_level) = args.min_level {
            self.clipmap.min_level = min_level;
        }
        if let Some(wireframe) = args.wireframe {
            self.render.wireframe = wireframe;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

/// Default config directory for the current user, if the platform has one.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("horizon"))
}
