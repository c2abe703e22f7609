//! Clipmap settings and their `config.ron` persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Clipmap geometry settings.
    pub clipmap: ClipmapConfig,
    pub render: RenderConfig,
    pub debug: DebugConfig,
}

/// Which inter-level connector strips are drawn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConnectorCoverage {
    /// Only the strip along the X side of the gap. Leaves the Z side of the
    /// gap between a ring and its finer neighbour open.
    HorizontalOnly,
    /// Both strips, closing the L-shaped gap completely.
    Both,
}

/// How consecutive row strips of a block mesh are joined into one draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StripStitching {
    /// Terminate each row with the primitive-restart sentinel index.
    PrimitiveRestart,
    /// Bridge rows with repeated indices forming zero-area triangles.
    DegenerateTriangles,
}

/// Clipmap geometry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClipmapConfig {
    /// Segments along one side of a regular tile.
    pub segments: u32,
    /// World-space size of one segment at level 0.
    pub segment_size: f32,
    /// Index of the coarsest level (levels are `min_level..=levels`).
    pub levels: u32,
    /// Index of the finest level drawn.
    pub min_level: u32,
    /// Width of a ring's border in tiles.
    pub border_tiles: u32,
    /// Connector strips drawn between levels.
    pub connectors: ConnectorCoverage,
    /// Row stitching strategy for block meshes.
    pub stitching: StripStitching,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Draw the rings as lines instead of filled triangles.
    pub wireframe: bool,
}

/// Diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Filter directive passed to the log subscriber when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ClipmapConfig {
    fn default() -> Self {
        Self {
            segments: 3,
            segment_size: 2.0,
            levels: 3,
            min_level: 0,
            border_tiles: 1,
            connectors: ConnectorCoverage::Both,
            stitching: StripStitching::PrimitiveRestart,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
        }
    }
}

/// File name of the persisted configuration inside a config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

impl Config {
    /// Path of the config file inside `config_dir`.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Read `config.ron` from `config_dir`, writing the defaults there first
    /// if the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(config_dir);
        if !path.exists() {
            let config = Self::default();
            config.save(config_dir)?;
            log::info!("Wrote default clipmap config to {}", path.display());
            return Ok(config);
        }

        let config = Self::read_from(&path)?;
        log::info!(
            "Loaded clipmap config from {} ({} levels from {})",
            path.display(),
            config.clipmap.levels,
            config.clipmap.min_level
        );
        Ok(config)
    }

    /// Write the config as pretty RON into `config_dir`, creating it if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = Self::path_in(config_dir);
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;
        std::fs::write(&path, text).map_err(|source| ConfigError::Write { path, source })
    }

    /// Re-read the file on disk. Returns the new config only if it differs
    /// from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read_from(&Self::path_in(config_dir))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Clipmap config changed on disk");
        Ok(Some(fresh))
    }

    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
