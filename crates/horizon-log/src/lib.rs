//! Structured logging for Horizon.
//!
//! Installs a `tracing` subscriber that also receives records emitted through
//! the `log` facade used by the library crates. Console output carries uptime
//! timestamps and module paths; debug builds can additionally write a JSON log
//! file for post-mortem analysis.

use horizon_config::Config;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config provide one.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "horizon.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (used only when `debug_build`)
/// * `debug_build` - enables the file layer
/// * `config` - optional configuration whose `debug.log_level` overrides the default filter
///
/// `RUST_LOG` takes precedence over both.
///
/// ```no_run
/// use horizon_config::Config;
/// use horizon_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), cfg!(debug_assertions), Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_string(config);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_path) = log_dir.and_then(log_file_path)
        && let Ok(log_file) = std::fs::File::create(log_path)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Resolve the filter directive string from an optional config.
///
/// An empty `log_level` falls back to [`DEFAULT_FILTER`].
pub fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create the log directory if needed and return the log file path inside it.
fn log_file_path(log_dir: &Path) -> Option<PathBuf> {
    std::fs::create_dir_all(log_dir).ok()?;
    Some(log_dir.join(LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_gpu_stack() {
        let rendered = EnvFilter::new(DEFAULT_FILTER).to_string();
        assert!(rendered.contains("wgpu=warn"));
        assert!(rendered.contains("naga=warn"));
    }

    #[test]
    fn test_filter_string_without_config() {
        assert_eq!(filter_string(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_filter_string_uses_config_level() {
        let mut config = Config::default();
        config.debug.log_level = "debug,horizon_clipmap=trace".to_string();
        assert_eq!(filter_string(Some(&config)), "debug,horizon_clipmap=trace");
    }

    #[test]
    fn test_empty_config_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level.clear();
        assert_eq!(filter_string(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_crate_directives_parse() {
        for directive in ["debug,horizon_render=trace", "warn,horizon_clipmap=debug,wgpu=error"] {
            assert!(EnvFilter::try_new(directive).is_ok(), "rejected {directive}");
        }
    }

    #[test]
    fn test_log_file_path_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("session");

        let path = log_file_path(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
    }
}
