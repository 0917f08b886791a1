//! TOML configuration for the benchmark harness.
//!
//! Layered model: an explicit `--config` path, then the `SMALL_FILTERS_CONFIG`
//! environment variable, then `/etc/small-filters/bench.toml`, then compiled-in
//! defaults. Command-line flags are applied on top by the binary.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::accel::RunMode;
use crate::runner::RunSettings;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SMALL_FILTERS_CONFIG";
/// System-wide config location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/small-filters/bench.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded benchmark configuration");
        Ok(config)
    }

    /// An explicit path must load; otherwise fall back through the
    /// environment variable, the system path and the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default()),
        }
    }

    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "{} set but file could not be loaded, trying fallback",
                        CONFIG_ENV
                    );
                }
            }
        }

        let system_path = Path::new(SYSTEM_CONFIG_PATH);
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    /// Run settings with command-line overrides applied.
    pub fn settings(&self, mode: Option<RunMode>, iterations: Option<usize>) -> RunSettings {
        let mut settings = self.run.clone();
        if let Some(mode) = mode {
            settings.modes = vec![mode];
        }
        if let Some(n) = iterations {
            settings.iterations = n;
        }
        settings
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.run.modes, RunMode::ALL);
        assert_eq!(cfg.run.iterations, 10);
        assert_eq!(cfg.run.warmup, 10);
        assert_eq!(cfg.run.width, 1024);
        assert_eq!(cfg.run.height, 1024);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
[run]
modes = ["hvx128", "cpu"]
width = 256

[logging]
level = "debug"
"#;
        let cfg: BenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.run.modes, vec![RunMode::Hvx128, RunMode::Cpu]);
        assert_eq!(cfg.run.width, 256);
        assert_eq!(cfg.run.height, 1024);
        assert_eq!(cfg.run.iterations, 10);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<BenchConfig, _> = toml::from_str("[run]\nmodes = [\"hvx256\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\niterations = 3\nheight = 16").unwrap();

        let cfg = BenchConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(cfg.run.iterations, 3);
        assert_eq!(cfg.run.height, 16);
    }

    #[test]
    fn test_warmup_not_configurable() {
        let cfg: BenchConfig = toml::from_str("[run]\niterations = 0\nwarmup = 0\n").unwrap();
        assert_eq!(cfg.run.iterations, 0);
        assert_eq!(cfg.run.warmup, 10);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(BenchConfig::resolve(Some(&missing)).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cfg = BenchConfig::default();
        let settings = cfg.settings(Some(RunMode::Cpu), Some(1));
        assert_eq!(settings.modes, vec![RunMode::Cpu]);
        assert_eq!(settings.iterations, 1);
        assert_eq!(settings.warmup, 10);

        let untouched = cfg.settings(None, None);
        assert_eq!(untouched, cfg.run);
    }
}
