// 🔧 Configuration - baseline sources, server, logging
// Loaded once from JSON; every field has a default so an empty object is valid

use crate::model::LcrMetrics;
use crate::session::SessionLimits;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted when no `--config` flag is given
pub const CONFIG_ENV: &str = "LCR_SIM_CONFIG";

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// CSV with headers `Counterparty,Product,Amount`; built-in sheet when absent
    #[serde(default)]
    pub balance_sheet_csv: Option<PathBuf>,

    /// Starting metrics; built-in values when absent
    #[serde(default)]
    pub metrics: Option<LcrMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Live sessions kept before the least recently used is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds a session may sit unused before it is swept
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_max_sessions() -> usize {
    SessionLimits::default().max_sessions
}

fn default_session_idle_secs() -> u64 {
    SessionLimits::default().idle_ttl.as_secs()
}

impl ServerConfig {
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions,
            idle_ttl: Duration::from_secs(self.session_idle_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive; `RUST_LOG` wins when set
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Write logs here instead of stdout (the TUI needs this to log at all)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub baseline: BaselineConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

impl AppConfig {
    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path.as_ref()))
    }

    /// Explicit path if given, else `LCR_SIM_CONFIG`, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::from_file(PathBuf::from(path)),
                None => Ok(Self::default()),
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.baseline.balance_sheet_csv.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let json = r#"{
            "server": { "bind": "127.0.0.1:8050" },
            "logging": { "format": "compact", "log_file": "sim.log" },
            "baseline": {
                "metrics": {
                    "hqla": 1000, "inflows": 200, "outflows": 900,
                    "net_cash_outflows": 700, "lcr_percent": 142.86
                }
            }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:8050");
        assert_eq!(config.server.static_dir, PathBuf::from("web"));
        assert_eq!(config.server.session_limits(), SessionLimits::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.log_file, Some(PathBuf::from("sim.log")));
        assert_eq!(config.baseline.metrics.unwrap().lcr_percent, dec!(142.86));
    }

    #[test]
    fn test_session_limits_from_server_section() {
        let json = r#"{ "server": { "max_sessions": 16, "session_idle_secs": 90 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        let limits = config.server.session_limits();
        assert_eq!(limits.max_sessions, 16);
        assert_eq!(limits.idle_ttl, Duration::from_secs(90));
    }

    #[test]
    fn test_from_file_errors_carry_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = AppConfig::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.json"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(AppConfig::from_file(&broken).is_err());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "logging": { "level": "debug" } }"#).unwrap();

        let config = AppConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
