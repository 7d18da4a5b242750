//! Configuration loading for memory-monitor
//!
//! Configuration is loaded from the first existing file of:
//! 1. `--config <path>` / `MEMORY_MONITOR_CONFIG`
//! 2. /etc/memory-monitor/config.toml
//! 3. config.toml next to the executable
//!
//! Individual keys fall back to defaults, but a missing file is an error:
//! the daemon never starts without an operator-provided configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::policy::{Thresholds, Whitelist};

/// System-wide configuration location
pub const SYSTEM_CONFIG_PATH: &str = "/etc/memory-monitor/config.toml";

/// Configuration file name looked up next to the executable
const LOCAL_CONFIG_NAME: &str = "config.toml";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// File format
// ============================================================================

/// Main configuration structure, as written in config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Memory thresholds and scan cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdsConfig {
    /// Percentage of total RAM a single process may use, in (0, 100]
    #[serde(default = "default_ram_percent")]
    pub ram_percent_threshold: f64,
    /// Resident size in GB a single process may use
    #[serde(default = "default_ram_gb")]
    pub ram_gb_threshold: f64,
    /// Seconds between scans
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

/// Processes that are never terminated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub pids: Vec<u32>,
    /// Exact process names
    #[serde(default)]
    pub names: Vec<String>,
    /// Exact owner user names
    #[serde(default)]
    pub users: Vec<String>,
}

/// Daemon behavior and log destinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsConfig {
    /// Log violations without sending any signal
    #[serde(default)]
    pub dry_run: bool,
    /// Log file path (empty = stderr only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Also send log records to syslog/journal
    #[serde(default)]
    pub enable_syslog: bool,
    /// Seconds between SIGTERM and SIGKILL
    #[serde(default = "default_grace_period")]
    pub grace_period: u64,
}

// Default value functions
fn default_ram_percent() -> f64 {
    10.0
}

fn default_ram_gb() -> f64 {
    2.0
}

fn default_check_interval() -> u64 {
    30
}

fn default_grace_period() -> u64 {
    5
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            ram_percent_threshold: default_ram_percent(),
            ram_gb_threshold: default_ram_gb(),
            check_interval: default_check_interval(),
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            log_file: None,
            enable_syslog: false,
            grace_period: default_grace_period(),
        }
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl Config {
    /// Locate, parse and validate the configuration
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let path = find_config_path(explicit)?;
        let config = Self::load_from_path(&path)?;
        Ok((config, path))
    }

    /// Parse and validate a specific file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !t.ram_percent_threshold.is_finite()
            || t.ram_percent_threshold <= 0.0
            || t.ram_percent_threshold > 100.0
        {
            return Err(ConfigError::Invalid(format!(
                "thresholds.ram_percent_threshold must be in (0, 100], got {}",
                t.ram_percent_threshold
            )));
        }
        if !t.ram_gb_threshold.is_finite() || t.ram_gb_threshold <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "thresholds.ram_gb_threshold must be greater than 0, got {}",
                t.ram_gb_threshold
            )));
        }
        if t.check_interval == 0 {
            return Err(ConfigError::Invalid(
                "thresholds.check_interval must be at least 1 second".to_string(),
            ));
        }
        if self.settings.grace_period == 0 {
            return Err(ConfigError::Invalid(
                "settings.grace_period must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(
            self.thresholds.ram_percent_threshold,
            self.thresholds.ram_gb_threshold,
        )
    }

    pub fn whitelist(&self) -> Whitelist {
        Whitelist::new(
            self.whitelist.pids.iter().copied(),
            self.whitelist.names.iter().cloned(),
            self.whitelist.users.iter().cloned(),
        )
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.thresholds.check_interval)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.settings.grace_period)
    }

    /// Log file, with an empty path treated as unset
    pub fn log_file(&self) -> Option<&Path> {
        self.settings
            .log_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Find the configuration file path
fn find_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    // 1. Explicit path wins and is never silently replaced
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ConfigError::NotFound {
            searched: vec![path.to_path_buf()],
        });
    }

    let mut searched = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];

    // 2. Next to the executable
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        searched.push(dir.join(LOCAL_CONFIG_NAME));
    }

    match searched.iter().find(|p| p.exists()) {
        Some(path) => Ok(path.clone()),
        None => Err(ConfigError::NotFound { searched }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_full_config() {
        let file = write_config(
            r#"
[thresholds]
ram_percent_threshold = 15.5
ram_gb_threshold = 4.0
check_interval = 10

[whitelist]
pids = [1, 2]
names = ["systemd", "sshd"]
users = ["root"]

[settings]
dry_run = true
log_file = "/var/log/memory-monitor.log"
enable_syslog = true
grace_period = 3
"#,
        );

        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.thresholds(), Thresholds::new(15.5, 4.0));
        assert_eq!(config.check_interval(), Duration::from_secs(10));
        assert_eq!(config.grace_period(), Duration::from_secs(3));
        assert!(config.settings.dry_run);
        assert!(config.settings.enable_syslog);
        assert_eq!(
            config.log_file(),
            Some(Path::new("/var/log/memory-monitor.log"))
        );

        let whitelist = config.whitelist();
        assert!(whitelist.pids.contains(&2));
        assert!(whitelist.names.contains("sshd"));
        assert!(whitelist.users.contains("root"));
    }

    #[test]
    fn test_defaults_for_missing_keys() {
        let file = write_config("[thresholds]\nram_gb_threshold = 8.0\n");

        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.thresholds.ram_percent_threshold, 10.0);
        assert_eq!(config.thresholds.ram_gb_threshold, 8.0);
        assert_eq!(config.thresholds.check_interval, 30);
        assert_eq!(config.grace_period(), Duration::from_secs(5));
        assert!(!config.settings.dry_run);
        assert!(config.whitelist().is_empty());
        assert_eq!(config.log_file(), None);
    }

    #[test]
    fn test_empty_log_file_is_unset() {
        let file = write_config("[settings]\nlog_file = \"\"\n");
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.log_file(), None);
    }

    #[test]
    fn test_rejects_out_of_range_thresholds() {
        for content in [
            "[thresholds]\nram_percent_threshold = 0.0\n",
            "[thresholds]\nram_percent_threshold = 150.0\n",
            "[thresholds]\nram_gb_threshold = -1.0\n",
            "[thresholds]\ncheck_interval = 0\n",
            "[settings]\ngrace_period = 0\n",
        ] {
            let file = write_config(content);
            let err = Config::load_from_path(file.path()).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid(_)),
                "expected invalid for {:?}, got {:?}",
                content,
                err
            );
        }
    }

    #[test]
    fn test_percent_upper_bound_inclusive() {
        let file = write_config("[thresholds]\nram_percent_threshold = 100.0\n");
        assert!(Config::load_from_path(file.path()).is_ok());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let file = write_config("[thresholds]\nram_percent = 10.0\n");
        let err = Config::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_explicit_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = Config::load(Some(missing.as_path())).unwrap_err();
        match err {
            ConfigError::NotFound { searched } => assert_eq!(searched, vec![missing]),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_path_is_used() {
        let file = write_config("[settings]\ndry_run = true\n");
        let (config, path) = Config::load(Some(file.path())).unwrap();
        assert_eq!(path, file.path());
        assert!(config.settings.dry_run);
    }

    #[test]
    fn test_example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.settings.dry_run);
        assert!(config.whitelist().names.contains("sshd"));
        assert!(config.whitelist().users.is_empty());
    }

    #[test]
    fn test_resolved_config_serializes_back_to_toml() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
