// ============================================
// File: crates/vpn-engine/src/config.rs
// ============================================
//! # Engine Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the engine, loaded from a TOML
//! file with a default for every field.
//!
//! ## Main Functionality
//! - `EngineConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//!
//! ## Configuration Sections
//! - `directory`: Feed URL and request timeout
//! - `cache`: Cache directory and file name
//! - `session`: Simulated phase timing
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [directory]
//! source_url = "http://www.vpngate.net/api/iphone/"
//! request_timeout_secs = 10
//!
//! [cache]
//! dir = "."
//! file_name = "servers.json"
//!
//! [session]
//! phase_delay_ms = 500
//! teardown_delay_ms = 1000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A missing config file is not an error for the CLI, defaults apply
//! - Validate config before building the engine
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use vpn_directory::{DEFAULT_CACHE_FILE, DEFAULT_SOURCE_URL, DEFAULT_TIMEOUT_SECS};

use crate::error::{EngineError, Result};

/// Upper bound for any configured delay or timeout.
const MAX_DELAY_MS: u64 = 60_000;
const MAX_TIMEOUT_SECS: u64 = 300;

// ============================================
// EngineConfig
// ============================================

/// Main engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remote directory settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Session timing.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| EngineError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    /// Returns error if the file exists but is invalid.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Loads configuration from a string (useful for testing).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EngineError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.directory.validate()?;
        self.cache.validate()?;
        self.session.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// DirectoryConfig
// ============================================

/// Remote directory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Feed URL.
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl DirectoryConfig {
    fn validate(&self) -> Result<()> {
        if !(self.source_url.starts_with("http://") || self.source_url.starts_with("https://")) {
            return Err(EngineError::config_invalid(
                "directory.source_url",
                "must be an http:// or https:// URL",
            ));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(EngineError::config_invalid(
                "directory.request_timeout_secs",
                format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
            ));
        }

        Ok(())
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// ============================================
// CacheConfig
// ============================================

/// Cache section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the cache file. The parent directory is searched
    /// as a fallback.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Cache file name.
    #[serde(default = "default_cache_file")]
    pub file_name: String,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cache_file() -> String {
    DEFAULT_CACHE_FILE.to_string()
}

impl CacheConfig {
    fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(EngineError::config_invalid("cache.file_name", "cannot be empty"));
        }

        if self.file_name.contains(['/', '\\']) || self.file_name == ".." {
            return Err(EngineError::config_invalid(
                "cache.file_name",
                "must be a bare file name",
            ));
        }

        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            file_name: default_cache_file(),
        }
    }
}

// ============================================
// SessionConfig
// ============================================

/// Session timing section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay of each connect phase in milliseconds.
    #[serde(default = "default_phase_delay")]
    pub phase_delay_ms: u64,

    /// Delay of the teardown phase in milliseconds.
    #[serde(default = "default_teardown_delay")]
    pub teardown_delay_ms: u64,
}

fn default_phase_delay() -> u64 {
    500
}

fn default_teardown_delay() -> u64 {
    1000
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if self.phase_delay_ms > MAX_DELAY_MS {
            return Err(EngineError::config_invalid(
                "session.phase_delay_ms",
                format!("cannot exceed {MAX_DELAY_MS}"),
            ));
        }

        if self.teardown_delay_ms > MAX_DELAY_MS {
            return Err(EngineError::config_invalid(
                "session.teardown_delay_ms",
                format!("cannot exceed {MAX_DELAY_MS}"),
            ));
        }

        Ok(())
    }

    /// Connect phase delay.
    #[must_use]
    pub const fn phase_delay(&self) -> Duration {
        Duration::from_millis(self.phase_delay_ms)
    }

    /// Teardown delay.
    #[must_use]
    pub const fn teardown_delay(&self) -> Duration {
        Duration::from_millis(self.teardown_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            phase_delay_ms: default_phase_delay(),
            teardown_delay_ms: default_teardown_delay(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(EngineError::config_invalid(
                "logging.level",
                "must be one of trace, debug, info, warn, error",
            )),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.directory.source_url, "http://www.vpngate.net/api/iphone/");
        assert_eq!(config.session.phase_delay(), Duration::from_millis(500));
        assert_eq!(config.session.teardown_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_full_config_format() {
        let toml = r#"
            [directory]
            source_url = "https://feed.example/api/"
            request_timeout_secs = 5

            [cache]
            dir = "/var/lib/vpn-engine"
            file_name = "directory.json"

            [session]
            phase_delay_ms = 0
            teardown_delay_ms = 0

            [logging]
            level = "debug"
        "#;

        let config = EngineConfig::from_str(toml).unwrap();
        assert_eq!(config.directory.request_timeout_secs, 5);
        assert_eq!(config.cache.dir, PathBuf::from("/var/lib/vpn-engine"));
        assert_eq!(config.cache.file_name, "directory.json");
        assert_eq!(config.session.phase_delay_ms, 0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EngineConfig::from_str("[session]\nphase_delay_ms = 10\n").unwrap();
        assert_eq!(config.session.phase_delay_ms, 10);
        assert_eq!(config.session.teardown_delay_ms, 1000);
        assert_eq!(config.cache.file_name, "servers.json");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_str("[directory]\nsource_url = \"ftp://x\"\n").unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref field, .. } if field == "directory.source_url"));

        let err = EngineConfig::from_str("[directory]\nrequest_timeout_secs = 0\n").unwrap_err();
        assert!(err.is_config_error());

        let err = EngineConfig::from_str("[cache]\nfile_name = \"../x.json\"\n").unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref field, .. } if field == "cache.file_name"));

        let err = EngineConfig::from_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = EngineConfig::default();
        let parsed = EngineConfig::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.directory.source_url, config.directory.source_url);
        assert_eq!(parsed.cache.dir, config.cache.dir);
    }

    #[tokio::test]
    async fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(dir.path().join("absent.toml"))
            .await
            .unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let err = EngineConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, EngineError::ConfigLoad { .. }));
        assert_eq!(err.token(), "ERROR_CONFIG");
    }
}
