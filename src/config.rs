//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `DOCVAL_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where records and files live
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the SQLite database
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Root of the file store; defaults to `<data_dir>/storage`
    #[serde(default)]
    pub storage_dir: Option<String>,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("docval").to_string_lossy().to_string())
        .unwrap_or_else(|| "./docval_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn data_path(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }

    pub fn storage_path(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => expand_home(dir),
            None => self.data_path().join("storage"),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_size() -> usize {
    50 * 1024 * 1024 // 50 MiB
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// OCR client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

fn default_ocr_timeout() -> u64 {
    60
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_ocr_timeout(),
        }
    }
}

/// Web UI hosting
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiConfig {
    /// Directory with the built UI (`index.html` plus `pkg/`)
    #[serde(default)]
    pub dist_dir: Option<String>,
}

impl UiConfig {
    pub fn dist_path(&self) -> Option<PathBuf> {
        self.dist_dir.as_deref().map(expand_home)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Nothing is logged here; the caller reports the outcome with
    /// [`LoadedConfig::log`] once tracing is installed.
    pub fn load_default() -> LoadedConfig {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("docval").join("config.toml")),
            Some(PathBuf::from("/etc/docval/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first existing file of `paths` that parses
    fn load_first(paths: &[PathBuf]) -> LoadedConfig {
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: ConfigSource::File(path.clone()),
                        skipped,
                    }
                }
                Err(e) => skipped.push(e),
            }
        }

        LoadedConfig {
            config: Self::from_env(),
            source: ConfigSource::Defaults,
            skipped,
        }
    }

    /// Apply `DOCVAL_*` overrides read through `lookup`
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Storage
        if let Some(data_dir) = lookup("DOCVAL_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }
        if let Some(storage_dir) = lookup("DOCVAL_STORAGE_DIR") {
            self.storage.storage_dir = Some(storage_dir);
        }

        // API
        if let Some(host) = lookup("DOCVAL_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("DOCVAL_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid DOCVAL_API_PORT"),
            }
        }

        // OCR
        if let Some(timeout) = lookup("DOCVAL_OCR_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(t) => self.ocr.timeout_secs = t,
                Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid DOCVAL_OCR_TIMEOUT_SECS"),
            }
        }

        // UI
        if let Some(dist) = lookup("DOCVAL_UI_DIST") {
            self.ui.dist_dir = Some(dist);
        }

        // Logging
        if let Some(level) = lookup("DOCVAL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("DOCVAL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Built-in defaults plus environment overrides
    Defaults,
}

/// Result of searching the default config locations
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
    /// Files that existed but could not be loaded
    pub skipped: Vec<ConfigError>,
}

impl LoadedConfig {
    /// A config read from an explicit path
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            config: Config::load_with_env(path)?,
            source: ConfigSource::File(path.to_path_buf()),
            skipped: Vec::new(),
        })
    }

    /// Report skipped files and the chosen source
    pub fn log(&self) {
        for error in &self.skipped {
            tracing::warn!("Skipping config file: {}", error);
        }
        match &self.source {
            ConfigSource::File(path) => tracing::info!("Loaded config from {:?}", path),
            ConfigSource::Defaults => {
                tracing::info!("Using default config with environment overrides")
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# docval Configuration
#
# Environment variables override these settings:
# - DOCVAL_DATA_DIR
# - DOCVAL_STORAGE_DIR
# - DOCVAL_API_HOST
# - DOCVAL_API_PORT
# - DOCVAL_OCR_TIMEOUT_SECS
# - DOCVAL_UI_DIST
# - DOCVAL_LOG_LEVEL
# - DOCVAL_LOG_FORMAT

[storage]
# Directory for the SQLite database
data_dir = "~/.local/share/docval"

# Root for scans, sample JSON and user input (defaults to <data_dir>/storage)
# storage_dir = "/data/storage"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8000

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Maximum request body size in bytes
max_body_size = 52428800

[ocr]
# Timeout for calls to a document's OCR endpoint (seconds)
timeout_secs = 60

[ui]
# Directory with the built web UI (index.html and pkg/)
# dist_dir = "./docval-ui/dist"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.api.max_body_size, 50 * 1024 * 1024);
        assert_eq!(config.ocr.timeout_secs, 60);
        assert!(config.ui.dist_dir.is_none());
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.api.port, 8000);
        assert!(config.api.cors_origins.is_empty());
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse("[api]\nport = 9000\n[logging]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::parse("[api]\nport = \"not a number\"\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("DOCVAL_DATA_DIR", "/tmp/docval"),
            ("DOCVAL_API_PORT", "8123"),
            ("DOCVAL_OCR_TIMEOUT_SECS", "nope"),
            ("DOCVAL_UI_DIST", "/srv/ui"),
            ("DOCVAL_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.data_dir, "/tmp/docval");
        assert_eq!(config.storage.storage_path(), PathBuf::from("/tmp/docval/storage"));
        assert_eq!(config.api.port, 8123);
        assert_eq!(config.ocr.timeout_secs, 60);
        assert_eq!(config.ui.dist_path(), Some(PathBuf::from("/srv/ui")));
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nstorage_dir = \"/srv/files\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.storage_path(), PathBuf::from("/srv/files"));

        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_first_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let broken = dir.path().join("broken.toml");
        let good = dir.path().join("good.toml");
        std::fs::write(&broken, "[api\nport = ").unwrap();
        std::fs::write(&good, "[ocr]\ntimeout_secs = 15\n").unwrap();

        let loaded = Config::load_first(&[missing, broken, good.clone()]);
        assert_eq!(loaded.source, ConfigSource::File(good));
        assert_eq!(loaded.config.ocr.timeout_secs, 15);
        assert_eq!(loaded.skipped.len(), 1);
        assert!(matches!(loaded.skipped[0], ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_first_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let loaded = Config::load_first(&[dir.path().join("none.toml")]);
        assert_eq!(loaded.source, ConfigSource::Defaults);
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_loaded_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nport = 9100\n").unwrap();

        let loaded = LoadedConfig::from_file(&path).unwrap();
        assert_eq!(loaded.source, ConfigSource::File(path));
        assert_eq!(loaded.config.api.port, 9100);

        assert!(LoadedConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
