//! Configuration loading for the relay binary.
//!
//! Configuration lives in `mural-config.yaml` in the working directory, or
//! at the path named by `MURAL_CONFIG`. Every field has a default, so a
//! missing file or a partial one is fine. A handful of environment
//! variables override the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MURAL_HOST` | `server.host` |
//! | `MURAL_PORT` | `server.port` |
//! | `MURAL_PUBLIC_ROOT` | `storage.public_root` |
//! | `MURAL_LOG_LEVEL` | `logging.level` |

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "mural-config.yaml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_VAR: &str = "MURAL_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidOverride {
        /// The environment variable.
        var: &'static str,
        /// Its value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level relay configuration.
///
/// Mirrors the structure of `mural-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MuralConfig {
    /// Listening address.
    #[serde(default)]
    pub server: ServerSection,

    /// Where snapshots and client pages live.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Mural grid dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MuralConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load from the configured path (or defaults if the file is absent),
    /// then apply environment overrides. `lookup` reads one variable.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup(CONFIG_PATH_VAR)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(lookup)?;
        Ok(config)
    }

    /// Override fields with environment variables when set.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup("MURAL_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("MURAL_PORT") {
            self.server.port = val.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidOverride {
                    var: "MURAL_PORT",
                    reason: e.to_string(),
                    value: val.clone(),
                }
            })?;
        }
        if let Some(val) = lookup("MURAL_PUBLIC_ROOT") {
            self.storage.public_root = PathBuf::from(val);
        }
        if let Some(val) = lookup("MURAL_LOG_LEVEL") {
            self.logging.level = val;
        }
        Ok(())
    }
}

/// Listening address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port for HTTP and both `WebSocket` endpoints.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Storage location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Public root: served over HTTP and parent of the `snapShots` folders.
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_root: default_public_root(),
        }
    }
}

/// Mural grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Fixed column count.
    #[serde(default = "default_num_columns")]
    pub num_columns: u32,

    /// Maximum number of rows before the oldest row is evicted.
    #[serde(default = "default_max_num_rows")]
    pub max_num_rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            num_columns: default_num_columns(),
            max_num_rows: default_max_num_rows(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    55555
}

fn default_public_root() -> PathBuf {
    PathBuf::from("public")
}

const fn default_num_columns() -> u32 {
    20
}

const fn default_max_num_rows() -> u32 {
    11
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_config_matches_installation() {
        let config = MuralConfig::default();
        assert_eq!(config.server.port, 55555);
        assert_eq!(config.grid.num_columns, 20);
        assert_eq!(config.grid.max_num_rows, 11);
        assert_eq!(config.storage.public_root, PathBuf::from("public"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
storage:
  public_root: "/srv/mural"
grid:
  num_columns: 8
  max_num_rows: 4
logging:
  level: "debug"
  format: json
"#;
        let config = MuralConfig::parse(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.public_root, PathBuf::from("/srv/mural"));
        assert_eq!(config.grid.num_columns, 8);
        assert_eq!(config.grid.max_num_rows, 4);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = MuralConfig::parse("grid:\n  max_num_rows: 3\n").unwrap();
        assert_eq!(config.grid.max_num_rows, 3);
        assert_eq!(config.grid.num_columns, 20);
        assert_eq!(config.server, ServerSection::default());
        assert_eq!(MuralConfig::parse("").unwrap(), MuralConfig::default());
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            MuralConfig::parse("grid: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = MuralConfig::default();
        config
            .apply_env_overrides(env(&[
                ("MURAL_HOST", "localhost"),
                ("MURAL_PORT", "9000"),
                ("MURAL_PUBLIC_ROOT", "/tmp/mural"),
                ("MURAL_LOG_LEVEL", "warn"),
            ]))
            .unwrap();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.public_root, PathBuf::from("/tmp/mural"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = MuralConfig::default();
        let result = config.apply_env_overrides(env(&[("MURAL_PORT", "eighty")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOverride { var: "MURAL_PORT", .. })
        ));
    }

    #[test]
    fn load_reads_file_named_by_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "server:\n  port: 7000\n").unwrap();
        let path_str = path.to_str().unwrap().to_owned();

        let config = MuralConfig::load(env(&[(CONFIG_PATH_VAR, path_str.as_str())])).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config =
            MuralConfig::load(env(&[(CONFIG_PATH_VAR, "/nonexistent/mural-config.yaml")])).unwrap();
        assert_eq!(config, MuralConfig::default());
    }
}
