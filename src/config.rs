//! Runtime configuration
//!
//! Loaded once per process, either installed explicitly by the embedder or
//! read lazily from `PYRT_*` environment variables.

use crate::array::MemoryOrder;
use crate::logging::LogConfig;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Capacity a buffer starts with when created empty
pub const DEFAULT_CAPACITY: usize = 4;

static CONFIG: OnceCell<RuntimeConfig> = OnceCell::new();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub array: ArrayConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    #[serde(default = "default_capacity")]
    pub default_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayConfig {
    #[serde(default)]
    pub default_order: MemoryOrder,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            default_order: MemoryOrder::RowMajor,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read config: {}", e),
            Self::Parse(e) => write!(f, "Failed to parse config: {}", e),
            Self::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl RuntimeConfig {
    /// Build configuration from `PYRT_*` environment variables.
    ///
    /// Unparseable values keep their defaults. Parsed values are taken as
    /// given, so the result may fail [`validate`](Self::validate).
    pub fn from_env() -> Self {
        let mut config = Self {
            log: LogConfig::from_env(),
            ..Self::default()
        };
        config.apply_vars(|name| std::env::var(name).ok());
        config
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(cap) = var("PYRT_DEFAULT_CAPACITY").and_then(|v| v.parse::<usize>().ok()) {
            self.buffer.default_capacity = cap;
        }

        if let Some(order) = var("PYRT_ARRAY_ORDER") {
            match order.to_ascii_uppercase().as_str() {
                "C" => self.array.default_order = MemoryOrder::RowMajor,
                "F" => self.array.default_order = MemoryOrder::ColumnMajor,
                _ => {}
            }
        }
    }

    /// Replace invalid settings with their defaults
    pub fn sanitized(mut self) -> Self {
        if !self.buffer.default_capacity.is_power_of_two() {
            self.buffer.default_capacity = DEFAULT_CAPACITY;
        }
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.buffer.default_capacity.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "buffer.default_capacity must be a power of two, got {}",
                self.buffer.default_capacity
            )));
        }
        Ok(())
    }
}

/// Install the process-wide configuration. Returns the rejected config if
/// one was already installed (or lazily loaded).
pub fn install(config: RuntimeConfig) -> Result<(), RuntimeConfig> {
    CONFIG.set(config)
}

/// Process-wide configuration
pub fn current() -> &'static RuntimeConfig {
    CONFIG.get_or_init(|| RuntimeConfig::from_env().sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.buffer.default_capacity, DEFAULT_CAPACITY);
        assert_eq!(config.array.default_order, MemoryOrder::RowMajor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [buffer]
            default_capacity = 16

            [array]
            default_order = "column-major"

            [log]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.buffer.default_capacity, 16);
        assert_eq!(config.array.default_order, MemoryOrder::ColumnMajor);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert_eq!(config.buffer.default_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_rejects_non_power_of_two_capacity() {
        let err = RuntimeConfig::from_toml_str("[buffer]\ndefault_capacity = 6\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RuntimeConfig::from_toml_str("[buffer]\ndefault_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_env_capacity_is_validated() {
        let vars = |value: &'static str| {
            move |name: &str| match name {
                "PYRT_DEFAULT_CAPACITY" => Some(value.to_string()),
                "PYRT_ARRAY_ORDER" => Some("f".to_string()),
                _ => None,
            }
        };

        let mut config = RuntimeConfig::default();
        config.apply_vars(vars("6"));
        assert_eq!(config.buffer.default_capacity, 6);
        assert_eq!(config.array.default_order, MemoryOrder::ColumnMajor);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = config.sanitized();
        assert_eq!(config.buffer.default_capacity, DEFAULT_CAPACITY);
        assert_eq!(config.array.default_order, MemoryOrder::ColumnMajor);
        assert!(config.validate().is_ok());

        let mut config = RuntimeConfig::default();
        config.apply_vars(vars("32"));
        assert_eq!(config.buffer.default_capacity, 32);
        assert!(config.validate().is_ok());

        let mut config = RuntimeConfig::default();
        config.apply_vars(vars("many"));
        assert_eq!(config.buffer.default_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[buffer]\ndefault_capacity = 8").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.buffer.default_capacity, 8);

        assert!(matches!(
            RuntimeConfig::from_file("/nonexistent/pyrt.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
