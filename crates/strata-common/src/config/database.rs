//! Database configuration structures.
//!
//! These structures define the configurable aspects of a Strata instance.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SCHEMA, MAX_IDENTIFIER_LENGTH, STANDARD_VECTOR_SIZE};
use crate::error::{StrataError, StrataResult};

/// Main database configuration.
///
/// # Example
///
/// ```rust
/// use strata_common::config::DatabaseConfig;
///
/// let config = DatabaseConfig::default();
/// assert_eq!(config.default_schema, "main");
/// assert_eq!(config.execution.vector_size, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Schema used when a statement does not name one.
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// Execution engine configuration.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default_schema: default_schema(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    /// Creates a configuration for testing: small batches and chunk
    /// verification on every pull.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            default_schema: default_schema(),
            execution: ExecutionConfig {
                vector_size: 4,
                verify_chunks: true,
            },
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> StrataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string and validates it.
    pub fn from_toml(content: &str) -> StrataResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> StrataResult<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to a TOML string.
    pub fn to_toml(&self) -> StrataResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> StrataResult<()> {
        if self.default_schema.is_empty() {
            return Err(invalid("default_schema must not be empty"));
        }

        if self.default_schema.len() > MAX_IDENTIFIER_LENGTH {
            return Err(invalid(format!(
                "default_schema exceeds {MAX_IDENTIFIER_LENGTH} characters"
            )));
        }

        self.execution.validate()
    }
}

/// Execution engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum number of rows an operator emits per chunk.
    /// Must be between 1 and `STANDARD_VECTOR_SIZE`.
    /// Default: 1024
    #[serde(default = "default_vector_size")]
    pub vector_size: usize,

    /// Verify chunk invariants on every pull (query verification).
    /// Default: false
    #[serde(default)]
    pub verify_chunks: bool,
}

fn default_vector_size() -> usize {
    STANDARD_VECTOR_SIZE
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            vector_size: STANDARD_VECTOR_SIZE,
            verify_chunks: false,
        }
    }
}

impl ExecutionConfig {
    /// Validates the execution configuration.
    pub fn validate(&self) -> StrataResult<()> {
        if self.vector_size == 0 {
            return Err(invalid("execution.vector_size must be at least 1"));
        }

        if self.vector_size > STANDARD_VECTOR_SIZE {
            return Err(invalid(format!(
                "execution.vector_size must not exceed {STANDARD_VECTOR_SIZE}"
            )));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> StrataError {
    StrataError::InvalidConfig {
        message: message.into(),
    }
}

/// Builder for `DatabaseConfig`.
#[derive(Debug, Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    /// Sets the default schema.
    #[must_use]
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.config.default_schema = schema.into();
        self
    }

    /// Sets the number of rows emitted per chunk.
    #[must_use]
    pub fn vector_size(mut self, size: usize) -> Self {
        self.config.execution.vector_size = size;
        self
    }

    /// Enables or disables chunk verification.
    #[must_use]
    pub fn verify_chunks(mut self, enabled: bool) -> Self {
        self.config.execution.verify_chunks = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> DatabaseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.default_schema, "main");
        assert_eq!(config.execution.vector_size, STANDARD_VECTOR_SIZE);
        assert!(!config.execution.verify_chunks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DatabaseConfig::default();
        config.execution.vector_size = 0;
        assert!(config.validate().is_err());

        config.execution.vector_size = STANDARD_VECTOR_SIZE + 1;
        assert!(config.validate().is_err());

        config.execution.vector_size = 16;
        config.default_schema = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::builder()
            .default_schema("analytics")
            .vector_size(64)
            .verify_chunks(true)
            .build();

        assert_eq!(config.default_schema, "analytics");
        assert_eq!(config.execution.vector_size, 64);
        assert!(config.execution.verify_chunks);
    }

    #[test]
    fn test_testing_config() {
        let config = DatabaseConfig::for_testing();
        assert_eq!(config.execution.vector_size, 4);
        assert!(config.execution.verify_chunks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            default_schema = "warehouse"

            [execution]
            vector_size = 256
        "#;

        let config = DatabaseConfig::from_toml(toml).unwrap();
        assert_eq!(config.default_schema, "warehouse");
        assert_eq!(config.execution.vector_size, 256);
        assert!(!config.execution.verify_chunks);
    }

    #[test]
    fn test_parse_toml_rejects_invalid() {
        let toml = r#"
            [execution]
            vector_size = 4096
        "#;
        assert!(DatabaseConfig::from_toml(toml).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("strata.toml");

        let config = DatabaseConfig::builder().vector_size(128).build();
        config.save(&path).unwrap();

        let loaded = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
