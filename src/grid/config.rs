//! Construction parameters for the knowledge grid.

use serde::{Deserialize, Serialize};

/// Grid construction parameters.
///
/// The grid is sized once, at simulation start, from the environment
/// dimensions; it never grows or shrinks afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid width in cells
    pub width: usize,

    /// Grid height in cells
    pub height: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl GridConfig {
    /// Create a configuration for the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Check that the configuration describes a usable grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Memory used by the flag storage, in bytes (one byte per cell).
    pub fn memory_bytes(&self) -> usize {
        self.width * self.height
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Configuration error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Grid dimensions must both be positive
    InvalidDimensions {
        /// Rejected width
        width: usize,
        /// Rejected height
        height: usize,
    },
    /// File I/O error
    IoError(String),
    /// YAML parsing error
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidDimensions { width, height } => {
                write!(f, "invalid grid dimensions {}x{}", width, height)
            }
            ConfigError::IoError(msg) => write!(f, "IO error: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
