//! modkit configuration system
//!
//! Provides configuration management for modkit projects including:
//! - Project configuration (modkit.toml)
//! - Global user configuration (~/.modkit/config.toml)
//! - Resolved project directory layout
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.modkit/config.toml)
//! 2. Project config (./modkit.toml)
//! 3. Environment variables (MODKIT_*)
//! 4. Caller overrides
//!
//! # Example
//!
//! ```no_run
//! use modkit_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let layout = config.layout();
//! ```

pub mod global;
pub mod layout;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "modkit.toml";

/// Module namespaces that belong to the vendor SDK and are never expanded
pub const DEFAULT_RESERVED_PREFIXES: &[&str] = &["com.google.gwt."];

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid module name: '{0}'")]
    InvalidModuleName(String),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Check that a module name is a dotted identifier (`com.example.App`)
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$')
        })
}

// Re-export main types
pub use global::GlobalConfig;
pub use layout::ProjectLayout;
pub use loader::{Config, ConfigLoader};
pub use project::{DependencyScope, DependencySpec, ProjectConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_module_names() {
        assert!(is_valid_module_name("App"));
        assert!(is_valid_module_name("com.example.App"));
        assert!(is_valid_module_name("com.example.my_app.Main"));
    }

    #[test]
    fn test_invalid_module_names() {
        assert!(!is_valid_module_name(""));
        assert!(!is_valid_module_name("com..App"));
        assert!(!is_valid_module_name(".App"));
        assert!(!is_valid_module_name("com/example/App"));
    }
}
