//! Global Configuration (~/.modkit/config.toml)
//!
//! Handles user-level configuration stored in `~/.modkit/config.toml`.

use crate::project::RepositoryConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.modkit/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings applied to every project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Artifact repository settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryConfig>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DefaultsConfig {
    /// Reserved module namespaces used when a project sets none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_prefixes: Option<Vec<String>>,

    /// Servlet path prefix used when a project sets none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servlet_prefix: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(prefixes) = self.reserved_prefixes() {
            if prefixes.iter().any(|p| p.is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "defaults.reserved-prefixes".to_string(),
                    reason: "prefix cannot be empty".to_string(),
                });
            }
        }

        if let Some(local) = self.local_repository() {
            if !local.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    field: "repository.local".to_string(),
                    reason: format!("must be an absolute path, got '{}'", local.display()),
                });
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.modkit/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".modkit").join("config.toml"))
    }

    /// Get the default reserved prefixes
    pub fn reserved_prefixes(&self) -> Option<&[String]> {
        self.defaults
            .as_ref()
            .and_then(|d| d.reserved_prefixes.as_deref())
    }

    /// Get the default servlet prefix
    pub fn servlet_prefix(&self) -> Option<&str> {
        self.defaults
            .as_ref()
            .and_then(|d| d.servlet_prefix.as_deref())
    }

    /// Get the configured local repository
    pub fn local_repository(&self) -> Option<&Path> {
        self.repository.as_ref().and_then(|r| r.local.as_deref())
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        if other.defaults.is_some() {
            self.defaults = other.defaults.clone();
        }
        if other.repository.is_some() {
            self.repository = other.repository.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_global_config() {
        let toml = r#"
[defaults]
reserved-prefixes = ["com.google.gwt.", "org.vendor."]
servlet-prefix = "/rpc"

[repository]
local = "/var/cache/repository"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.reserved_prefixes().map(|p| p.len()), Some(2));
        assert_eq!(config.servlet_prefix(), Some("/rpc"));
        assert_eq!(
            config.local_repository(),
            Some(Path::new("/var/cache/repository"))
        );
    }

    #[test]
    fn test_relative_repository_rejected() {
        let config = GlobalConfig {
            repository: Some(RepositoryConfig {
                local: Some(PathBuf::from("relative/repo")),
            }),
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_configs() {
        let mut base = GlobalConfig::default();
        let override_config = GlobalConfig {
            defaults: Some(DefaultsConfig {
                reserved_prefixes: None,
                servlet_prefix: Some("/x".to_string()),
            }),
            ..Default::default()
        };

        base.merge(&override_config);
        assert_eq!(base.servlet_prefix(), Some("/x"));
    }
}
