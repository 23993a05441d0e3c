//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::layout::ProjectLayout;
use crate::project::{ProjectConfig, RepositoryConfig};
use crate::{
    is_valid_module_name, ConfigError, ConfigResult, CONFIG_FILE_NAME, DEFAULT_RESERVED_PREFIXES,
};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.modkit/config.toml) - lowest priority
/// 2. Project config (./modkit.toml) - overrides global
/// 3. Environment variables (MODKIT_*) - overrides project
/// 4. Caller overrides - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where modkit.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read global configuration from `path` instead of ~/.modkit/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find modkit.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a missing file yields the default config
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration; absent file or home directory yields the default
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            }
        }

        match self.global_config_path.as_deref() {
            Some(path) if path.exists() => GlobalConfig::load_from_file(path),
            _ => Ok(GlobalConfig::default()),
        }
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognized variables:
    /// - MODKIT_FORCE=true
    /// - MODKIT_OUTPUT=<module output root>
    /// - MODKIT_MODULES=com.example.A,com.example.B
    /// - MODKIT_LOCAL_REPOSITORY=<path>
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(force) = env::var("MODKIT_FORCE") {
            config.modules.force = Some(parse_bool(&force));
        }

        if let Ok(output) = env::var("MODKIT_OUTPUT") {
            config.layout.webapp = Some(PathBuf::from(output));
        }

        if let Ok(modules) = env::var("MODKIT_MODULES") {
            let names: Vec<String> = modules
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if let Some(bad) = names.iter().find(|n| !is_valid_module_name(n)) {
                return Err(ConfigError::InvalidModuleName(bad.clone()));
            }
            config.modules.names = names;
        }

        if let Ok(repository) = env::var("MODKIT_LOCAL_REPOSITORY") {
            config.repository = Some(RepositoryConfig {
                local: Some(PathBuf::from(repository)),
            });
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Configuration for a project rooted at `root` with no global settings
    pub fn for_project(root: impl Into<PathBuf>, project: ProjectConfig) -> Self {
        Self {
            project,
            global: GlobalConfig::default(),
            project_root: Some(root.into()),
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has modkit.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Get the project name
    pub fn project_name(&self) -> Option<&str> {
        self.project.project_name()
    }

    /// Resolved directory layout; the current directory stands in for a missing root
    pub fn layout(&self) -> ProjectLayout {
        let base = self
            .project_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        ProjectLayout::from_config(base, &self.project.layout)
    }

    /// Explicitly configured modules (empty means discover)
    pub fn module_names(&self) -> &[String] {
        &self.project.modules.names
    }

    /// Reserved module namespaces (project > global > default)
    pub fn reserved_prefixes(&self) -> Vec<String> {
        self.project
            .modules
            .reserved_prefixes
            .as_deref()
            .or_else(|| self.global.reserved_prefixes())
            .map(|p| p.to_vec())
            .unwrap_or_else(|| {
                DEFAULT_RESERVED_PREFIXES
                    .iter()
                    .map(|p| p.to_string())
                    .collect()
            })
    }

    /// Servlet path prefix (project > global > none)
    pub fn servlet_prefix(&self) -> &str {
        self.project
            .modules
            .servlet_prefix
            .as_deref()
            .or_else(|| self.global.servlet_prefix())
            .unwrap_or("")
    }

    /// Whether staleness checks are bypassed
    pub fn force(&self) -> bool {
        self.project.modules.force.unwrap_or(false)
    }

    /// Local artifact repository (project > global > ~/.m2/repository)
    pub fn local_repository(&self) -> ConfigResult<PathBuf> {
        if let Some(local) = self
            .project
            .repository
            .as_ref()
            .and_then(|r| r.local.as_ref())
        {
            return Ok(match self.project_root() {
                Some(root) => root.join(local),
                None => local.clone(),
            });
        }

        if let Some(local) = self.global.local_repository() {
            return Ok(local.to_path_buf());
        }

        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".m2").join("repository"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &TempDir) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(dir.path().join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[project]
name = "test-project"
"#,
        );

        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.project_name(), Some("test-project"));
        assert!(config.is_project());
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[project]
name = "parent-project"
"#,
        );

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.project_name(), Some("parent-project"));
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_env_override_force() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[modules]
force = false
"#,
        );

        env::set_var("MODKIT_FORCE", "yes");
        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path());
        env::remove_var("MODKIT_FORCE");

        assert!(config.unwrap().force());
    }

    #[test]
    #[serial]
    fn test_env_override_modules() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "");

        env::set_var("MODKIT_MODULES", "com.example.A, com.example.B");
        let mut loader = isolated_loader(&temp_dir);
        let config = loader.load_from_directory(temp_dir.path());
        env::remove_var("MODKIT_MODULES");

        assert_eq!(
            config.unwrap().module_names(),
            &["com.example.A".to_string(), "com.example.B".to_string()]
        );
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_bad_module() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "");

        env::set_var("MODKIT_MODULES", "com..Broken");
        let mut loader = isolated_loader(&temp_dir);
        let result = loader.load_from_directory(temp_dir.path());
        env::remove_var("MODKIT_MODULES");

        assert!(matches!(result, Err(ConfigError::InvalidModuleName(_))));
    }

    #[test]
    #[serial]
    fn test_global_config_supplies_defaults() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "");
        let global_path = temp_dir.path().join("global.toml");
        fs::write(
            &global_path,
            r#"
[defaults]
reserved-prefixes = ["org.vendor."]
servlet-prefix = "/rpc"
"#,
        )
        .unwrap();

        let mut loader = ConfigLoader::new().with_global_config_path(&global_path);
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.reserved_prefixes(), vec!["org.vendor.".to_string()]);
        assert_eq!(config.servlet_prefix(), "/rpc");
    }

    #[test]
    fn test_default_reserved_prefixes() {
        let config = Config::for_project("/work", ProjectConfig::default());
        assert_eq!(config.reserved_prefixes(), vec!["com.google.gwt.".to_string()]);
        assert_eq!(config.servlet_prefix(), "");
        assert!(!config.force());
    }

    #[test]
    fn test_project_repository_is_relative_to_root() {
        let project = ProjectConfig {
            repository: Some(RepositoryConfig {
                local: Some(PathBuf::from("repo")),
            }),
            ..Default::default()
        };
        let config = Config::for_project("/work", project);

        assert_eq!(
            config.local_repository().unwrap(),
            PathBuf::from("/work/repo")
        );
    }

    #[test]
    fn test_layout_uses_project_root() {
        let config = Config::for_project("/work", ProjectConfig::default());
        assert_eq!(
            config.layout().source_roots,
            vec![PathBuf::from("/work/src/main/java")]
        );
    }
}
