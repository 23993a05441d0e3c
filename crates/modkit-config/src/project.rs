//! Project Configuration (modkit.toml)
//!
//! Handles project-level configuration stored in `modkit.toml` at the project root.

use crate::{is_valid_module_name, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Project configuration from modkit.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSection>,

    /// Directory layout overrides
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Module selection and resolution settings
    #[serde(default)]
    pub modules: ModulesConfig,

    /// Dependency artifacts, in classpath order
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencySpec>,

    /// Artifact repository settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryConfig>,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Project name
    pub name: String,

    /// Project description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Directory layout, relative to the project root
///
/// Every field falls back to the conventional Maven layout when unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Primary source roots (default: ["src/main/java"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<PathBuf>>,

    /// Resource roots (default: ["src/main/resources"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<PathBuf>>,

    /// Test source roots (default: ["src/test/java"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_sources: Option<Vec<PathBuf>>,

    /// Test resource roots (default: ["src/test/resources"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_resources: Option<Vec<PathBuf>>,

    /// Primary output directory (default: "target/classes")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Test output directory (default: "target/test-classes")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output: Option<PathBuf>,

    /// Root for compiled module output (default: "target/webapp")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webapp: Option<PathBuf>,
}

/// Module selection and resolution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ModulesConfig {
    /// Modules to process; discovered from the source tree when empty
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,

    /// Namespaces whose modules are never expanded during inheritance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_prefixes: Option<Vec<String>>,

    /// Prefix prepended to every servlet path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servlet_prefix: Option<String>,

    /// Always recompile, ignoring staleness checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

/// Artifact repository settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Local repository root (default: ~/.m2/repository)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<PathBuf>,
}

/// Declared scope of a dependency artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Needed to compile and run
    #[default]
    Compile,
    /// Supplied by the container at runtime
    Provided,
    /// Needed only at runtime
    Runtime,
    /// Needed only by tests
    Test,
    /// Supplied from an explicit path on the local system
    System,
}

impl DependencyScope {
    /// Visible when compiling main sources
    pub fn is_compile_visible(&self) -> bool {
        matches!(self, Self::Compile | Self::Provided | Self::System)
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Provided => write!(f, "provided"),
            Self::Runtime => write!(f, "runtime"),
            Self::Test => write!(f, "test"),
            Self::System => write!(f, "system"),
        }
    }
}

impl FromStr for DependencyScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Self::Compile),
            "provided" => Ok(Self::Provided),
            "runtime" => Ok(Self::Runtime),
            "test" => Ok(Self::Test),
            "system" => Ok(Self::System),
            other => Err(ConfigError::InvalidValue {
                field: "scope".to_string(),
                reason: format!("unknown dependency scope '{}'", other),
            }),
        }
    }
}

/// Dependency specification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    /// Group identifier (e.g. "com.example")
    pub group: String,

    /// Artifact identifier
    pub artifact: String,

    /// Exact version
    pub version: String,

    /// Declared scope (default: compile)
    #[serde(default)]
    pub scope: DependencyScope,

    /// Optional classifier (e.g. "sources")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    /// Packaging type (default: "jar")
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    /// Explicit file for system-scoped dependencies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_kind() -> String {
    "jar".to_string()
}

impl DependencySpec {
    /// Create a jar dependency with the given scope
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
        scope: DependencyScope,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            scope,
            classifier: None,
            kind: default_kind(),
            path: None,
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
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

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(project) = &self.project {
            if project.name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "project.name".to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }
        }

        for name in &self.modules.names {
            if !is_valid_module_name(name) {
                return Err(ConfigError::InvalidModuleName(name.clone()));
            }
        }

        if let Some(prefixes) = &self.modules.reserved_prefixes {
            if prefixes.iter().any(|p| p.is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "modules.reserved-prefixes".to_string(),
                    reason: "prefix cannot be empty".to_string(),
                });
            }
        }

        for spec in &self.dependencies {
            validate_dependency(spec)?;
        }

        Ok(())
    }

    /// Get the project name, if present
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if other.project.is_some() {
            self.project = other.project.clone();
        }

        let layout = &other.layout;
        merge_option(&mut self.layout.sources, &layout.sources);
        merge_option(&mut self.layout.resources, &layout.resources);
        merge_option(&mut self.layout.test_sources, &layout.test_sources);
        merge_option(&mut self.layout.test_resources, &layout.test_resources);
        merge_option(&mut self.layout.output, &layout.output);
        merge_option(&mut self.layout.test_output, &layout.test_output);
        merge_option(&mut self.layout.webapp, &layout.webapp);

        if !other.modules.names.is_empty() {
            self.modules.names = other.modules.names.clone();
        }
        merge_option(
            &mut self.modules.reserved_prefixes,
            &other.modules.reserved_prefixes,
        );
        merge_option(&mut self.modules.servlet_prefix, &other.modules.servlet_prefix);
        merge_option(&mut self.modules.force, &other.modules.force);

        if !other.dependencies.is_empty() {
            self.dependencies.extend(other.dependencies.iter().cloned());
        }
        if other.repository.is_some() {
            self.repository = other.repository.clone();
        }
    }
}

fn merge_option<T: Clone>(target: &mut Option<T>, other: &Option<T>) {
    if other.is_some() {
        *target = other.clone();
    }
}

/// Validate a dependency specification
fn validate_dependency(spec: &DependencySpec) -> ConfigResult<()> {
    let label = format!("{}:{}", spec.group, spec.artifact);

    for (field, value) in [
        ("group", &spec.group),
        ("artifact", &spec.artifact),
        ("version", &spec.version),
        ("type", &spec.kind),
    ] {
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("dependency '{}'", label),
                reason: format!("{} cannot be empty", field),
            });
        }
    }

    match (spec.scope, &spec.path) {
        (DependencyScope::System, None) => Err(ConfigError::InvalidValue {
            field: format!("dependency '{}'", label),
            reason: "system scope requires a path".to_string(),
        }),
        (scope, Some(_)) if scope != DependencyScope::System => Err(ConfigError::InvalidValue {
            field: format!("dependency '{}'", label),
            reason: format!("path is only allowed with system scope, not {}", scope),
        }),
        _ => Ok(()),
    }
}
