/// Build engine error types
use crate::manifest::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Module not found: {module} (searched {} location(s))", .searched.len())]
    ModuleNotFound {
        module: String,
        searched: Vec<String>,
    },

    #[error("Failed to parse module manifest at {location}: {source}")]
    ModuleParse {
        location: String,
        #[source]
        source: ManifestError,
    },

    #[error("Failed to resolve inherited module '{}' (via {})", .chain.last().map(String::as_str).unwrap_or("?"), .chain.join(" -> "))]
    InheritedModule {
        chain: Vec<String>,
        #[source]
        source: Box<BuildError>,
    },

    #[error("Classpath build failed: {0}")]
    ClasspathBuild(String),

    #[error("Compilation failed for module '{module}' with exit status {status}")]
    CompilationFailed { module: String, status: i32 },

    #[error("Failed to scan {path}: {error}")]
    Scan { path: PathBuf, error: String },

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] modkit_config::ConfigError),
}

impl BuildError {
    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>, searched: Vec<String>) -> Self {
        Self::ModuleNotFound {
            module: module.into(),
            searched,
        }
    }

    /// Create a manifest parse error
    pub fn module_parse(location: impl ToString, source: ManifestError) -> Self {
        Self::ModuleParse {
            location: location.to_string(),
            source,
        }
    }

    /// Wrap a failure to resolve the last module of `chain`
    pub fn inherited(chain: Vec<String>, source: BuildError) -> Self {
        Self::InheritedModule {
            chain,
            source: Box::new(source),
        }
    }

    /// Create an unsupported classpath scope error
    pub fn unsupported_scope(scope: &str) -> Self {
        Self::ClasspathBuild(format!(
            "unsupported scope '{}' (expected compile, runtime or test)",
            scope
        ))
    }

    /// Create an unresolved artifact error
    pub fn unresolved_artifact(artifact: impl ToString, reason: impl ToString) -> Self {
        Self::ClasspathBuild(format!(
            "cannot resolve artifact {}: {}",
            artifact.to_string(),
            reason.to_string()
        ))
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Create a scan error
    pub fn scan(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::Scan {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Name of the module this error is about, if any
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::ModuleNotFound { module, .. } | Self::CompilationFailed { module, .. } => {
                Some(module.as_str())
            }
            Self::InheritedModule { chain, .. } => chain.last().map(String::as_str),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherited_message_shows_chain() {
        let err = BuildError::inherited(
            vec!["app.App".to_string(), "lib.Lib".to_string(), "gone.Gone".to_string()],
            BuildError::module_not_found("gone.Gone", vec![]),
        );

        let message = err.to_string();
        assert!(message.contains("'gone.Gone'"));
        assert!(message.contains("app.App -> lib.Lib -> gone.Gone"));
        assert_eq!(err.module(), Some("gone.Gone"));
    }

    #[test]
    fn test_unsupported_scope_message() {
        let err = BuildError::unsupported_scope("bogus");
        assert!(matches!(err, BuildError::ClasspathBuild(_)));
        assert!(err.to_string().contains("'bogus'"));
    }
}
