//! Resolved project directory layout
//!
//! Turns the relative `[layout]` section of `modkit.toml` into absolute
//! directories under the project root.

use crate::project::LayoutConfig;
use std::path::{Path, PathBuf};

/// Absolute directory layout of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Project root
    pub base_dir: PathBuf,
    /// Primary source roots
    pub source_roots: Vec<PathBuf>,
    /// Resource roots
    pub resource_roots: Vec<PathBuf>,
    /// Test source roots
    pub test_source_roots: Vec<PathBuf>,
    /// Test resource roots
    pub test_resource_roots: Vec<PathBuf>,
    /// Primary output directory
    pub output_dir: PathBuf,
    /// Test output directory
    pub test_output_dir: PathBuf,
    /// Root under which compiled modules are written
    pub webapp_dir: PathBuf,
}

impl ProjectLayout {
    /// Conventional Maven layout rooted at `base_dir`
    pub fn maven(base_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(base_dir, &LayoutConfig::default())
    }

    /// Resolve a layout section against `base_dir`
    pub fn from_config(base_dir: impl Into<PathBuf>, config: &LayoutConfig) -> Self {
        let base_dir = base_dir.into();
        let roots = |configured: &Option<Vec<PathBuf>>, default: &str| -> Vec<PathBuf> {
            match configured {
                Some(paths) => paths.iter().map(|p| base_dir.join(p)).collect(),
                None => vec![base_dir.join(default)],
            }
        };
        let dir = |configured: &Option<PathBuf>, default: &str| -> PathBuf {
            base_dir.join(configured.as_deref().unwrap_or(Path::new(default)))
        };

        Self {
            source_roots: roots(&config.sources, "src/main/java"),
            resource_roots: roots(&config.resources, "src/main/resources"),
            test_source_roots: roots(&config.test_sources, "src/test/java"),
            test_resource_roots: roots(&config.test_resources, "src/test/resources"),
            output_dir: dir(&config.output, "target/classes"),
            test_output_dir: dir(&config.test_output, "target/test-classes"),
            webapp_dir: dir(&config.webapp, "target/webapp"),
            base_dir,
        }
    }

    /// Replace the primary source roots
    pub fn with_source_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.source_roots = roots;
        self
    }

    /// Replace the resource roots
    pub fn with_resource_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.resource_roots = roots;
        self
    }

    /// Replace the module output root
    pub fn with_webapp_dir(mut self, dir: PathBuf) -> Self {
        self.webapp_dir = dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_maven_defaults() {
        let layout = ProjectLayout::maven("/work/app");
        assert_eq!(
            layout.source_roots,
            vec![PathBuf::from("/work/app/src/main/java")]
        );
        assert_eq!(
            layout.resource_roots,
            vec![PathBuf::from("/work/app/src/main/resources")]
        );
        assert_eq!(layout.output_dir, PathBuf::from("/work/app/target/classes"));
        assert_eq!(
            layout.test_output_dir,
            PathBuf::from("/work/app/target/test-classes")
        );
        assert_eq!(layout.webapp_dir, PathBuf::from("/work/app/target/webapp"));
    }

    #[test]
    fn test_configured_roots_are_resolved_against_base() {
        let config = LayoutConfig {
            sources: Some(vec![PathBuf::from("src"), PathBuf::from("generated")]),
            output: Some(PathBuf::from("out/classes")),
            ..Default::default()
        };

        let layout = ProjectLayout::from_config("/work/app", &config);
        assert_eq!(
            layout.source_roots,
            vec![
                PathBuf::from("/work/app/src"),
                PathBuf::from("/work/app/generated")
            ]
        );
        assert_eq!(layout.output_dir, PathBuf::from("/work/app/out/classes"));
        assert_eq!(
            layout.test_source_roots,
            vec![PathBuf::from("/work/app/src/test/java")]
        );
    }

    #[test]
    fn test_absolute_configured_paths_are_kept() {
        let config = LayoutConfig {
            webapp: Some(PathBuf::from("/srv/www")),
            ..Default::default()
        };

        let layout = ProjectLayout::from_config("/work/app", &config);
        assert_eq!(layout.webapp_dir, PathBuf::from("/srv/www"));
    }
}
