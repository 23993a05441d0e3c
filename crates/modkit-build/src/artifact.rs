//! Dependency artifacts and their resolution to files
use crate::error::{BuildError, BuildResult};
use modkit_config::{DependencyScope, DependencySpec};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Group/artifact/version coordinates of a dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinates {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    /// Packaging type, e.g. `jar`
    pub kind: String,
}

impl Coordinates {
    /// Jar coordinates without classifier
    pub fn jar(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            kind: "jar".to_string(),
        }
    }

    /// File name of the artifact inside a repository
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.kind
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.kind),
        }
    }
}

impl From<&DependencySpec> for Coordinates {
    fn from(spec: &DependencySpec) -> Self {
        Self {
            group: spec.group.clone(),
            artifact: spec.artifact.clone(),
            version: spec.version.clone(),
            classifier: spec.classifier.clone(),
            kind: spec.kind.clone(),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.kind)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

/// A dependency resolved to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub coordinates: Coordinates,
    pub scope: DependencyScope,
    pub file: PathBuf,
}

impl Artifact {
    pub fn new(coordinates: Coordinates, scope: DependencyScope, file: impl Into<PathBuf>) -> Self {
        Self {
            coordinates,
            scope,
            file: file.into(),
        }
    }
}

/// Resolves coordinates to files
pub trait ArtifactResolver {
    fn resolve(&self, coordinates: &Coordinates, scope: DependencyScope) -> BuildResult<PathBuf>;
}

/// A local repository in the conventional `group/artifact/version` layout
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the artifact would live inside this repository
    pub fn path_of(&self, coordinates: &Coordinates) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(coordinates.group.split('.'));
        path.push(&coordinates.artifact);
        path.push(&coordinates.version);
        path.push(coordinates.file_name());
        path
    }
}

impl ArtifactResolver for LocalRepository {
    fn resolve(&self, coordinates: &Coordinates, _scope: DependencyScope) -> BuildResult<PathBuf> {
        let path = self.path_of(coordinates);
        if path.is_file() {
            Ok(path)
        } else {
            Err(BuildError::unresolved_artifact(
                coordinates,
                format!("{} does not exist", path.display()),
            ))
        }
    }
}

/// Resolve configured dependencies, keeping their declared order
///
/// System-scoped dependencies use their explicit path and bypass the resolver.
pub fn resolve_artifacts(
    specs: &[DependencySpec],
    resolver: &dyn ArtifactResolver,
) -> BuildResult<Vec<Artifact>> {
    let mut artifacts = Vec::with_capacity(specs.len());

    for spec in specs {
        let coordinates = Coordinates::from(spec);
        let file = match (&spec.scope, &spec.path) {
            (DependencyScope::System, Some(path)) => {
                if !path.is_file() {
                    return Err(BuildError::unresolved_artifact(
                        &coordinates,
                        format!("system path {} does not exist", path.display()),
                    ));
                }
                path.clone()
            }
            (DependencyScope::System, None) => {
                return Err(BuildError::unresolved_artifact(
                    &coordinates,
                    "system scope requires a path",
                ))
            }
            (scope, _) => resolver.resolve(&coordinates, *scope)?,
        };

        debug!(artifact = %coordinates, scope = %spec.scope, file = %file.display(), "Resolved artifact");
        artifacts.push(Artifact::new(coordinates, spec.scope, file));
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_display() {
        let mut coords = Coordinates::jar("com.example", "shared", "1.0");
        assert_eq!(coords.to_string(), "com.example:shared:jar:1.0");
        coords.classifier = Some("sources".to_string());
        assert_eq!(coords.to_string(), "com.example:shared:jar:sources:1.0");
        assert_eq!(coords.file_name(), "shared-1.0-sources.jar");
    }

    #[test]
    fn test_local_repository_layout() {
        let repo = LocalRepository::new("/repo");
        let path = repo.path_of(&Coordinates::jar("com.example", "shared", "1.0"));
        assert_eq!(
            path,
            PathBuf::from("/repo/com/example/shared/1.0/shared-1.0.jar")
        );
    }

    #[test]
    fn test_resolve_existing_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(temp_dir.path());
        let present = Coordinates::jar("org.acme", "core", "2.0");
        let file = repo.path_of(&present);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"PK").unwrap();

        assert_eq!(
            repo.resolve(&present, DependencyScope::Compile).unwrap(),
            file
        );

        let missing = Coordinates::jar("org.acme", "gone", "2.0");
        assert!(matches!(
            repo.resolve(&missing, DependencyScope::Compile),
            Err(BuildError::ClasspathBuild(_))
        ));
    }

    #[test]
    fn test_system_scope_uses_path() {
        let temp_dir = TempDir::new().unwrap();
        let jar = temp_dir.path().join("tools.jar");
        fs::write(&jar, b"PK").unwrap();

        let mut spec = DependencySpec::new("sun", "tools", "1.8", DependencyScope::System);
        spec.path = Some(jar.clone());

        let repo = LocalRepository::new(temp_dir.path().join("empty"));
        let artifacts = resolve_artifacts(&[spec], &repo).unwrap();
        assert_eq!(artifacts[0].file, jar);
        assert_eq!(artifacts[0].scope, DependencyScope::System);
    }
}
