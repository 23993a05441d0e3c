//! Scope-partitioned classpath assembly
use crate::artifact::Artifact;
use crate::error::{BuildError, BuildResult};
use modkit_config::{DependencyScope, ProjectLayout};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Classpath partition requested by a build step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClasspathScope {
    Compile,
    /// Embedded execution shell; includes provided artifacts
    Runtime,
    Test,
}

impl fmt::Display for ClasspathScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Runtime => write!(f, "runtime"),
            Self::Test => write!(f, "test"),
        }
    }
}

impl FromStr for ClasspathScope {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Self::Compile),
            "runtime" => Ok(Self::Runtime),
            "test" => Ok(Self::Test),
            other => Err(BuildError::unsupported_scope(other)),
        }
    }
}

/// Ordered, de-duplicated set of classpath locations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless already present; returns whether it was added
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.entries.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.entries.iter()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Whether every entry of `other` is present here
    pub fn is_superset_of(&self, other: &Classpath) -> bool {
        other.iter().all(|p| self.contains(p))
    }

    /// Entries joined with the platform path separator
    pub fn to_os_string(&self) -> BuildResult<OsString> {
        std::env::join_paths(&self.entries)
            .map_err(|e| BuildError::ClasspathBuild(format!("cannot join entries: {}", e)))
    }
}

impl<'a> IntoIterator for &'a Classpath {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Builds classpaths from a project layout and an explicit artifact list
#[derive(Debug, Clone)]
pub struct ClasspathAssembler {
    layout: ProjectLayout,
    artifacts: Vec<Artifact>,
}

impl ClasspathAssembler {
    /// `artifacts` is the full dependency map, in declaration order
    pub fn new(layout: ProjectLayout, artifacts: Vec<Artifact>) -> Self {
        Self { layout, artifacts }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Build the classpath for a scope token such as `"compile"`
    pub fn build_named(&self, scope: &str) -> BuildResult<Classpath> {
        self.build(scope.parse()?)
    }

    /// Build the classpath for `scope`
    pub fn build(&self, scope: ClasspathScope) -> BuildResult<Classpath> {
        let mut classpath = Classpath::new();

        match scope {
            ClasspathScope::Compile => self.add_compile(&mut classpath),
            ClasspathScope::Runtime => {
                self.add(&mut classpath, &self.layout.output_dir);
                self.add_all(&mut classpath, &self.layout.resource_roots);
                self.add_artifacts(&mut classpath, |s| s != DependencyScope::Test);
            }
            ClasspathScope::Test => {
                self.add_compile(&mut classpath);
                self.add_all(&mut classpath, &self.layout.test_source_roots);
                self.add_all(&mut classpath, &self.layout.test_resource_roots);
                self.add(&mut classpath, &self.layout.test_output_dir);
                self.add_artifacts(&mut classpath, |_| true);
            }
        }

        debug!(scope = %scope, entries = classpath.len(), "Assembled classpath");
        Ok(classpath)
    }

    fn add_compile(&self, classpath: &mut Classpath) {
        self.add_all(classpath, &self.layout.source_roots);
        self.add_all(classpath, &self.layout.resource_roots);
        self.add(classpath, &self.layout.output_dir);
        self.add_artifacts(classpath, |s| s.is_compile_visible());
    }

    fn add_artifacts(&self, classpath: &mut Classpath, include: impl Fn(DependencyScope) -> bool) {
        for artifact in self.artifacts.iter().filter(|a| include(a.scope)) {
            self.add(classpath, &artifact.file);
        }
    }

    fn add_all(&self, classpath: &mut Classpath, paths: &[PathBuf]) {
        for path in paths {
            self.add(classpath, path);
        }
    }

    fn add(&self, classpath: &mut Classpath, path: &Path) {
        classpath.insert(self.absolute(path));
    }

    /// Layout paths are already resolved against the project root; a path
    /// that is still relative is relative to the working directory
    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return normalize(path);
        }
        match std::env::current_dir() {
            Ok(cwd) => normalize(&cwd.join(path)),
            Err(_) => normalize(path),
        }
    }
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
