//! Module descriptors: the parsed form of one module manifest
use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Suffix shared by every module manifest file
pub const MANIFEST_SUFFIX: &str = ".gwt.xml";

/// Source path used when a manifest declares no `<source>` element
pub const DEFAULT_SOURCE_PATH: &str = "client";

/// Public path used when a manifest declares no `<public>` element
pub const DEFAULT_PUBLIC_PATH: &str = "public";

/// Where a descriptor's manifest was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackingLocation {
    /// A loose file on disk
    File(PathBuf),
    /// An opaque stream, e.g. an entry inside a dependency archive
    Stream { origin: String },
}

impl BackingLocation {
    /// Modification time of the backing file, if one is available
    pub fn timestamp(&self) -> Option<SystemTime> {
        match self {
            Self::File(path) => fs::metadata(path).and_then(|m| m.modified()).ok(),
            Self::Stream { .. } => None,
        }
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Stream { .. } => None,
        }
    }
}

impl fmt::Display for BackingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stream { origin } => write!(f, "{}", origin),
        }
    }
}

/// A URL path bound to a handler class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServletMapping {
    pub path: String,
    pub class: String,
}

/// One module of the inheritance graph
///
/// Identity is the module name alone: two descriptors parsed from different
/// locations but carrying the same name compare and hash equal.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    name: String,
    rename_to: Option<String>,
    public_path: String,
    source_paths: Vec<String>,
    super_source_paths: Vec<String>,
    entry_points: Vec<String>,
    servlets: Vec<ServletMapping>,
    inherits: Vec<String>,
    location: BackingLocation,
    /// Transitive inherits, filled once by the first graph resolver to
    /// expand this descriptor
    resolved_inherits: OnceCell<Vec<ModuleDescriptor>>,
}

impl ModuleDescriptor {
    /// Create a descriptor with default source and public paths and no declarations
    pub fn new(name: impl Into<String>, location: BackingLocation) -> Self {
        Self {
            name: name.into(),
            rename_to: None,
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            source_paths: vec![DEFAULT_SOURCE_PATH.to_string()],
            super_source_paths: Vec::new(),
            entry_points: Vec::new(),
            servlets: Vec::new(),
            inherits: Vec::new(),
            location,
            resolved_inherits: OnceCell::new(),
        }
    }

    /// Set the output-facing rename
    pub fn with_rename_to(mut self, rename_to: impl Into<String>) -> Self {
        self.rename_to = Some(rename_to.into());
        self
    }

    /// Set the public path
    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_path = path.into();
        self
    }

    /// Replace the source paths
    pub fn with_source_paths(mut self, paths: Vec<String>) -> Self {
        self.source_paths = paths;
        self
    }

    /// Replace the super-source paths
    pub fn with_super_source_paths(mut self, paths: Vec<String>) -> Self {
        self.super_source_paths = paths;
        self
    }

    /// Declare an entry point
    pub fn with_entry_point(mut self, class: impl Into<String>) -> Self {
        self.entry_points.push(class.into());
        self
    }

    /// Declare a servlet mapping
    pub fn with_servlet(mut self, path: impl Into<String>, class: impl Into<String>) -> Self {
        self.servlets.push(ServletMapping {
            path: path.into(),
            class: class.into(),
        });
        self
    }

    /// Declare an inherited module; repeated names are kept once
    pub fn with_inherits(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.inherits.contains(&name) {
            self.inherits.push(name);
        }
        self
    }

    /// Fully qualified module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared rename, if any
    pub fn rename_to(&self) -> Option<&str> {
        self.rename_to.as_deref()
    }

    /// Output-facing identifier: the rename if present, else the name
    pub fn effective_path(&self) -> &str {
        self.rename_to.as_deref().unwrap_or(&self.name)
    }

    /// Package of the module (`com.example` for `com.example.App`)
    pub fn package(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map(|(package, _)| package)
            .unwrap_or("")
    }

    /// Package as a relative directory (`com/example`)
    pub fn package_path(&self) -> PathBuf {
        self.package().split('.').filter(|s| !s.is_empty()).collect()
    }

    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    pub fn source_paths(&self) -> &[String] {
        &self.source_paths
    }

    pub fn super_source_paths(&self) -> &[String] {
        &self.super_source_paths
    }

    /// Entry points declared directly on this module
    pub fn local_entry_points(&self) -> &[String] {
        &self.entry_points
    }

    /// Servlet mappings declared directly on this module, in declaration order
    pub fn local_servlets(&self) -> &[ServletMapping] {
        &self.servlets
    }

    /// Module names declared directly as inherited, in declaration order
    pub fn local_inherits(&self) -> &[String] {
        &self.inherits
    }

    pub fn location(&self) -> &BackingLocation {
        &self.location
    }

    pub(crate) fn resolved_inherits(&self) -> &OnceCell<Vec<ModuleDescriptor>> {
        &self.resolved_inherits
    }

    /// Directories holding this module's translatable sources under each root
    pub fn source_directories(&self, roots: &[PathBuf]) -> Vec<PathBuf> {
        let package_path = self.package_path();
        let mut dirs = Vec::new();

        for root in roots {
            for relative in self.source_paths.iter().chain(&self.super_source_paths) {
                let dir = root.join(&package_path).join(relative);
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }

        dirs
    }

    /// Relative manifest path for a module name (`com/example/App.gwt.xml`)
    pub fn manifest_path(name: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", name.replace('.', "/"), MANIFEST_SUFFIX))
    }

    /// Module name for a relative manifest path, if it carries the manifest suffix
    pub fn name_from_manifest_path(relative: &Path) -> Option<String> {
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let (file, dirs) = segments.split_last()?;
        let stem = file.strip_suffix(MANIFEST_SUFFIX)?;
        if stem.is_empty() {
            return None;
        }

        let mut name = dirs.join(".");
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(stem);
        Some(name)
    }
}

impl PartialEq for ModuleDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ModuleDescriptor {}

impl Hash for ModuleDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
