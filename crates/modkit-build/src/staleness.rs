//! Skip-or-compile decisions from filesystem timestamps
//!
//! A module's compiled output is considered current only when its bootstrap
//! artifact exists and is at least as new as the manifest and every
//! translatable source under the module's source directories. Changes in
//! inherited modules or dependency archives are not tracked.

use crate::descriptor::ModuleDescriptor;
use crate::error::{BuildError, BuildResult};
use crate::graph::ModuleGraphResolver;
use crate::scanner::FileScanner;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Suffix of the per-module bootstrap artifact
pub const BOOTSTRAP_SUFFIX: &str = ".nocache.js";

/// Source suffixes that feed compilation, with the suffix each produces
pub const SOURCE_MAPPINGS: &[(&str, &str)] = &[(".java", ".class"), (".ui.xml", ".java")];

/// Why a module does or does not need compiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Staleness {
    /// Library-only module; nothing to compile
    NoEntryPoints,
    Forced,
    MissingOutput,
    /// Manifest is newer than the bootstrap artifact
    ManifestChanged,
    /// Manifest came from a location without a timestamp
    UnknownProvenance,
    SourceChanged,
    UpToDate,
}

impl Staleness {
    pub fn requires_compile(self) -> bool {
        !matches!(self, Self::NoEntryPoints | Self::UpToDate)
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoEntryPoints => "no entry points",
            Self::Forced => "forced",
            Self::MissingOutput => "output missing",
            Self::ManifestChanged => "manifest changed",
            Self::UnknownProvenance => "manifest has no timestamp",
            Self::SourceChanged => "sources changed",
            Self::UpToDate => "up to date",
        };
        write!(f, "{}", text)
    }
}

/// Location of a module's bootstrap artifact under `output_root`
pub fn bootstrap_path(descriptor: &ModuleDescriptor, output_root: &Path) -> PathBuf {
    let effective = descriptor.effective_path();
    output_root
        .join(effective)
        .join(format!("{}{}", effective, BOOTSTRAP_SUFFIX))
}

/// Decides whether a module must be recompiled
pub struct BuildStalenessDetector<'r> {
    resolver: &'r ModuleGraphResolver<'r>,
    source_roots: Vec<PathBuf>,
}

impl<'r> BuildStalenessDetector<'r> {
    pub fn new(resolver: &'r ModuleGraphResolver<'r>, source_roots: Vec<PathBuf>) -> Self {
        Self {
            resolver,
            source_roots,
        }
    }

    /// `true` when `descriptor` must be recompiled into `output_root`
    pub fn decide(
        &self,
        descriptor: &ModuleDescriptor,
        output_root: &Path,
        force: bool,
    ) -> BuildResult<bool> {
        Ok(self
            .explain(descriptor, output_root, force)?
            .requires_compile())
    }

    /// The reason behind [`decide`](Self::decide); checks run in order and the first match wins
    pub fn explain(
        &self,
        descriptor: &ModuleDescriptor,
        output_root: &Path,
        force: bool,
    ) -> BuildResult<Staleness> {
        let staleness = self.check(descriptor, output_root, force)?;
        debug!(module = descriptor.name(), staleness = %staleness, "Checked staleness");
        Ok(staleness)
    }

    fn check(
        &self,
        descriptor: &ModuleDescriptor,
        output_root: &Path,
        force: bool,
    ) -> BuildResult<Staleness> {
        if self.resolver.resolve_entry_points(descriptor)?.is_empty() {
            return Ok(Staleness::NoEntryPoints);
        }
        if force {
            return Ok(Staleness::Forced);
        }

        let bootstrap = bootstrap_path(descriptor, output_root);
        if !bootstrap.is_file() {
            return Ok(Staleness::MissingOutput);
        }
        let built_at = modified(&bootstrap)?;

        match descriptor.location().timestamp() {
            Some(changed) if changed > built_at => return Ok(Staleness::ManifestChanged),
            Some(_) => {}
            None => return Ok(Staleness::UnknownProvenance),
        }

        for dir in descriptor.source_directories(&self.source_roots) {
            let scanner = SOURCE_MAPPINGS
                .iter()
                .fold(FileScanner::new(&dir), |scanner, (suffix, _)| {
                    scanner.include(format!("**/*{}", suffix))
                });

            for relative in scanner.scan()? {
                let source = dir.join(&relative);
                if modified(&source)? > built_at {
                    debug!(module = descriptor.name(), source = %source.display(), "Source newer than output");
                    return Ok(Staleness::SourceChanged);
                }
            }
        }

        Ok(Staleness::UpToDate)
    }
}

fn modified(path: &Path) -> BuildResult<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| BuildError::io(path, e))
}
