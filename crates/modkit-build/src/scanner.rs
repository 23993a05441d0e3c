//! Directory scanning with include/exclude glob patterns
use crate::error::{BuildError, BuildResult};
use ignore::overrides::{Override, OverrideBuilder};
use ignore::Match;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Walks a base directory and reports files matching gitignore-style globs
///
/// With no include patterns every file is a candidate; exclude patterns
/// always win over includes. Symbolic links are followed and reported under
/// the link's own path; link loops are skipped.
#[derive(Debug, Clone)]
pub struct FileScanner {
    base: PathBuf,
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl FileScanner {
    /// Create a scanner rooted at `base`
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Add an include glob (e.g. `**/*.java`)
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Add an exclude glob
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Matched files relative to the base, sorted; a missing base yields nothing
    pub fn scan(&self) -> BuildResult<Vec<PathBuf>> {
        if !self.base.is_dir() {
            return Ok(Vec::new());
        }

        let overrides = self.overrides()?;
        let mut matched = Vec::new();

        for entry in WalkDir::new(&self.base)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(base = %self.base.display(), error = %err, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if let Match::Ignore(_) = overrides.matched(entry.path(), false) {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(&self.base) {
                matched.push(relative.to_path_buf());
            }
        }

        Ok(matched)
    }

    fn overrides(&self) -> BuildResult<Override> {
        let mut builder = OverrideBuilder::new(&self.base);
        for pattern in &self.includes {
            builder
                .add(pattern)
                .map_err(|e| BuildError::scan(&self.base, e))?;
        }
        for pattern in &self.excludes {
            builder
                .add(&format!("!{}", pattern))
                .map_err(|e| BuildError::scan(&self.base, e))?;
        }
        builder.build().map_err(|e| BuildError::scan(&self.base, e))
    }
}
