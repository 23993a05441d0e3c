//! Module lookup through an ordered chain of storage locations
//!
//! The default chain mirrors how a module name is resolved during a build:
//! primary source roots first, then resource roots, then every entry of the
//! compile classpath. Directory entries are probed as plain files and
//! `.jar`/`.zip` entries are opened and probed by entry name.

use crate::classpath::{ClasspathAssembler, ClasspathScope};
use crate::descriptor::{BackingLocation, ModuleDescriptor, MANIFEST_SUFFIX};
use crate::error::{BuildError, BuildResult};
use crate::manifest::{parse_manifest, ManifestError};
use crate::scanner::FileScanner;
use modkit_config::ProjectLayout;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// Anything that can turn a module name into a descriptor
pub trait LocateModule {
    fn locate(&self, name: &str) -> BuildResult<ModuleDescriptor>;
}

/// One link of the lookup chain
#[derive(Debug, Clone)]
pub enum LocatorStrategy {
    SourceRoots(Vec<PathBuf>),
    ResourceRoots(Vec<PathBuf>),
    /// Probe every entry of the compile classpath
    CompileClasspath(ClasspathAssembler),
}

impl LocatorStrategy {
    fn roots(&self) -> &[PathBuf] {
        match self {
            Self::SourceRoots(roots) | Self::ResourceRoots(roots) => roots,
            Self::CompileClasspath(_) => &[],
        }
    }
}

/// Finds and parses module manifests
#[derive(Debug, Clone)]
pub struct ModuleLocator {
    strategies: Vec<LocatorStrategy>,
}

impl ModuleLocator {
    /// Standard chain for a project: sources, resources, compile classpath
    ///
    /// Layout roots are used as given; they are already resolved against the
    /// project root.
    pub fn new(layout: &ProjectLayout, assembler: ClasspathAssembler) -> Self {
        Self::with_strategies(vec![
            LocatorStrategy::SourceRoots(layout.source_roots.clone()),
            LocatorStrategy::ResourceRoots(layout.resource_roots.clone()),
            LocatorStrategy::CompileClasspath(assembler),
        ])
    }

    /// Use an explicit chain; earlier strategies win
    pub fn with_strategies(strategies: Vec<LocatorStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[LocatorStrategy] {
        &self.strategies
    }

    /// Locate and parse the manifest for `name`
    pub fn locate(&self, name: &str) -> BuildResult<ModuleDescriptor> {
        let relative = ModuleDescriptor::manifest_path(name);
        let mut searched = Vec::new();

        for strategy in &self.strategies {
            match strategy {
                LocatorStrategy::SourceRoots(roots) | LocatorStrategy::ResourceRoots(roots) => {
                    for root in roots {
                        if let Some(module) = probe_directory(name, root, &relative, &mut searched)? {
                            return Ok(module);
                        }
                    }
                }
                LocatorStrategy::CompileClasspath(assembler) => {
                    let classpath = assembler.build(ClasspathScope::Compile)?;
                    for entry in &classpath {
                        let found = if is_archive(entry) {
                            probe_archive(name, entry, &mut searched)?
                        } else {
                            probe_directory(name, entry, &relative, &mut searched)?
                        };
                        if let Some(module) = found {
                            return Ok(module);
                        }
                    }
                }
            }
        }

        debug!(module = name, searched = searched.len(), "Module not found");
        Err(BuildError::module_not_found(name, searched))
    }

    /// Names of every manifest under the source and resource roots
    ///
    /// Roots are scanned in chain order; a name found under several roots is
    /// reported once, at its first occurrence.
    pub fn discover_all(&self) -> BuildResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for root in self.strategies.iter().flat_map(LocatorStrategy::roots) {
            let manifests = FileScanner::new(root)
                .include(format!("**/*{}", MANIFEST_SUFFIX))
                .scan()?;

            for relative in manifests {
                if let Some(name) = ModuleDescriptor::name_from_manifest_path(&relative) {
                    if seen.insert(name.clone()) {
                        names.push(name);
                    }
                }
            }
        }

        debug!(modules = names.len(), "Discovered modules");
        Ok(names)
    }
}

impl LocateModule for ModuleLocator {
    fn locate(&self, name: &str) -> BuildResult<ModuleDescriptor> {
        ModuleLocator::locate(self, name)
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jar") || e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn probe_directory(
    name: &str,
    dir: &Path,
    relative: &Path,
    searched: &mut Vec<String>,
) -> BuildResult<Option<ModuleDescriptor>> {
    let path = dir.join(relative);
    searched.push(path.display().to_string());

    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| BuildError::module_parse(path.display(), ManifestError::Io(e)))?;
    let location = BackingLocation::File(path);
    let module = parse_manifest(name, &content, location.clone())
        .map_err(|e| BuildError::module_parse(&location, e))?;

    debug!(module = name, location = %location, "Located module");
    Ok(Some(module))
}

fn probe_archive(
    name: &str,
    archive_path: &Path,
    searched: &mut Vec<String>,
) -> BuildResult<Option<ModuleDescriptor>> {
    // Archive entry names always use '/'
    let entry = format!("{}{}", name.replace('.', "/"), MANIFEST_SUFFIX);
    let origin = format!("jar:file:{}!/{}", archive_path.display(), entry);
    searched.push(origin.clone());

    let file = match File::open(archive_path) {
        Ok(file) => file,
        Err(err) => {
            warn!(archive = %archive_path.display(), error = %err, "Skipping unreadable archive");
            return Ok(None);
        }
    };

    let mut archive =
        ZipArchive::new(file).map_err(|e| BuildError::module_parse(&origin, e.into()))?;

    let mut content = String::new();
    match archive.by_name(&entry) {
        Ok(mut zipped) => zipped
            .read_to_string(&mut content)
            .map_err(|e| BuildError::module_parse(&origin, ManifestError::Io(e)))?,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(BuildError::module_parse(&origin, err.into())),
    };

    let module = parse_manifest(name, &content, BackingLocation::Stream { origin: origin.clone() })
        .map_err(|e| BuildError::module_parse(&origin, e))?;

    debug!(module = name, location = %origin, "Located module in archive");
    Ok(Some(module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn write_jar(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn locator(layout: &ProjectLayout, jars: Vec<PathBuf>) -> ModuleLocator {
        use crate::artifact::{Artifact, Coordinates};
        use modkit_config::DependencyScope;

        let artifacts = jars
            .into_iter()
            .enumerate()
            .map(|(i, file)| {
                Artifact::new(
                    Coordinates::jar("org.acme", format!("lib{}", i), "1.0"),
                    DependencyScope::Compile,
                    file,
                )
            })
            .collect();
        ModuleLocator::new(layout, ClasspathAssembler::new(layout.clone(), artifacts))
    }

    #[test]
    fn test_source_root_wins_over_resources() {
        let temp_dir = TempDir::new().unwrap();
        let layout = ProjectLayout::maven(temp_dir.path());
        let source = write(
            &layout.source_roots[0],
            "com/acme/App.gwt.xml",
            r#"<module rename-to="app"/>"#,
        );
        write(
            &layout.resource_roots[0],
            "com/acme/App.gwt.xml",
            r#"<module rename-to="other"/>"#,
        );

        let module = locator(&layout, vec![]).locate("com.acme.App").unwrap();
        assert_eq!(module.effective_path(), "app");
        assert_eq!(module.location(), &BackingLocation::File(source));
    }

    #[test]
    fn test_falls_back_to_resources() {
        let temp_dir = TempDir::new().unwrap();
        let layout = ProjectLayout::maven(temp_dir.path());
        write(&layout.resource_roots[0], "com/acme/Res.gwt.xml", "<module/>");

        let module = locator(&layout, vec![]).locate("com.acme.Res").unwrap();
        assert_eq!(module.name(), "com.acme.Res");
        assert!(module.location().path().is_some());
    }

    #[test]
    fn test_found_in_archive() {
        let temp_dir = TempDir::new().unwrap();
        let layout = ProjectLayout::maven(temp_dir.path());
        let jar = temp_dir.path().join("shared.jar");
        write_jar(
            &jar,
            &[(
                "org/lib/Shared.gwt.xml",
                r#"<module><entry-point class="org.lib.client.Boot"/></module>"#,
            )],
        );

        let module = locator(&layout, vec![jar.clone()]).locate("org.lib.Shared").unwrap();
        assert_eq!(
            module.location(),
            &BackingLocation::Stream {
                origin: format!("jar:file:{}!/org/lib/Shared.gwt.xml", jar.display())
            }
        );
        assert!(module.location().timestamp().is_none());
        assert_eq!(module.local_entry_points(), &["org.lib.client.Boot".to_string()]);
    }

    #[test]
    fn test_found_in_output_directory() {
        let temp_dir = TempDir::new().unwrap();
        let layout = ProjectLayout::maven(temp_dir.path());
        write(&layout.output_dir, "gen/Generated.gwt.xml", "<module/>");

        let module = locator(&layout, vec![]).locate("gen.Generated").unwrap();
        assert_eq!(
            module.location().path(),
            Some(layout.output_dir.join("gen/Generated.gwt.xml").as_path())
        );
    }

    #[test]
    fn test_not_found_lists_searched_locations() {
        let temp_dir = TempDir::new().unwrap();
        let layout = ProjectLayout::maven(temp_dir.path());
        let jar = temp_dir.path().join("empty.jar");
        write_jar(&jar, &[("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n")]);

        match locator(&layout, vec![jar]).locate("com.acme.Missing") {
            Err(BuildError::ModuleNotFound { module, searched }) => {
                assert_eq!(module, "com.acme.Missing");
                // both roots directly, then every compile classpath entry
                assert_eq!(searched.len(), 6);
                assert!(searched.last().unwrap().starts_with("jar:file:"));
            }
            other => panic!("expected ModuleNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let layout = ProjectLayout::maven(temp_dir.path());
        write(&layout.source_roots[0], "bad/Bad.gwt.xml", "<module>");

        let result = locator(&layout, vec![]).locate("bad.Bad");
        assert!(matches!(result, Err(BuildError::ModuleParse { .. })));
    }

    #[test]
    fn test_discover_all_dedupes_across_roots() {
        let temp_dir = TempDir::new().unwrap();
        let layout = ProjectLayout::maven(temp_dir.path());
        write(&layout.source_roots[0], "com/acme/App.gwt.xml", "<module/>");
        write(&layout.source_roots[0], "com/acme/client/Main.java", "");
        write(&layout.resource_roots[0], "com/acme/App.gwt.xml", "<module/>");
        write(&layout.resource_roots[0], "com/acme/Extra.gwt.xml", "<module/>");

        let names = locator(&layout, vec![]).discover_all().unwrap();
        assert_eq!(
            names,
            vec!["com.acme.App".to_string(), "com.acme.Extra".to_string()]
        );
    }

    #[test]
    fn test_explicit_strategies() {
        let temp_dir = TempDir::new().unwrap();
        let only = temp_dir.path().join("only");
        write(&only, "x/X.gwt.xml", "<module/>");

        let locator =
            ModuleLocator::with_strategies(vec![LocatorStrategy::ResourceRoots(vec![only])]);
        assert!(locator.locate("x.X").is_ok());
        assert!(locator.locate("y.Y").is_err());
    }
}
