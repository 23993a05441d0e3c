//! Build planning and compiler hand-off
use crate::artifact::{resolve_artifacts, Artifact, LocalRepository};
use crate::classpath::{Classpath, ClasspathAssembler, ClasspathScope};
use crate::error::{BuildError, BuildResult};
use crate::graph::ModuleGraphResolver;
use crate::locator::ModuleLocator;
use crate::staleness::{bootstrap_path, BuildStalenessDetector, Staleness};
use modkit_config::{Config, ProjectLayout};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What to do when a single module cannot be planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort on the first failing module
    #[default]
    FailFast,
    /// Record the failure and plan the remaining modules
    Continue,
}

/// One module's entry in a build plan
#[derive(Debug, Clone, Serialize)]
pub struct PlannedModule {
    pub name: String,
    pub effective_path: String,
    pub staleness: Staleness,
    /// Entry points across the inherits closure
    pub entry_points: Vec<String>,
    /// Servlet mappings across the inherits closure
    pub servlets: BTreeMap<String, String>,
    /// Bootstrap artifact the compiler is expected to produce
    pub bootstrap: PathBuf,
}

impl PlannedModule {
    pub fn requires_compile(&self) -> bool {
        self.staleness.requires_compile()
    }
}

/// A module that could not be planned
#[derive(Debug, Clone, Serialize)]
pub struct PlanFailure {
    pub module: String,
    pub error: String,
}

/// Planning statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanStats {
    /// Modules considered
    pub total_modules: usize,
    /// Modules that need compiling
    pub stale_modules: usize,
    /// Modules with current output
    pub up_to_date_modules: usize,
    /// Modules without entry points
    pub library_modules: usize,
    /// Modules that failed to plan
    pub failed_modules: usize,
    /// Time spent planning
    pub planning_time: Duration,
}

/// Result of planning every module of a project
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub output_root: PathBuf,
    pub modules: Vec<PlannedModule>,
    pub failures: Vec<PlanFailure>,
    pub stats: PlanStats,
}

impl BuildPlan {
    /// Modules that need compiling, in planning order
    pub fn stale(&self) -> impl Iterator<Item = &PlannedModule> {
        self.modules.iter().filter(|m| m.requires_compile())
    }

    /// Whether every module was planned successfully
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Pretty-printed JSON report
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Everything the external compiler needs for one module
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub module: String,
    pub effective_path: String,
    pub classpath: Classpath,
    pub output_root: PathBuf,
}

/// External compiler invoker
pub trait ModuleCompiler {
    /// Compile one module, returning the process exit status
    fn compile(&mut self, request: &CompileRequest) -> BuildResult<i32>;
}

/// Applies locator, graph resolver and staleness detector to a whole project
pub struct BuildPlanner {
    layout: ProjectLayout,
    assembler: ClasspathAssembler,
    locator: ModuleLocator,
    modules: Vec<String>,
    reserved_prefixes: Vec<String>,
    servlet_prefix: String,
    output_root: PathBuf,
    force: bool,
}

impl BuildPlanner {
    /// Create a planner from loaded configuration and already resolved artifacts
    pub fn new(config: &Config, artifacts: Vec<Artifact>) -> Self {
        let layout = config.layout();
        let assembler = ClasspathAssembler::new(layout.clone(), artifacts);
        let locator = ModuleLocator::new(&layout, assembler.clone());

        Self {
            output_root: layout.webapp_dir.clone(),
            layout,
            assembler,
            locator,
            modules: config.module_names().to_vec(),
            reserved_prefixes: config.reserved_prefixes(),
            servlet_prefix: config.servlet_prefix().to_string(),
            force: config.force(),
        }
    }

    /// Create a planner, resolving configured dependencies from the local repository
    pub fn from_config(config: &Config) -> BuildResult<Self> {
        let repository = LocalRepository::new(config.local_repository()?);
        let artifacts = resolve_artifacts(&config.project.dependencies, &repository)?;
        Ok(Self::new(config, artifacts))
    }

    /// Override the configured force flag
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Override where compiled modules are written
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn locator(&self) -> &ModuleLocator {
        &self.locator
    }

    pub fn assembler(&self) -> &ClasspathAssembler {
        &self.assembler
    }

    /// Configured module names, or every discoverable module when none are configured
    pub fn module_names(&self) -> BuildResult<Vec<String>> {
        if self.modules.is_empty() {
            self.locator.discover_all()
        } else {
            Ok(self.modules.clone())
        }
    }

    /// Decide, for every module, whether it needs compiling
    pub fn plan(&self, policy: FailurePolicy) -> BuildResult<BuildPlan> {
        let start = Instant::now();
        let resolver = ModuleGraphResolver::new(&self.locator)
            .with_reserved_prefixes(self.reserved_prefixes.clone());
        let detector = BuildStalenessDetector::new(&resolver, self.layout.source_roots.clone());

        let names = self.module_names()?;
        info!(modules = names.len(), force = self.force, "Planning build");

        let mut modules = Vec::with_capacity(names.len());
        let mut failures = Vec::new();
        let mut stats = PlanStats {
            total_modules: names.len(),
            ..PlanStats::default()
        };

        for name in names {
            match self.plan_module(&name, &resolver, &detector) {
                Ok(planned) => {
                    match planned.staleness {
                        Staleness::NoEntryPoints => stats.library_modules += 1,
                        Staleness::UpToDate => stats.up_to_date_modules += 1,
                        _ => stats.stale_modules += 1,
                    }
                    modules.push(planned);
                }
                Err(err) if policy == FailurePolicy::Continue => {
                    warn!(module = %name, error = %err, "Failed to plan module");
                    stats.failed_modules += 1;
                    failures.push(PlanFailure {
                        module: name,
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        stats.planning_time = start.elapsed();
        info!(
            stale = stats.stale_modules,
            up_to_date = stats.up_to_date_modules,
            failed = stats.failed_modules,
            "Build planned in {:.2}s",
            stats.planning_time.as_secs_f64()
        );

        Ok(BuildPlan {
            output_root: self.output_root.clone(),
            modules,
            failures,
            stats,
        })
    }

    fn plan_module(
        &self,
        name: &str,
        resolver: &ModuleGraphResolver<'_>,
        detector: &BuildStalenessDetector<'_>,
    ) -> BuildResult<PlannedModule> {
        let descriptor = self.locator.locate(name)?;
        let staleness = detector.explain(&descriptor, &self.output_root, self.force)?;

        Ok(PlannedModule {
            name: descriptor.name().to_string(),
            effective_path: descriptor.effective_path().to_string(),
            staleness,
            entry_points: resolver.resolve_entry_points(&descriptor)?,
            servlets: resolver.resolve_servlets(&descriptor, &self.servlet_prefix)?,
            bootstrap: bootstrap_path(&descriptor, &self.output_root),
        })
    }

    /// Hand every stale module of `plan` to `compiler`; returns how many were compiled
    pub fn execute(&self, plan: &BuildPlan, compiler: &mut dyn ModuleCompiler) -> BuildResult<usize> {
        let classpath = self.assembler.build(ClasspathScope::Compile)?;
        let mut compiled = 0;

        for module in plan.stale() {
            info!(module = %module.name, reason = %module.staleness, "Compiling module");
            let request = CompileRequest {
                module: module.name.clone(),
                effective_path: module.effective_path.clone(),
                classpath: classpath.clone(),
                output_root: plan.output_root.clone(),
            };

            let status = compiler.compile(&request)?;
            if status != 0 {
                return Err(BuildError::CompilationFailed {
                    module: module.name.clone(),
                    status,
                });
            }
            compiled += 1;
        }

        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modkit_config::ProjectConfig;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(root: &Path) -> Config {
        Config::for_project(root, ProjectConfig::default())
    }

    #[derive(Default)]
    struct Recorder {
        requests: Vec<CompileRequest>,
        status: i32,
    }

    impl ModuleCompiler for Recorder {
        fn compile(&mut self, request: &CompileRequest) -> BuildResult<i32> {
            self.requests.push(request.clone());
            Ok(self.status)
        }
    }

    #[test]
    fn test_plan_discovers_modules() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src/main/java");
        write(
            &src,
            "com/acme/App.gwt.xml",
            r#"<module rename-to="app"><entry-point class="com.acme.client.Main"/></module>"#,
        );
        write(&src, "com/acme/Lib.gwt.xml", "<module/>");

        let planner = BuildPlanner::new(&config(temp_dir.path()), vec![]);
        let plan = planner.plan(FailurePolicy::FailFast).unwrap();

        assert_eq!(plan.stats.total_modules, 2);
        assert_eq!(plan.stats.stale_modules, 1);
        assert_eq!(plan.stats.library_modules, 1);
        assert_eq!(plan.modules[0].staleness, Staleness::MissingOutput);
        assert_eq!(
            plan.modules[0].bootstrap,
            temp_dir.path().join("target/webapp/app/app.nocache.js")
        );
        assert_eq!(plan.stale().count(), 1);
    }

    #[test]
    fn test_fail_fast_and_continue() {
        let temp_dir = TempDir::new().unwrap();
        let mut project = ProjectConfig::default();
        project.modules.names = vec!["com.acme.Missing".to_string(), "com.acme.Lib".to_string()];
        write(
            &temp_dir.path().join("src/main/java"),
            "com/acme/Lib.gwt.xml",
            "<module/>",
        );
        let planner = BuildPlanner::new(&Config::for_project(temp_dir.path(), project), vec![]);

        let err = planner.plan(FailurePolicy::FailFast).unwrap_err();
        assert!(matches!(err, BuildError::ModuleNotFound { .. }));

        let plan = planner.plan(FailurePolicy::Continue).unwrap();
        assert!(!plan.is_complete());
        assert_eq!(plan.failures[0].module, "com.acme.Missing");
        assert_eq!(plan.modules.len(), 1);
        assert_eq!(plan.stats.failed_modules, 1);
    }

    #[test]
    fn test_execute_hands_stale_modules_to_compiler() {
        let temp_dir = TempDir::new().unwrap();
        write(
            &temp_dir.path().join("src/main/java"),
            "com/acme/App.gwt.xml",
            r#"<module><entry-point class="com.acme.client.Main"/></module>"#,
        );
        let planner = BuildPlanner::new(&config(temp_dir.path()), vec![]);
        let plan = planner.plan(FailurePolicy::FailFast).unwrap();

        let mut compiler = Recorder::default();
        assert_eq!(planner.execute(&plan, &mut compiler).unwrap(), 1);
        let request = &compiler.requests[0];
        assert_eq!(request.effective_path, "com.acme.App");
        assert_eq!(request.output_root, temp_dir.path().join("target/webapp"));
        assert!(request
            .classpath
            .contains(&temp_dir.path().join("target/classes")));
    }

    #[test]
    fn test_non_zero_status_fails() {
        let temp_dir = TempDir::new().unwrap();
        write(
            &temp_dir.path().join("src/main/java"),
            "com/acme/App.gwt.xml",
            r#"<module><entry-point class="com.acme.client.Main"/></module>"#,
        );
        let planner = BuildPlanner::new(&config(temp_dir.path()), vec![]);
        let plan = planner.plan(FailurePolicy::FailFast).unwrap();

        let mut compiler = Recorder {
            status: 2,
            ..Recorder::default()
        };
        match planner.execute(&plan, &mut compiler) {
            Err(BuildError::CompilationFailed { module, status }) => {
                assert_eq!(module, "com.acme.App");
                assert_eq!(status, 2);
            }
            other => panic!("expected CompilationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_json() {
        let temp_dir = TempDir::new().unwrap();
        write(
            &temp_dir.path().join("src/main/java"),
            "com/acme/App.gwt.xml",
            r#"<module><servlet path="/rpc" class="com.acme.server.Rpc"/></module>"#,
        );
        let planner = BuildPlanner::new(&config(temp_dir.path()), vec![]).with_force(true);
        let json = planner.plan(FailurePolicy::FailFast).unwrap().to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["modules"][0]["staleness"], "no-entry-points");
        assert_eq!(value["modules"][0]["servlets"]["/rpc"], "com.acme.server.Rpc");
    }
}
