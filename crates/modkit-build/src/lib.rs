//! modkit build engine
//!
//! Provides the pieces a module build runs on:
//! - Module manifest parsing and descriptors
//! - Module lookup across source trees, resource trees and dependency archives
//! - Transitive inheritance resolution with entry point and servlet merging
//! - Scope-partitioned classpath assembly
//! - Timestamp-based staleness detection
//! - Build planning and compiler hand-off

pub mod artifact;
pub mod classpath;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod locator;
pub mod manifest;
pub mod plan;
pub mod scanner;
pub mod staleness;

// Re-export main types
pub use artifact::{resolve_artifacts, Artifact, ArtifactResolver, Coordinates, LocalRepository};
pub use classpath::{Classpath, ClasspathAssembler, ClasspathScope};
pub use descriptor::{BackingLocation, ModuleDescriptor, ServletMapping, MANIFEST_SUFFIX};
pub use error::{BuildError, BuildResult};
pub use graph::ModuleGraphResolver;
pub use locator::{LocateModule, LocatorStrategy, ModuleLocator};
pub use manifest::{parse_manifest, ManifestError};
pub use plan::{
    BuildPlan, BuildPlanner, CompileRequest, FailurePolicy, ModuleCompiler, PlanFailure,
    PlanStats, PlannedModule,
};
pub use scanner::FileScanner;
pub use staleness::{bootstrap_path, BuildStalenessDetector, Staleness, BOOTSTRAP_SUFFIX};

// Re-export configuration types for convenience
pub use modkit_config::{Config, DependencyScope, DependencySpec, ProjectLayout};
