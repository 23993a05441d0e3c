//! Transitive inheritance resolution over module descriptors
//!
//! The inherits graph may contain cycles. Traversal is depth-first with an
//! explicit stack and a visited set local to each call. A module is marked
//! visited before it is expanded.

use crate::descriptor::ModuleDescriptor;
use crate::error::{BuildError, BuildResult};
use crate::locator::LocateModule;
use modkit_config::DEFAULT_RESERVED_PREFIXES;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, trace};

/// Resolves inherited modules and the entry points and servlets they contribute
pub struct ModuleGraphResolver<'a> {
    locator: &'a dyn LocateModule,
    reserved_prefixes: Vec<String>,
}

/// A module being expanded: its chain from the root and its pending children
struct Frame {
    chain: Vec<String>,
    children: Vec<String>,
    next: usize,
}

impl<'a> ModuleGraphResolver<'a> {
    /// Resolver skipping the default reserved namespaces
    pub fn new(locator: &'a dyn LocateModule) -> Self {
        Self {
            locator,
            reserved_prefixes: DEFAULT_RESERVED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Replace the reserved namespaces
    pub fn with_reserved_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.reserved_prefixes = prefixes;
        self
    }

    /// Whether `name` lives in a namespace that is never expanded
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Every module transitively inherited by `descriptor`
    ///
    /// Depth-first pre-order following declared inherits order. The result
    /// is computed once per descriptor and cached on it. The cache belongs to
    /// the first resolver that fills it: a later resolver with different
    /// reserved prefixes gets the cached set. Clones carry the cache along,
    /// so parse or locate the descriptor again when the prefixes change.
    pub fn resolve_inherits<'d>(
        &self,
        descriptor: &'d ModuleDescriptor,
    ) -> BuildResult<&'d [ModuleDescriptor]> {
        if let Some(resolved) = descriptor.resolved_inherits().get() {
            return Ok(resolved.as_slice());
        }

        let resolved = self.collect_inherits(descriptor)?;
        debug!(
            module = descriptor.name(),
            inherited = resolved.len(),
            "Resolved inherited modules"
        );
        Ok(descriptor.resolved_inherits().get_or_init(|| resolved).as_slice())
    }

    fn collect_inherits(&self, root: &ModuleDescriptor) -> BuildResult<Vec<ModuleDescriptor>> {
        let mut visited = HashSet::new();
        let mut resolved = Vec::new();
        let mut stack = vec![Frame {
            chain: vec![root.name().to_string()],
            children: root.local_inherits().to_vec(),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.get(frame.next).cloned() else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            if self.is_reserved(&child) {
                trace!(module = %child, "Skipping reserved module");
                continue;
            }
            if !visited.insert(child.clone()) {
                continue;
            }

            let mut chain = frame.chain.clone();
            chain.push(child.clone());

            let module = match self.locator.locate(&child) {
                Ok(module) => module,
                Err(err @ BuildError::ModuleNotFound { .. }) => {
                    return Err(BuildError::inherited(chain, err))
                }
                Err(err) => return Err(err),
            };

            let children = module.local_inherits().to_vec();
            resolved.push(module);
            stack.push(Frame {
                chain,
                children,
                next: 0,
            });
        }

        Ok(resolved)
    }

    /// Local entry points followed by those of every inherited module
    pub fn resolve_entry_points(&self, descriptor: &ModuleDescriptor) -> BuildResult<Vec<String>> {
        let mut entry_points = descriptor.local_entry_points().to_vec();
        for module in self.resolve_inherits(descriptor)? {
            entry_points.extend_from_slice(module.local_entry_points());
        }
        Ok(entry_points)
    }

    /// Servlet mappings keyed by prefixed path
    ///
    /// Inherited mappings are applied in resolution order, later modules
    /// overwriting earlier ones. The descriptor's own mappings always win.
    pub fn resolve_servlets(
        &self,
        descriptor: &ModuleDescriptor,
        prefix: &str,
    ) -> BuildResult<BTreeMap<String, String>> {
        let mut servlets = BTreeMap::new();
        let inherited = self.resolve_inherits(descriptor)?;

        for module in inherited.iter().chain(std::iter::once(descriptor)) {
            for mapping in module.local_servlets() {
                servlets.insert(prefixed(prefix, &mapping.path), mapping.class.clone());
            }
        }

        Ok(servlets)
    }
}

fn prefixed(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
