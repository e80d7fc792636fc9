//! Boundary to whatever resolves themed resources.
//!
//! Package-manager lookups live outside this crate. The composer only asks
//! a [`ResourceResolver`] for icon sources by package and resource.

use std::collections::HashMap;

use crate::icon::IconSource;

/// Looks up icon artwork owned by other packages.
pub trait ResourceResolver: Send + Sync {
    /// Resolves a resource by runtime id at the given screen density.
    fn resolve(&self, package: &str, resource_id: u32, density: u32) -> Option<IconSource>;

    /// Resolves a resource by its fully qualified name. Ids change across
    /// installs, so persisted references go through this.
    fn resolve_named(&self, _package: &str, _resource_name: &str, _density: u32) -> Option<IconSource> {
        None
    }
}

/// An in-memory resolver, handy for tests and bundled icon packs.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    by_id: HashMap<(String, u32), IconSource>,
    by_name: HashMap<(String, String), IconSource>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, package: impl Into<String>, resource_id: u32, source: IconSource) -> Self {
        self.by_id.insert((package.into(), resource_id), source);
        self
    }

    pub fn with_name(
        mut self,
        package: impl Into<String>,
        resource_name: impl Into<String>,
        source: IconSource,
    ) -> Self {
        self.by_name.insert((package.into(), resource_name.into()), source);
        self
    }
}

impl ResourceResolver for StaticResolver {
    fn resolve(&self, package: &str, resource_id: u32, _density: u32) -> Option<IconSource> {
        self.by_id.get(&(package.to_string(), resource_id)).cloned()
    }

    fn resolve_named(&self, package: &str, resource_name: &str, _density: u32) -> Option<IconSource> {
        self.by_name
            .get(&(package.to_string(), resource_name.to_string()))
            .cloned()
    }
}
