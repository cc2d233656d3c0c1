//! Cache Manifest
//!
//! The fixed set of region names and static assets owned by one proxy version.

use serde::Serialize;

use crate::proxy::RegionKind;

// == Cache Manifest ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheManifest {
    prefix: String,
    version: String,
    static_assets: Vec<String>,
}

impl CacheManifest {
    pub fn new(prefix: &str, version: &str, static_assets: Vec<String>) -> Self {
        Self {
            prefix: prefix.to_string(),
            version: version.to_string(),
            static_assets,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn static_assets(&self) -> &[String] {
        &self.static_assets
    }

    /// Name of the region of `kind` for this version, e.g. `siraha-bazaar-api-v2`.
    pub fn region_name(&self, kind: RegionKind) -> String {
        format!("{}-{}-{}", self.prefix, kind.as_str(), self.version)
    }

    pub fn static_region(&self) -> String {
        self.region_name(RegionKind::Static)
    }

    /// Every region name this version owns.
    pub fn region_names(&self) -> Vec<String> {
        RegionKind::ALL.iter().map(|kind| self.region_name(*kind)).collect()
    }

    /// Returns true if `name` belongs to this version.
    pub fn contains(&self, name: &str) -> bool {
        RegionKind::ALL.iter().any(|kind| self.region_name(*kind) == name)
    }

    /// Region names in `existing` that this version does not own.
    pub fn stale_regions(&self, existing: &[String]) -> Vec<String> {
        existing
            .iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect()
    }
}
