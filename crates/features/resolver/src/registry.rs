//! Read-only view of the components and features a build can draw from.

use fxhash::FxHashMap;
use pbuild_domain::{Feature, Version, VersionSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A concrete, buildable component (plugin or fragment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: String,
    pub version: Version,
    /// Pre-built: nothing to compile, only to package.
    #[serde(default)]
    pub binary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

impl Bundle {
    #[must_use]
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self { id: id.into(), version, binary: false, location: None }
    }

    #[must_use]
    pub const fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn key(&self) -> ComponentKey {
        ComponentKey { id: self.id.clone(), version: self.version.clone() }
    }
}

/// Identity of a resolved component within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    pub id: String,
    pub version: Version,
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.version)
    }
}

/// Lookup interface over components and features.
///
/// Both lookups return the highest version satisfying the request. A `None` feature request
/// accepts any version.
pub trait Registry: fmt::Debug {
    fn resolve_bundle(&self, id: &str, spec: &VersionSpec) -> Option<Bundle>;

    fn find_feature(&self, id: &str, spec: Option<&VersionSpec>) -> Option<Feature>;
}

/// A registry held entirely in memory, versions kept in descending order per id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    bundles: FxHashMap<String, Vec<Bundle>>,
    features: FxHashMap<String, Vec<Feature>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bundle, replacing one with the same id and version.
    pub fn add_bundle(&mut self, bundle: Bundle) {
        let versions = self.bundles.entry(bundle.id.clone()).or_default();
        insert_descending(versions, bundle, |b| &b.version);
    }

    /// Adds a feature, replacing one with the same id and version.
    pub fn add_feature(&mut self, feature: Feature) {
        let versions = self.features.entry(feature.id.clone()).or_default();
        insert_descending(versions, feature, |f| &f.version);
    }

    #[must_use]
    pub fn with_bundle(mut self, bundle: Bundle) -> Self {
        self.add_bundle(bundle);
        self
    }

    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.add_feature(feature);
        self
    }

    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.values().flatten()
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values().flatten()
    }

    #[must_use]
    pub fn bundle_count(&self) -> usize {
        self.bundles.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.features.values().map(Vec::len).sum()
    }
}

fn insert_descending<T>(items: &mut Vec<T>, item: T, version: impl Fn(&T) -> &Version) {
    match items.binary_search_by(|probe| version(&item).cmp(version(probe))) {
        Ok(index) => items[index] = item,
        Err(index) => items.insert(index, item),
    }
}

impl Registry for InMemoryRegistry {
    fn resolve_bundle(&self, id: &str, spec: &VersionSpec) -> Option<Bundle> {
        self.bundles.get(id)?.iter().find(|b| spec.matches(&b.version)).cloned()
    }

    fn find_feature(&self, id: &str, spec: Option<&VersionSpec>) -> Option<Feature> {
        self.features
            .get(id)?
            .iter()
            .find(|f| spec.is_none_or(|spec| spec.matches(&f.version)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn highest_matching_version_wins() {
        let registry = InMemoryRegistry::new()
            .with_bundle(Bundle::new("org.demo.a", version("1.0.0.v1")))
            .with_bundle(Bundle::new("org.demo.a", version("1.2.0.v3")))
            .with_bundle(Bundle::new("org.demo.a", version("1.0.0.v2")));

        let any = registry.resolve_bundle("org.demo.a", &VersionSpec::Any).unwrap();
        assert_eq!(any.version, version("1.2.0.v3"));

        let wildcard = VersionSpec::parse("1.0.0.qualifier").unwrap();
        let found = registry.resolve_bundle("org.demo.a", &wildcard).unwrap();
        assert_eq!(found.version, version("1.0.0.v2"));

        let exact = VersionSpec::parse("1.0.0.v1").unwrap();
        assert_eq!(registry.resolve_bundle("org.demo.a", &exact).unwrap().version, version("1.0.0.v1"));

        let absent = VersionSpec::parse("3.0.0").unwrap();
        assert!(registry.resolve_bundle("org.demo.a", &absent).is_none());
        assert!(registry.resolve_bundle("org.demo.b", &VersionSpec::Any).is_none());
    }

    #[test]
    fn same_version_is_replaced() {
        let mut registry = InMemoryRegistry::new();
        registry.add_bundle(Bundle::new("org.demo.a", version("1.0.0")));
        registry.add_bundle(Bundle::new("org.demo.a", version("1.0.0")).with_binary(true));

        assert_eq!(registry.bundle_count(), 1);
        assert!(registry.resolve_bundle("org.demo.a", &VersionSpec::Any).unwrap().binary);
    }

    #[test]
    fn feature_lookup_without_request_takes_highest() {
        let registry = InMemoryRegistry::new()
            .with_feature(Feature::new("org.demo.f", version("1.0.0")))
            .with_feature(Feature::new("org.demo.f", version("2.0.0")));

        assert_eq!(registry.find_feature("org.demo.f", None).unwrap().version, version("2.0.0"));
        let spec = VersionSpec::parse("1.0.0").unwrap();
        assert_eq!(
            registry.find_feature("org.demo.f", Some(&spec)).unwrap().version,
            version("1.0.0")
        );
    }
}
