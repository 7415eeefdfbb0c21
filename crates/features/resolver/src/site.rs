//! The per-run view of the registry: generated sources and rewritten features layered on top
//! of the read-only registry.

use crate::error::ResolveError;
use crate::registry::{Bundle, InMemoryRegistry, Registry};
use crate::source::GeneratedSource;
use fxhash::FxHashMap;
use pbuild_domain::{Feature, Version, VersionSpec};
use tracing::debug;

/// A processed feature together with the version it was found under.
#[derive(Debug, Clone)]
struct Published {
    found_as: Version,
    feature: Feature,
}

/// Lookup order: published features, then generated sources, then the base registry.
#[derive(Debug)]
pub struct Site<'r> {
    registry: &'r dyn Registry,
    generated: InMemoryRegistry,
    published: FxHashMap<String, Vec<Published>>,
}

impl<'r> Site<'r> {
    #[must_use]
    pub fn new(registry: &'r dyn Registry) -> Self {
        Self { registry, generated: InMemoryRegistry::new(), published: FxHashMap::default() }
    }

    /// The read-only registry underneath the overlay.
    #[must_use]
    pub fn registry(&self) -> &'r dyn Registry {
        self.registry
    }

    pub fn install_bundle(&mut self, bundle: Bundle) {
        debug!(plugin = %bundle.id, version = %bundle.version, "Installing generated plugin");
        self.generated.add_bundle(bundle);
    }

    pub fn install_feature(&mut self, feature: Feature) {
        debug!(feature = %feature.id, version = %feature.version, "Installing generated feature");
        self.generated.add_feature(feature);
    }

    /// Installs everything a source generator produced.
    pub fn install(&mut self, generated: GeneratedSource) {
        for bundle in generated.bundles {
            self.install_bundle(bundle);
        }
        self.install_feature(generated.feature);
    }

    /// Makes the processed state of a feature visible to later lookups.
    ///
    /// `found_as` is the version the feature had when it was looked up, so requests made for
    /// the original version keep finding the processed (possibly rewritten) feature.
    pub fn publish(&mut self, found_as: Version, feature: Feature) {
        let versions = self.published.entry(feature.id.clone()).or_default();
        versions.retain(|p| p.found_as != found_as);
        versions.push(Published { found_as, feature });
    }

    /// Whether the feature found under `found_as` was already processed in this run.
    #[must_use]
    pub fn is_published(&self, id: &str, found_as: &Version) -> bool {
        self.published.get(id).is_some_and(|v| v.iter().any(|p| &p.found_as == found_as))
    }

    /// Like [`Registry::find_feature`], failing with [`ResolveError::MissingFeature`].
    ///
    /// # Errors
    /// Returns [`ResolveError::MissingFeature`] when nothing satisfies the request.
    pub fn require_feature(
        &self,
        id: &str,
        spec: Option<&VersionSpec>,
    ) -> Result<Feature, ResolveError> {
        self.find_feature(id, spec).ok_or_else(|| {
            ResolveError::missing_feature(id, spec.map_or_else(|| "0.0.0".to_owned(), ToString::to_string))
        })
    }
}

impl Registry for Site<'_> {
    fn resolve_bundle(&self, id: &str, spec: &VersionSpec) -> Option<Bundle> {
        self.generated.resolve_bundle(id, spec).or_else(|| self.registry.resolve_bundle(id, spec))
    }

    fn find_feature(&self, id: &str, spec: Option<&VersionSpec>) -> Option<Feature> {
        let published = self.published.get(id).and_then(|versions| {
            versions.iter().rev().find(|p| {
                spec.is_none_or(|spec| spec.matches(&p.found_as) || spec.matches(&p.feature.version))
            })
        });
        if let Some(published) = published {
            return Some(published.feature.clone());
        }

        self.generated.find_feature(id, spec).or_else(|| self.registry.find_feature(id, spec))
    }
}
