//! Turns the plugin entries of a feature into concrete components.

use crate::error::ResolveError;
use crate::registry::{Bundle, ComponentKey, Registry};
use crate::site::Site;
use crate::source::{DefaultSourceGenerator, SourceGenerator, SourceRequest};
use fxhash::FxHashMap;
use pbuild_domain::{Config, Feature, FeatureEntry, VersionSpec, select_configs};
use pbuild_kernel::context::BuildContext;
use std::borrow::Cow;
use tracing::{debug, trace};

/// Reason code recorded for optional plugins that could not be resolved.
pub const MISSING_OPTIONAL_PLUGIN: &str = "missing_optional_plugin";

/// A component together with every feature entry that referenced it during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedComponent {
    pub bundle: Bundle,
    entries: Vec<FeatureEntry>,
}

impl ResolvedComponent {
    #[must_use]
    pub const fn new(bundle: Bundle) -> Self {
        Self { bundle, entries: Vec::new() }
    }

    #[must_use]
    pub fn key(&self) -> ComponentKey {
        self.bundle.key()
    }

    /// Records a referencing entry. Returns `false` when it was already recorded.
    pub fn add_entry(&mut self, entry: FeatureEntry) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Referencing entries in first-seen order.
    #[must_use]
    pub fn entries(&self) -> &[FeatureEntry] {
        &self.entries
    }

    /// The entry whose configurations decide where the component is built.
    #[must_use]
    pub fn representative_entry(&self) -> Option<&FeatureEntry> {
        self.entries.first()
    }
}

/// Resolves plugin entries, accumulating the components of a whole run.
#[derive(Debug)]
pub struct FeatureEntryResolver {
    configs: Vec<Config>,
    generator: Box<dyn SourceGenerator>,
    components: FxHashMap<ComponentKey, ResolvedComponent>,
    order: Vec<ComponentKey>,
}

impl FeatureEntryResolver {
    /// A resolver building for `configs`; an empty list means the generic configuration.
    #[must_use]
    pub fn new(configs: Vec<Config>) -> Self {
        let configs = if configs.is_empty() { vec![Config::generic()] } else { configs };
        Self {
            configs,
            generator: Box::new(DefaultSourceGenerator),
            components: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_generator(mut self, generator: impl SourceGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    #[must_use]
    pub fn configs(&self) -> &[Config] {
        &self.configs
    }

    /// Requested configurations accepted by `entry`.
    #[must_use]
    pub fn select_configs(&self, entry: &FeatureEntry) -> Vec<Config> {
        select_configs(&entry.filter, &self.configs)
    }

    /// Resolves the plugin entries of `feature` in declaration order.
    ///
    /// Entries whose platform filter accepts none of the requested configurations are
    /// skipped. When an entry resolves to nothing, or to a binary bundle, and the feature's
    /// build properties carry `generate.plugin@<id>`, the source plugin is generated into
    /// the site and resolution is retried. Each resolved component records the entry that
    /// referenced it; the returned keys are distinct and in first-reference order.
    ///
    /// # Errors
    /// * [`ResolveError::MissingComponent`] for a required entry that nothing satisfies.
    /// * [`ResolveError::MissingFeature`] when the base feature of a source plugin is absent.
    /// * [`ResolveError::MalformedVersion`] for an entry whose version text does not parse.
    /// * [`ResolveError::Cancelled`] when the run was cancelled.
    pub fn compute_elements(
        &mut self,
        site: &mut Site<'_>,
        feature: &Feature,
        ctx: &mut BuildContext,
    ) -> Result<Vec<ComponentKey>, ResolveError> {
        let mut elements = Vec::new();

        for entry in feature.plugin_entries() {
            if ctx.is_cancelled() {
                return Err(ResolveError::cancelled(&feature.id));
            }
            if self.select_configs(entry).is_empty() {
                trace!(feature = %feature.id, plugin = %entry.id, "No requested configuration applies, skipping");
                continue;
            }

            let spec = entry.version_spec()?;
            let mut bundle = site.resolve_bundle(&entry.id, &spec);

            if bundle.as_ref().is_none_or(|b| b.binary) {
                let source = feature.properties.as_ref().and_then(|p| p.source_plugin(&entry.id));
                if let Some(list) = source {
                    self.generate_source(site, &entry.id, &list, None)?;
                    bundle = site.resolve_bundle(&entry.id, &spec);
                }
            }

            let Some(bundle) = bundle else {
                if entry.optional {
                    ctx.problems_mut().warn(
                        MISSING_OPTIONAL_PLUGIN,
                        entry.to_string(),
                        format!("optional plugin of feature {} not found, skipped", feature.key()),
                    );
                    continue;
                }
                return Err(ResolveError::MissingComponent {
                    id: entry.id.clone(),
                    version: entry.version.clone(),
                    context: Some(Cow::Owned(format!("required by feature {}", feature.key()))),
                });
            };

            let key = self.associate(bundle, entry);
            if !elements.contains(&key) {
                elements.push(key);
            }
        }

        debug!(feature = %feature.id, components = elements.len(), "Resolved plugin entries");
        Ok(elements)
    }

    /// Generates a source feature or plugin named `name` from the list carried by a
    /// `generate.*@<name>` build property and installs it into the site.
    ///
    /// The base feature is looked up with `base_spec`; `None` accepts any version.
    ///
    /// # Errors
    /// * [`ResolveError::Generation`] for an empty list or a generator failure.
    /// * [`ResolveError::MissingFeature`] when the base feature is absent.
    pub fn generate_source(
        &self,
        site: &mut Site<'_>,
        name: &str,
        list: &[String],
        base_spec: Option<&VersionSpec>,
    ) -> Result<Feature, ResolveError> {
        let Some((base_id, extra_entries)) = list.split_first() else {
            return Err(ResolveError::Generation {
                message: Cow::Borrowed("no base feature named"),
                context: Some(Cow::Owned(name.to_owned())),
            });
        };

        let base = site.require_feature(base_id, base_spec)?;
        debug!(source = %name, base = %base.key(), "Generating source");
        let generated =
            self.generator.generate(&SourceRequest { name, base: &base, extra_entries })?;
        let feature = generated.feature.clone();
        site.install(generated);
        Ok(feature)
    }

    fn associate(&mut self, bundle: Bundle, entry: &FeatureEntry) -> ComponentKey {
        let key = bundle.key();
        let component = self.components.entry(key.clone()).or_insert_with(|| {
            self.order.push(key.clone());
            ResolvedComponent::new(bundle)
        });
        component.add_entry(entry.clone());
        key
    }

    #[must_use]
    pub fn component(&self, key: &ComponentKey) -> Option<&ResolvedComponent> {
        self.components.get(key)
    }

    /// Every component resolved so far, in first-resolution order.
    pub fn components(&self) -> impl Iterator<Item = &ResolvedComponent> {
        self.order.iter().filter_map(|key| self.components.get(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
