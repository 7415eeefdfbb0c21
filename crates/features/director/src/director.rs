//! The recursive generation driver.

use crate::assembly::AssemblyLedger;
use crate::emitter::ScriptEmitter;
use crate::error::DirectorError;
use fxhash::FxHashSet;
use pbuild_domain::config::GeneratorConfig;
use pbuild_domain::{
    Config, Feature, FeatureEntry, FeatureKey, GenerationFlags, Version, VersionSpec, select_configs,
};
use pbuild_kernel::context::BuildContext;
use pbuild_kernel::problems::ProblemLog;
use pbuild_qualifier::{QualifierSettings, QualifierSynthesizer};
use pbuild_resolver::{ComponentKey, FeatureEntryResolver, Registry, ResolveError, Site, SourceGenerator};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Reason code of an optional nested feature that could not be generated.
pub const ABSORBED_OPTIONAL_FEATURE: &str = "absorbed_optional_feature";
/// Reason code of a source feature without build properties.
pub const MISSING_BUILD_PROPERTIES: &str = "missing_build_properties";

/// An optional nested feature whose absence was tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsorbedFailure {
    pub parent: FeatureKey,
    pub entry: FeatureEntry,
    pub reason: String,
}

/// Outcome of [`BuildDirector::generate_root`].
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Final identity of the root feature; `None` when the run was cancelled.
    pub feature: Option<FeatureKey>,
    /// Components handed to the emitter, in emission order.
    pub emitted: Vec<ComponentKey>,
    pub absorbed: Vec<AbsorbedFailure>,
    pub problems: ProblemLog,
    pub cancelled: bool,
}

/// Drives one generation run over a feature tree.
///
/// Per-run state lives here: the site overlay, the resolved components, the assembly
/// ledger and the set of components already handed to the emitter.
#[derive(Debug)]
pub struct BuildDirector<'r, E: ScriptEmitter> {
    flags: GenerationFlags,
    site: Site<'r>,
    resolver: FeatureEntryResolver,
    synthesizer: QualifierSynthesizer,
    emitter: E,
    ledger: AssemblyLedger,
    emitted: FxHashSet<ComponentKey>,
    emitted_order: Vec<ComponentKey>,
    in_progress: FxHashSet<FeatureKey>,
    generated: FxHashSet<FeatureKey>,
    absorbed: Vec<AbsorbedFailure>,
}

impl<'r, E: ScriptEmitter> BuildDirector<'r, E> {
    /// A director with default flags building for `configs` (empty means generic).
    #[must_use]
    pub fn new(registry: &'r dyn Registry, configs: Vec<Config>, emitter: E) -> Self {
        Self {
            flags: GenerationFlags::default(),
            site: Site::new(registry),
            resolver: FeatureEntryResolver::new(configs),
            synthesizer: QualifierSynthesizer::default(),
            emitter,
            ledger: AssemblyLedger::new(),
            emitted: FxHashSet::default(),
            emitted_order: Vec::new(),
            in_progress: FxHashSet::default(),
            generated: FxHashSet::default(),
            absorbed: Vec::new(),
        }
    }

    /// A director set up from the generator configuration.
    #[must_use]
    pub fn from_config(registry: &'r dyn Registry, config: &GeneratorConfig, emitter: E) -> Self {
        Self::new(registry, config.site.effective_configs(), emitter)
            .with_flags(GenerationFlags::from(&config.generation))
            .with_synthesizer(QualifierSynthesizer::new(QualifierSettings::from(&config.qualifier)))
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: GenerationFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: QualifierSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    #[must_use]
    pub fn with_source_generator(mut self, generator: impl SourceGenerator + 'static) -> Self {
        self.resolver = self.resolver.with_generator(generator);
        self
    }

    #[must_use]
    pub const fn flags(&self) -> GenerationFlags {
        self.flags
    }

    #[must_use]
    pub const fn site(&self) -> &Site<'r> {
        &self.site
    }

    #[must_use]
    pub const fn resolver(&self) -> &FeatureEntryResolver {
        &self.resolver
    }

    #[must_use]
    pub const fn ledger(&self) -> &AssemblyLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Components handed to the emitter so far, in emission order.
    #[must_use]
    pub fn emitted(&self) -> &[ComponentKey] {
        &self.emitted_order
    }

    #[must_use]
    pub fn absorbed(&self) -> &[AbsorbedFailure] {
        &self.absorbed
    }

    /// Consumes the director, keeping the emitter and the ledger.
    #[must_use]
    pub fn into_parts(self) -> (E, AssemblyLedger) {
        (self.emitter, self.ledger)
    }

    /// Looks up the root feature and generates it.
    ///
    /// `version` is the requested version text; empty or `0.0.0` takes the highest version.
    /// A cancelled run still returns a report, with `cancelled` set.
    ///
    /// # Errors
    /// * [`DirectorError::Resolve`] wrapping [`ResolveError::MissingFeature`] when the root is
    ///   absent, or any fatal failure of [`BuildDirector::generate`].
    pub fn generate_root(
        &mut self,
        id: &str,
        version: &str,
        mut ctx: BuildContext,
    ) -> Result<GenerationReport, DirectorError> {
        let spec = VersionSpec::parse(version).map_err(ResolveError::from)?;
        let root = self.site.require_feature(id, Some(&spec))?;

        let (feature, cancelled) = match self.generate(root, &mut ctx) {
            Ok(feature) => (Some(feature.key()), false),
            Err(err) if err.is_cancelled() => {
                warn!(feature = %id, "Generation cancelled");
                (None, true)
            },
            Err(err) => return Err(err),
        };

        info!(
            feature = %id,
            emitted = self.emitted_order.len(),
            absorbed = self.absorbed.len(),
            problems = ctx.problems().len(),
            "Generation finished"
        );

        Ok(GenerationReport {
            feature,
            emitted: self.emitted_order.clone(),
            absorbed: self.absorbed.clone(),
            problems: ctx.into_problems(),
            cancelled,
        })
    }

    /// Generates `feature` and, depending on the flags, everything it includes.
    ///
    /// 1. Nested features, in declaration order. Optional ones that cannot be found are
    ///    absorbed; any other failure propagates.
    /// 2. Plugin entries: resolution, then the qualifier suffix, then one build unit per
    ///    component not yet emitted in this run.
    /// 3. Assembly ledger records.
    /// 4. The feature script.
    ///
    /// A feature already generated in this run is not generated again, and a feature that
    /// includes itself is skipped while it is being generated. A feature whose generation
    /// failed is tried again when referenced again. Returns the processed feature, whose
    /// version may have been rewritten.
    ///
    /// # Errors
    /// * [`DirectorError::Resolve`] for missing required plugins or features, malformed
    ///   versions and source generation failures.
    /// * [`DirectorError::Qualifier`] when suffix synthesis fails.
    /// * Emitter failures.
    /// * [`DirectorError::Cancelled`] when the run was cancelled.
    #[instrument(skip_all, fields(feature = %feature.id, version = %feature.version))]
    pub fn generate(&mut self, feature: Feature, ctx: &mut BuildContext) -> Result<Feature, DirectorError> {
        if ctx.is_cancelled() {
            return Err(DirectorError::cancelled(&feature.id));
        }

        let found_as = feature.version.clone();
        let key = feature.key();
        if self.generated.contains(&key) {
            debug!("Already generated in this run");
            let spec = VersionSpec::Exact(found_as);
            return Ok(self.site.find_feature(&feature.id, Some(&spec)).unwrap_or(feature));
        }
        if !self.in_progress.insert(key.clone()) {
            debug!("Included by itself, skipping");
            return Ok(feature);
        }

        let result = self.generate_feature(feature, &found_as, ctx);
        self.in_progress.remove(&key);
        let feature = result?;

        // Later lookups may use the rewritten version.
        self.generated.insert(key);
        self.generated.insert(feature.key());
        self.site.publish(found_as, feature.clone());
        Ok(feature)
    }

    fn generate_feature(
        &mut self,
        mut feature: Feature,
        found_as: &Version,
        ctx: &mut BuildContext,
    ) -> Result<Feature, DirectorError> {
        if self.flags.contains(GenerationFlags::INCLUDED_FEATURES) {
            self.generate_included(&feature, ctx)?;
        }

        let components = if self.flags.contains(GenerationFlags::PLUGINS) {
            self.generate_children(&mut feature, found_as, ctx)?
        } else {
            Vec::new()
        };

        self.collect(&feature, &components, ctx);

        if self.flags.contains(GenerationFlags::SCRIPTS) {
            let configs = select_configs(&feature.filter, self.resolver.configs());
            self.emitter.emit_feature(&feature, &configs)?;
        }
        Ok(feature)
    }

    fn generate_included(&mut self, feature: &Feature, ctx: &mut BuildContext) -> Result<(), DirectorError> {
        for entry in feature.included_features() {
            if ctx.is_cancelled() {
                return Err(DirectorError::cancelled(&feature.id));
            }
            if self.resolver.select_configs(entry).is_empty() {
                continue;
            }

            match self.generate_nested(feature, entry, ctx) {
                Ok(()) => {},
                Err(err) if entry.optional && err.is_missing_feature() => {
                    self.absorb(feature, entry, &err, ctx);
                },
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn generate_nested(
        &mut self,
        parent: &Feature,
        entry: &FeatureEntry,
        ctx: &mut BuildContext,
    ) -> Result<(), DirectorError> {
        let spec = entry.version_spec().map_err(ResolveError::from)?;

        if let Some(list) = parent.properties.as_ref().and_then(|p| p.source_feature(&entry.id)) {
            self.resolver.generate_source(&mut self.site, &entry.id, &list, Some(&spec))?;
        }

        let nested = self.site.require_feature(&entry.id, Some(&spec))?;
        self.generate(nested, ctx)?;
        Ok(())
    }

    fn absorb(&mut self, parent: &Feature, entry: &FeatureEntry, err: &DirectorError, ctx: &mut BuildContext) {
        ctx.problems_mut().info(
            ABSORBED_OPTIONAL_FEATURE,
            entry.to_string(),
            format!("optional feature of {} skipped: {err}", parent.key()),
        );
        self.absorbed.push(AbsorbedFailure {
            parent: parent.key(),
            entry: entry.clone(),
            reason: err.to_string(),
        });
    }

    /// Resolves the plugin entries, rewrites the version and emits the components.
    fn generate_children(
        &mut self,
        feature: &mut Feature,
        found_as: &Version,
        ctx: &mut BuildContext,
    ) -> Result<Vec<ComponentKey>, DirectorError> {
        let components = self.resolver.compute_elements(&mut self.site, feature, ctx)?;

        if self.flags.contains(GenerationFlags::VERSION_SUFFIX)
            && let Some(suffix) = self.synthesizer.synthesize(feature, &self.site)?
            && feature.apply_qualifier_suffix(&suffix)
        {
            info!(suffix = %suffix, version = %feature.version, "Rewrote feature version");
            self.site.publish(found_as.clone(), feature.clone());
        }

        if self.flags.contains(GenerationFlags::SCRIPTS | GenerationFlags::BINARY_PLUGINS) {
            self.generate_models(&components, ctx)?;
        }
        Ok(components)
    }

    /// Emits each component once per run, for the configurations of its first entry.
    fn generate_models(&mut self, components: &[ComponentKey], ctx: &BuildContext) -> Result<(), DirectorError> {
        for key in components {
            if ctx.is_cancelled() {
                return Err(DirectorError::cancelled(&key.id));
            }
            if self.emitted.contains(key) {
                continue;
            }
            let Some(component) = self.resolver.component(key) else { continue };
            let Some(entry) = component.representative_entry() else { continue };

            let configs = self.resolver.select_configs(entry);
            if configs.is_empty() {
                continue;
            }

            self.emitter.emit_component(component, entry, &configs)?;
            self.emitted.insert(key.clone());
            self.emitted_order.push(key.clone());
            debug!(plugin = %key, "Emitted build unit");
        }
        Ok(())
    }

    /// Records the feature and its components into the assembly ledger.
    fn collect(&mut self, feature: &Feature, components: &[ComponentKey], ctx: &mut BuildContext) {
        for key in components {
            let Some(component) = self.resolver.component(key) else { continue };
            for entry in component.entries().iter().filter(|e| feature.entries.contains(e)) {
                for config in self.resolver.select_configs(entry) {
                    self.ledger.add_plugin(config, key.clone());
                }
            }
        }

        if !feature.binary {
            let Some(properties) = &feature.properties else {
                if !self.flags.contains(GenerationFlags::IGNORE_MISSING_PROPERTIES) {
                    ctx.problems_mut().warn(
                        MISSING_BUILD_PROPERTIES,
                        feature.key().to_string(),
                        "feature declares no build properties",
                    );
                }
                return;
            };
            if properties.bin_includes().is_none() {
                return;
            }
        }

        for config in select_configs(&feature.filter, self.resolver.configs()) {
            self.ledger.add_feature(config, feature.key());
        }
    }
}
