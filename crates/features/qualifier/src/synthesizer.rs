//! Computes the qualifier suffix of a feature from the versions of everything it contains.

use crate::codec::{encode, fold_qualifiers, strip_trailing_blanks};
use crate::error::{QualifierError, QualifierErrorExt};
use pbuild_domain::config::{DEFAULT_MAX_GENERATED_LENGTH, QualifierConfig};
use pbuild_domain::properties::{GENERATED_VERSION_LENGTH, SIGNIFICANT_VERSION_DIGITS};
use pbuild_domain::{BuildProperties, Feature, Version};
use pbuild_resolver::Registry;
use std::borrow::Cow;
use tracing::{debug, trace};

/// Version of the suffix scheme, added to the major sum so that a scheme change moves every
/// suffix forward.
pub const QUALIFIER_SUFFIX_VERSION: u64 = 1;

/// Limits applied while synthesizing a suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifierSettings {
    /// Characters of each contributing qualifier that count. `None` keeps all.
    pub significant_digits: Option<usize>,
    pub max_generated_length: usize,
}

impl Default for QualifierSettings {
    fn default() -> Self {
        Self { significant_digits: None, max_generated_length: DEFAULT_MAX_GENERATED_LENGTH }
    }
}

impl From<&QualifierConfig> for QualifierSettings {
    fn from(config: &QualifierConfig) -> Self {
        Self {
            significant_digits: config.significant_digits.filter(|d| *d >= 1),
            max_generated_length: if config.max_generated_length >= 1 {
                config.max_generated_length
            } else {
                DEFAULT_MAX_GENERATED_LENGTH
            },
        }
    }
}

impl QualifierSettings {
    /// Settings for one feature: positive values of its build properties win.
    #[must_use]
    pub fn for_properties(self, properties: Option<&BuildProperties>) -> Self {
        let Some(properties) = properties else { return self };
        Self {
            significant_digits: properties
                .positive_int(SIGNIFICANT_VERSION_DIGITS)
                .or(self.significant_digits),
            max_generated_length: properties
                .positive_int(GENERATED_VERSION_LENGTH)
                .unwrap_or(self.max_generated_length),
        }
    }
}

/// Running totals over the contributing versions.
#[derive(Debug, Default)]
struct Totals {
    major: u64,
    minor: u64,
    micro: u64,
    qualifiers: Vec<String>,
}

impl Totals {
    fn add(&mut self, version: &Version, qualifier: &str) {
        self.major = self.major.saturating_add(version.major);
        self.minor = self.minor.saturating_add(version.minor);
        self.micro = self.micro.saturating_add(version.micro);
        self.qualifiers.push(qualifier.to_owned());
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualifierSynthesizer {
    settings: QualifierSettings,
}

impl QualifierSynthesizer {
    #[must_use]
    pub const fn new(settings: QualifierSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> QualifierSettings {
        self.settings
    }

    /// Synthesizes the qualifier suffix of `feature`.
    ///
    /// Returns `None` when suffix generation is disabled for the feature or it has neither
    /// plugin nor nested-feature entries. Contributions are taken from every nested feature
    /// and then every plugin entry, in declaration order and regardless of platform filters:
    ///
    /// * a nested feature is looked up by id in `registry`, so a child rewritten earlier in
    ///   the run contributes its rewritten version. Only the qualifier part after the child's
    ///   own context part counts. A missing child contributes an empty qualifier.
    /// * a plugin contributes the registry version when found, or else the requested version
    ///   with the placeholder token stripped.
    ///
    /// # Errors
    /// Returns [`QualifierError::MalformedVersion`] for a plugin version that does not parse.
    pub fn synthesize(
        &self,
        feature: &Feature,
        registry: &dyn Registry,
    ) -> Result<Option<String>, QualifierError> {
        if feature.context_qualifier_length.is_none() {
            return Ok(None);
        }
        if feature.plugin_entries().next().is_none() && feature.included_features().next().is_none() {
            trace!(feature = %feature.id, "Empty feature, no suffix");
            return Ok(None);
        }

        let settings = self.settings.for_properties(feature.properties.as_ref());
        let mut totals = Totals { major: QUALIFIER_SUFFIX_VERSION, ..Totals::default() };

        for entry in feature.included_features() {
            let Some(nested) = registry.find_feature(&entry.id, None) else {
                totals.qualifiers.push(String::new());
                continue;
            };
            let qualifier = &nested.version.qualifier;
            let context = nested.context_qualifier_length.map_or(0, |length| length + 1);
            let generated =
                qualifier.get(context..).filter(|rest| !rest.is_empty()).unwrap_or(qualifier);
            totals.add(&nested.version, generated);
        }

        for entry in feature.plugin_entries() {
            let spec = entry
                .version_spec()
                .context(Cow::Owned(format!("plugin {entry} of feature {}", feature.id)))?;
            let version = registry
                .resolve_bundle(&entry.id, &spec)
                .map_or_else(|| spec.fallback_version(), |bundle| bundle.version);
            totals.add(&version, &version.qualifier);
        }

        let mut suffix = encode(totals.major);
        suffix.push_str(&encode(totals.minor));
        suffix.push_str(&encode(totals.micro));
        suffix.push_str(&fold_qualifiers(&totals.qualifiers, settings.significant_digits));

        let suffix = strip_trailing_blanks(&suffix);
        let suffix = suffix.get(..settings.max_generated_length).unwrap_or(suffix).to_owned();

        debug!(feature = %feature.id, suffix = %suffix, "Synthesized qualifier suffix");
        Ok(Some(suffix))
    }
}
