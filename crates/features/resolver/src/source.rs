//! Source generation: deriving a source feature and its source plugin from a base feature.
//!
//! Triggered by the `generate.plugin@<id>` and `generate.feature@<id>` build properties.
//! The property value is a comma-separated list whose first item names the base feature; the
//! remaining items are extra entries of the form `plugin@<id>[;version=<v>]` or
//! `feature@<id>[;version=<v>]`.

use crate::error::ResolveError;
use crate::registry::Bundle;
use pbuild_domain::properties::BIN_INCLUDES;
use pbuild_domain::{BuildProperties, Feature, FeatureEntry};
use std::borrow::Cow;
use std::fmt;

const PLUGIN_PREFIX: &str = "plugin@";
const FEATURE_PREFIX: &str = "feature@";
const ANY_VERSION: &str = "0.0.0";

/// What to generate.
#[derive(Debug, Clone, Copy)]
pub struct SourceRequest<'a> {
    /// Id of the generated feature and of its source plugin.
    pub name: &'a str,
    pub base: &'a Feature,
    /// The property items after the base feature id.
    pub extra_entries: &'a [String],
}

/// Output of a source generator, installed into the site overlay as a unit.
#[derive(Debug, Clone)]
pub struct GeneratedSource {
    pub feature: Feature,
    pub bundles: Vec<Bundle>,
}

/// Produces source features and plugins.
pub trait SourceGenerator: fmt::Debug {
    /// # Errors
    /// Returns [`ResolveError::Generation`] when the request cannot be honoured.
    fn generate(&self, request: &SourceRequest<'_>) -> Result<GeneratedSource, ResolveError>;
}

/// Generates one non-binary source plugin named after the request, versioned like the base
/// feature, and a source feature listing that plugin followed by the extra entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSourceGenerator;

impl SourceGenerator for DefaultSourceGenerator {
    fn generate(&self, request: &SourceRequest<'_>) -> Result<GeneratedSource, ResolveError> {
        let SourceRequest { name, base, extra_entries } = *request;
        let version = base.version.clone();

        let mut bundle = Bundle::new(name, version.clone());
        if let Some(root) = &base.root {
            bundle = bundle.with_location(root.join("source").join(name));
        }

        let mut feature = Feature::new(name, version.clone())
            .with_context_qualifier_length(base.context_qualifier_length)
            .with_properties(BuildProperties::from_iter([(BIN_INCLUDES, "feature.toml")]))
            .with_entry(FeatureEntry::plugin(name, version.to_string()));
        feature.filter = base.filter.clone();
        feature.root = bundle.location.clone();

        for raw in extra_entries {
            feature.entries.push(parse_extra_entry(raw)?);
        }

        Ok(GeneratedSource { feature, bundles: vec![bundle] })
    }
}

/// Parses `plugin@<id>[;version=<v>]` and `feature@<id>[;version=<v>]`.
fn parse_extra_entry(raw: &str) -> Result<FeatureEntry, ResolveError> {
    let mut parts = raw.split(';').map(str::trim);
    let head = parts.next().unwrap_or_default();

    let mut version = ANY_VERSION;
    for attribute in parts {
        if let Some(value) = attribute.strip_prefix("version=") {
            version = value.trim();
        }
    }

    if let Some(id) = head.strip_prefix(PLUGIN_PREFIX).filter(|id| !id.is_empty()) {
        return Ok(FeatureEntry::plugin(id, version));
    }
    if let Some(id) = head.strip_prefix(FEATURE_PREFIX).filter(|id| !id.is_empty()) {
        return Ok(FeatureEntry::feature(id, version));
    }

    Err(ResolveError::Generation {
        message: Cow::Owned(format!("unsupported source entry '{raw}'")),
        context: None,
    })
}
