//! Features and the entries they declare.

use crate::error::DomainError;
use crate::platform::PlatformFilter;
use crate::properties::BuildProperties;
use crate::version::{Version, VersionSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The kind of a feature entry. Kinds are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Plugin,
    Feature,
    /// Import declaration. Never built, never resolved.
    Requires,
}

/// One declared entry of a feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureEntry {
    #[serde(default)]
    pub kind: EntryKind,
    pub id: String,
    /// Requested version text: exact, `0.0.0`, or ending in the `qualifier` placeholder.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub reexported: bool,
    #[serde(default, flatten)]
    pub filter: PlatformFilter,
}

impl FeatureEntry {
    fn new(kind: EntryKind, id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            version: version.into(),
            optional: false,
            reexported: false,
            filter: PlatformFilter::any(),
        }
    }

    #[must_use]
    pub fn plugin(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(EntryKind::Plugin, id, version)
    }

    #[must_use]
    pub fn feature(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(EntryKind::Feature, id, version)
    }

    #[must_use]
    pub fn requires(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(EntryKind::Requires, id, version)
    }

    #[must_use]
    pub const fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: PlatformFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Parses the requested version.
    ///
    /// # Errors
    /// Returns [`DomainError::MalformedVersion`] when the text is not a version request.
    pub fn version_spec(&self) -> Result<VersionSpec, DomainError> {
        VersionSpec::parse(&self.version)
    }

    #[must_use]
    pub fn is_plugin(&self) -> bool {
        self.kind == EntryKind::Plugin
    }

    #[must_use]
    pub fn is_feature(&self) -> bool {
        self.kind == EntryKind::Feature
    }
}

impl fmt::Display for FeatureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.version)
    }
}

/// Identity of a feature within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureKey {
    pub id: String,
    pub version: Version,
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.version)
    }
}

/// A named, versioned bundle of plugins and nested features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub version: Version,
    #[serde(default)]
    pub entries: Vec<FeatureEntry>,
    /// Pre-built feature: collected for assembly regardless of `bin.includes`.
    #[serde(default)]
    pub binary: bool,
    /// Leading qualifier characters fixed by the build context. `None` disables suffix generation.
    #[serde(default)]
    pub context_qualifier_length: Option<usize>,
    #[serde(default)]
    pub filter: PlatformFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BuildProperties>,
    #[serde(skip)]
    suffix: Option<String>,
}

impl Feature {
    #[must_use]
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            entries: Vec::new(),
            binary: false,
            context_qualifier_length: None,
            filter: PlatformFilter::any(),
            root: None,
            properties: None,
            suffix: None,
        }
    }

    #[must_use]
    pub fn with_entry(mut self, entry: FeatureEntry) -> Self {
        self.entries.push(entry);
        self
    }

    #[must_use]
    pub const fn with_context_qualifier_length(mut self, length: Option<usize>) -> Self {
        self.context_qualifier_length = length;
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: BuildProperties) -> Self {
        self.properties = Some(properties);
        self
    }

    #[must_use]
    pub fn key(&self) -> FeatureKey {
        FeatureKey { id: self.id.clone(), version: self.version.clone() }
    }

    /// Plugin entries in declaration order, regardless of platform filters.
    pub fn plugin_entries(&self) -> impl Iterator<Item = &FeatureEntry> {
        self.entries.iter().filter(|e| e.is_plugin())
    }

    /// Included feature entries in declaration order, regardless of platform filters.
    pub fn included_features(&self) -> impl Iterator<Item = &FeatureEntry> {
        self.entries.iter().filter(|e| e.is_feature())
    }

    pub fn imports(&self) -> impl Iterator<Item = &FeatureEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Requires)
    }

    /// The generated suffix installed by [`Feature::apply_qualifier_suffix`], if any.
    #[must_use]
    pub fn qualifier_suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Rewrites the qualifier to `<context part>-<suffix>`.
    ///
    /// The version is rewritten at most once: returns `false` and leaves the feature untouched
    /// when a suffix was already applied or suffix generation is disabled for this feature.
    pub fn apply_qualifier_suffix(&mut self, suffix: &str) -> bool {
        if self.suffix.is_some() {
            return false;
        }
        let Some(context_length) = self.context_qualifier_length else {
            return false;
        };

        let qualifier = &self.version.qualifier;
        let context = qualifier.get(..context_length).unwrap_or(qualifier);
        self.version = self.version.with_qualifier(format!("{context}-{suffix}"));
        self.suffix = Some(suffix.to_owned());
        true
    }
}
