//! Loads a registry from an install location.
//!
//! Every `feature.toml` and `bundle.toml` below the location is read. A feature descriptor
//! looks like:
//!
//! ```toml
//! id = "org.demo.feature"
//! version = "1.0.0.qualifier"
//! os = "linux,win32"
//!
//! [[entries]]
//! kind = "plugin"
//! id = "org.demo.core"
//! version = "1.0.0.qualifier"
//!
//! [properties]
//! "bin.includes" = "feature.toml"
//! ```

use crate::error::{ResolveError, ResolveErrorExt};
use crate::registry::{Bundle, InMemoryRegistry};
use pbuild_domain::{BuildProperties, Feature, FeatureEntry, PlatformFilter, QUALIFIER_TOKEN, Version};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const FEATURE_DESCRIPTOR: &str = "feature.toml";
pub const BUNDLE_DESCRIPTOR: &str = "bundle.toml";

#[derive(Debug, Deserialize)]
struct FeatureDescriptor {
    id: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    binary: bool,
    /// `-1` disables suffix generation for the feature.
    #[serde(default)]
    context_qualifier_length: Option<i64>,
    #[serde(default)]
    entries: Vec<FeatureEntry>,
    #[serde(default)]
    properties: Option<BuildProperties>,
    #[serde(default, flatten)]
    filter: PlatformFilter,
}

#[derive(Debug, Deserialize)]
struct BundleDescriptor {
    id: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    binary: bool,
}

/// Reads feature and bundle descriptors, replacing the `qualifier` placeholder of their
/// versions with the build stamp when one is configured.
#[derive(Debug, Clone, Default)]
pub struct SiteLoader {
    build_stamp: Option<String>,
}

impl SiteLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_build_stamp(mut self, stamp: Option<String>) -> Self {
        self.build_stamp = stamp.filter(|s| !s.is_empty());
        self
    }

    /// Walks `install` and collects every descriptor into a fresh registry.
    ///
    /// # Errors
    /// * [`ResolveError::Walk`] when the location cannot be traversed.
    /// * [`ResolveError::Io`] / [`ResolveError::Descriptor`] for unreadable descriptors.
    /// * [`ResolveError::MalformedVersion`] for descriptor versions that do not parse.
    pub fn load(&self, install: impl AsRef<Path>) -> Result<InMemoryRegistry, ResolveError> {
        let mut registry = InMemoryRegistry::new();
        self.load_into(install, &mut registry)?;
        Ok(registry)
    }

    /// Like [`SiteLoader::load`], adding to an existing registry.
    ///
    /// # Errors
    /// See [`SiteLoader::load`].
    pub fn load_into(
        &self,
        install: impl AsRef<Path>,
        registry: &mut InMemoryRegistry,
    ) -> Result<(), ResolveError> {
        let install = install.as_ref();
        info!(install = %install.display(), "Loading site");

        for entry in WalkDir::new(install).follow_links(true).sort_by_file_name() {
            let entry = entry.context(Cow::Owned(install.display().to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            match entry.file_name().to_str() {
                Some(FEATURE_DESCRIPTOR) => registry.add_feature(self.read_feature(entry.path())?),
                Some(BUNDLE_DESCRIPTOR) => registry.add_bundle(self.read_bundle(entry.path())?),
                _ => {},
            }
        }

        info!(
            features = registry.feature_count(),
            plugins = registry.bundle_count(),
            "Site loaded"
        );
        Ok(())
    }

    /// Reads one `feature.toml`. The containing directory becomes the feature root.
    ///
    /// # Errors
    /// See [`SiteLoader::load`].
    pub fn read_feature(&self, path: &Path) -> Result<Feature, ResolveError> {
        let descriptor: FeatureDescriptor = read_descriptor(path)?;
        let (version, placeholder_length) = self.stamp_version(&descriptor.version)?;

        let context_qualifier_length = match descriptor.context_qualifier_length {
            Some(length) => usize::try_from(length).ok(),
            None => placeholder_length,
        };

        let mut feature = Feature::new(descriptor.id, version)
            .with_context_qualifier_length(context_qualifier_length);
        feature.entries = descriptor.entries;
        feature.binary = descriptor.binary;
        feature.filter = descriptor.filter;
        feature.properties = descriptor.properties;
        feature.root = path.parent().map(Path::to_path_buf);

        debug!(feature = %feature.id, version = %feature.version, "Read feature descriptor");
        Ok(feature)
    }

    /// Reads one `bundle.toml`. The containing directory becomes the bundle location.
    ///
    /// # Errors
    /// See [`SiteLoader::load`].
    pub fn read_bundle(&self, path: &Path) -> Result<Bundle, ResolveError> {
        let descriptor: BundleDescriptor = read_descriptor(path)?;
        let (version, _) = self.stamp_version(&descriptor.version)?;

        let mut bundle = Bundle::new(descriptor.id, version).with_binary(descriptor.binary);
        if let Some(parent) = path.parent() {
            bundle = bundle.with_location(parent);
        }

        debug!(plugin = %bundle.id, version = %bundle.version, "Read bundle descriptor");
        Ok(bundle)
    }

    /// Parses a descriptor version. For the `qualifier` placeholder also returns the length of
    /// the context part: the stamp length when stamped, the placeholder length otherwise.
    fn stamp_version(&self, text: &str) -> Result<(Version, Option<usize>), ResolveError> {
        let version = Version::parse(text)?;
        if version.qualifier != QUALIFIER_TOKEN {
            return Ok((version, None));
        }

        Ok(match &self.build_stamp {
            Some(stamp) => (version.with_qualifier(stamp.as_str()), Some(stamp.len())),
            None => (version, Some(QUALIFIER_TOKEN.len())),
        })
    }
}

fn read_descriptor<T: DeserializeOwned>(path: &Path) -> Result<T, ResolveError> {
    let content = fs::read_to_string(path).context(Cow::Owned(path.display().to_string()))?;
    toml::from_str(&content).context(Cow::Owned(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_replaced_by_the_stamp() {
        let loader = SiteLoader::new().with_build_stamp(Some("v20240101".to_owned()));
        let (version, length) = loader.stamp_version("1.0.0.qualifier").unwrap();
        assert_eq!(version.to_string(), "1.0.0.v20240101");
        assert_eq!(length, Some(9));

        let (version, length) = loader.stamp_version("1.0.0.v1").unwrap();
        assert_eq!(version.to_string(), "1.0.0.v1");
        assert_eq!(length, None);
    }

    #[test]
    fn placeholder_is_kept_without_a_stamp() {
        let (version, length) = SiteLoader::new().stamp_version("2.0.0.qualifier").unwrap();
        assert_eq!(version.qualifier, QUALIFIER_TOKEN);
        assert_eq!(length, Some(QUALIFIER_TOKEN.len()));
    }
}
