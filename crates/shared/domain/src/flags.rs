use crate::config::GenerationConfig;
use bitflags::bitflags;

bitflags! {
    /// Which stages of a generation run are enabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GenerationFlags: u32 {
        /// Recurse into included features.
        const INCLUDED_FEATURES = 1 << 0;
        /// Resolve the plugin entries of each feature.
        const PLUGINS = 1 << 1;
        /// Rewrite feature versions with a generated qualifier suffix.
        const VERSION_SUFFIX = 1 << 2;
        /// Emit build scripts through the script emitter.
        const SCRIPTS = 1 << 3;
        /// Emit per-plugin build units (as opposed to the feature script only).
        const BINARY_PLUGINS = 1 << 4;
        /// A feature without build properties is not worth a warning.
        const IGNORE_MISSING_PROPERTIES = 1 << 5;

        const DEFAULT = Self::PLUGINS.bits() | Self::SCRIPTS.bits() | Self::BINARY_PLUGINS.bits();
    }
}

impl Default for GenerationFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&str> for GenerationFlags {
    fn from(s: &str) -> Self {
        match s.trim() {
            "features" | "included-features" => Self::INCLUDED_FEATURES,
            "plugins" => Self::PLUGINS,
            "qualifier" | "version-suffix" => Self::VERSION_SUFFIX,
            "scripts" => Self::SCRIPTS,
            "binary-plugins" => Self::BINARY_PLUGINS,
            "ignore-missing-properties" => Self::IGNORE_MISSING_PROPERTIES,
            "all" | "*" => Self::all(),
            _ => Self::empty(),
        }
    }
}

impl From<&GenerationConfig> for GenerationFlags {
    fn from(config: &GenerationConfig) -> Self {
        let mut flags = Self::empty();
        flags.set(Self::INCLUDED_FEATURES, config.included_features);
        flags.set(Self::PLUGINS, config.plugins);
        flags.set(Self::VERSION_SUFFIX, config.version_suffix);
        flags.set(Self::SCRIPTS, config.scripts);
        flags.set(Self::BINARY_PLUGINS, config.binary_plugins);
        flags.set(Self::IGNORE_MISSING_PROPERTIES, config.ignore_missing_properties);
        flags
    }
}
