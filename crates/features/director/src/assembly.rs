//! What has to be packaged, per configuration.

use pbuild_domain::{Config, FeatureKey};
use pbuild_resolver::ComponentKey;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Features and plugins to package for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigAssembly {
    pub features: BTreeSet<FeatureKey>,
    pub plugins: BTreeSet<ComponentKey>,
}

/// Per-configuration accumulation. Additions are idempotent, nothing is ever removed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AssemblyLedger {
    configs: BTreeMap<Config, ConfigAssembly>,
}

impl AssemblyLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the feature was already recorded for `config`.
    pub fn add_feature(&mut self, config: Config, feature: FeatureKey) -> bool {
        self.configs.entry(config).or_default().features.insert(feature)
    }

    /// Returns `false` when the plugin was already recorded for `config`.
    pub fn add_plugin(&mut self, config: Config, plugin: ComponentKey) -> bool {
        self.configs.entry(config).or_default().plugins.insert(plugin)
    }

    #[must_use]
    pub fn get(&self, config: &Config) -> Option<&ConfigAssembly> {
        self.configs.get(config)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Config, &ConfigAssembly)> {
        self.configs.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbuild_domain::Version;

    #[test]
    fn additions_are_idempotent() {
        let mut ledger = AssemblyLedger::new();
        let linux = Config::new("linux", "gtk", "x86_64");
        let feature = FeatureKey { id: "org.demo.f".into(), version: Version::new(1, 0, 0, "") };
        let plugin = ComponentKey { id: "org.demo.a".into(), version: Version::new(1, 0, 0, "v1") };

        assert!(ledger.add_feature(linux.clone(), feature.clone()));
        assert!(!ledger.add_feature(linux.clone(), feature));
        assert!(ledger.add_plugin(linux.clone(), plugin.clone()));
        assert!(!ledger.add_plugin(linux.clone(), plugin));
        assert!(ledger.add_plugin(Config::generic(), ComponentKey { id: "org.demo.b".into(), version: Version::default() }));

        let assembly = ledger.get(&linux).unwrap();
        assert_eq!(assembly.features.len(), 1);
        assert_eq!(assembly.plugins.len(), 1);
        assert_eq!(ledger.iter().count(), 2);
    }
}
