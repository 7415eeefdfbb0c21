use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Binary inclusion list. A source feature without it contributes nothing to assembly.
pub const BIN_INCLUDES: &str = "bin.includes";
/// `generate.plugin@<id>`: generate source plugin `<id>` from the feature named first.
pub const GENERATE_PLUGIN_PREFIX: &str = "generate.plugin@";
/// `generate.feature@<id>`: generate source feature `<id>` from the feature named first.
pub const GENERATE_FEATURE_PREFIX: &str = "generate.feature@";
/// Number of qualifier characters that take part in suffix computation.
pub const SIGNIFICANT_VERSION_DIGITS: &str = "significantVersionDigits";
/// Maximum length of a generated qualifier suffix.
pub const GENERATED_VERSION_LENGTH: &str = "generatedVersionLength";

/// Key/value build settings attached to one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildProperties(BTreeMap<String, String>);

impl BuildProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn bin_includes(&self) -> Option<&str> {
        self.get(BIN_INCLUDES)
    }

    /// Extra entries for generating source plugin `plugin_id`; the first names the base feature.
    #[must_use]
    pub fn source_plugin(&self, plugin_id: &str) -> Option<Vec<String>> {
        self.get(&format!("{GENERATE_PLUGIN_PREFIX}{plugin_id}")).map(split_list)
    }

    /// Extra entries for generating source feature `feature_id`; the first names the base feature.
    #[must_use]
    pub fn source_feature(&self, feature_id: &str) -> Option<Vec<String>> {
        self.get(&format!("{GENERATE_FEATURE_PREFIX}{feature_id}")).map(split_list)
    }

    /// A strictly positive integer setting. Absent, unparsable and `< 1` values are `None`.
    #[must_use]
    pub fn positive_int(&self, key: &str) -> Option<usize> {
        self.get(key)?.trim().parse::<usize>().ok().filter(|value| *value >= 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for BuildProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Splits a comma-separated property value, dropping blanks.
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_int_ignores_invalid_values() {
        let props: BuildProperties = [
            (SIGNIFICANT_VERSION_DIGITS, "3"),
            (GENERATED_VERSION_LENGTH, "0"),
            ("other", "abc"),
        ]
        .into_iter()
        .collect();

        assert_eq!(props.positive_int(SIGNIFICANT_VERSION_DIGITS), Some(3));
        assert_eq!(props.positive_int(GENERATED_VERSION_LENGTH), None);
        assert_eq!(props.positive_int("other"), None);
        assert_eq!(props.positive_int("missing"), None);
    }

    #[test]
    fn source_generation_lists_are_split() {
        let props: BuildProperties =
            [("generate.plugin@org.demo.source", "org.demo.sdk, plugin@org.demo.doc,")]
                .into_iter()
                .collect();

        assert_eq!(
            props.source_plugin("org.demo.source"),
            Some(vec!["org.demo.sdk".to_owned(), "plugin@org.demo.doc".to_owned()])
        );
        assert_eq!(props.source_feature("org.demo.source"), None);
    }
}
