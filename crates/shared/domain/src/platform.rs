//! Target platform configurations and the filters entries use to select them.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ANY: &str = "*";

/// A target platform tuple. `*` on an axis means "any".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Config {
    pub os: String,
    pub ws: String,
    pub arch: String,
}

impl Config {
    #[must_use]
    pub fn new(os: impl Into<String>, ws: impl Into<String>, arch: impl Into<String>) -> Self {
        Self { os: os.into(), ws: ws.into(), arch: arch.into() }
    }

    /// The platform independent configuration `*,*,*`.
    #[must_use]
    pub fn generic() -> Self {
        Self::new(ANY, ANY, ANY)
    }

    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.os == ANY && self.ws == ANY && self.arch == ANY
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::generic()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.os, self.ws, self.arch)
    }
}

impl FromStr for Config {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [os, ws, arch] if !os.is_empty() && !ws.is_empty() && !arch.is_empty() => {
                Ok(Self::new(*os, *ws, *arch))
            },
            _ => Err(DomainError::MalformedConfig { input: s.to_owned(), context: None }),
        }
    }
}

impl TryFrom<String> for Config {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Config> for String {
    fn from(value: Config) -> Self {
        value.to_string()
    }
}

/// Comma-separated lists of accepted values per axis. An absent axis accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl PlatformFilter {
    /// A filter that accepts every configuration.
    #[must_use]
    pub const fn any() -> Self {
        Self { os: None, ws: None, arch: None }
    }

    #[must_use]
    pub fn matches(&self, config: &Config) -> bool {
        axis_matches(self.os.as_deref(), &config.os)
            && axis_matches(self.ws.as_deref(), &config.ws)
            && axis_matches(self.arch.as_deref(), &config.arch)
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.os.is_none() && self.ws.is_none() && self.arch.is_none()
    }
}

fn axis_matches(accepted: Option<&str>, value: &str) -> bool {
    let Some(accepted) = accepted.filter(|a| !a.trim().is_empty()) else {
        return true;
    };
    value == ANY || accepted.split(',').map(str::trim).any(|candidate| candidate == value)
}

/// Returns the requested configurations accepted by `filter`, in request order.
#[must_use]
pub fn select_configs(filter: &PlatformFilter, configs: &[Config]) -> Vec<Config> {
    configs.iter().filter(|config| filter.matches(config)).cloned().collect()
}
