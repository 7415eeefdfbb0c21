use crate::platform::Config;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Default maximum length of a generated qualifier suffix.
pub const DEFAULT_MAX_GENERATED_LENGTH: usize = 28;

/// Top-level generator configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfigInner {
    pub generation: GenerationConfig,
    pub qualifier: QualifierConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into the slices.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(flatten, default)]
    inner: Arc<GeneratorConfigInner>,
}

impl Deref for GeneratorConfig {
    type Target = GeneratorConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for GeneratorConfig {
    fn deref_mut(&mut self) -> &mut GeneratorConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Stages of a generation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub included_features: bool,
    pub plugins: bool,
    pub scripts: bool,
    pub version_suffix: bool,
    pub binary_plugins: bool,
    pub ignore_missing_properties: bool,
}

/// Global qualifier settings; per-feature build properties take precedence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualifierConfig {
    /// `None` keeps every qualifier character significant.
    pub significant_digits: Option<usize>,
    pub max_generated_length: usize,
}

/// Where features come from and what they are built for.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub install: PathBuf,
    /// Requested configurations; empty means the generic `*,*,*` configuration.
    pub configs: Vec<Config>,
    pub nl: Option<String>,
    /// Replaces the `qualifier` placeholder of feature versions when set.
    pub build_stamp: Option<String>,
    pub dev_entries: Vec<String>,
}

impl SiteConfig {
    /// The configurations to build for, never empty.
    #[must_use]
    pub fn effective_configs(&self) -> Vec<Config> {
        if self.configs.is_empty() { vec![Config::generic()] } else { self.configs.clone() }
    }
}

/// Emitted build plans.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// Build log file. Console output is always on; `-v` sets its level.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Writes `pbuild.log` into this directory when set.
    pub directory: Option<PathBuf>,
    pub json: bool,
    /// Module directives replacing `RUST_LOG` (e.g. `pbuild_director=debug`).
    pub filter: Option<String>,
    pub rotation: LogRotation,
    pub max_files: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Daily,
    Hourly,
    Minutely,
}

// --- Default ---

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            included_features: false,
            plugins: true,
            scripts: true,
            version_suffix: false,
            binary_plugins: true,
            ignore_missing_properties: false,
        }
    }
}

impl Default for QualifierConfig {
    fn default() -> Self {
        Self { significant_digits: None, max_generated_length: DEFAULT_MAX_GENERATED_LENGTH }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { directory: None, json: false, filter: None, rotation: LogRotation::Never, max_files: 5 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { directory: PathBuf::from("build-plans") }
    }
}
