//! Build script emission: the collaborator the director hands resolved units to.

use crate::assembly::AssemblyLedger;
use crate::error::{DirectorError, DirectorErrorExt};
use pbuild_domain::{Config, Feature, FeatureEntry, Version};
use pbuild_resolver::ResolvedComponent;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of every emitted plan.
pub const PLAN_FILE: &str = "build.json";
/// File name of the assembly ledger, next to the `plugins` and `features` directories.
pub const ASSEMBLY_FILE: &str = "assembly.json";

/// Consumes resolved units. Called at most once per component per run.
pub trait ScriptEmitter: fmt::Debug {
    /// # Errors
    /// Returns [`DirectorError`] when the build unit cannot be produced.
    fn emit_component(
        &mut self,
        component: &ResolvedComponent,
        entry: &FeatureEntry,
        configs: &[Config],
    ) -> Result<(), DirectorError>;

    /// # Errors
    /// Returns [`DirectorError`] when the feature script cannot be produced.
    fn emit_feature(&mut self, feature: &Feature, configs: &[Config]) -> Result<(), DirectorError>;
}

/// Everything needed to build one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentPlan {
    pub id: String,
    pub version: Version,
    pub binary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
    /// The entry whose filter selected `configs`.
    pub entry: FeatureEntry,
    pub configs: Vec<Config>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dev_entries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nl: Option<String>,
}

/// Everything needed to build and package one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeaturePlan {
    pub id: String,
    pub version: Version,
    pub binary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier_suffix: Option<String>,
    pub configs: Vec<Config>,
    pub plugins: Vec<FeatureEntry>,
    pub features: Vec<FeatureEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

/// Environment-wide settings copied into every component plan.
#[derive(Debug, Clone, Default)]
pub struct PlanSettings {
    pub dev_entries: Vec<String>,
    pub nl: Option<String>,
}

impl PlanSettings {
    fn component_plan(
        &self,
        component: &ResolvedComponent,
        entry: &FeatureEntry,
        configs: &[Config],
    ) -> ComponentPlan {
        let bundle = &component.bundle;
        ComponentPlan {
            id: bundle.id.clone(),
            version: bundle.version.clone(),
            binary: bundle.binary,
            location: bundle.location.clone(),
            entry: entry.clone(),
            configs: configs.to_vec(),
            dev_entries: self.dev_entries.clone(),
            nl: self.nl.clone(),
        }
    }
}

impl FeaturePlan {
    fn new(feature: &Feature, configs: &[Config]) -> Self {
        Self {
            id: feature.id.clone(),
            version: feature.version.clone(),
            binary: feature.binary,
            qualifier_suffix: feature.qualifier_suffix().map(str::to_owned),
            configs: configs.to_vec(),
            plugins: feature.plugin_entries().cloned().collect(),
            features: feature.included_features().cloned().collect(),
            root: feature.root.clone(),
        }
    }
}

/// Writes JSON plans to `<output>/plugins/<id>_<version>/build.json` and
/// `<output>/features/<id>_<version>/build.json`.
#[derive(Debug, Clone)]
pub struct PlanEmitter {
    output: PathBuf,
    settings: PlanSettings,
    written: Vec<PathBuf>,
}

impl PlanEmitter {
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self { output: output.into(), settings: PlanSettings::default(), written: Vec::new() }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: PlanSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Plans written so far, in emission order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Writes the per-configuration assembly ledger to `<output>/assembly.json`.
    ///
    /// # Errors
    /// Returns [`DirectorError::Io`] or [`DirectorError::Serialize`] when the file cannot be written.
    pub fn write_assembly(&mut self, ledger: &AssemblyLedger) -> Result<PathBuf, DirectorError> {
        fs::create_dir_all(&self.output).context(format!("creating {}", self.output.display()))?;

        let json = serde_json::to_string_pretty(ledger).context("assembly ledger")?;
        let path = self.output.join(ASSEMBLY_FILE);
        fs::write(&path, json).context(format!("writing {}", path.display()))?;

        debug!(path = %path.display(), "Wrote assembly ledger");
        self.written.push(path.clone());
        Ok(path)
    }

    fn write_plan<T: Serialize>(&mut self, kind: &str, name: &str, plan: &T) -> Result<(), DirectorError> {
        let dir = self.output.join(kind).join(name);
        fs::create_dir_all(&dir).context(format!("creating {}", dir.display()))?;

        let json = serde_json::to_string_pretty(plan).context(format!("plan of {name}"))?;
        let path = dir.join(PLAN_FILE);
        fs::write(&path, json).context(format!("writing {}", path.display()))?;

        debug!(path = %path.display(), "Wrote build plan");
        self.written.push(path);
        Ok(())
    }
}

impl ScriptEmitter for PlanEmitter {
    fn emit_component(
        &mut self,
        component: &ResolvedComponent,
        entry: &FeatureEntry,
        configs: &[Config],
    ) -> Result<(), DirectorError> {
        let plan = self.settings.component_plan(component, entry, configs);
        self.write_plan("plugins", &component.key().to_string(), &plan)
    }

    fn emit_feature(&mut self, feature: &Feature, configs: &[Config]) -> Result<(), DirectorError> {
        let plan = FeaturePlan::new(feature, configs);
        self.write_plan("features", &feature.key().to_string(), &plan)
    }
}

/// Keeps plans in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    pub settings: PlanSettings,
    pub components: Vec<ComponentPlan>,
    pub features: Vec<FeaturePlan>,
}

impl RecordingEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the emitted components, in emission order.
    #[must_use]
    pub fn component_ids(&self) -> Vec<&str> {
        self.components.iter().map(|plan| plan.id.as_str()).collect()
    }

    /// Ids of the emitted features, in emission order.
    #[must_use]
    pub fn feature_ids(&self) -> Vec<&str> {
        self.features.iter().map(|plan| plan.id.as_str()).collect()
    }
}

impl ScriptEmitter for RecordingEmitter {
    fn emit_component(
        &mut self,
        component: &ResolvedComponent,
        entry: &FeatureEntry,
        configs: &[Config],
    ) -> Result<(), DirectorError> {
        self.components.push(self.settings.component_plan(component, entry, configs));
        Ok(())
    }

    fn emit_feature(&mut self, feature: &Feature, configs: &[Config]) -> Result<(), DirectorError> {
        self.features.push(FeaturePlan::new(feature, configs));
        Ok(())
    }
}
