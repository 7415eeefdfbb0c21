use pbuild_director::*;
use pbuild_domain::properties::{BIN_INCLUDES, GENERATE_FEATURE_PREFIX};
use pbuild_domain::{
    BuildProperties, Config, Feature, FeatureEntry, FeatureKey, GenerationFlags, PlatformFilter, Version,
};
use pbuild_kernel::context::{BuildContext, CancellationToken};
use pbuild_qualifier::QualifierSynthesizer;
use pbuild_resolver::{Bundle, InMemoryRegistry, ResolvedComponent};

fn version(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn packaged() -> BuildProperties {
    BuildProperties::from_iter([(BIN_INCLUDES, "feature.toml")])
}

fn all_stages() -> GenerationFlags {
    GenerationFlags::DEFAULT | GenerationFlags::INCLUDED_FEATURES | GenerationFlags::VERSION_SUFFIX
}

fn child() -> Feature {
    Feature::new("org.demo.child", version("2.0.0.v1"))
        .with_context_qualifier_length(Some(2))
        .with_properties(packaged())
        .with_entry(FeatureEntry::plugin("org.demo.b", "2.1.0.qualifier"))
}

fn parent() -> Feature {
    Feature::new("org.demo.parent", version("1.0.0.qualifier"))
        .with_context_qualifier_length(Some(9))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.child", "2.0.0.v1"))
        .with_entry(FeatureEntry::plugin("org.demo.a", "1.0.0.v1"))
}

fn registry() -> InMemoryRegistry {
    InMemoryRegistry::new()
        .with_bundle(Bundle::new("org.demo.a", version("1.0.0.v1")))
        .with_bundle(Bundle::new("org.demo.b", version("2.1.0.v2")))
        .with_bundle(Bundle::new("org.demo.linux", version("1.0.0.v1")))
        .with_feature(child())
        .with_feature(parent())
}

#[test]
fn nested_features_are_generated_before_their_parent() {
    let registry = registry();
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    let report = director.generate_root("org.demo.parent", "0.0.0", BuildContext::new()).unwrap();
    assert!(!report.cancelled);

    let emitter = director.emitter();
    assert_eq!(emitter.feature_ids(), ["org.demo.child", "org.demo.parent"]);
    assert_eq!(emitter.component_ids(), ["org.demo.b", "org.demo.a"]);

    let child_plan = &emitter.features[0];
    assert!(child_plan.version.qualifier.starts_with("v1-"));
    assert!(child_plan.qualifier_suffix.is_some());

    // The parent suffix was computed against the rewritten child.
    let expected = QualifierSynthesizer::default().synthesize(&parent(), director.site()).unwrap().unwrap();
    let parent_plan = &emitter.features[1];
    assert_eq!(parent_plan.qualifier_suffix.as_deref(), Some(expected.as_str()));
    assert_eq!(parent_plan.version.qualifier, format!("qualifier-{expected}"));
    assert_eq!(report.feature, Some(FeatureKey { id: parent_plan.id.clone(), version: parent_plan.version.clone() }));
}

#[test]
fn missing_optional_feature_is_absorbed() {
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.gone", "1.0.0").with_optional(true))
        .with_entry(FeatureEntry::feature("org.demo.child", "0.0.0"));
    let registry = registry().with_feature(root);
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    let report = director.generate_root("org.demo.root", "", BuildContext::new()).unwrap();

    assert_eq!(report.absorbed.len(), 1);
    assert_eq!(report.absorbed[0].entry.id, "org.demo.gone");
    assert_eq!(report.absorbed[0].parent.id, "org.demo.root");
    assert_eq!(report.problems.count(ABSORBED_OPTIONAL_FEATURE), 1);
    assert_eq!(director.emitter().feature_ids(), ["org.demo.child", "org.demo.root"]);
}

#[test]
fn missing_required_feature_aborts_the_run() {
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_entry(FeatureEntry::feature("org.demo.gone", "1.0.0"));
    let registry = registry().with_feature(root);
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    let err = director.generate_root("org.demo.root", "1.0.0", BuildContext::new()).unwrap_err();
    assert!(err.is_missing_feature());
    assert!(err.to_string().contains("org.demo.gone"));
    assert!(director.emitter().features.is_empty());
}

#[test]
fn missing_root_is_reported() {
    let registry = registry();
    let mut director = BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new());

    let err = director.generate_root("org.demo.nowhere", "", BuildContext::new()).unwrap_err();
    assert!(err.is_missing_feature());
}

#[test]
fn missing_required_plugin_is_not_absorbed() {
    let broken = Feature::new("org.demo.broken", version("1.0.0"))
        .with_entry(FeatureEntry::plugin("org.demo.nowhere", "1.0.0"));
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_entry(FeatureEntry::feature("org.demo.broken", "1.0.0").with_optional(true));
    let registry = registry().with_feature(broken).with_feature(root);
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    let err = director.generate_root("org.demo.root", "", BuildContext::new()).unwrap_err();
    assert!(!err.is_missing_feature());
    assert_eq!(err.code(), "resolve");
}

#[test]
fn components_are_emitted_once_per_run() {
    let linux_only = PlatformFilter { os: Some("linux".into()), ..PlatformFilter::any() };
    let one = Feature::new("org.demo.one", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::plugin("org.demo.a", "0.0.0"))
        .with_entry(FeatureEntry::plugin("org.demo.linux", "0.0.0").with_filter(linux_only));
    let two = Feature::new("org.demo.two", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::plugin("org.demo.a", "1.0.0.qualifier"))
        .with_entry(FeatureEntry::plugin("org.demo.b", "0.0.0"));
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.one", "0.0.0"))
        .with_entry(FeatureEntry::feature("org.demo.two", "0.0.0"));
    let registry = registry().with_feature(one).with_feature(two).with_feature(root);

    let win32 = Config::new("win32", "win32", "x86_64");
    let mut director = BuildDirector::new(&registry, vec![win32.clone()], RecordingEmitter::new())
        .with_flags(GenerationFlags::DEFAULT | GenerationFlags::INCLUDED_FEATURES);

    let report = director.generate_root("org.demo.root", "", BuildContext::new()).unwrap();

    let emitter = director.emitter();
    assert_eq!(emitter.component_ids(), ["org.demo.a", "org.demo.b"]);
    assert_eq!(emitter.components[0].entry.version, "0.0.0");
    assert_eq!(emitter.components[0].configs, [win32.clone()]);
    assert_eq!(report.emitted.len(), 2);

    let assembly = director.ledger().get(&win32).unwrap();
    let plugins: Vec<_> = assembly.plugins.iter().map(ToString::to_string).collect();
    assert_eq!(plugins, ["org.demo.a_1.0.0.v1", "org.demo.b_2.1.0.v2"]);
    assert_eq!(assembly.features.len(), 3);
}

#[test]
fn ledger_follows_binary_and_bin_includes() {
    let mut prebuilt = Feature::new("org.demo.prebuilt", version("1.0.0"))
        .with_entry(FeatureEntry::plugin("org.demo.a", "0.0.0"));
    prebuilt.binary = true;
    let bare = Feature::new("org.demo.bare", version("1.0.0")).with_entry(FeatureEntry::plugin("org.demo.b", "0.0.0"));
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.prebuilt", "0.0.0"))
        .with_entry(FeatureEntry::feature("org.demo.bare", "0.0.0"));
    let registry = registry().with_feature(prebuilt).with_feature(bare).with_feature(root);
    let mut director = BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new())
        .with_flags(GenerationFlags::DEFAULT | GenerationFlags::INCLUDED_FEATURES);

    let report = director.generate_root("org.demo.root", "", BuildContext::new()).unwrap();

    let assembly = director.ledger().get(&Config::generic()).unwrap();
    let features: Vec<_> = assembly.features.iter().map(|key| key.id.as_str()).collect();
    assert_eq!(features, ["org.demo.prebuilt", "org.demo.root"]);
    assert_eq!(assembly.plugins.len(), 2);

    assert_eq!(report.problems.count(MISSING_BUILD_PROPERTIES), 1);
    assert_eq!(report.problems.warnings().next().unwrap().subject, "org.demo.bare_1.0.0");
}

#[test]
fn missing_properties_can_be_ignored() {
    let bare = Feature::new("org.demo.bare", version("1.0.0")).with_entry(FeatureEntry::plugin("org.demo.b", "0.0.0"));
    let registry = registry().with_feature(bare);
    let mut director = BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new())
        .with_flags(GenerationFlags::DEFAULT | GenerationFlags::IGNORE_MISSING_PROPERTIES);

    let report = director.generate_root("org.demo.bare", "", BuildContext::new()).unwrap();
    assert!(report.problems.is_empty());
    assert!(director.ledger().get(&Config::generic()).unwrap().features.is_empty());
}

#[test]
fn shared_nested_feature_is_generated_once() {
    let shared = Feature::new("org.demo.shared", version("1.0.0.v3"))
        .with_context_qualifier_length(Some(2))
        .with_properties(packaged())
        .with_entry(FeatureEntry::plugin("org.demo.a", "0.0.0"));
    let left = Feature::new("org.demo.left", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.shared", "1.0.0.v3"));
    let right = Feature::new("org.demo.right", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.shared", "1.0.0.qualifier"));
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.left", "0.0.0"))
        .with_entry(FeatureEntry::feature("org.demo.right", "0.0.0"));
    let registry = registry().with_feature(shared).with_feature(left).with_feature(right).with_feature(root);
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    director.generate_root("org.demo.root", "", BuildContext::new()).unwrap();

    let emitter = director.emitter();
    assert_eq!(emitter.feature_ids(), ["org.demo.shared", "org.demo.left", "org.demo.right", "org.demo.root"]);
    let rewritten = &emitter.features[0].version.clone();
    assert!(rewritten.qualifier.starts_with("v3-"));

    let mut ctx = BuildContext::new();
    let again = director.generate(registry_feature(&registry, "org.demo.shared"), &mut ctx).unwrap();
    assert_eq!(&again.version, rewritten);
    assert_eq!(director.emitter().features.len(), 4);
}

#[test]
fn absorbed_feature_still_fails_a_required_reference() {
    let flaky = Feature::new("org.demo.flaky", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.gone", "1.0.0"));
    let user = Feature::new("org.demo.user", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.flaky", "1.0.0"));
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.flaky", "1.0.0").with_optional(true))
        .with_entry(FeatureEntry::feature("org.demo.user", "1.0.0"));
    let registry = registry().with_feature(flaky).with_feature(user).with_feature(root);
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    let err = director.generate_root("org.demo.root", "", BuildContext::new()).unwrap_err();

    assert!(err.is_missing_feature());
    assert!(err.to_string().contains("org.demo.gone"));
    assert_eq!(director.absorbed().len(), 1);
    assert_eq!(director.absorbed()[0].entry.id, "org.demo.flaky");
    assert!(director.emitter().features.is_empty());
}

#[test]
fn self_including_feature_is_generated_once() {
    let looped = Feature::new("org.demo.loop", version("1.0.0"))
        .with_properties(packaged())
        .with_entry(FeatureEntry::feature("org.demo.loop", "1.0.0"))
        .with_entry(FeatureEntry::plugin("org.demo.a", "0.0.0"));
    let registry = registry().with_feature(looped);
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    director.generate_root("org.demo.loop", "", BuildContext::new()).unwrap();

    assert_eq!(director.emitter().feature_ids(), ["org.demo.loop"]);
    assert_eq!(director.emitter().component_ids(), ["org.demo.a"]);
}

fn registry_feature(registry: &InMemoryRegistry, id: &str) -> Feature {
    registry.features().find(|f| f.id == id).cloned().unwrap()
}

#[test]
fn source_feature_is_generated_from_build_properties() {
    let sdk = Feature::new("org.demo.sdk", version("1.0.0.v5")).with_entry(FeatureEntry::plugin("org.demo.a", "0.0.0"));
    let properties = BuildProperties::from_iter([
        (BIN_INCLUDES.to_owned(), "feature.toml".to_owned()),
        (format!("{GENERATE_FEATURE_PREFIX}org.demo.sdk.source"), "org.demo.sdk, plugin@org.demo.b".to_owned()),
    ]);
    let root = Feature::new("org.demo.root", version("1.0.0"))
        .with_properties(properties)
        .with_entry(FeatureEntry::feature("org.demo.sdk", "0.0.0"))
        .with_entry(FeatureEntry::feature("org.demo.sdk.source", "0.0.0"));
    let registry = registry().with_feature(sdk).with_feature(root);
    let mut director = BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new())
        .with_flags(GenerationFlags::DEFAULT | GenerationFlags::INCLUDED_FEATURES);

    let report = director.generate_root("org.demo.root", "", BuildContext::new()).unwrap();

    let emitter = director.emitter();
    assert_eq!(emitter.feature_ids(), ["org.demo.sdk", "org.demo.sdk.source", "org.demo.root"]);
    assert_eq!(emitter.component_ids(), ["org.demo.a", "org.demo.sdk.source", "org.demo.b"]);
    assert!(!emitter.components[1].binary);
    assert_eq!(emitter.components[1].version, version("1.0.0.v5"));

    // The generated feature declares bin.includes, the sdk declares no properties.
    let assembly = director.ledger().get(&Config::generic()).unwrap();
    assert!(assembly.features.iter().any(|key| key.id == "org.demo.sdk.source"));
    assert_eq!(report.problems.count(MISSING_BUILD_PROPERTIES), 1);
}

#[test]
fn cancelled_run_still_reports() {
    let registry = registry();
    let token = CancellationToken::new();
    token.cancel();
    let mut director =
        BuildDirector::new(&registry, Vec::new(), RecordingEmitter::new()).with_flags(all_stages());

    let report = director.generate_root("org.demo.parent", "", BuildContext::with_cancellation(token)).unwrap();
    assert!(report.cancelled);
    assert!(report.feature.is_none());
    assert!(report.emitted.is_empty());
    assert!(director.emitter().features.is_empty());
}

/// Cancels the run from inside the first emission.
#[derive(Debug)]
struct CancellingEmitter {
    token: CancellationToken,
    inner: RecordingEmitter,
}

impl ScriptEmitter for CancellingEmitter {
    fn emit_component(
        &mut self,
        component: &ResolvedComponent,
        entry: &FeatureEntry,
        configs: &[Config],
    ) -> Result<(), DirectorError> {
        self.token.cancel();
        self.inner.emit_component(component, entry, configs)
    }

    fn emit_feature(&mut self, feature: &Feature, configs: &[Config]) -> Result<(), DirectorError> {
        self.inner.emit_feature(feature, configs)
    }
}

#[test]
fn cancellation_stops_between_components() {
    let wide = Feature::new("org.demo.wide", version("1.0.0"))
        .with_entry(FeatureEntry::plugin("org.demo.a", "0.0.0"))
        .with_entry(FeatureEntry::plugin("org.demo.b", "0.0.0"));
    let registry = registry().with_feature(wide);
    let token = CancellationToken::new();
    let emitter = CancellingEmitter { token: token.clone(), inner: RecordingEmitter::new() };
    let mut director = BuildDirector::new(&registry, Vec::new(), emitter);

    let report = director.generate_root("org.demo.wide", "", BuildContext::with_cancellation(token)).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.emitted.len(), 1);
    assert_eq!(director.emitter().inner.component_ids(), ["org.demo.a"]);
    assert!(director.emitter().inner.features.is_empty());
}

#[test]
fn plan_emitter_writes_json_plans() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry();
    let settings = PlanSettings { dev_entries: vec!["bin".into()], nl: Some("en_US".into()) };
    let emitter = PlanEmitter::new(dir.path()).with_settings(settings);
    let mut director = BuildDirector::new(&registry, Vec::new(), emitter).with_flags(all_stages());

    director.generate_root("org.demo.parent", "", BuildContext::new()).unwrap();

    let (mut emitter, ledger) = director.into_parts();
    assert_eq!(emitter.written().len(), 4);

    let assembly = emitter.write_assembly(&ledger).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(assembly).unwrap()).unwrap();
    assert_eq!(json["*,*,*"]["plugins"].as_array().unwrap().len(), 2);
    assert_eq!(json["*,*,*"]["features"].as_array().unwrap().len(), 2);

    let plan = dir.path().join("plugins").join("org.demo.a_1.0.0.v1").join(PLAN_FILE);
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(plan).unwrap()).unwrap();
    assert_eq!(json["id"], "org.demo.a");
    assert_eq!(json["nl"], "en_US");
    assert_eq!(json["dev_entries"][0], "bin");
    assert_eq!(json["configs"][0], "*,*,*");

    let features = std::fs::read_dir(dir.path().join("features")).unwrap().count();
    assert_eq!(features, 2);
}
