use pbuild_domain::config::GeneratorConfig;
use pbuild_kernel::config::load_config;
use std::fs;

#[test]
fn settings_file_overrides_defaults() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("pbuild.toml");
    fs::write(
        &path,
        r#"
[generation]
included_features = true
version_suffix = true

[qualifier]
significant_digits = 3
max_generated_length = 20

[site]
install = "/opt/site"
configs = ["linux,gtk,x86_64"]
build_stamp = "v20240101"
"#,
    )
    .expect("write settings");

    let cfg: GeneratorConfig = load_config(Some(&path)).expect("settings load");
    assert!(cfg.generation.included_features);
    assert!(cfg.generation.version_suffix);
    assert!(cfg.generation.plugins);
    assert_eq!(cfg.qualifier.significant_digits, Some(3));
    assert_eq!(cfg.qualifier.max_generated_length, 20);
    assert_eq!(cfg.site.build_stamp.as_deref(), Some("v20240101"));
    assert_eq!(cfg.site.configs.len(), 1);
}

#[test]
fn missing_settings_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let err = load_config::<GeneratorConfig>(Some(tmp.path().join("absent.toml")))
        .expect_err("a named settings file must exist");
    assert_eq!(err.code(), "config");
}
