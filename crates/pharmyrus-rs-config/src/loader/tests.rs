//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options
}

#[test]
fn parse_minimal_config() {
    let config = PharmyrusConfig::load_from_str("{}").expect("config");
    assert_eq!(config.intent.backend, IntentBackendKind::Session);
    assert_eq!(config.intent.default_scope, vec!["BR".to_string()]);
    assert_eq!(config.intent.remote.field, "pendingSearch");
    assert_eq!(config.default_scope().codes(), ["BR"]);
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = PharmyrusConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_invalid_backend_name() {
    let err = PharmyrusConfig::load_from_str(r#"{ intent: { backend: "cookie" } }"#).unwrap_err();
    assert!(format!("{err}").contains("intent.backend"));
}

#[test]
fn remote_backend_requires_base_url() {
    let err = PharmyrusConfig::load_from_str(r#"{ intent: { backend: "remote" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::RemoteUrl { .. }));

    let err = PharmyrusConfig::load_from_str(
        r#"{ intent: { backend: "remote", remote: { base_url: "ftp://docs" } } }"#,
    )
    .unwrap_err();
    assert!(format!("{err}").contains("http(s)"));

    let config = PharmyrusConfig::load_from_str(
        r#"{ intent: { backend: "remote", remote: { base_url: "https://docs.example", timeout_ms: 2500 } } }"#,
    )
    .expect("config");
    assert_eq!(config.intent.remote.timeout_ms, 2500);
}

#[test]
fn rejects_invalid_default_scope() {
    let err = PharmyrusConfig::load_from_str(r#"{ intent: { default_scope: ["brazil"] } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("intent.default_scope"));

    let err =
        PharmyrusConfig::load_from_str(r#"{ intent: { default_scope: [] } }"#).unwrap_err();
    assert!(format!("{err}").contains("at least one region"));
}

#[test]
fn cwd_layer_overrides_project_and_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("user.json5");
    write_json5(
        &user_config,
        r#"{ intent: { backend: "ephemeral", default_scope: ["US"] } }"#,
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ intent: { path: "/project/intents" } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ intent: { backend: "session" } }"#,
    );

    let mut options = isolated_options(&cwd);
    options.user_config_path = Some(user_config);

    let layered = PharmyrusConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 3);
    assert_eq!(layered.config.intent.backend, IntentBackendKind::Session);
    assert_eq!(
        layered.config.intent.path,
        Some("/project/intents".to_string())
    );
    assert_eq!(layered.config.intent.default_scope, vec!["US".to_string()]);
}

#[test]
fn runtime_override_is_applied_last() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();

    let system_config = root.join("system.json5");
    write_json5(
        &system_config,
        r#"{ intent: { remote: { base_url: "https://system.example", field: "pending" } } }"#,
    );
    let runtime_config = root.join("runtime.json5");
    write_json5(
        &runtime_config,
        r#"{ intent: { backend: "remote", remote: { base_url: "https://runtime.example" } } }"#,
    );

    let mut options = isolated_options(root).with_runtime_path(&runtime_config);
    options.system_config_path = Some(system_config);

    let layered = PharmyrusConfig::load_layered_with_options(options).expect("layered");
    let remote = &layered.config.intent.remote;
    assert_eq!(layered.config.intent.backend, IntentBackendKind::Remote);
    assert_eq!(remote.base_url, Some("https://runtime.example".to_string()));
    assert_eq!(remote.field, "pending");
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Runtime)
    );
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = isolated_options(temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    let err = PharmyrusConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn project_root_equal_to_cwd_loads_once() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    fs::create_dir_all(root.join(".git")).expect("git");
    write_json5(
        &root.join(DEFAULT_CONFIG_FILE),
        r#"{ session: { path: "/tmp/session.json" } }"#,
    );

    let layered =
        PharmyrusConfig::load_layered_with_options(isolated_options(root)).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Project);
    assert_eq!(
        layered.config.session.path,
        Some("/tmp/session.json".to_string())
    );
}

#[test]
fn layer_schema_errors_name_the_layer() {
    let temp = TempDir::new().expect("tmp");
    let runtime = temp.path().join("runtime.json5");
    write_json5(&runtime, r#"{ intent: { remote: { timeout_ms: "fast" } } }"#);
    let options = isolated_options(temp.path()).with_runtime_path(&runtime);
    let err = PharmyrusConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("runtime("));
    assert!(msg.contains("intent.remote.timeout_ms"));
}
