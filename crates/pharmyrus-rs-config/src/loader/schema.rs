//! Schema validation for Pharmyrus JSON5 configuration layers.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "intent", "session"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("intent") {
        validate_intent(value, layer, "intent")?;
    }
    if let Some(value) = map.get("session") {
        validate_session(value, layer, "session")?;
    }
    Ok(())
}

/// Validate the "intent" block.
fn validate_intent(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["backend", "path", "default_scope", "remote"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("backend") {
        let backend_path = join_path(path, "backend");
        let Some(backend) = value.as_str() else {
            return Err(invalid_field(layer, &backend_path, "expected string"));
        };
        if !matches!(backend, "ephemeral" | "session" | "remote") {
            return Err(invalid_field(layer, &backend_path, "invalid intent backend"));
        }
    }
    if let Some(value) = map.get("path") {
        expect_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("default_scope") {
        validate_string_array(value, layer, &join_path(path, "default_scope"))?;
    }
    if let Some(value) = map.get("remote") {
        validate_remote(value, layer, &join_path(path, "remote"))?;
    }
    Ok(())
}

/// Validate remote document store settings.
fn validate_remote(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "base_url",
            "api_token",
            "field",
            "timeout_ms",
            "max_conflict_retries",
        ],
        layer,
        path,
    )?;
    for key in ["base_url", "api_token", "field"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    for key in ["timeout_ms", "max_conflict_retries"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_session(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["path"], layer, path)?;
    if let Some(value) = map.get("path") {
        expect_string(value, layer, &join_path(path, "path"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid_field(layer, path, "expected object"))
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value {
        Value::String(_) => Ok(()),
        _ => Err(invalid_field(layer, path, "expected string")),
    }
}

/// Expect a non-negative integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Some(entries) = value.as_array() else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    match entries.iter().position(|entry| !entry.is_string()) {
        Some(idx) => Err(invalid_field(
            layer,
            &format!("{path}[{idx}]"),
            "expected string",
        )),
        None => Ok(()),
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
