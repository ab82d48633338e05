//! Argument extraction helpers shared by every tool handler: pull a typed
//! field out of the `arguments` JSON object with a remediation-bearing
//! error message on a missing or mistyped field, rather than panicking on
//! an `unwrap`.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

pub fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("missing required string argument '{key}'"))
}

pub fn require_path(args: &Value, key: &str) -> Result<PathBuf> {
    require_str(args, key).map(PathBuf::from)
}

pub fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub fn opt_bool(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub fn opt_u64(args: &Value, key: &str, default: u64) -> u64 {
    args.get(key).and_then(Value::as_u64).unwrap_or(default)
}

pub fn opt_usize(args: &Value, key: &str, default: usize) -> usize {
    opt_u64(args, key, default as u64) as usize
}

pub fn opt_i64(args: &Value, key: &str, default: i64) -> i64 {
    args.get(key).and_then(Value::as_i64).unwrap_or(default)
}

pub fn require_i64(args: &Value, key: &str) -> Result<i64> {
    args.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("missing required integer argument '{key}'"))
}

pub fn require_usize(args: &Value, key: &str) -> Result<usize> {
    require_i64(args, key).map(|n| n as usize)
}

/// Deserialize a required array field into `Vec<T>`, giving a field-scoped
/// error message rather than a bare serde one.
pub fn require_array<T: serde::de::DeserializeOwned>(args: &Value, key: &str) -> Result<Vec<T>> {
    let raw = args
        .get(key)
        .ok_or_else(|| anyhow!("missing required array argument '{key}'"))?;
    serde_json::from_value(raw.clone()).with_context(|| format!("argument '{key}' is malformed"))
}

/// Deserialize the whole arguments object into `T`, for tools (like
/// `batch_operations`) whose shape is easier to express as a struct than
/// field-by-field.
pub fn require_object<T: serde::de::DeserializeOwned>(args: &Value) -> Result<T> {
    serde_json::from_value(args.clone()).context("arguments do not match the expected shape")
}
