//! Command handlers for `srk`.
//!
//! Shared utilities used by multiple command paths live here.
//! Reconciler-backed commands live in [`resource`]; offline ones in [`diff`].

pub mod diff;
pub mod resource;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use srk_cluster::{connect, CancelToken, ClusterHandle};
use srk_config::{load_layered_yaml, report_unused_keys, UnusedKeyPolicy};
use srk_schemas::ErrorKind;
use tracing::warn;

// ---------------------------------------------------------------------------
// Outcome + exit codes
// ---------------------------------------------------------------------------

/// JSON printed on stdout plus the error class that decides the exit code.
#[derive(Debug)]
pub struct Outcome {
    pub json: Value,
    pub error: Option<ErrorKind>,
}

impl Outcome {
    /// Exit code for failures outside any reconciler call (config, files).
    pub const FATAL_EXIT: u8 = 1;

    pub fn ok(json: Value) -> Self {
        Self { json, error: None }
    }

    pub fn failed(json: Value, kind: ErrorKind) -> Self {
        Self {
            json,
            error: Some(kind),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.error.map_or(0, exit_code_for)
    }

    pub fn emit(self) -> ExitCode {
        let text = serde_json::to_string_pretty(&self.json).unwrap_or_else(|_| self.json.to_string());
        println!("{text}");
        ExitCode::from(self.exit_code())
    }
}

/// 2 is left to clap for usage errors.
pub fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Fatal => 1,
        ErrorKind::NotFound => 3,
        ErrorKind::Unsupported => 4,
        ErrorKind::TransientRemote => 5,
        ErrorKind::Cancelled => 130,
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Read a JSON document from a file. Tolerates a UTF-8 BOM.
pub fn load_json_file(path: &str) -> Result<Value> {
    let bytes = fs::read(path).with_context(|| format!("read json file failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let raw = std::str::from_utf8(bytes).with_context(|| format!("{path} must be UTF-8 text"))?;
    serde_json::from_str(raw.trim()).with_context(|| format!("{path} must contain valid JSON"))
}

/// Load layered config, warn about keys nothing reads, and build the cluster
/// handle. With a pinned dialect this makes no network call.
pub fn connect_from(config_paths: &[String]) -> Result<ClusterHandle> {
    let refs: Vec<&str> = config_paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&refs)?;

    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &unused.unused_leaf_pointers {
        warn!(key = %pointer, "config key is not used");
    }

    let settings = loaded.cluster()?;
    connect(&settings, &CancelToken::new()).context("cluster connect failed")
}

// ---------------------------------------------------------------------------
// Simple commands
// ---------------------------------------------------------------------------

pub fn config_hash(paths: &[String]) -> Result<Outcome> {
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&refs)?;
    Ok(Outcome::ok(json!({
        "config_hash": loaded.config_hash,
        "config": loaded.config_json,
    })))
}

pub fn probe(config_paths: &[String]) -> Result<Outcome> {
    let handle = connect_from(config_paths)?;
    Ok(Outcome::ok(json!({ "dialect": handle.dialect() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_class_has_a_distinct_exit_code() {
        let codes: Vec<u8> = [
            ErrorKind::Fatal,
            ErrorKind::NotFound,
            ErrorKind::Unsupported,
            ErrorKind::TransientRemote,
            ErrorKind::Cancelled,
        ]
        .into_iter()
        .map(exit_code_for)
        .collect();
        assert_eq!(codes, vec![1, 3, 4, 5, 130]);
        assert_eq!(Outcome::ok(json!({})).exit_code(), 0);
    }

    #[test]
    fn json_file_tolerates_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        fs::write(&path, b"\xEF\xBB\xBF{\"a\": 1}\n").unwrap();
        let v = load_json_file(path.to_str().unwrap()).unwrap();
        assert_eq!(v, json!({"a": 1}));
    }
}
