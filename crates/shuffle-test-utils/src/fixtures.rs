//! Locations of files under `test-fixtures/`.

use shuffle_repo::Trace;
use std::fs;
use std::path::{Path, PathBuf};

/// Root of the workspace checkout.
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Path of `test-fixtures/traces/<name>.toml`.
pub fn trace_path(name: &str) -> PathBuf {
    workspace_root()
        .join("test-fixtures")
        .join("traces")
        .join(format!("{name}.toml"))
}

/// Path of `test-fixtures/rules/<name>.toml`.
pub fn rules_path(name: &str) -> PathBuf {
    workspace_root()
        .join("test-fixtures")
        .join("rules")
        .join(format!("{name}.toml"))
}

/// Names of every sample trace, sorted.
pub fn trace_names() -> Vec<String> {
    let dir = workspace_root().join("test-fixtures").join("traces");
    let mut names: Vec<String> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Could not read {}: {e}", dir.display()))
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

/// Load a sample trace by name.
///
/// # Panics
/// Panics if the trace is missing or malformed.
pub fn load_trace(name: &str) -> Trace {
    let path = trace_path(name);
    Trace::load(&path).unwrap_or_else(|e| panic!("Could not load {}: {e}", path.display()))
}
