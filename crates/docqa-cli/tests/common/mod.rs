//! Shared test utilities for docqa-cli integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Get a Command for the docqa binary, with no ambient configuration.
///
/// # Panics
///
/// Panics if the docqa binary cannot be found.
#[allow(deprecated)]
pub fn docqa_cmd() -> Command {
    let mut cmd = Command::cargo_bin("docqa").expect("docqa binary should exist");
    cmd.env_remove("DOCQA_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Write an offline config (hashed embeddings, fallback generation, jsonl
/// index and sessions) under `dir` and return its path.
pub fn write_offline_config(dir: &Path) -> PathBuf {
    let yaml = format!(
        "generation:\n  provider: fallback\n\
         embedding:\n  provider: hashed\n  dimension: 384\n\
         index:\n  backend: jsonl\n  dir: {}\n\
         chunking:\n  chunkSize: 120\n  chunkOverlap: 0\n\
         session:\n  backend: jsonl\n  dir: {}\n",
        dir.join("index").display(),
        dir.join("sessions").display()
    );
    let path = dir.join("config.yaml");
    fs::write(&path, yaml).expect("write config");
    path
}
