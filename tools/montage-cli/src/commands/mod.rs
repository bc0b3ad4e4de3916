pub mod build;
pub mod call;
pub mod checkpoint;
pub mod compose;
pub mod history;
pub mod import;
pub mod info;
pub mod init;
pub mod relink;
pub mod replace;
pub mod tools;

use std::path::Path;

use serde::de::DeserializeOwned;

use montage_cli::{DiskFacade, ProjectDir, ToolError, ToolResponse};
use montage_common::config::AppConfig;

/// Run `f` against the project at `path`, then write the editor state back.
///
/// State is written even when `f` fails: a halted composition leaves
/// committed work in the editor, and the file must match it.
fn with_project<T>(
    path: &Path,
    config: &AppConfig,
    f: impl FnOnce(&mut DiskFacade) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let dir =
        ProjectDir::open(path).map_err(|e| anyhow::anyhow!("Failed to open project: {e}"))?;
    let mut facade = dir
        .load(config)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    let outcome = f(&mut facade);
    dir.persist(&facade)
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;
    outcome
}

/// Decode a successful response, or print the failure and bail.
fn into_result<T: DeserializeOwned>(response: ToolResponse) -> anyhow::Result<T> {
    if let Some(error) = response.error {
        print_error(&error);
        anyhow::bail!("{:?}: {}", error.kind, error.message);
    }
    let value = response
        .result
        .ok_or_else(|| anyhow::anyhow!("tool returned no result"))?;
    Ok(serde_json::from_value(value)?)
}

fn print_error(error: &ToolError) {
    eprintln!("Failed ({:?}): {}", error.kind, error.message);
    if let Some(step) = &error.failed_step {
        eprintln!("  Failed step: {step}");
    }
    let Some(committed) = &error.committed else {
        return;
    };
    let count = |v: &serde_json::Value| v.as_array().map_or(0, Vec::len);
    // Import-aware tools report {"imports": [...], "ops": [...]}.
    let (imports, ops) = match committed.get("ops") {
        Some(ops) => (committed.get("imports").map_or(0, count), count(ops)),
        None => (0, count(committed)),
    };
    if imports > 0 {
        eprintln!("  Imported before the failure: {imports} media");
    }
    if ops > 0 {
        eprintln!("  Committed before the failure: {ops} step(s)");
    }
    if imports + ops > 0 {
        eprintln!("  Nothing was rolled back; undo or restore a checkpoint to revert.");
    }
}
