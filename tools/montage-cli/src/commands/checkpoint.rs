//! Save, restore, and list checkpoints.

use std::path::PathBuf;

use montage_checkpoint::{Checkpoint, CheckpointId, RestoreResult};
use montage_cli::facade::{CheckpointRestoreArgs, CheckpointSaveArgs};
use montage_cli::ToolRequest;
use montage_common::config::AppConfig;

pub fn save(path: PathBuf, label: String, config: &AppConfig) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        let response = facade.call(ToolRequest::CheckpointSave(CheckpointSaveArgs { label }));
        let checkpoint: Checkpoint = super::into_result(response)?;
        println!(
            "Saved {} '{}' ({} bytes)",
            checkpoint.id, checkpoint.label, checkpoint.size_bytes
        );
        Ok(())
    })
}

pub fn restore(
    path: PathBuf,
    id: Option<String>,
    label: Option<String>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let id = id
        .map(|s| s.parse::<CheckpointId>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    super::with_project(&path, config, |facade| {
        let response =
            facade.call(ToolRequest::CheckpointRestore(CheckpointRestoreArgs { id, label }));
        let restored: RestoreResult = super::into_result(response)?;
        println!(
            "Restored {} '{}'",
            restored.checkpoint.id, restored.checkpoint.label
        );
        match (restored.clips, restored.transitions, restored.markers) {
            (Some(clips), Some(transitions), Some(markers)) => {
                println!("  Clips: {clips}");
                println!("  Transitions: {transitions}");
                println!("  Markers: {markers}");
            }
            _ => println!("  (project could not be read back; run `montage info` to check)"),
        }
        Ok(())
    })
}

pub fn list(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        let checkpoints = facade.checkpoints().list();
        if checkpoints.is_empty() {
            println!("No checkpoints.");
            return Ok(());
        }
        println!("Checkpoints:");
        for c in checkpoints {
            println!(
                "  {}  {}  {:>8} B  {}",
                c.id,
                c.created_at.format("%Y-%m-%d %H:%M:%S"),
                c.size_bytes,
                c.label
            );
        }
        Ok(())
    })
}
