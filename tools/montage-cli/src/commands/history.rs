//! Walk the editor's undo history.

use std::path::PathBuf;

use serde::Deserialize;

use montage_cli::facade::StepsArgs;
use montage_cli::ToolRequest;
use montage_common::config::AppConfig;
use montage_editor::UndoStatus;

#[derive(Deserialize)]
struct Walked {
    #[serde(alias = "undone", alias = "redone")]
    steps: usize,
    status: UndoStatus,
}

pub fn undo(path: PathBuf, steps: usize, config: &AppConfig) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        let response = facade.call(ToolRequest::Undo(StepsArgs { steps }));
        let walked: Walked = super::into_result(response)?;
        println!("Undid {} command(s)", walked.steps);
        print_status(&walked.status);
        Ok(())
    })
}

pub fn redo(path: PathBuf, steps: usize, config: &AppConfig) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        let response = facade.call(ToolRequest::Redo(StepsArgs { steps }));
        let walked: Walked = super::into_result(response)?;
        println!("Redid {} command(s)", walked.steps);
        print_status(&walked.status);
        Ok(())
    })
}

pub fn status(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        let status: UndoStatus = super::into_result(facade.call(ToolRequest::UndoStatus))?;
        print_status(&status);
        Ok(())
    })
}

fn print_status(status: &UndoStatus) {
    println!("History: {} of {}", status.index, status.count);
    if let Some(text) = &status.undo_text {
        println!("  Next undo: {text}");
    }
    if let Some(text) = &status.redo_text {
        println!("  Next redo: {text}");
    }
}
