//! Import files into the media pool.

use std::path::PathBuf;

use montage_cli::ToolRequest;
use montage_common::config::AppConfig;
use montage_editor::{ImportMedia, Imported};

pub fn run(
    path: PathBuf,
    files: Vec<String>,
    duration: Option<u64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        println!("Media:");
        for file in files {
            let response = facade.call(ToolRequest::ImportMedia(ImportMedia {
                source: file,
                kind: None,
                duration,
            }));
            let imported: Imported = super::into_result(response)?;
            let media = &imported.media;
            println!(
                "  {}  {} ({:?}, {} frames){}",
                media.id,
                media.name,
                media.kind,
                media.duration,
                if imported.newly_added { "" } else { " [already in pool]" }
            );
        }
        Ok(())
    })
}
