//! Point a media pool clip at another file.

use std::path::PathBuf;

use montage_cli::facade::RelinkClipArgs;
use montage_cli::ToolRequest;
use montage_common::config::AppConfig;
use montage_project_model::{MediaClip, MediaId};

pub fn run(path: PathBuf, media: String, file: String, config: &AppConfig) -> anyhow::Result<()> {
    let media = media
        .parse::<MediaId>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    // Relinking takes absolute paths only.
    let file = std::fs::canonicalize(&file)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or(file);

    super::with_project(&path, config, |facade| {
        let response = facade.call(ToolRequest::RelinkClip(RelinkClipArgs {
            media,
            new_file: file,
        }));
        let relinked: MediaClip = super::into_result(response)?;
        println!("Relinked {} to {}", relinked.id, relinked.source);
        Ok(())
    })
}
