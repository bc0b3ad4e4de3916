//! Replace the media of one scene or one clip in place.

use std::path::PathBuf;

use montage_cli::facade::{ReplaceClipArgs, ReplaceSceneArgs};
use montage_cli::ToolRequest;
use montage_common::config::AppConfig;
use montage_common::timecode::format_timecode;
use montage_composer::ReplaceResult;
use montage_project_model::{ClipId, MediaId};

pub fn run(
    path: PathBuf,
    scene: Option<u32>,
    clip: Option<String>,
    file: Option<String>,
    media: Option<String>,
    source_in: u64,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let media = media
        .map(|m| m.parse::<MediaId>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    if file.is_none() && media.is_none() {
        anyhow::bail!("Pass either --file or --media");
    }
    let clip = clip
        .map(|c| c.parse::<ClipId>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let request = match (scene, clip) {
        (Some(scene), None) => ToolRequest::ReplaceScene(ReplaceSceneArgs {
            scene,
            media,
            new_file: file,
            source_in,
        }),
        (None, Some(clip)) => ToolRequest::ReplaceClip(ReplaceClipArgs {
            clip,
            media,
            new_file: file,
            source_in,
        }),
        _ => anyhow::bail!("Pass exactly one of --scene or --clip"),
    };

    super::with_project(&path, config, |facade| {
        let fps = facade.client_mut().project_info()?.settings.fps;
        let response = facade.call(request);
        let result: ReplaceResult = super::into_result(response)?;
        let plan = &result.plan;

        println!("Replaced {}:", plan.target);
        println!(
            "  Slot: {} - {}",
            format_timecode(plan.envelope.start, fps),
            format_timecode(plan.envelope.end, fps)
        );
        println!("  Old clips: {}", plan.old_clips.len());
        println!("  New clip: {} ({} frames)", result.clip.id, result.clip.duration);
        if result.gap() > 0 {
            println!("  Gap left at the end: {} frames", result.gap());
        }
        println!("  Transitions kept: {}", result.transitions.len());
        if !plan.markers.is_empty() {
            println!("  Markers left in place: {}", plan.markers.len());
        }
        Ok(())
    })
}
