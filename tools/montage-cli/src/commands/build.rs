//! Import files and compose them into the timeline, one scene each.

use std::path::PathBuf;

use serde::Deserialize;

use montage_cli::facade::BuildTimelineArgs;
use montage_cli::ToolRequest;
use montage_common::config::AppConfig;
use montage_common::timecode::{format_timecode, frames_to_secs, secs_to_frames};
use montage_composer::CompositionResult;
use montage_project_model::MediaId;

#[derive(Deserialize)]
struct Built {
    media: Vec<MediaId>,
    composition: CompositionResult,
}

/// Run `build_timeline`; `transition_secs`, when given, is converted at the
/// project frame rate and replaces `args.transition_frames`.
pub fn run(
    path: PathBuf,
    mut args: BuildTimelineArgs,
    transition_secs: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        let fps = facade.client_mut().project_info()?.settings.fps;
        if let Some(secs) = transition_secs {
            args.transition_frames = Some(secs_to_frames(secs, fps));
        }
        let response = facade.call(ToolRequest::BuildTimeline(args));
        let built: Built = super::into_result(response)?;
        print_composition(&built.composition, fps);
        println!("  Media imported: {}", built.media.len());
        Ok(())
    })
}

pub(crate) fn print_composition(result: &CompositionResult, fps: f64) {
    println!("Composition:");
    println!("  Steps committed: {}", result.committed.len());
    println!(
        "  Length: {} ({} frames, {:.2}s)",
        format_timecode(result.plan.end, fps),
        result.plan.end,
        frames_to_secs(result.plan.end, fps)
    );
    println!("  Transitions: {}", result.transitions().len());
    println!("  Markers: {}", result.markers().len());
    println!();
    println!("Scenes:");
    for scene in &result.plan.scenes {
        println!(
            "  {:>3}  {} - {}  {} clip(s)",
            scene.number,
            format_timecode(scene.span.start, fps),
            format_timecode(scene.span.end, fps),
            scene.slots.len()
        );
    }
}
