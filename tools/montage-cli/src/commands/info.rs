//! Show project information.

use std::path::PathBuf;

use montage_common::config::AppConfig;
use montage_common::timecode::frames_to_secs;

pub fn run(path: PathBuf, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    super::with_project(&path, config, |facade| {
        if json {
            let info = facade.client_mut().project_info()?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            return Ok(());
        }

        let summary = facade.timeline_summary()?;
        println!("Project: {}", summary.name);
        println!("  FPS: {}", summary.fps);
        println!(
            "  Duration: {} ({} frames, {:.2}s)",
            summary.duration,
            summary.end,
            frames_to_secs(summary.end, summary.fps)
        );
        println!();

        println!("Tracks:");
        for track in &summary.tracks {
            println!(
                "  {} ({:?}, {}): {} clip(s)",
                track.name,
                track.kind,
                track.id,
                track.clips.len()
            );
            for clip in &track.clips {
                let scene = clip
                    .scene
                    .map(|n| format!("scene {n}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "    {}  {} - {}  {:<9} {}",
                    clip.id, clip.timecode_in, clip.timecode_out, scene, clip.media
                );
            }
        }
        println!();

        println!("Transitions: {}", summary.transitions);
        println!("Markers:");
        if summary.markers.is_empty() {
            println!("  (none)");
        }
        for marker in &summary.markers {
            println!(
                "  {}  {:<7} {}",
                marker.timecode,
                marker.category.name(),
                marker.label
            );
        }
        println!();

        println!("Checkpoints: {}", facade.checkpoints().list().len());
        Ok(())
    })
}
