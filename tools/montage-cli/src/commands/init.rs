//! Initialize a new Montage project.

use std::path::PathBuf;

use montage_cli::ProjectDir;
use montage_common::config::AppConfig;

pub fn run(
    name: String,
    output: PathBuf,
    fps: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let project_dir = output.join(&name);
    let fps = fps.unwrap_or(config.editor.fps);
    println!("Creating project '{}' at {}", name, project_dir.display());

    let project = ProjectDir::create(&project_dir, &name, fps)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!("  FPS: {fps}");
    println!("  Tracks: V1 (video), A1 (audio)");
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── meta/         (editor.json)");
    println!("  └── checkpoints/  (index.json, snapshots)");

    Ok(())
}
