//! Run a composition request read from a JSON file.

use std::path::PathBuf;

use montage_cli::ToolRequest;
use montage_common::config::AppConfig;
use montage_composer::{CompositionRequest, CompositionResult};

pub fn run(
    path: PathBuf,
    request: PathBuf,
    dry_run: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&request)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", request.display()))?;
    let request: CompositionRequest = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid composition request: {e}"))?;

    super::with_project(&path, config, |facade| {
        let fps = facade.client_mut().project_info()?.settings.fps;
        if dry_run {
            let plan = facade.plan(&request)?;
            println!("Plan ({} steps, nothing applied):", plan.len());
            for (i, op) in plan.ops.iter().enumerate() {
                println!("  {:>3}. {op}", i + 1);
            }
            return Ok(());
        }

        let response = facade.call(ToolRequest::ComposeTimeline(request));
        let result: CompositionResult = super::into_result(response)?;
        super::build::print_composition(&result, fps);
        Ok(())
    })
}
