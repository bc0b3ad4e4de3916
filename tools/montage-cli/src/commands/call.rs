//! Run one raw tool request.

use std::io::Read;
use std::path::PathBuf;

use montage_common::config::AppConfig;

pub fn run(path: PathBuf, request: String, config: &AppConfig) -> anyhow::Result<()> {
    let request = if request == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        request
    };

    super::with_project(&path, config, |facade| {
        let response = facade.call_json(&request);
        println!("{}", serde_json::to_string_pretty(&response)?);
        if !response.ok {
            anyhow::bail!("tool call failed");
        }
        Ok(())
    })
}
