use anyhow::{Context, Result};
use harness_core::{DailyContext, DailyContextVersion};

/// Handle the tools command
pub fn handle_tools_command(version: DailyContextVersion) -> Result<()> {
    let declarations = DailyContext::new().with_version(version).declarations();
    let json = serde_json::to_string_pretty(&declarations)
        .context("failed to serialize tool declarations")?;
    println!("{json}");
    Ok(())
}
