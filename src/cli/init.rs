use anyhow::{Result, bail};
use console::style;
use harness_core::HarnessConfig;
use std::path::Path;

/// Handle the init command
pub fn handle_init_command(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            output.display()
        );
    }

    HarnessConfig::create_sample_config(output)?;
    println!(
        "{} {}",
        style("Wrote configuration to").green(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core::ConfigManager;
    use tempfile::TempDir;

    #[test]
    fn writes_a_loadable_config_and_refuses_to_overwrite() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("harness.toml");

        handle_init_command(&path, false).expect("first init");
        let manager = ConfigManager::load_from_file(&path).expect("load");
        assert_eq!(
            manager.config().agent.model,
            HarnessConfig::default().agent.model
        );

        assert!(handle_init_command(&path, false).is_err());
        handle_init_command(&path, true).expect("forced init");
    }
}
