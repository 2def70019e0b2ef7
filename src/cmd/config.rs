//! Configuration view and validation commands: `tackboard config`.

use std::path::Path;

use anyhow::{Context, Result, bail};

use super::super::ConfigCommands;
use tackboard::config::{BoardConfig, DEFAULT_CONFIG_FILE};

pub fn cmd_config(
    config: &BoardConfig,
    config_path: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

    match command {
        None | Some(ConfigCommands::Show) => {
            if path.exists() {
                println!("# Config file: {}", path.display());
            } else {
                println!("# No {} found; showing defaults", path.display());
            }
            println!("# Effective values (with env overrides):");
            println!();
            let rendered =
                toml::to_string_pretty(config).context("Failed to render configuration")?;
            println!("{}", rendered);
        }
        Some(ConfigCommands::Validate) => {
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init { force }) => {
            if path.exists() && !force {
                bail!(
                    "{} already exists. Use --force to overwrite it.",
                    path.display()
                );
            }
            let content = toml::to_string_pretty(&BoardConfig::default())
                .context("Failed to serialize default configuration")?;
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write config file: {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
