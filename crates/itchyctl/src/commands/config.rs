//! Configuration file commands

use anyhow::Result;
use itchy::ItchyConfig;

use crate::commands::ConfigCommands;
use crate::error::CliError;
use crate::output;
use crate::session::{Session, resolve_config_path};
use std::path::Path;

pub fn execute(cmd: &ConfigCommands, config_path: Option<&Path>, json: bool) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => init(&resolve_config_path(config_path)?, *force, json),
        ConfigCommands::Show => {
            let session = Session::load(config_path, false)?;
            output::print_config(&session.config, &session.config_path, json)
        }
    }
}

/// Write the default configuration without reading the existing file.
fn init(path: &Path, force: bool, json: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::ValidationError(format!(
            "{} already exists, use --force to overwrite",
            path.display()
        ))
        .into());
    }

    ItchyConfig::default()
        .save_to_path(path)
        .map_err(CliError::from_command)?;
    output::print_success(&format!("Wrote default config to {}", path.display()), json);
    Ok(())
}
