use std::path::{Path, PathBuf};

use jotter_core::config::normalize_api_base_url;
use jotter_core::ClientConfig;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub config_path: PathBuf,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
}

pub fn run_config(
    command: ConfigCommands,
    config: &ClientConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let view = ConfigView {
                config_path: config_path.to_path_buf(),
                api_base_url: config.api_base_url()?,
                request_timeout_secs: config.request_timeout().as_secs(),
                data_dir: config.data_dir(),
                database_path: config.database_path(),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        ConfigCommands::SetApiUrl { url } => {
            let normalized = set_api_url(config_path, &url)?;
            println!("API base URL set to {normalized}");
            Ok(())
        }
    }
}

/// Persist a normalized base URL, keeping the other stored settings
pub fn set_api_url(config_path: &Path, url: &str) -> Result<String, CliError> {
    let normalized = normalize_api_base_url(url)?;
    let mut stored = ClientConfig::load_from_path(config_path)?;
    stored.api_base_url = Some(normalized.clone());
    stored.save_to_path(config_path)?;
    Ok(normalized)
}
