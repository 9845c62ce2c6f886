//! Configuration file resolution
//!
//! Resolves the service configuration file following the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config directory (`~/.config/facelink/<service>.toml`)
//! 4. System config directory (`/etc/facelink/<service>.toml`)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolve the configuration file path for a service.
///
/// `cli_arg` wins over the environment variable named by `env_var_name`,
/// which wins over the conventional per-user and system locations.
/// Fails if no candidate file exists: connector services cannot run
/// without a settings document.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    service_name: &str,
) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let file_name = format!("{}.toml", service_name);

    // Priority 3: Per-user config directory
    if let Some(dir) = dirs::config_dir() {
        let path = dir.join("facelink").join(&file_name);
        if path.exists() {
            return Ok(path);
        }
    }

    // Priority 4: System config directory
    let system_path = PathBuf::from("/etc/facelink").join(&file_name);
    if system_path.exists() {
        return Ok(system_path);
    }

    Err(Error::Config(format!(
        "No config file found for {}. Provide one via --config, {} or ~/.config/facelink/{}",
        service_name, env_var_name, file_name
    )))
}
