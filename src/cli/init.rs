//! Init command - write a default configuration file

use crate::cli::style::{Stylize, check};
use anstream::println;
use cherry_pick_bot::config::{EngineConfig, default_config_path, save_config};
use cherry_pick_bot::error::{Error, Result};
use std::path::Path;

/// Write the default configuration to `path` (or the default location)
///
/// An existing file is only replaced with `force`.
pub fn run_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .ok_or_else(|| Error::Config("no config directory on this platform".to_string()))?;

    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    save_config(&path, &EngineConfig::default())?;
    println!("{} Wrote {}", check(), path.display().to_string().accent());
    Ok(())
}
