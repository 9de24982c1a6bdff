use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Directory name used under the user configuration directory.
pub const APP_DIR_NAME: &str = "ghupd";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default application directory, e.g. `~/.config/ghupd`.
#[tracing::instrument(skip(runtime))]
pub fn default_app_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let config_dir = runtime
        .config_dir()
        .context("Could not find the user configuration directory")?;
    Ok(config_dir.join(APP_DIR_NAME))
}

pub fn default_config_path<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    Ok(default_app_dir(runtime)?.join(CONFIG_FILE_NAME))
}

/// The token lives next to the configuration unless told otherwise.
pub fn default_state_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    default_app_dir(runtime)
}
