mod builder;
mod defaults;
mod file;
mod models;

pub use builder::build_config;
pub use models::WorkspaceSettings;

use crate::error::{CliError, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("edu", "caltech", "foldkit").ok_or_else(|| {
        CliError::Config("Could not determine the user configuration directory.".to_string())
    })
}

/// `config.toml` in the per-user configuration directory.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}
