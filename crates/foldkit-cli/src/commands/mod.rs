pub mod align;
pub mod config;
pub mod convert;
pub mod design;
pub mod fold;
pub mod predict;

use crate::error::{CliError, Result};
use foldkit::core::io::read_structure;
use foldkit::core::models::structure::Structure;
use std::fs;
use std::path::Path;
use tracing::info;

/// Reads a PDB or mmCIF file, naming the structure after the file stem.
pub(crate) fn load_structure(path: &Path) -> Result<Structure> {
    info!("Loading structure from {:?}", path);
    let text = fs::read_to_string(path)?;
    let mut structure = read_structure(&text).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        structure.name = stem.to_string();
    }
    Ok(structure)
}

/// Writes text output, creating parent directories as needed.
pub(crate) fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    info!("Wrote {} bytes to {:?}", text.len(), path);
    Ok(())
}
