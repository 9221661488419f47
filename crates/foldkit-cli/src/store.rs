use crate::error::{CliError, Result};
use foldkit::engine::pipeline::RunRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const REGISTRY_FILE: &str = "runs.json";

/// On-disk home of the run registry, so that runs submitted by one
/// invocation can be tracked by the next.
#[derive(Debug)]
pub struct RunStore {
    path: PathBuf,
}

impl RunStore {
    pub fn new() -> Result<Self> {
        let path = crate::config::project_dirs()?
            .data_dir()
            .join(REGISTRY_FILE);
        debug!("RunStore initialized with path: {:?}", &path);
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An empty registry when nothing has been saved yet.
    pub fn load(&self) -> Result<RunRegistry> {
        if !self.path.exists() {
            return Ok(RunRegistry::new());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| CliError::FileParsing {
            path: self.path.clone(),
            source: e.into(),
        })
    }

    /// Writes through a sibling temporary file so a crash never leaves a
    /// truncated registry behind.
    pub fn save(&self, registry: &RunRegistry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(registry)
            .map_err(|e| CliError::Registry(format!("Failed to serialize runs: {}", e)))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)?;
        fs::rename(&staging, &self.path)?;
        info!(
            "Saved {} tracked run(s) to {:?}",
            registry.runs().len(),
            &self.path
        );
        Ok(())
    }
}
