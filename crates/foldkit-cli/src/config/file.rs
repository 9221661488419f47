use crate::error::{CliError, Result};
use foldkit::core::utils::identifiers::ResidueCoding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileWorkspaceConfig {
    pub host: Option<String>,
    pub token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePipelineConfig {
    pub job_name: Option<String>,
    pub volume_root: Option<String>,
    pub notebook_dir: Option<String>,
    pub featurize_node_type: Option<String>,
    pub fold_node_type: Option<String>,
    pub db_preset: Option<String>,
    pub max_template_date: Option<String>,
    pub notification_email: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileEndpointsConfig {
    pub structure: Option<String>,
    pub backbone: Option<String>,
    pub designer: Option<String>,
    pub complex: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDesignConfig {
    pub num_backbones: Option<usize>,
    pub design_chain: Option<char>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileAlignmentConfig {
    pub coding: Option<ResidueCoding>,
    pub atom_names: Option<Vec<String>>,
    pub exclude_hetero: Option<bool>,
}

/// The on-disk TOML configuration. Every key is optional; gaps are filled
/// from the built-in defaults.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub workspace: Option<FileWorkspaceConfig>,
    pub pipeline: Option<FilePipelineConfig>,
    pub endpoints: Option<FileEndpointsConfig>,
    pub design: Option<FileDesignConfig>,
    pub alignment: Option<FileAlignmentConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn workspace_mut(&mut self) -> &mut FileWorkspaceConfig {
        self.workspace.get_or_insert_with(Default::default)
    }

    pub fn pipeline_mut(&mut self) -> &mut FilePipelineConfig {
        self.pipeline.get_or_insert_with(Default::default)
    }

    pub fn endpoints_mut(&mut self) -> &mut FileEndpointsConfig {
        self.endpoints.get_or_insert_with(Default::default)
    }

    pub fn design_mut(&mut self) -> &mut FileDesignConfig {
        self.design.get_or_insert_with(Default::default)
    }

    pub fn alignment_mut(&mut self) -> &mut FileAlignmentConfig {
        self.alignment.get_or_insert_with(Default::default)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to render configuration: {}", e)))
    }
}
