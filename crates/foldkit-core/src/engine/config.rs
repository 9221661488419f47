use crate::core::utils::identifiers::{CORRESPONDENCE_ATOM_NAMES, ResidueCoding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    pub coding: ResidueCoding,
    pub atom_names: Vec<String>,
    pub exclude_hetero: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            coding: ResidueCoding::FirstLetter,
            atom_names: CORRESPONDENCE_ATOM_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_hetero: true,
        }
    }
}

/// Compute sizing for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResources {
    pub node_type: String,
    pub runtime_version: String,
    pub num_workers: u32,
    pub accelerator: bool,
    pub max_retries: u32,
    pub timeout_seconds: Option<u64>,
}

impl StageResources {
    pub fn cpu(node_type: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            runtime_version: "15.4.x-cpu-ml-scala2.12".to_string(),
            num_workers: 0,
            accelerator: false,
            max_retries: 0,
            timeout_seconds: None,
        }
    }

    pub fn accelerated(node_type: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            runtime_version: "15.4.x-gpu-ml-scala2.12".to_string(),
            num_workers: 0,
            accelerator: true,
            max_retries: 0,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub db_preset: String,
    pub max_template_date: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_preset: "reduced_dbs".to_string(),
            max_template_date: "2020-05-14".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub job_name: String,
    pub volume_root: String,
    pub notebook_dir: String,
    pub featurize: StageResources,
    pub fold: StageResources,
    pub databases: DatabaseConfig,
    pub notification_email: Option<String>,
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    job_name: Option<String>,
    volume_root: Option<String>,
    notebook_dir: Option<String>,
    featurize: Option<StageResources>,
    fold: Option<StageResources>,
    databases: Option<DatabaseConfig>,
    notification_email: Option<String>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_name(mut self, name: &str) -> Self {
        self.job_name = Some(name.to_string());
        self
    }
    pub fn volume_root(mut self, root: &str) -> Self {
        self.volume_root = Some(root.trim_end_matches('/').to_string());
        self
    }
    pub fn notebook_dir(mut self, dir: &str) -> Self {
        self.notebook_dir = Some(dir.trim_end_matches('/').to_string());
        self
    }
    pub fn featurize(mut self, resources: StageResources) -> Self {
        self.featurize = Some(resources);
        self
    }
    pub fn fold(mut self, resources: StageResources) -> Self {
        self.fold = Some(resources);
        self
    }
    pub fn databases(mut self, databases: DatabaseConfig) -> Self {
        self.databases = Some(databases);
        self
    }
    pub fn notification_email(mut self, email: Option<String>) -> Self {
        self.notification_email = email;
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let featurize = self
            .featurize
            .ok_or(ConfigError::MissingParameter("featurize"))?;
        let fold = self.fold.ok_or(ConfigError::MissingParameter("fold"))?;
        if featurize.accelerator {
            return Err(ConfigError::InvalidParameter {
                name: "featurize",
                reason: "the featurize stage runs without an accelerator".to_string(),
            });
        }
        if !fold.accelerator {
            return Err(ConfigError::InvalidParameter {
                name: "fold",
                reason: "the fold stage requires an accelerator".to_string(),
            });
        }

        Ok(PipelineConfig {
            job_name: self
                .job_name
                .ok_or(ConfigError::MissingParameter("job_name"))?,
            volume_root: self
                .volume_root
                .ok_or(ConfigError::MissingParameter("volume_root"))?,
            notebook_dir: self
                .notebook_dir
                .ok_or(ConfigError::MissingParameter("notebook_dir"))?,
            featurize,
            fold,
            databases: self.databases.unwrap_or_default(),
            notification_email: self.notification_email,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignConfig {
    /// Number of backbones requested from the generator.
    pub num_backbones: usize,
    /// Chain of the initial prediction handed to the generator; `None` takes the first chain.
    pub design_chain: Option<char>,
    pub alignment: AlignmentConfig,
}

#[derive(Default)]
pub struct DesignConfigBuilder {
    num_backbones: Option<usize>,
    design_chain: Option<char>,
    alignment: Option<AlignmentConfig>,
}

impl DesignConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_backbones(mut self, n: usize) -> Self {
        self.num_backbones = Some(n);
        self
    }
    pub fn design_chain(mut self, chain: char) -> Self {
        self.design_chain = Some(chain);
        self
    }
    pub fn alignment(mut self, config: AlignmentConfig) -> Self {
        self.alignment = Some(config);
        self
    }

    pub fn build(self) -> Result<DesignConfig, ConfigError> {
        let num_backbones = self
            .num_backbones
            .ok_or(ConfigError::MissingParameter("num_backbones"))?;
        if num_backbones == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "num_backbones",
                reason: "at least one backbone must be generated".to_string(),
            });
        }
        Ok(DesignConfig {
            num_backbones,
            design_chain: self.design_chain,
            alignment: self.alignment.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_pipeline_builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
            .job_name("alphafold")
            .volume_root("/Volumes/protein_folding/alphafold/")
            .notebook_dir("/Workspace/foldkit/notebooks")
            .featurize(StageResources::cpu("Standard_F8"))
            .fold(StageResources::accelerated("Standard_NC4as_T4_v3"))
    }

    #[test]
    fn alignment_config_defaults_to_backbone_triplet() {
        let config = AlignmentConfig::default();
        assert_eq!(config.atom_names, vec!["N", "CA", "C"]);
        assert!(config.exclude_hetero);
        assert_eq!(config.coding, ResidueCoding::FirstLetter);
    }

    #[test]
    fn pipeline_builder_succeeds_with_required_parameters() {
        let config = complete_pipeline_builder().build().unwrap();
        assert_eq!(config.volume_root, "/Volumes/protein_folding/alphafold");
        assert_eq!(config.databases, DatabaseConfig::default());
        assert!(config.notification_email.is_none());
    }

    #[test]
    fn pipeline_builder_reports_missing_parameter() {
        let result = PipelineConfigBuilder::new()
            .featurize(StageResources::cpu("Standard_F8"))
            .fold(StageResources::accelerated("Standard_NC4as_T4_v3"))
            .volume_root("/v")
            .notebook_dir("/n")
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("job_name")));
    }

    #[test]
    fn pipeline_builder_rejects_swapped_stage_resources() {
        let result = complete_pipeline_builder()
            .featurize(StageResources::accelerated("Standard_NC4as_T4_v3"))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "featurize",
                ..
            })
        ));
    }

    #[test]
    fn design_builder_requires_positive_backbone_count() {
        assert_eq!(
            DesignConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("num_backbones"))
        );
        assert!(matches!(
            DesignConfigBuilder::new().num_backbones(0).build(),
            Err(ConfigError::InvalidParameter { .. })
        ));
        let config = DesignConfigBuilder::new().num_backbones(2).build().unwrap();
        assert_eq!(config.num_backbones, 2);
        assert_eq!(config.design_chain, None);
    }
}
