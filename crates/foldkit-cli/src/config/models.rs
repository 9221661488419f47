use super::file::{
    FileAlignmentConfig, FileConfig, FileDesignConfig, FileEndpointsConfig, FilePipelineConfig,
    FileWorkspaceConfig,
};
use crate::error::{CliError, Result};
use foldkit::engine::config::{AlignmentConfig, DesignConfig, PipelineConfig};

const REDACTED: &str = "<redacted>";

/// Where the remote workspace lives and how to authenticate against it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSettings {
    pub host: Option<String>,
    pub token: Option<String>,
}

impl WorkspaceSettings {
    /// Base URL and token, or a configuration error naming what is missing.
    pub fn credentials(&self) -> Result<(String, String)> {
        let host = self.host.as_deref().filter(|h| !h.trim().is_empty()).ok_or_else(|| {
            CliError::Config(
                "Workspace host is not set. Use `[workspace] host`, `-S workspace.host=...` or FOLDKIT_HOST."
                    .to_string(),
            )
        })?;
        let token = self.token.as_deref().filter(|t| !t.is_empty()).ok_or_else(|| {
            CliError::Config(
                "Workspace token is not set. Use `[workspace] token`, `-S workspace.token=...` or FOLDKIT_TOKEN."
                    .to_string(),
            )
        })?;
        Ok((base_url(host), token.to_string()))
    }
}

fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Names of the model-serving endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub structure: String,
    pub backbone: String,
    pub designer: String,
    pub complex: String,
}

pub struct AppConfig {
    pub workspace: WorkspaceSettings,
    pub pipeline: PipelineConfig,
    pub endpoints: EndpointSettings,
    pub design: DesignConfig,
    pub alignment: AlignmentConfig,
}

impl AppConfig {
    /// The effective configuration in file form, with the token redacted.
    pub fn to_file_config(&self) -> FileConfig {
        FileConfig {
            workspace: Some(FileWorkspaceConfig {
                host: self.workspace.host.clone(),
                token: self.workspace.token.as_ref().map(|_| REDACTED.to_string()),
            }),
            pipeline: Some(FilePipelineConfig {
                job_name: Some(self.pipeline.job_name.clone()),
                volume_root: Some(self.pipeline.volume_root.clone()),
                notebook_dir: Some(self.pipeline.notebook_dir.clone()),
                featurize_node_type: Some(self.pipeline.featurize.node_type.clone()),
                fold_node_type: Some(self.pipeline.fold.node_type.clone()),
                db_preset: Some(self.pipeline.databases.db_preset.clone()),
                max_template_date: Some(self.pipeline.databases.max_template_date.clone()),
                notification_email: self.pipeline.notification_email.clone(),
            }),
            endpoints: Some(FileEndpointsConfig {
                structure: Some(self.endpoints.structure.clone()),
                backbone: Some(self.endpoints.backbone.clone()),
                designer: Some(self.endpoints.designer.clone()),
                complex: Some(self.endpoints.complex.clone()),
            }),
            design: Some(FileDesignConfig {
                num_backbones: Some(self.design.num_backbones),
                design_chain: self.design.design_chain,
            }),
            alignment: Some(FileAlignmentConfig {
                coding: Some(self.alignment.coding),
                atom_names: Some(self.alignment.atom_names.clone()),
                exclude_hetero: Some(self.alignment.exclude_hetero),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builder::merge_with_defaults;

    #[test]
    fn credentials_prefix_bare_hosts_with_https() {
        let settings = WorkspaceSettings {
            host: Some("adb-123.azuredatabricks.net/".to_string()),
            token: Some("dapi-secret".to_string()),
        };
        let (url, token) = settings.credentials().unwrap();
        assert_eq!(url, "https://adb-123.azuredatabricks.net");
        assert_eq!(token, "dapi-secret");
    }

    #[test]
    fn credentials_keep_explicit_schemes() {
        let settings = WorkspaceSettings {
            host: Some("http://localhost:8080".to_string()),
            token: Some("t".to_string()),
        };
        assert_eq!(settings.credentials().unwrap().0, "http://localhost:8080");
    }

    #[test]
    fn file_form_redacts_the_token_and_reads_back() {
        let mut file = FileConfig::default();
        file.workspace_mut().token = Some("dapi-secret".to_string());
        file.design_mut().num_backbones = Some(3);
        let app = merge_with_defaults(file).unwrap();

        let shown = app.to_file_config();
        let text = shown.to_toml().unwrap();
        assert!(!text.contains("dapi-secret"));
        assert!(text.contains(REDACTED));

        let reparsed: FileConfig = toml::from_str(&text).unwrap();
        let rebuilt = merge_with_defaults(reparsed).unwrap();
        assert_eq!(rebuilt.pipeline, app.pipeline);
        assert_eq!(rebuilt.design, app.design);
        assert_eq!(rebuilt.endpoints, app.endpoints);
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let settings = WorkspaceSettings {
            host: Some("example.net".to_string()),
            token: None,
        };
        assert!(matches!(settings.credentials(), Err(CliError::Config(_))));
        assert!(matches!(
            WorkspaceSettings::default().credentials(),
            Err(CliError::Config(msg)) if msg.contains("host")
        ));
    }
}
