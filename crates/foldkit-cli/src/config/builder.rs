use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, EndpointSettings, WorkspaceSettings};
use crate::cli::ConfigOverrides;
use crate::error::{CliError, Result};
use foldkit::core::utils::identifiers::ResidueCoding;
use foldkit::engine::config as core_config;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub const HOST_ENV: &str = "FOLDKIT_HOST";
pub const TOKEN_ENV: &str = "FOLDKIT_TOKEN";

/// Loads the configuration file (explicit path, else the per-user default if
/// present) and layers environment variables and `-S` values on top.
pub fn build_config(overrides: &ConfigOverrides) -> Result<AppConfig> {
    merge_with_defaults(layered_file_config(overrides)?)
}

/// The file configuration after environment and `-S` overrides, before
/// defaults are applied.
fn layered_file_config(overrides: &ConfigOverrides) -> Result<FileConfig> {
    let file_config = load_file_config(overrides.config.as_ref())?;
    layer_overrides(file_config, &overrides.set_values, |key| {
        std::env::var(key).ok()
    })
}

fn load_file_config(explicit: Option<&PathBuf>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return FileConfig::from_file(path);
    }
    match super::default_config_path() {
        Ok(path) if path.exists() => FileConfig::from_file(&path),
        Ok(path) => {
            debug!("No configuration file at {:?}; using defaults.", path);
            Ok(FileConfig::default())
        }
        Err(_) => Ok(FileConfig::default()),
    }
}

fn layer_overrides(
    mut config: FileConfig,
    set_values: &[String],
    env: impl Fn(&str) -> Option<String>,
) -> Result<FileConfig> {
    if let Some(host) = env(HOST_ENV) {
        config.workspace_mut().host = Some(host);
    }
    if let Some(token) = env(TOKEN_ENV) {
        config.workspace_mut().token = Some(token);
    }
    apply_set_values(config, set_values)
}

pub(super) fn merge_with_defaults(mut file_config: FileConfig) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let workspace_file = file_config.workspace.take().unwrap_or_default();
    let workspace = WorkspaceSettings {
        host: workspace_file.host,
        token: workspace_file.token,
    };

    let pipeline_file = file_config.pipeline.take().unwrap_or_default();
    let databases = core_config::DatabaseConfig {
        db_preset: pipeline_file.db_preset.unwrap_or(defaults.db_preset),
        max_template_date: pipeline_file
            .max_template_date
            .unwrap_or(defaults.max_template_date),
    };
    let pipeline = core_config::PipelineConfigBuilder::new()
        .job_name(pipeline_file.job_name.as_deref().unwrap_or(&defaults.job_name))
        .volume_root(
            pipeline_file
                .volume_root
                .as_deref()
                .unwrap_or(&defaults.volume_root),
        )
        .notebook_dir(
            pipeline_file
                .notebook_dir
                .as_deref()
                .unwrap_or(&defaults.notebook_dir),
        )
        .featurize(core_config::StageResources::cpu(
            pipeline_file
                .featurize_node_type
                .as_deref()
                .unwrap_or(&defaults.featurize_node_type),
        ))
        .fold(core_config::StageResources::accelerated(
            pipeline_file
                .fold_node_type
                .as_deref()
                .unwrap_or(&defaults.fold_node_type),
        ))
        .databases(databases)
        .notification_email(pipeline_file.notification_email)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let endpoints_file = file_config.endpoints.take().unwrap_or_default();
    let endpoints = EndpointSettings {
        structure: endpoints_file
            .structure
            .unwrap_or(defaults.structure_endpoint),
        backbone: endpoints_file.backbone.unwrap_or(defaults.backbone_endpoint),
        designer: endpoints_file.designer.unwrap_or(defaults.designer_endpoint),
        complex: endpoints_file.complex.unwrap_or(defaults.complex_endpoint),
    };

    let alignment_file = file_config.alignment.take().unwrap_or_default();
    let mut alignment = core_config::AlignmentConfig::default();
    if let Some(coding) = alignment_file.coding {
        alignment.coding = coding;
    }
    if let Some(names) = alignment_file.atom_names {
        if names.is_empty() {
            return Err(CliError::Config(
                "`alignment.atom-names` must name at least one atom.".to_string(),
            ));
        }
        alignment.atom_names = names;
    }
    if let Some(exclude) = alignment_file.exclude_hetero {
        alignment.exclude_hetero = exclude;
    }

    let design_file = file_config.design.take().unwrap_or_default();
    let mut design_builder = core_config::DesignConfigBuilder::new()
        .num_backbones(design_file.num_backbones.unwrap_or(defaults.num_backbones))
        .alignment(alignment.clone());
    if let Some(chain) = design_file.design_chain {
        design_builder = design_builder.design_chain(chain);
    }
    let design = design_builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        workspace,
        pipeline,
        endpoints,
        design,
        alignment,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let value = value_str.to_string();

        match key {
            "workspace.host" => config.workspace_mut().host = Some(value),
            "workspace.token" => config.workspace_mut().token = Some(value),
            "pipeline.job-name" => config.pipeline_mut().job_name = Some(value),
            "pipeline.volume-root" => config.pipeline_mut().volume_root = Some(value),
            "pipeline.notebook-dir" => config.pipeline_mut().notebook_dir = Some(value),
            "pipeline.featurize-node-type" => {
                config.pipeline_mut().featurize_node_type = Some(value)
            }
            "pipeline.fold-node-type" => config.pipeline_mut().fold_node_type = Some(value),
            "pipeline.db-preset" => config.pipeline_mut().db_preset = Some(value),
            "pipeline.max-template-date" => {
                config.pipeline_mut().max_template_date = Some(value)
            }
            "pipeline.notification-email" => {
                config.pipeline_mut().notification_email = Some(value)
            }
            "endpoints.structure" => config.endpoints_mut().structure = Some(value),
            "endpoints.backbone" => config.endpoints_mut().backbone = Some(value),
            "endpoints.designer" => config.endpoints_mut().designer = Some(value),
            "endpoints.complex" => config.endpoints_mut().complex = Some(value),
            "design.num-backbones" => {
                config.design_mut().num_backbones = Some(parse_value(key, value_str, "integer")?)
            }
            "design.design-chain" => {
                config.design_mut().design_chain = Some(parse_value(key, value_str, "chain")?)
            }
            "alignment.coding" => {
                config.alignment_mut().coding = Some(match value_str {
                    "one-letter" => ResidueCoding::OneLetter,
                    "first-letter" => ResidueCoding::FirstLetter,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: {}. Expected 'one-letter' or 'first-letter'.",
                            key, value_str
                        )));
                    }
                })
            }
            "alignment.atom-names" => {
                config.alignment_mut().atom_names = Some(
                    value_str
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            }
            "alignment.exclude-hetero" => {
                config.alignment_mut().exclude_hetero =
                    Some(parse_value(key, value_str, "boolean")?)
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::FileDesignConfig;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn build(file_config: FileConfig, set_values: &[&str]) -> Result<AppConfig> {
        let set_values: Vec<String> = set_values.iter().map(|s| s.to_string()).collect();
        merge_with_defaults(layer_overrides(file_config, &set_values, no_env)?)
    }

    #[test]
    fn empty_file_uses_defaults_everywhere() {
        let app = build(FileConfig::default(), &[]).unwrap();
        let defaults = DefaultsConfig::default();

        assert_eq!(app.pipeline.job_name, defaults.job_name);
        assert_eq!(app.pipeline.volume_root, defaults.volume_root);
        assert_eq!(app.pipeline.featurize.node_type, defaults.featurize_node_type);
        assert!(!app.pipeline.featurize.accelerator);
        assert_eq!(app.pipeline.fold.node_type, defaults.fold_node_type);
        assert!(app.pipeline.fold.accelerator);
        assert_eq!(app.pipeline.databases.db_preset, "reduced_dbs");
        assert_eq!(app.endpoints.structure, "esmfold");
        assert_eq!(app.endpoints.backbone, "rfdiffusion_inpaint");
        assert_eq!(app.endpoints.designer, "proteinmpnn");
        assert_eq!(app.endpoints.complex, "boltz");
        assert_eq!(app.design.num_backbones, 1);
        assert_eq!(app.design.design_chain, None);
        assert_eq!(app.alignment, core_config::AlignmentConfig::default());
        assert_eq!(app.workspace, WorkspaceSettings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [pipeline]
            volume-root = "/Volumes/lab/af2/"
            notification-email = "lab@example.org"

            [endpoints]
            designer = "proteinmpnn_v2"

            [design]
            num-backbones = 3

            [alignment]
            exclude-hetero = false
            "#,
        )
        .unwrap();

        let app = build(FileConfig::from_file(&path).unwrap(), &[]).unwrap();
        assert_eq!(app.pipeline.volume_root, "/Volumes/lab/af2");
        assert_eq!(
            app.pipeline.notification_email.as_deref(),
            Some("lab@example.org")
        );
        assert_eq!(app.endpoints.designer, "proteinmpnn_v2");
        assert_eq!(app.design.num_backbones, 3);
        assert!(!app.alignment.exclude_hetero);
        assert!(!app.design.alignment.exclude_hetero);
    }

    #[test]
    fn set_values_override_file_values() {
        let file_config = FileConfig {
            design: Some(FileDesignConfig {
                num_backbones: Some(5),
                design_chain: None,
            }),
            ..Default::default()
        };
        let app = build(
            file_config,
            &[
                "design.num-backbones=2",
                "design.design-chain=B",
                "alignment.atom-names=CA, C",
                "alignment.coding=one-letter",
                "pipeline.job-name=af2_multimer",
            ],
        )
        .unwrap();

        assert_eq!(app.design.num_backbones, 2);
        assert_eq!(app.design.design_chain, Some('B'));
        assert_eq!(app.alignment.atom_names, vec!["CA", "C"]);
        assert_eq!(app.alignment.coding, ResidueCoding::OneLetter);
        assert_eq!(app.pipeline.job_name, "af2_multimer");
    }

    #[test]
    fn environment_supplies_credentials_below_set_values() {
        let env: HashMap<&str, &str> =
            HashMap::from([(HOST_ENV, "env-host.net"), (TOKEN_ENV, "env-token")]);
        let layered = layer_overrides(
            FileConfig::default(),
            &["workspace.host=set-host.net".to_string()],
            |key| env.get(key).map(|v| v.to_string()),
        )
        .unwrap();
        let workspace = layered.workspace.unwrap();
        assert_eq!(workspace.host.as_deref(), Some("set-host.net"));
        assert_eq!(workspace.token.as_deref(), Some("env-token"));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        assert!(matches!(
            build(FileConfig::default(), &["design.num-backbones"]),
            Err(CliError::Config(msg)) if msg.contains("KEY=VALUE")
        ));
        assert!(matches!(
            build(FileConfig::default(), &["design.num-backbones=many"]),
            Err(CliError::Config(msg)) if msg.contains("integer")
        ));
        assert!(matches!(
            build(FileConfig::default(), &["alignment.coding=three-letter"]),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            build(FileConfig::default(), &["optimization.num-solutions=1"]),
            Err(CliError::Config(msg)) if msg.contains("Unsupported")
        ));
    }

    #[test]
    fn zero_backbones_fail_validation() {
        assert!(matches!(
            build(FileConfig::default(), &["design.num-backbones=0"]),
            Err(CliError::Config(msg)) if msg.contains("num_backbones")
        ));
    }

    #[test]
    fn empty_atom_list_is_rejected() {
        assert!(matches!(
            build(FileConfig::default(), &["alignment.atom-names= , "]),
            Err(CliError::Config(msg)) if msg.contains("atom-names")
        ));
    }
}
