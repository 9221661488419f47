use super::write_output;
use crate::cli::DesignArgs;
use crate::client::{BackboneEndpoint, DesignerEndpoint, StructureEndpoint, WorkspaceClient};
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use foldkit::engine::config::{DesignConfig, DesignConfigBuilder};
use foldkit::workflows::design::{DesignLoop, DesignResult};
use std::path::{Path, PathBuf};
use tracing::info;

pub async fn run(args: DesignArgs, quiet: bool) -> Result<()> {
    let app = build_config(&args.overrides)?;
    let design = design_config(&app.design, args.num_backbones, args.design_chain)?;
    let client = WorkspaceClient::new(&app.workspace)?;

    let structure = StructureEndpoint::new(&client, &app.endpoints.structure);
    let backbones = BackboneEndpoint::new(&client, &app.endpoints.backbone);
    let designer = DesignerEndpoint::new(&client, &app.endpoints.designer);

    let progress = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let result = DesignLoop::new(structure, backbones, designer, design)
        .with_reporter(progress.reporter())
        .run(&args.sequence)
        .await?;

    let written = write_designs(&args.output_dir, &result)?;
    info!(files = written.len(), "Design outputs written.");
    println!(
        "✓ {} design(s) written to: {}",
        result.designs().len(),
        args.output_dir.display()
    );
    Ok(())
}

/// Command-line values win over the configured ones.
fn design_config(
    base: &DesignConfig,
    num_backbones: Option<usize>,
    design_chain: Option<char>,
) -> Result<DesignConfig> {
    let mut builder = DesignConfigBuilder::new()
        .num_backbones(num_backbones.unwrap_or(base.num_backbones))
        .alignment(base.alignment.clone());
    if let Some(chain) = design_chain.or(base.design_chain) {
        builder = builder.design_chain(chain);
    }
    builder
        .build()
        .map_err(|e| CliError::Argument(e.to_string()))
}

/// `initial.pdb`, then `design_1.pdb`, `design_2.pdb`, ... in generation order.
fn write_designs(dir: &Path, result: &DesignResult) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(result.structures.len());
    if let Some(initial) = result.initial() {
        let path = dir.join("initial.pdb");
        write_output(&path, initial)?;
        written.push(path);
    }
    for (i, design) in result.designs().iter().enumerate() {
        let path = dir.join(format!("design_{}.pdb", i + 1));
        write_output(&path, design)?;
        written.push(path);
    }
    Ok(written)
}
