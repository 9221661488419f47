use super::write_output;
use crate::cli::{FoldArgs, FoldCommands};
use crate::client::WorkspaceClient;
use crate::config::build_config;
use crate::error::Result;
use crate::store::RunStore;
use foldkit::engine::pipeline::{PipelineRun, RunRegistry};
use foldkit::engine::services::{BlobVolume, JobService};
use foldkit::workflows::fold::FoldCoordinator;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub async fn run(args: FoldArgs) -> Result<()> {
    let config = build_config(&args.overrides)?;
    let client = WorkspaceClient::new(&config.workspace)?;
    let store = RunStore::new()?;
    let registry = store.load()?;
    let mut coordinator = FoldCoordinator::new(client.clone(), client, config.pipeline, registry);

    match args.command {
        FoldCommands::Create => {
            let job = coordinator.create_workflow().await?;
            println!("✓ Created fold workflow with job id {}", job);
        }
        FoldCommands::Submit { name, sequence } => {
            let run = coordinator.submit(&name, &sequence).await?;
            println!(
                "✓ Submitted '{}' ({}, {} chain(s)) as run {}",
                run.name,
                run.input.mode().as_str(),
                run.input.chains().len(),
                run.run_id
            );
            store.save(coordinator.registry())?;
        }
        FoldCommands::Status {
            name,
            watch,
            interval,
        } => {
            watch_status(&mut coordinator, &store, name.as_deref(), watch, interval).await?;
        }
        FoldCommands::Cancel { name } => {
            coordinator.cancel(&name).await?;
            println!("✓ Cancellation requested for '{}'", name);
        }
        FoldCommands::Fetch { name, output } => {
            let prediction = coordinator.fetch_prediction(&name).await?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.pdb", name)));
            write_output(&output, &prediction)?;
            println!("✓ Prediction written to: {}", output.display());
        }
        FoldCommands::Compare {
            name,
            pdb_code,
            output_dir,
        } => {
            let comparison = coordinator.compare_with_entry(&name, &pdb_code).await?;
            let code = pdb_code.to_ascii_lowercase();
            let files = [
                (format!("{}.pdb", name), &comparison.prediction),
                (format!("{}_reference.pdb", code), &comparison.reference),
                (format!("{}_aligned_to_{}.pdb", name, code), &comparison.aligned),
            ];
            for (file, text) in files {
                let path = output_dir.join(file);
                write_output(&path, text)?;
                println!("  Wrote {}", path.display());
            }
            println!("✓ '{}' superposed onto {}", name, pdb_code.to_ascii_uppercase());
        }
    }

    Ok(())
}

async fn watch_status<J: JobService, V: BlobVolume>(
    coordinator: &mut FoldCoordinator<J, V>,
    store: &RunStore,
    name: Option<&str>,
    watch: bool,
    interval: u64,
) -> Result<()> {
    loop {
        let targets: Vec<String> = match name {
            Some(n) => vec![n.to_string()],
            None => coordinator
                .registry()
                .active_runs()
                .map(|r| r.name.clone())
                .collect(),
        };

        for target in &targets {
            match coordinator.refresh(target).await {
                Ok(state) => info!(run = %target, state = %state, "Refreshed run."),
                Err(e) if name.is_none() => warn!("Could not refresh '{}': {}", target, e),
                Err(e) => return Err(e.into()),
            }
        }
        store.save(coordinator.registry())?;
        print!("{}", render_status(coordinator.registry(), name));

        let pending = targets.iter().any(|t| {
            coordinator
                .registry()
                .get(t)
                .is_some_and(|r| !r.state.is_terminal())
        });
        if !watch || !pending {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(interval.max(1))).await;
    }
}

fn render_run(out: &mut String, run: &PipelineRun) {
    let _ = write!(
        out,
        "{:<24} {:<12} {:<9} {:>12}",
        run.name,
        run.state.to_string(),
        run.input.mode().as_str(),
        run.run_id
    );
    if let Some(failure) = &run.failure {
        let _ = write!(out, "  {}", failure);
    }
    out.push('\n');
}

/// One line per run (or only `name`), then the per-state totals.
fn render_status(registry: &RunRegistry, name: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:<12} {:<9} {:>12}",
        "RUN", "STATE", "MODE", "RUN ID"
    );
    match name {
        Some(n) => {
            if let Some(run) = registry.get(n) {
                render_run(&mut out, run);
            }
        }
        None => registry.runs().iter().for_each(|r| render_run(&mut out, r)),
    }
    if name.is_none() {
        let totals: Vec<String> = registry
            .state_counts()
            .iter()
            .map(|(state, count)| format!("{} {}", count, state))
            .collect();
        if !totals.is_empty() {
            let _ = writeln!(out, "\n{}", totals.join(", "));
        }
    }
    out
}
