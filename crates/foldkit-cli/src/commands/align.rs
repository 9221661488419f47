use super::{load_structure, write_output};
use crate::cli::AlignArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use foldkit::core::io::write_pdb;
use foldkit::workflows::align::superpose_onto_best_chain;
use tracing::info;

pub async fn run(args: AlignArgs) -> Result<()> {
    let config = build_config(&args.overrides)?;
    let reference = load_structure(&args.reference)?;
    let candidate = load_structure(&args.candidate)?;

    println!(
        "Aligning '{}' onto the best-matching chain of '{}'...",
        candidate.name, reference.name
    );
    let report = tokio::task::block_in_place(|| {
        superpose_onto_best_chain(&reference, &candidate, &config.alignment)
    })?;
    info!(
        chain = %report.chain,
        score = report.score,
        pairs = report.pairs,
        rmsd = report.rmsd,
        "Superposition complete."
    );

    let render = |structure, label: &str| {
        write_pdb(structure).map_err(|source| CliError::Render {
            what: label.to_string(),
            source,
        })
    };

    write_output(&args.output, &render(&report.aligned, "aligned")?)?;
    println!(
        "✓ Chain {} (identity {}), {} atom pairs, RMSD {:.3} Å",
        report.chain, report.score, report.pairs, report.rmsd
    );
    println!("  Aligned structure written to: {}", args.output.display());

    if let Some(path) = &args.reference_output {
        write_output(path, &render(&report.reference, "reference")?)?;
        println!("  Reference chain written to: {}", path.display());
    }

    Ok(())
}
