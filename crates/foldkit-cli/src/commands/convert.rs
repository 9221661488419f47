use super::write_output;
use crate::cli::ConvertArgs;
use crate::error::{CliError, Result};
use foldkit::core::io::mmcif_to_pdb;
use foldkit::core::io::pdb::apply_pdb_header;
use std::fs;
use tracing::info;

pub fn run(args: ConvertArgs) -> Result<()> {
    info!("Converting {:?} to PDB", &args.input);
    let text = fs::read_to_string(&args.input)?;
    let pdb = mmcif_to_pdb(&text).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    let pdb = match &args.header {
        Some(name) => apply_pdb_header(&pdb, name),
        None => pdb,
    };

    write_output(&args.output, &pdb)?;
    println!("✓ Converted structure written to: {}", args.output.display());
    Ok(())
}
