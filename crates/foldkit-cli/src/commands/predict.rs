use super::write_output;
use crate::cli::{MsaArg, PredictArgs, PredictCommands};
use crate::client::{ComplexEndpoint, StructureEndpoint, WorkspaceClient};
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use foldkit::engine::error::EngineError;
use foldkit::engine::services::{MsaMode, MultiEntityRequest, Predictor, PredictorError};

pub async fn run(args: PredictArgs, quiet: bool) -> Result<()> {
    let app = build_config(&args.overrides)?;
    let client = WorkspaceClient::new(&app.workspace)?;
    let progress = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };

    match args.command {
        PredictCommands::Structure { sequence, output } => {
            let sequence = normalize_sequence(&sequence)?;
            let endpoint = StructureEndpoint::new(&client, &app.endpoints.structure);
            progress.start_spinner(&format!(
                "Folding {} residues with '{}'...",
                sequence.len(),
                endpoint.endpoint()
            ));
            let pdb = first_prediction(&endpoint, sequence).await?;
            progress.finish("✓ Prediction received");
            write_output(&output, &pdb)?;
            println!("✓ Structure written to: {}", output.display());
        }
        PredictCommands::Complex {
            input,
            output,
            msa,
            use_msa_server,
        } => {
            let request = complex_request(&input, msa, use_msa_server)?;
            let endpoint = ComplexEndpoint::new(&client, &app.endpoints.complex);
            progress.start_spinner(&format!("Predicting complex with '{}'...", endpoint.endpoint()));
            let prediction = first_prediction(&endpoint, request).await?;
            progress.finish("✓ Prediction received");
            write_output(&output, &prediction.pdb)?;
            println!("✓ Complex written to: {}", output.display());
        }
    }
    Ok(())
}

async fn first_prediction<P: Predictor>(predictor: &P, input: P::Input) -> Result<P::Output> {
    let outputs = predictor
        .predict(vec![input])
        .await
        .map_err(EngineError::from)?;
    outputs
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::from(PredictorError::empty_response(predictor.endpoint())).into())
}

fn normalize_sequence(sequence: &str) -> Result<String> {
    let sequence: String = sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if sequence.is_empty() {
        return Err(CliError::Argument("Sequence must not be empty.".to_string()));
    }
    if let Some(bad) = sequence.chars().find(|c| !c.is_ascii_alphabetic()) {
        return Err(CliError::Argument(format!(
            "Sequence contains '{}', which is not a residue letter.",
            bad
        )));
    }
    Ok(sequence)
}

fn complex_request(input: &str, msa: MsaArg, use_msa_server: bool) -> Result<MultiEntityRequest> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::Argument("Complex input must not be empty.".to_string()));
    }
    let mut request = MultiEntityRequest::new(input);
    request.msa = match msa {
        MsaArg::None => MsaMode::NoMsa,
        MsaArg::Jackhmmer => MsaMode::Jackhmmer,
    };
    request.use_msa_server = use_msa_server;
    Ok(request)
}
