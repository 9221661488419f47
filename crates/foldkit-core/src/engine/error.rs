use thiserror::Error;

use super::config::ConfigError;
use super::mask::MaskError;
use super::pipeline::ValidationError;
use super::services::{ExternalError, PredictorError};
use crate::core::io::error::FormatError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read structure '{structure}': {source}")]
    Format {
        structure: String,
        #[source]
        source: FormatError,
    },

    #[error(
        "Structure '{structure}' has no polymer residues{}",
        .chain.map(|c| format!(" in chain {}", c)).unwrap_or_default()
    )]
    EmptySequence {
        structure: String,
        chain: Option<char>,
    },

    #[error("Structure '{structure}' has no chains")]
    NoChains { structure: String },

    #[error("Chain '{chain}' not found in structure '{structure}'")]
    ChainNotFound { structure: String, chain: char },

    #[error(
        "Only {found} corresponding atoms between '{moving}' and chain {chain} of '{fixed}'; at least 3 are needed"
    )]
    InsufficientPoints {
        moving: String,
        fixed: String,
        chain: char,
        found: usize,
    },

    #[error("Superposition failed: {0}")]
    Superposition(String),

    #[error("Invalid design mask: {0}")]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Predictor(#[from] PredictorError),

    #[error("Pipeline validation failed: {0}")]
    PipelineValidation(#[from] ValidationError),

    #[error("External service error: {0}")]
    PipelineExternal(#[from] ExternalError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn format(structure: impl Into<String>, source: FormatError) -> Self {
        EngineError::Format {
            structure: structure.into(),
            source,
        }
    }
}
