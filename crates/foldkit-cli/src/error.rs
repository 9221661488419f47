use foldkit::core::io::error::FormatError;
use foldkit::engine::error::EngineError;
use foldkit::engine::services::{ExternalError, PredictorError};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(EngineError),

    #[error("{service} answered HTTP {status}: {message}")]
    Http {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Failed to write {what} structure: {source}")]
    Render {
        what: String,
        #[source]
        source: FormatError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run registry error: {0}")]
    Registry(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<EngineError> for CliError {
    /// Lifts non-success HTTP answers out of the engine error so they report
    /// the service and status directly.
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::PipelineExternal(ExternalError::Http {
                service,
                status,
                body,
            }) => CliError::Http {
                service,
                status,
                message: body,
            },
            EngineError::Predictor(PredictorError {
                endpoint,
                message,
                status: Some(status),
            }) => CliError::Http {
                service: endpoint,
                status,
                message,
            },
            other => CliError::Core(other),
        }
    }
}
