use super::format::Dialect;
use crate::core::models::builder::BuildError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse {dialect} data on line {line}: {details}")]
    Parse {
        dialect: Dialect,
        line: usize,
        details: String,
    },
    #[error("Unrecognised structure format")]
    UnknownDialect,
    #[error("Missing required {dialect} record: {record}")]
    MissingRecord { dialect: Dialect, record: String },
    #[error("Cannot write {dialect}: {details}")]
    Unwritable { dialect: Dialect, details: String },
}

impl FormatError {
    pub fn parse(dialect: Dialect, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            dialect,
            line,
            details: details.into(),
        }
    }

    pub fn unwritable(dialect: Dialect, details: impl Into<String>) -> Self {
        Self::Unwritable {
            dialect,
            details: details.into(),
        }
    }

    pub(crate) fn from_build(dialect: Dialect, line: usize, err: BuildError) -> Self {
        Self::parse(dialect, line, err.to_string())
    }
}
