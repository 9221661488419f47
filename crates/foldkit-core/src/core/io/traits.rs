use super::error::FormatError;
use super::format::Dialect;
use crate::core::models::structure::Structure;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

/// Common reading interface for structure file dialects.
pub trait StructureFile {
    /// The dialect this reader parses.
    const DIALECT: Dialect;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if a record is malformed or reading fails.
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, FormatError>;

    /// Reads a structure from an in-memory payload.
    fn read_from_str(text: &str) -> Result<Structure, FormatError> {
        let mut reader = Cursor::new(text.as_bytes());
        Self::read_from(&mut reader)
    }

    /// Reads a structure from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, FormatError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
