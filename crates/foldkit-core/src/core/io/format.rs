use super::error::FormatError;
use std::fmt;
use std::path::Path;

const PDB_RECORDS: [&str; 10] = [
    "ATOM", "HETATM", "MODEL", "ENDMDL", "TER", "HEADER", "TITLE", "COMPND", "REMARK", "CRYST1",
];

/// The two textual structure dialects understood by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Legacy fixed-column, one-atom-record-per-line format.
    Pdb,
    /// Token/table based format (`_atom_site.` loop).
    Mmcif,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Pdb => write!(f, "PDB"),
            Dialect::Mmcif => write!(f, "mmCIF"),
        }
    }
}

impl Dialect {
    /// Sniffs the dialect from the first meaningful line of a payload.
    pub fn detect(text: &str) -> Result<Self, FormatError> {
        for line in text.lines() {
            let trimmed = line.trim_end();
            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with("data_")
                || trimmed.starts_with("loop_")
                || trimmed.starts_with("_atom_site.")
            {
                return Ok(Dialect::Mmcif);
            }
            let record = trimmed.split_whitespace().next().unwrap_or_default();
            if PDB_RECORDS.contains(&record) || trimmed.starts_with("HETATM") {
                return Ok(Dialect::Pdb);
            }
            if record == "END" {
                return Ok(Dialect::Pdb);
            }
            return Err(FormatError::UnknownDialect);
        }
        Err(FormatError::UnknownDialect)
    }

    /// Picks the dialect from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdb") | Some("ent") => Ok(Dialect::Pdb),
            Some("cif") | Some("mmcif") => Ok(Dialect::Mmcif),
            _ => Err(FormatError::UnknownDialect),
        }
    }
}
