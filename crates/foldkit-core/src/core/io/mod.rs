//! Reading and writing of macromolecular structure text.
//!
//! Two dialects are read: the legacy fixed-column PDB format ([`pdb`]) and the
//! token-table mmCIF format ([`mmcif`]). Output is always PDB; conversion runs
//! one way, mmCIF to PDB.

pub mod error;
pub mod format;
pub mod mmcif;
pub mod pdb;
pub mod traits;

use crate::core::models::structure::Structure;
use error::FormatError;
use format::Dialect;
use mmcif::MmcifFile;
use pdb::{PdbFile, WriteOptions};
use traits::StructureFile;

/// Parses a payload in whichever dialect it is written in.
pub fn read_structure(text: &str) -> Result<Structure, FormatError> {
    match Dialect::detect(text)? {
        Dialect::Pdb => PdbFile::read_from_str(text),
        Dialect::Mmcif => MmcifFile::read_from_str(text),
    }
}

/// Serialises a structure to PDB text, omitting hetero residues.
pub fn write_pdb(structure: &Structure) -> Result<String, FormatError> {
    PdbFile::write_to_string(structure, WriteOptions::default())
}

/// Converts an mmCIF payload to PDB text. Hetero residues are kept so that the
/// converted entry carries the whole deposited content.
pub fn mmcif_to_pdb(text: &str) -> Result<String, FormatError> {
    let structure = MmcifFile::read_from_str(text)?;
    PdbFile::write_to_string(
        &structure,
        WriteOptions {
            include_hetero: true,
        },
    )
}
