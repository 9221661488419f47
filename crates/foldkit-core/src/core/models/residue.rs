use super::ids::{AtomId, ChainId};
use std::collections::HashMap;

/// Distinguishes polymer residues from heteroatom content (ligands, waters, ions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResidueKind {
    #[default]
    Standard, // ATOM records / polymer residues
    Hetero,   // HETATM records
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: isize,                      // Residue sequence number from source file
    pub insertion_code: Option<char>,       // Insertion code, if any
    pub name: String,                       // Name of the residue (e.g., "ALA", "HOH")
    pub kind: ResidueKind,                  // Polymer or heteroatom content
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atom IDs in file order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        kind: ResidueKind,
        chain_id: ChainId,
    ) -> Self {
        Self {
            number,
            insertion_code,
            name: name.to_string(),
            kind,
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map.insert(atom_name.to_string(), atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom_name_map.contains_key(name)
    }

    pub fn is_hetero(&self) -> bool {
        self.kind == ResidueKind::Hetero
    }
}
