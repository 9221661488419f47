use super::atom::Atom;
use super::ids::{ChainId, ResidueId};
use super::residue::ResidueKind;
use super::structure::Structure;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Residue {found} follows residue {previous} in chain '{chain}'")]
    ResidueOrder {
        chain: char,
        previous: isize,
        found: isize,
    },
    #[error("Cannot add a {0} without an open parent")]
    NoOpenParent(&'static str),
}

/// Incrementally assembles a [`Structure`] from records read in file order.
///
/// Chains are keyed by identifier within the current model, so a chain that
/// reappears after other chains (typical for waters listed at the end of a
/// file) is reopened rather than duplicated. Residue numbers must not
/// decrease within a chain.
pub struct StructureBuilder {
    structure: Structure,
    current_model: Option<usize>,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

impl StructureBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            structure: Structure::new(name),
            current_model: None,
            current_chain: None,
            current_residue: None,
        }
    }

    pub fn start_model(&mut self, serial: usize) -> &mut Self {
        self.current_model = Some(self.structure.add_model(serial));
        self.current_chain = None;
        self.current_residue = None;
        self
    }

    pub fn start_chain(&mut self, id: char) -> &mut Self {
        let model = match self.current_model {
            Some(model) => model,
            None => {
                let serial = self.structure.models().len() + 1;
                self.start_model(serial);
                self.structure.models().len() - 1
            }
        };

        if let Some(current) = self.current_chain {
            if self.structure.chain(current).map(|c| c.id) == Some(id) {
                return self;
            }
        }

        let existing = self.structure.models()[model]
            .chains()
            .iter()
            .copied()
            .find(|&chain_id| self.structure.chain(chain_id).map(|c| c.id) == Some(id));

        self.current_chain = match existing {
            Some(chain_id) => Some(chain_id),
            None => self.structure.add_chain(model, id),
        };
        self.current_residue = None;
        self
    }

    /// Opens a residue in the current chain, or continues it if the record
    /// belongs to the residue already open.
    pub fn start_residue(
        &mut self,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        kind: ResidueKind,
    ) -> Result<&mut Self, BuildError> {
        let chain_id = self.current_chain.ok_or(BuildError::NoOpenParent("residue"))?;

        if let Some(current) = self.current_residue.and_then(|id| self.structure.residue(id)) {
            if current.number == number
                && current.insertion_code == insertion_code
                && current.name == name
            {
                return Ok(self);
            }
        }

        let chain = self
            .structure
            .chain(chain_id)
            .ok_or(BuildError::NoOpenParent("residue"))?;
        if let Some(last) = chain
            .residues()
            .last()
            .and_then(|&id| self.structure.residue(id))
        {
            if number < last.number {
                return Err(BuildError::ResidueOrder {
                    chain: chain.id,
                    previous: last.number,
                    found: number,
                });
            }
        }

        self.current_residue =
            self.structure
                .add_residue(chain_id, number, insertion_code, name, kind);
        Ok(self)
    }

    /// Adds an atom to the open residue. A repeated atom name within a residue
    /// (alternate locations) keeps the first occurrence.
    pub fn add_atom(&mut self, atom: Atom) -> Result<&mut Self, BuildError> {
        let residue_id = self.current_residue.ok_or(BuildError::NoOpenParent("atom"))?;
        let duplicate = self
            .structure
            .residue(residue_id)
            .is_some_and(|residue| residue.has_atom(&atom.name));
        if !duplicate {
            self.structure.add_atom_to_residue(residue_id, atom);
        }
        Ok(self)
    }

    /// Closes the current chain so that the next record opens a new residue.
    pub fn end_chain(&mut self) -> &mut Self {
        self.current_chain = None;
        self.current_residue = None;
        self
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}
