use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::{Residue, ResidueKind};
use slotmap::SlotMap;

/// One model of a structure: an ordered list of chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub serial: usize,
    pub(crate) chains: Vec<ChainId>,
}

impl Model {
    pub fn chains(&self) -> &[ChainId] {
        &self.chains
    }
}

/// A macromolecular structure: models of chains of residues of atoms.
///
/// Storage is flat (one slot map per entity kind) so ids stay valid across
/// clones. A cloned structure can therefore be addressed with ids taken from
/// the original, which is what the superposition workflow relies on when it
/// moves a copy of the candidate.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Identifier carried from the source (e.g., a `data_` block name).
    pub name: String,
    models: Vec<Model>,
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Returns the first model, which is the one every structural operation works on.
    pub fn first_model(&self) -> Option<&Model> {
        self.models.first()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = (AtomId, &mut Atom)> {
        self.atoms.iter_mut()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residue_mut(&mut self, id: ResidueId) -> Option<&mut Residue> {
        self.residues.get_mut(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Iterates the chains of the first model in file order.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.first_model()
            .into_iter()
            .flat_map(|model| model.chains.iter())
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    /// Iterates the residues of a chain in file order.
    pub fn residues_of(&self, chain_id: ChainId) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains
            .get(chain_id)
            .into_iter()
            .flat_map(|chain| chain.residues.iter())
            .filter_map(|&id| self.residues.get(id).map(|residue| (id, residue)))
    }

    /// Iterates the atoms of a residue in file order.
    pub fn atoms_of(&self, residue_id: ResidueId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residues
            .get(residue_id)
            .into_iter()
            .flat_map(|residue| residue.atoms.iter())
            .filter_map(|&id| self.atoms.get(id).map(|atom| (id, atom)))
    }

    /// Finds a chain of the first model by its single-character identifier.
    pub fn find_chain(&self, id: char) -> Option<ChainId> {
        self.chains_iter()
            .find(|(_, chain)| chain.id == id)
            .map(|(chain_id, _)| chain_id)
    }

    /// Polymer residues of the first model, chain after chain, in file order.
    pub fn polymer_residues(&self) -> Vec<ResidueId> {
        self.chains_iter()
            .flat_map(|(chain_id, _)| self.residues_of(chain_id))
            .filter(|(_, residue)| residue.kind == ResidueKind::Standard)
            .map(|(id, _)| id)
            .collect()
    }

    /// Polymer residues of a single chain in file order.
    pub fn chain_polymer_residues(&self, chain_id: ChainId) -> Vec<ResidueId> {
        self.residues_of(chain_id)
            .filter(|(_, residue)| residue.kind == ResidueKind::Standard)
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn add_model(&mut self, serial: usize) -> usize {
        self.models.push(Model {
            serial,
            chains: Vec::new(),
        });
        self.models.len() - 1
    }

    pub(crate) fn add_chain(&mut self, model_index: usize, id: char) -> Option<ChainId> {
        let model = self.models.get_mut(model_index)?;
        let chain_id = self.chains.insert(Chain::new(id));
        model.chains.push(chain_id);
        Some(chain_id)
    }

    pub(crate) fn add_residue(
        &mut self,
        chain_id: ChainId,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        kind: ResidueKind,
    ) -> Option<ResidueId> {
        if !self.chains.contains_key(chain_id) {
            return None;
        }
        let residue_id = self
            .residues
            .insert(Residue::new(number, insertion_code, name, kind, chain_id));
        self.chains[chain_id].residues.push(residue_id);
        Some(residue_id)
    }

    pub(crate) fn add_atom_to_residue(&mut self, residue_id: ResidueId, atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        self.residues[residue_id].add_atom(&name, atom_id);
        Some(atom_id)
    }
}
