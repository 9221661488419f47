//! Chain and residue selection over a [`Structure`].
//!
//! Selections are expressed as plain predicate functions handed to
//! [`filter`]; every function here except [`renumber_residues`] returns new
//! data and leaves its input untouched.

use crate::core::models::atom::Atom;
use crate::core::models::chain::Chain;
use crate::core::models::ids::{ChainId, ResidueId};
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use crate::core::utils::identifiers::ResidueCoding;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Chain '{chain}' not found in structure '{structure}'")]
    ChainNotFound { structure: String, chain: char },
}

/// Residue predicate keeping polymer residues only.
pub fn is_polymer(residue: &Residue) -> bool {
    !residue.is_hetero()
}

/// Residue predicate keeping everything.
pub fn any_residue(_: &Residue) -> bool {
    true
}

/// Chain predicate keeping everything.
pub fn any_chain(_: &Chain) -> bool {
    true
}

/// Copies the chains and residues accepted by both predicates into a new
/// structure. Atom content of kept residues is copied unchanged; chains left
/// without residues are dropped.
pub fn filter<C, R>(structure: &Structure, chain_pred: C, residue_pred: R) -> Structure
where
    C: Fn(&Chain) -> bool,
    R: Fn(&Residue) -> bool,
{
    copy_selected(structure, |_| true, chain_pred, residue_pred)
}

fn copy_selected<M, C, R>(
    structure: &Structure,
    model_pred: M,
    chain_pred: C,
    residue_pred: R,
) -> Structure
where
    M: Fn(usize) -> bool,
    C: Fn(&Chain) -> bool,
    R: Fn(&Residue) -> bool,
{
    let mut out = Structure::new(&structure.name);

    for (index, model) in structure.models().iter().enumerate() {
        if !model_pred(index) {
            continue;
        }
        let model_index = out.add_model(model.serial);

        for &chain_id in model.chains() {
            let Some(chain) = structure.chain(chain_id) else {
                continue;
            };
            if !chain_pred(chain) {
                continue;
            }
            let kept: Vec<(ResidueId, &Residue)> = structure
                .residues_of(chain_id)
                .filter(|(_, residue)| residue_pred(residue))
                .collect();
            if kept.is_empty() {
                continue;
            }

            let Some(new_chain) = out.add_chain(model_index, chain.id) else {
                continue;
            };
            for (residue_id, residue) in kept {
                let Some(new_residue) = out.add_residue(
                    new_chain,
                    residue.number,
                    residue.insertion_code,
                    &residue.name,
                    residue.kind,
                ) else {
                    continue;
                };
                for (_, atom) in structure.atoms_of(residue_id) {
                    out.add_atom_to_residue(new_residue, atom.clone());
                }
            }
        }
    }

    out
}

/// Reduces a structure to one chain of its first model, optionally dropping
/// hetero residues, and renumbers the residues contiguously from 1.
pub fn filter_chain(
    structure: &Structure,
    chain_id: char,
    exclude_hetero: bool,
) -> Result<Structure, SelectionError> {
    if structure.find_chain(chain_id).is_none() {
        return Err(SelectionError::ChainNotFound {
            structure: structure.name.clone(),
            chain: chain_id,
        });
    }

    let mut reduced = copy_selected(
        structure,
        |index| index == 0,
        |chain| chain.id == chain_id,
        |residue| !(exclude_hetero && residue.is_hetero()),
    );

    if let Some(new_chain) = reduced.find_chain(chain_id) {
        renumber_residues(&mut reduced, new_chain, 1);
    }
    Ok(reduced)
}

/// Chain identifiers of the first model in file order.
pub fn list_chains(structure: &Structure) -> Vec<char> {
    structure.chains_iter().map(|(_, chain)| chain.id).collect()
}

/// Atoms of the first model in file order, optionally restricted to a set of
/// atom names.
pub fn concat_atoms<'a>(structure: &'a Structure, names: Option<&[&str]>) -> Vec<&'a Atom> {
    structure
        .chains_iter()
        .flat_map(|(chain_id, _)| structure.residues_of(chain_id))
        .flat_map(|(residue_id, _)| structure.atoms_of(residue_id))
        .map(|(_, atom)| atom)
        .filter(|atom| names.is_none_or(|names| names.contains(&atom.name.as_str())))
        .collect()
}

/// Renumbers the residues of a chain contiguously from `start`, clearing
/// insertion codes.
pub fn renumber_residues(structure: &mut Structure, chain_id: ChainId, start: isize) {
    let residue_ids: Vec<ResidueId> = structure
        .chain(chain_id)
        .map(|chain| chain.residues().to_vec())
        .unwrap_or_default();
    for (offset, residue_id) in residue_ids.into_iter().enumerate() {
        if let Some(residue) = structure.residue_mut(residue_id) {
            residue.number = start + offset as isize;
            residue.insertion_code = None;
        }
    }
}

/// Single-letter sequence of the given residues.
pub fn residue_sequence(
    structure: &Structure,
    residues: &[ResidueId],
    coding: ResidueCoding,
) -> String {
    residues
        .iter()
        .filter_map(|&id| structure.residue(id))
        .map(|residue| coding.encode(&residue.name))
        .collect()
}
