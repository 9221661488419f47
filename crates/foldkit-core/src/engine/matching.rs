use super::error::EngineError;
use crate::core::alignment::{Alignment, align_local};
use crate::core::models::ids::ChainId;
use crate::core::models::structure::Structure;
use crate::core::selection::residue_sequence;
use crate::core::utils::identifiers::ResidueCoding;
use tracing::debug;

/// The reference chain whose sequence best explains a candidate structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMatch {
    pub chain_id: ChainId,
    pub chain: char,
    pub score: usize,
    pub alignment: Alignment,
}

/// Scores the candidate's polymer sequence (all chains of its first model,
/// concatenated) against each polymer chain of the reference's first model
/// and returns the best one. The first chain in file order wins ties.
///
/// Reference chains without polymer residues are not candidates.
///
/// # Errors
///
/// * [`EngineError::NoChains`] if the reference has no chains.
/// * [`EngineError::EmptySequence`] if the candidate has no polymer residues,
///   or no reference chain has any.
pub fn best_matching_chain(
    reference: &Structure,
    candidate: &Structure,
    coding: ResidueCoding,
) -> Result<ChainMatch, EngineError> {
    if reference.chains_iter().next().is_none() {
        return Err(EngineError::NoChains {
            structure: reference.name.clone(),
        });
    }

    let candidate_seq = residue_sequence(candidate, &candidate.polymer_residues(), coding);
    if candidate_seq.is_empty() {
        return Err(EngineError::EmptySequence {
            structure: candidate.name.clone(),
            chain: None,
        });
    }

    let mut best: Option<ChainMatch> = None;
    for (chain_id, chain) in reference.chains_iter() {
        let chain_seq =
            residue_sequence(reference, &reference.chain_polymer_residues(chain_id), coding);
        if chain_seq.is_empty() {
            continue;
        }
        let alignment = align_local(&chain_seq, &candidate_seq)
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        debug!(chain = %chain.id, score = alignment.score, "Scored reference chain");

        if best.as_ref().is_none_or(|b| alignment.score > b.score) {
            best = Some(ChainMatch {
                chain_id,
                chain: chain.id,
                score: alignment.score,
                alignment,
            });
        }
    }

    best.ok_or_else(|| EngineError::EmptySequence {
        structure: reference.name.clone(),
        chain: None,
    })
}
