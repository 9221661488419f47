use crate::core::alignment::align_local;
use crate::core::io::write_pdb;
use crate::core::models::structure::Structure;
use crate::core::selection::{SelectionError, filter_chain, residue_sequence};
use crate::core::superposition::{RigidTransform, SuperpositionError, superpose};
use crate::engine::config::AlignmentConfig;
use crate::engine::correspondence::{Track, build_correspondence};
use crate::engine::error::EngineError;
use crate::engine::matching::best_matching_chain;
use tracing::{debug, info, instrument};

/// Everything the alignment produced, for callers that need more than text.
#[derive(Debug, Clone)]
pub struct AlignmentReport {
    /// Reference chain the candidate was superposed onto.
    pub chain: char,
    /// Identity score of that chain against the candidate sequence.
    pub score: usize,
    /// Number of backbone atom pairs used for the fit.
    pub pairs: usize,
    pub rmsd: f64,
    pub transform: RigidTransform,
    /// The reference reduced to the matched chain, renumbered from 1.
    pub reference: Structure,
    /// A copy of the candidate moved onto the reference chain.
    pub aligned: Structure,
}

/// Superposes `candidate` onto the chain of `reference` that best matches its
/// sequence. Neither input is modified.
///
/// # Errors
///
/// Propagates chain matching failures ([`EngineError::NoChains`],
/// [`EngineError::EmptySequence`]) and returns
/// [`EngineError::InsufficientPoints`] when fewer than three backbone atom
/// pairs correspond.
#[instrument(
    skip_all,
    name = "alignment_workflow",
    fields(reference = %reference.name, candidate = %candidate.name)
)]
pub fn superpose_onto_best_chain(
    reference: &Structure,
    candidate: &Structure,
    config: &AlignmentConfig,
) -> Result<AlignmentReport, EngineError> {
    let matched = best_matching_chain(reference, candidate, config.coding)?;
    debug!(chain = %matched.chain, score = matched.score, "Selected reference chain");

    let reduced = filter_chain(reference, matched.chain, config.exclude_hetero).map_err(
        |SelectionError::ChainNotFound { structure, chain }| EngineError::ChainNotFound {
            structure,
            chain,
        },
    )?;

    let reference_track = reduced.polymer_residues();
    let candidate_track = candidate.polymer_residues();
    let reference_seq = residue_sequence(&reduced, &reference_track, config.coding);
    let candidate_seq = residue_sequence(candidate, &candidate_track, config.coding);
    let alignment = align_local(&reference_seq, &candidate_seq).map_err(|_| {
        EngineError::EmptySequence {
            structure: reference.name.clone(),
            chain: Some(matched.chain),
        }
    })?;

    let atom_names: Vec<&str> = config.atom_names.iter().map(String::as_str).collect();
    let correspondence = build_correspondence(
        &alignment,
        Track::new(&reduced, &reference_track),
        Track::new(candidate, &candidate_track),
        &atom_names,
    );
    let (fixed, moving) = correspondence.positions(&reduced, candidate);

    let fit = superpose(&moving, &fixed).map_err(|e| match e {
        SuperpositionError::InsufficientPoints { found } => EngineError::InsufficientPoints {
            moving: candidate.name.clone(),
            fixed: reference.name.clone(),
            chain: matched.chain,
            found,
        },
        other => EngineError::Superposition(other.to_string()),
    })?;

    let mut aligned = candidate.clone();
    fit.transform.apply_to(&mut aligned);

    info!(
        chain = %matched.chain,
        pairs = correspondence.len(),
        rmsd = fit.rmsd,
        "Superposed candidate onto reference chain."
    );

    Ok(AlignmentReport {
        chain: matched.chain,
        score: alignment.score,
        pairs: correspondence.len(),
        rmsd: fit.rmsd,
        transform: fit.transform,
        reference: reduced,
        aligned,
    })
}

/// Picks the reference chain best matching `candidate`, superposes the
/// candidate's backbone onto it and returns both as PDB text: the reference
/// reduced to that chain, then the moved candidate.
pub fn select_and_align(
    reference: &Structure,
    candidate: &Structure,
) -> Result<(String, String), EngineError> {
    let report = superpose_onto_best_chain(reference, candidate, &AlignmentConfig::default())?;
    let reference_text =
        write_pdb(&report.reference).map_err(|e| EngineError::format(&reference.name, e))?;
    let candidate_text =
        write_pdb(&report.aligned).map_err(|e| EngineError::format(&candidate.name, e))?;
    Ok((reference_text, candidate_text))
}
