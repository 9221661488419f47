//! Synthetic structures shared by unit tests.

use crate::core::io::write_pdb;
use crate::core::models::atom::Atom;
use crate::core::models::builder::StructureBuilder;
use crate::core::models::residue::ResidueKind;
use crate::core::models::structure::Structure;
use crate::core::superposition::RigidTransform;
use crate::core::utils::geometry::rotation_from_axis_angle;
use crate::core::utils::identifiers::three_letter_code;
use nalgebra::{Point3, Vector3};

/// Deterministic pseudo-random sequence over `alphabet`.
pub fn sequence(seed: u64, len: usize, alphabet: &str) -> String {
    let letters: Vec<char> = alphabet.chars().collect();
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            letters[((state >> 33) % letters.len() as u64) as usize]
        })
        .collect()
}

/// N, CA and C positions of residue `index` on an ideal helix whose axis
/// runs along z through `origin`.
pub fn helix_backbone(index: usize, origin: Vector3<f64>) -> [Point3<f64>; 3] {
    let theta = (index as f64 * 100.0).to_radians();
    let rise = 1.5 * index as f64;
    let at = |radius: f64, shift: f64, dz: f64| {
        let angle = theta + shift.to_radians();
        Point3::new(radius * angle.cos(), radius * angle.sin(), rise + dz) + origin
    };
    [at(1.6, -28.0, -0.8), at(2.3, 0.0, 0.0), at(1.7, 27.0, 0.9)]
}

/// Builds a backbone-only structure, one helix per chain, each chain
/// displaced along x so that chains do not overlap.
pub fn backbone_structure(name: &str, chains: &[(char, &str)]) -> Structure {
    let mut builder = StructureBuilder::new(name);
    for (chain_index, (chain_id, seq)) in chains.iter().enumerate() {
        let origin = Vector3::new(40.0 * chain_index as f64, 0.0, 0.0);
        builder.start_chain(*chain_id);
        for (i, code) in seq.chars().enumerate() {
            builder
                .start_residue(
                    i as isize + 1,
                    None,
                    three_letter_code(code).unwrap_or("UNK"),
                    ResidueKind::Standard,
                )
                .unwrap();
            for (atom_name, position) in ["N", "CA", "C"].iter().zip(helix_backbone(i, origin)) {
                builder.add_atom(Atom::new(atom_name, position)).unwrap();
            }
        }
        builder.end_chain();
    }
    builder.build()
}

/// Like [`backbone_structure`] for a single chain, but skipping the residues
/// in `deleted` while keeping the survivors' coordinates.
pub fn backbone_with_deletion(
    name: &str,
    chain_id: char,
    seq: &str,
    deleted: std::ops::Range<usize>,
    chain_index: usize,
) -> Structure {
    let mut builder = StructureBuilder::new(name);
    let origin = Vector3::new(40.0 * chain_index as f64, 0.0, 0.0);
    builder.start_chain(chain_id);
    let mut number = 0;
    for (i, code) in seq.chars().enumerate() {
        if deleted.contains(&i) {
            continue;
        }
        number += 1;
        builder
            .start_residue(
                number,
                None,
                three_letter_code(code).unwrap_or("UNK"),
                ResidueKind::Standard,
            )
            .unwrap();
        for (atom_name, position) in ["N", "CA", "C"].iter().zip(helix_backbone(i, origin)) {
            builder.add_atom(Atom::new(atom_name, position)).unwrap();
        }
    }
    builder.build()
}

/// An arbitrary proper rigid motion.
pub fn some_motion() -> RigidTransform {
    RigidTransform {
        rotation: rotation_from_axis_angle(&Vector3::new(0.3, -1.0, 0.6), 73.0).into_inner(),
        translation: Vector3::new(12.5, -4.0, 30.25),
    }
}

/// Applies `transform` to a copy of `structure`.
pub fn moved(structure: &Structure, transform: &RigidTransform) -> Structure {
    let mut copy = structure.clone();
    transform.apply_to(&mut copy);
    copy
}

pub fn pdb_text(structure: &Structure) -> String {
    write_pdb(structure).unwrap()
}
