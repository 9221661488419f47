//! Atom-level correspondence derived from a sequence alignment.

use crate::core::alignment::Alignment;
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::structure::Structure;
use nalgebra::Point3;

/// Paired atoms: the first of each pair belongs to structure A, the second
/// to structure B.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correspondence {
    pub pairs: Vec<(AtomId, AtomId)>,
}

impl Correspondence {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Positions of both sides, in pair order.
    pub fn positions(
        &self,
        structure_a: &Structure,
        structure_b: &Structure,
    ) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
        self.pairs
            .iter()
            .filter_map(|&(a, b)| {
                Some((structure_a.atom(a)?.position, structure_b.atom(b)?.position))
            })
            .unzip()
    }
}

/// One side of an alignment: the residues each non-gap symbol stands for.
#[derive(Clone, Copy)]
pub struct Track<'a> {
    pub structure: &'a Structure,
    pub residues: &'a [ResidueId],
}

impl<'a> Track<'a> {
    pub fn new(structure: &'a Structure, residues: &'a [ResidueId]) -> Self {
        Self {
            structure,
            residues,
        }
    }

    fn atom(&self, index: usize, name: &str) -> Option<AtomId> {
        let residue = self.structure.residue(*self.residues.get(index)?)?;
        let id = residue.get_atom_id_by_name(name)?;
        self.structure.atom(id).map(|_| id)
    }
}

/// Walks the alignment with one cursor per side. Every column where both
/// sides hold a residue contributes one pair per name in `atom_names`, in
/// that order; a name missing from either residue is skipped. Aligned
/// residues need not be identical.
pub fn build_correspondence(
    alignment: &Alignment,
    track_a: Track<'_>,
    track_b: Track<'_>,
    atom_names: &[&str],
) -> Correspondence {
    let mut pairs = Vec::new();
    let (mut cursor_a, mut cursor_b) = (0usize, 0usize);

    for (a, b) in alignment.columns() {
        if a.is_some() && b.is_some() {
            for name in atom_names {
                if let (Some(atom_a), Some(atom_b)) =
                    (track_a.atom(cursor_a, name), track_b.atom(cursor_b, name))
                {
                    pairs.push((atom_a, atom_b));
                }
            }
        }
        if a.is_some() {
            cursor_a += 1;
        }
        if b.is_some() {
            cursor_b += 1;
        }
    }

    Correspondence { pairs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::align_local;
    use crate::core::models::atom::Atom;
    use crate::core::models::builder::StructureBuilder;
    use crate::core::models::residue::ResidueKind;
    use crate::core::utils::identifiers::CORRESPONDENCE_ATOM_NAMES;
    use crate::testing::backbone_structure;

    fn track_of(structure: &Structure) -> Vec<ResidueId> {
        structure.polymer_residues()
    }

    fn owner_number(structure: &Structure, residues: &[ResidueId], atom: AtomId) -> isize {
        residues
            .iter()
            .filter_map(|&id| structure.residue(id))
            .find(|residue| residue.atoms().contains(&atom))
            .map(|residue| residue.number)
            .unwrap()
    }

    #[test]
    fn aligned_columns_pair_backbone_atoms_in_order() {
        let a = backbone_structure("a", &[('A', "MKVLA")]);
        let b = backbone_structure("b", &[('A', "MKVLA")]);
        let (ra, rb) = (track_of(&a), track_of(&b));
        let alignment = align_local("MKVLA", "MKVLA").unwrap();

        let c = build_correspondence(
            &alignment,
            Track::new(&a, &ra),
            Track::new(&b, &rb),
            &CORRESPONDENCE_ATOM_NAMES,
        );
        assert_eq!(c.len(), 15);
        let names: Vec<&str> = c.pairs[..3]
            .iter()
            .map(|&(id, _)| a.atom(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["N", "CA", "C"]);
        let (pa, pb) = c.positions(&a, &b);
        assert_eq!(pa, pb);
    }

    #[test]
    fn gap_columns_advance_only_one_cursor() {
        let a = backbone_structure("a", &[('A', "MKGGGVLA")]);
        let b = backbone_structure("b", &[('A', "MKVLA")]);
        let (ra, rb) = (track_of(&a), track_of(&b));
        let alignment = align_local("MKGGGVLA", "MKVLA").unwrap();
        assert_eq!(alignment.aligned_columns(), 5);

        let c = build_correspondence(
            &alignment,
            Track::new(&a, &ra),
            Track::new(&b, &rb),
            &["CA"],
        );
        let numbers: Vec<(isize, isize)> = c
            .pairs
            .iter()
            .map(|&(x, y)| (owner_number(&a, &ra, x), owner_number(&b, &rb, y)))
            .collect();
        assert_eq!(numbers, vec![(1, 1), (2, 2), (6, 3), (7, 4), (8, 5)]);
    }

    #[test]
    fn mismatched_columns_still_pair() {
        let a = backbone_structure("a", &[('A', "MKVLA")]);
        let b = backbone_structure("b", &[('A', "MKWLA")]);
        let (ra, rb) = (track_of(&a), track_of(&b));
        let alignment = align_local("MKVLA", "MKWLA").unwrap();

        let c = build_correspondence(
            &alignment,
            Track::new(&a, &ra),
            Track::new(&b, &rb),
            &CORRESPONDENCE_ATOM_NAMES,
        );
        assert_eq!(alignment.score, 4);
        assert_eq!(c.len(), 15);
    }

    #[test]
    fn atoms_missing_on_either_side_are_skipped() {
        let a = backbone_structure("a", &[('A', "MK")]);
        let mut builder = StructureBuilder::new("b");
        builder.start_chain('A');
        builder
            .start_residue(1, None, "MET", ResidueKind::Standard)
            .unwrap()
            .add_atom(Atom::new("CA", Point3::origin()))
            .unwrap();
        builder
            .start_residue(2, None, "LYS", ResidueKind::Standard)
            .unwrap()
            .add_atom(Atom::new("N", Point3::origin()))
            .unwrap()
            .add_atom(Atom::new("C", Point3::origin()))
            .unwrap();
        let b = builder.build();
        let (ra, rb) = (track_of(&a), track_of(&b));
        let alignment = align_local("MK", "MK").unwrap();

        let c = build_correspondence(
            &alignment,
            Track::new(&a, &ra),
            Track::new(&b, &rb),
            &CORRESPONDENCE_ATOM_NAMES,
        );
        let names: Vec<&str> = c
            .pairs
            .iter()
            .map(|&(_, id)| b.atom(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["CA", "N", "C"]);
    }
}
