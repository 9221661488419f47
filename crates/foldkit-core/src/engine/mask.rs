//! Bracket-delimited redesign masks, e.g. `CASRRSG[FTYPGF]FFEQYF`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("Sequence has no '[' ... ']' region to redesign")]
    MissingMask,
    #[error("Sequence must contain exactly one '[' and one ']'")]
    MultipleMasks,
    #[error("Mask closes at {end} before it opens at {start}")]
    Reversed { start: usize, end: usize },
    #[error("Mask region is empty")]
    EmptyMask,
    #[error("Residue '{residue}' at position {position} is not a letter")]
    InvalidResidue { position: usize, residue: char },
}

/// A sequence with one region marked for redesign.
///
/// `start_idx` and `end_idx` are the positions of `[` and `]` in the
/// bracketed text. Read as 1-based residue numbers of the unbracketed
/// sequence, they are the fixed residues on either side of the mask, which
/// is the convention the backbone in-painting model expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedSequence {
    pub sequence: String,
    pub start_idx: usize,
    pub end_idx: usize,
}

impl MaskedSequence {
    pub fn parse(text: &str) -> Result<Self, MaskError> {
        let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let opens: Vec<usize> = text.match_indices('[').map(|(i, _)| i).collect();
        let closes: Vec<usize> = text.match_indices(']').map(|(i, _)| i).collect();

        let (start_idx, end_idx) = match (opens.as_slice(), closes.as_slice()) {
            ([], []) => return Err(MaskError::MissingMask),
            ([start], [end]) => (*start, *end),
            _ => return Err(MaskError::MultipleMasks),
        };
        if end_idx < start_idx {
            return Err(MaskError::Reversed {
                start: start_idx,
                end: end_idx,
            });
        }
        if end_idx == start_idx + 1 {
            return Err(MaskError::EmptyMask);
        }

        let sequence: String = text.chars().filter(|c| !matches!(c, '[' | ']')).collect();
        if let Some((position, residue)) = sequence
            .chars()
            .enumerate()
            .find(|(_, c)| !c.is_ascii_alphabetic())
        {
            return Err(MaskError::InvalidResidue {
                position: position + 1,
                residue,
            });
        }

        Ok(Self {
            sequence: sequence.to_ascii_uppercase(),
            start_idx,
            end_idx,
        })
    }

    /// The masked residues.
    pub fn masked(&self) -> &str {
        &self.sequence[self.start_idx..self.end_idx - 1]
    }
}
