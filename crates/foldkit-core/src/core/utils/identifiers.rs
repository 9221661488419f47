use phf::{Map, Set, phf_map, phf_set};
use serde::{Deserialize, Serialize};

/// Backbone atoms used for structural correspondence, in emission order.
pub const CORRESPONDENCE_ATOM_NAMES: [&str; 3] = ["N", "CA", "C"];

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3",
    "HA2", "HA3", "OT1", "OT2",
};

static ONE_LETTER_CODES: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
    // Common variants and modified residues mapped to their parent
    "SEC" => 'U', "PYL" => 'O', "MSE" => 'M', "HSD" => 'H', "HSE" => 'H',
    "HSP" => 'H', "HID" => 'H', "HIE" => 'H', "HIP" => 'H', "CYX" => 'C',
    "ASX" => 'B', "GLX" => 'Z', "UNK" => 'X',
};

static THREE_LETTER_CODES: Map<char, &'static str> = phf_map! {
    'A' => "ALA", 'R' => "ARG", 'N' => "ASN", 'D' => "ASP", 'C' => "CYS",
    'Q' => "GLN", 'E' => "GLU", 'G' => "GLY", 'H' => "HIS", 'I' => "ILE",
    'L' => "LEU", 'K' => "LYS", 'M' => "MET", 'F' => "PHE", 'P' => "PRO",
    'S' => "SER", 'T' => "THR", 'W' => "TRP", 'Y' => "TYR", 'V' => "VAL",
};

/// How residue names are reduced to single symbols for sequence alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidueCoding {
    /// IUPAC one-letter codes; unknown residues become `X`.
    OneLetter,
    /// First character of the residue name (`GLY` -> `G`, `GLU` -> `G`).
    /// Chain choice and correspondence of `select_and_align` are defined
    /// over this coding.
    #[default]
    FirstLetter,
}

impl ResidueCoding {
    pub fn encode(&self, residue_name: &str) -> char {
        let name = residue_name.trim();
        match self {
            ResidueCoding::OneLetter => one_letter_code(name).unwrap_or('X'),
            ResidueCoding::FirstLetter => name
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or('X'),
        }
    }
}

pub fn one_letter_code(residue_name: &str) -> Option<char> {
    ONE_LETTER_CODES
        .get(residue_name.trim().to_ascii_uppercase().as_str())
        .copied()
}

pub fn three_letter_code(code: char) -> Option<&'static str> {
    THREE_LETTER_CODES.get(&code.to_ascii_uppercase()).copied()
}

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}
