//! Local pairwise sequence alignment with identity scoring.
//!
//! Identical symbols score +1; mismatches and gaps cost nothing. The score of
//! an alignment is therefore the number of identical aligned columns, which is
//! what chain matching and structural correspondence need.
//!
//! Ties are resolved deterministically. The traceback starts at the first
//! highest-scoring cell in row-major order and, at each step, prefers an
//! identity diagonal, then a substitution diagonal, then continuing the gap
//! already open, then opening a gap in B before a gap in A. Unaligned flanks
//! are laid out as A-only columns followed by B-only columns.

use thiserror::Error;

pub const GAP: char = '-';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("Cannot align an empty sequence ({0})")]
    EmptySequence(&'static str),
}

/// A pair of equal-length gapped sequences with their score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub seq_a: String,
    pub seq_b: String,
    pub score: usize,
}

impl Alignment {
    /// Columns as `(a, b)` symbol pairs, `None` where a side is a gap.
    pub fn columns(&self) -> impl Iterator<Item = (Option<char>, Option<char>)> + '_ {
        let side = |c: char| if c == GAP { None } else { Some(c) };
        self.seq_a
            .chars()
            .zip(self.seq_b.chars())
            .map(move |(a, b)| (side(a), side(b)))
    }

    /// Number of columns where both sides carry a residue.
    pub fn aligned_columns(&self) -> usize {
        self.columns()
            .filter(|(a, b)| a.is_some() && b.is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.seq_a.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.seq_a.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Diagonal,
    Up,   // consumes A, gap in B
    Left, // consumes B, gap in A
}

struct ScoreMatrix {
    cols: usize,
    cells: Vec<u32>,
}

impl ScoreMatrix {
    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.cols + j]
    }
}

fn fill(a: &[char], b: &[char]) -> (ScoreMatrix, usize, usize) {
    let cols = b.len() + 1;
    let mut cells = vec![0u32; (a.len() + 1) * cols];
    let (mut best, mut best_i, mut best_j) = (0u32, 0usize, 0usize);

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let s = u32::from(a[i - 1] == b[j - 1]);
            let diag = cells[(i - 1) * cols + (j - 1)] + s;
            let up = cells[(i - 1) * cols + j];
            let left = cells[i * cols + (j - 1)];
            let h = diag.max(up).max(left);
            cells[i * cols + j] = h;
            if h > best {
                best = h;
                best_i = i;
                best_j = j;
            }
        }
    }

    (ScoreMatrix { cols, cells }, best_i, best_j)
}

fn next_step(
    h: &ScoreMatrix,
    a: &[char],
    b: &[char],
    i: usize,
    j: usize,
    open: Option<Step>,
) -> Step {
    let here = h.get(i, j);
    let identical = a[i - 1] == b[j - 1];
    let diag = h.get(i - 1, j - 1);

    if identical && here == diag + 1 {
        return Step::Diagonal;
    }
    if !identical && here == diag {
        return Step::Diagonal;
    }
    let up = here == h.get(i - 1, j);
    let left = here == h.get(i, j - 1);
    match open {
        Some(Step::Up) if up => Step::Up,
        Some(Step::Left) if left => Step::Left,
        _ if up => Step::Up,
        _ => Step::Left,
    }
}

/// Computes the best local alignment of `a` against `b`.
///
/// # Errors
///
/// Returns [`AlignmentError::EmptySequence`] if either input is empty.
pub fn align_local(a: &str, b: &str) -> Result<Alignment, AlignmentError> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return Err(AlignmentError::EmptySequence("sequence A"));
    }
    if b.is_empty() {
        return Err(AlignmentError::EmptySequence("sequence B"));
    }

    let (h, end_i, end_j) = fill(&a, &b);
    let score = h.get(end_i, end_j) as usize;

    let mut core_a = Vec::new();
    let mut core_b = Vec::new();
    let (mut i, mut j) = (end_i, end_j);
    let mut open = None;
    while i > 0 && j > 0 && h.get(i, j) > 0 {
        let step = next_step(&h, &a, &b, i, j, open);
        match step {
            Step::Diagonal => {
                core_a.push(a[i - 1]);
                core_b.push(b[j - 1]);
                i -= 1;
                j -= 1;
                open = None;
            }
            Step::Up => {
                core_a.push(a[i - 1]);
                core_b.push(GAP);
                i -= 1;
                open = Some(Step::Up);
            }
            Step::Left => {
                core_a.push(GAP);
                core_b.push(b[j - 1]);
                j -= 1;
                open = Some(Step::Left);
            }
        }
    }
    let (start_i, start_j) = (i, j);

    let mut seq_a = String::with_capacity(a.len() + b.len());
    let mut seq_b = String::with_capacity(a.len() + b.len());

    seq_a.extend(&a[..start_i]);
    seq_a.extend(std::iter::repeat_n(GAP, start_j));
    seq_b.extend(std::iter::repeat_n(GAP, start_i));
    seq_b.extend(&b[..start_j]);

    seq_a.extend(core_a.iter().rev());
    seq_b.extend(core_b.iter().rev());

    seq_a.extend(&a[end_i..]);
    seq_a.extend(std::iter::repeat_n(GAP, b.len() - end_j));
    seq_b.extend(std::iter::repeat_n(GAP, a.len() - end_i));
    seq_b.extend(&b[end_j..]);

    Ok(Alignment {
        seq_a,
        seq_b,
        score,
    })
}
