//! Page reordering sequences used when imposing a PDF for printing.
//!
//! Every sequence is a fixed positional permutation applied block by block.
//! Positions that fall past the end of the document in a partial final block
//! are dropped, never padded, so the result always holds distinct indices in
//! `[0, n)`.

use std::fmt;
use std::str::FromStr;

const FOUR_UP: [usize; 4] = [0, 3, 1, 2];
const SIX_UP: [usize; 6] = [0, 5, 1, 4, 2, 3];
/// 1-based offsets of the even pages inside an 18-page block.
const NINE_UP_EVEN_OFFSETS: [usize; 9] = [6, 4, 2, 12, 10, 8, 18, 16, 14];
const NINE_UP_BLOCK: usize = 18;
const SIXTEEN_UP_BLOCK: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SequenceType {
    One,
    Two,
    Four,
    Six,
    #[default]
    Nine,
    Twelve,
    Sixteen,
}

impl SequenceType {
    pub fn all() -> [SequenceType; 7] {
        [
            SequenceType::One,
            SequenceType::Two,
            SequenceType::Four,
            SequenceType::Six,
            SequenceType::Nine,
            SequenceType::Twelve,
            SequenceType::Sixteen,
        ]
    }

    pub fn token(&self) -> &'static str {
        match self {
            SequenceType::One => "1",
            SequenceType::Two => "2",
            SequenceType::Four => "4",
            SequenceType::Six => "6",
            SequenceType::Nine => "9",
            SequenceType::Twelve => "12",
            SequenceType::Sixteen => "16",
        }
    }

    /// Parses a token, falling back to the 9-up sequence for anything unknown.
    pub fn from_token(token: &str) -> Self {
        token.parse().unwrap_or_default()
    }

    /// Output order of the pages, as 0-based indices into the source document.
    pub fn order(&self, n: usize) -> Vec<usize> {
        match self {
            SequenceType::One => (0..n).collect(),
            SequenceType::Two => (0..n).step_by(2).chain((1..n).step_by(2)).collect(),
            SequenceType::Four => apply_pattern(n, &FOUR_UP),
            // "12" shares the six-page table.
            SequenceType::Six | SequenceType::Twelve => apply_pattern(n, &SIX_UP),
            SequenceType::Nine => nine_up(n),
            SequenceType::Sixteen => sixteen_up(n),
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSequenceType(pub String);

impl fmt::Display for UnknownSequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sequence type: {}", self.0)
    }
}

impl std::error::Error for UnknownSequenceType {}

impl FromStr for SequenceType {
    type Err = UnknownSequenceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(SequenceType::One),
            "2" => Ok(SequenceType::Two),
            "4" => Ok(SequenceType::Four),
            "6" => Ok(SequenceType::Six),
            "9" => Ok(SequenceType::Nine),
            "12" => Ok(SequenceType::Twelve),
            "16" => Ok(SequenceType::Sixteen),
            other => Err(UnknownSequenceType(other.to_string())),
        }
    }
}

/// Page order for `n` pages under `sequence_type`. Unknown tokens use the 9-up order.
pub fn generate_custom_order(n: usize, sequence_type: &str) -> Vec<usize> {
    SequenceType::from_token(sequence_type).order(n)
}

fn apply_pattern(n: usize, pattern: &[usize]) -> Vec<usize> {
    let block = pattern.len();
    let mut order = Vec::with_capacity(n);
    for base in (0..n).step_by(block) {
        order.extend(
            pattern
                .iter()
                .map(|offset| base + offset)
                .filter(|&idx| idx < n),
        );
    }
    order
}

fn nine_up(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n);
    for base in (0..n).step_by(NINE_UP_BLOCK) {
        // 1-based page numbers from here on.
        let odd = (1..NINE_UP_BLOCK)
            .step_by(2)
            .map(|offset| base + offset)
            .filter(|&page| page <= n);
        let even = NINE_UP_EVEN_OFFSETS
            .iter()
            .map(|offset| base + offset)
            .filter(|&page| page <= n && page % 2 == 0);
        order.extend(odd.chain(even).map(|page| page - 1));
    }
    order
}

fn sixteen_up(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n);
    for base in (0..n).step_by(SIXTEEN_UP_BLOCK) {
        let end = (base + SIXTEEN_UP_BLOCK).min(n);
        order.extend((base..end).filter(|idx| (idx - base) % 2 == 0));
        order.extend((base..end).rev().filter(|idx| (idx - base) % 2 == 1));
    }
    order
}
