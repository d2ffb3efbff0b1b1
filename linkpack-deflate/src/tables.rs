//! Constant tables for DEFLATE (RFC 1951).
//!
//! Length and distance symbols carry a base value plus a number of extra
//! bits. The fixed ("static") block type uses hardcoded code lengths, which
//! are built into encode and decode tables once and cached.

use crate::huffman::{CodeTable, HuffmanTree};
use std::sync::OnceLock;

/// Number of literal/length symbols covered by the fixed code (0-287).
pub const FIXED_LITLEN_SYMBOLS: usize = 288;

/// Number of distance symbols covered by the fixed code (0-29).
pub const FIXED_DISTANCE_SYMBOLS: usize = 30;

/// Length code base values for symbols 257-285 (RFC 1951 Section 3.2.5).
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
    131, 163, 195, 227, 258,
];

/// Number of extra bits for length symbols 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Distance code base values for symbols 0-29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Number of extra bits for distance symbols 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order in which code length code lengths are transmitted (RFC 1951 Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// A symbol together with the extra bits that refine it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolWithExtra {
    /// Alphabet symbol.
    pub symbol: u16,
    /// Number of extra bits following the symbol's code.
    pub extra_bits: u8,
    /// Value of the extra bits.
    pub extra_value: u16,
}

/// Map a match length (3-258) to its literal/length symbol (257-285).
pub fn length_symbol(length: u16) -> SymbolWithExtra {
    debug_assert!(
        (3..=258).contains(&length),
        "Length out of range: {}",
        length
    );

    // 258 has its own symbol even though 284 + 31 would also reach it.
    let index = if length == 258 {
        28
    } else {
        LENGTH_BASE[..28].partition_point(|&base| base <= length) - 1
    };

    SymbolWithExtra {
        symbol: 257 + index as u16,
        extra_bits: LENGTH_EXTRA_BITS[index],
        extra_value: length - LENGTH_BASE[index],
    }
}

/// Map a match distance (1-32768) to its distance symbol (0-29).
pub fn distance_symbol(distance: u16) -> SymbolWithExtra {
    debug_assert!(distance >= 1, "Distance out of range: {}", distance);

    let index = DISTANCE_BASE.partition_point(|&base| base <= distance) - 1;

    SymbolWithExtra {
        symbol: index as u16,
        extra_bits: DISTANCE_EXTRA_BITS[index],
        extra_value: distance - DISTANCE_BASE[index],
    }
}

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; FIXED_LITLEN_SYMBOLS] {
    let mut lengths = [8u8; FIXED_LITLEN_SYMBOLS];
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths
}

/// Fixed distance code lengths: every symbol uses 5 bits.
pub fn fixed_distance_lengths() -> [u8; FIXED_DISTANCE_SYMBOLS] {
    [5u8; FIXED_DISTANCE_SYMBOLS]
}

/// Get the fixed literal/length decode tree (cached after first use).
pub fn fixed_litlen_tree() -> &'static HuffmanTree {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();
    TREE.get_or_init(|| HuffmanTree::from_valid_lengths(&fixed_litlen_lengths()))
}

/// Get the fixed distance decode tree (cached after first use).
pub fn fixed_distance_tree() -> &'static HuffmanTree {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();
    TREE.get_or_init(|| HuffmanTree::from_valid_lengths(&fixed_distance_lengths()))
}

/// Get the fixed literal/length encode table (cached after first use).
pub fn fixed_litlen_codes() -> &'static CodeTable {
    static CODES: OnceLock<CodeTable> = OnceLock::new();
    CODES.get_or_init(|| CodeTable::from_lengths(&fixed_litlen_lengths()))
}

/// Get the fixed distance encode table (cached after first use).
pub fn fixed_distance_codes() -> &'static CodeTable {
    static CODES: OnceLock<CodeTable> = OnceLock::new();
    CODES.get_or_init(|| CodeTable::from_lengths(&fixed_distance_lengths()))
}
