//! Huffman coding for DEFLATE compression.
//!
//! This module builds length-limited canonical Huffman codes from symbol
//! frequencies (encode side) and decodes canonical codes from their bit
//! lengths (decode side), as specified in RFC 1951.
//!
//! # Alphabets
//!
//! DEFLATE uses three Huffman alphabets:
//! - **Literal/Length**: 0-285 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29 (back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)
//!
//! # Construction
//!
//! Code lengths come from the package-merge algorithm, which yields an
//! optimal code under a maximum length. The requested maximum is first
//! clamped to the height of the unrestricted Huffman tree for the same
//! frequencies, so lightly skewed inputs skip needless packaging rounds.

use linkpack_core::bitstream::BitReader;
use linkpack_core::error::{DecodeError, Result};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// Maximum code length for the code length alphabet (7 bits).
pub const MAX_CODELEN_CODE_LENGTH: usize = 7;

/// Size of the literal/length alphabet (0-285).
pub const LITLEN_ALPHABET_SIZE: usize = 286;

/// Size of the distance alphabet (0-29).
pub const DISTANCE_ALPHABET_SIZE: usize = 30;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// One symbol's codeword, ready to be written LSB-first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalCode {
    /// Codeword, bit-reversed within `length` bits.
    pub code: u16,
    /// Codeword length in bits (0 = symbol unused).
    pub length: u8,
}

/// Encode table: one [`CanonicalCode`] per symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<CanonicalCode>,
}

impl CodeTable {
    /// Assign canonical codes to a list of code lengths.
    ///
    /// Symbols are ordered by length, then by symbol value. Codes of one
    /// length are consecutive; moving to a longer length shifts the next
    /// code left by the difference.
    pub fn from_lengths(lengths: &[u8]) -> Self {
        let mut bl_count = [0u16; MAX_CODE_LENGTH + 1];
        for &len in lengths {
            if len > 0 {
                bl_count[len as usize] += 1;
            }
        }

        // RFC 1951 Section 3.2.2
        let mut next_code = [0u16; MAX_CODE_LENGTH + 1];
        let mut code = 0u16;
        for bits in 1..=MAX_CODE_LENGTH {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        let codes = lengths
            .iter()
            .map(|&len| {
                if len == 0 {
                    return CanonicalCode::default();
                }
                let code = next_code[len as usize];
                next_code[len as usize] += 1;
                CanonicalCode {
                    code: reverse_bits(code, len),
                    length: len,
                }
            })
            .collect();

        Self { codes }
    }

    /// Get the code for `symbol`.
    ///
    /// Symbols outside the table have length 0.
    #[inline]
    pub fn get(&self, symbol: usize) -> CanonicalCode {
        self.codes.get(symbol).copied().unwrap_or_default()
    }

    /// Code length of every symbol, in symbol order.
    pub fn lengths(&self) -> Vec<u8> {
        self.codes.iter().map(|c| c.length).collect()
    }

    /// Number of symbols in the table.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the table covers no symbols.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Build a canonical code for `frequencies` with no code longer than `max_bits`.
///
/// Zero-frequency symbols get length 0. A lone used symbol gets length 1.
pub fn build_canonical_code(frequencies: &[u32], max_bits: u8) -> CodeTable {
    let mut builder = HuffmanBuilder::new(frequencies.len(), max_bits);
    for (symbol, &count) in frequencies.iter().enumerate() {
        builder.add_count(symbol as u16, count);
    }
    CodeTable::from_lengths(&builder.build_lengths())
}

/// Reverse the low `length` bits of `code`.
#[inline]
pub fn reverse_bits(code: u16, length: u8) -> u16 {
    if length == 0 {
        return 0;
    }
    code.reverse_bits() >> (16 - length)
}

/// A canonical Huffman tree for decoding.
///
/// Holds how many codes exist of each length and the symbols sorted in
/// canonical order. Decoding walks the lengths one bit at a time, so no
/// lookup table has to be built per block.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    /// Number of codes of each length (index 0 unused).
    counts: [u16; MAX_CODE_LENGTH + 1],
    /// Symbols in canonical order (by length, then symbol value).
    symbols: Vec<u16>,
}

impl HuffmanTree {
    /// Build a Huffman tree from code lengths read off the wire.
    ///
    /// # Arguments
    ///
    /// * `code_lengths` - Array where `code_lengths[i]` is the bit length for symbol `i`.
    ///   A length of 0 means the symbol is not used.
    ///
    /// Incomplete codes are accepted (RFC 1951 allows a single distance code);
    /// over-subscribed ones are rejected.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        if let Some(&len) = code_lengths
            .iter()
            .find(|&&len| len as usize > MAX_CODE_LENGTH)
        {
            return Err(DecodeError::corrupt_huffman(
                0,
                format!("code length {} exceeds maximum {}", len, MAX_CODE_LENGTH),
            ));
        }

        let tree = Self::from_valid_lengths(code_lengths);

        let mut left = 1i32;
        for len in 1..=MAX_CODE_LENGTH {
            left <<= 1;
            left -= i32::from(tree.counts[len]);
            if left < 0 {
                return Err(DecodeError::corrupt_huffman(
                    0,
                    "over-subscribed code lengths",
                ));
            }
        }

        Ok(tree)
    }

    /// Build a Huffman tree from code lengths known to be valid.
    ///
    /// Used for the fixed tables, which are correct by construction.
    pub fn from_valid_lengths(code_lengths: &[u8]) -> Self {
        let mut counts = [0u16; MAX_CODE_LENGTH + 1];
        for &len in code_lengths {
            debug_assert!(len as usize <= MAX_CODE_LENGTH);
            if len > 0 {
                counts[len as usize] += 1;
            }
        }

        let mut offsets = [0u16; MAX_CODE_LENGTH + 1];
        for len in 1..MAX_CODE_LENGTH {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        let total = counts.iter().map(|&c| c as usize).sum();
        let mut symbols = vec![0u16; total];
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len > 0 {
                let slot = &mut offsets[len as usize];
                symbols[*slot as usize] = symbol as u16;
                *slot += 1;
            }
        }

        Self { counts, symbols }
    }

    /// Check if the tree has no codes at all.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Decode a symbol from the bit stream.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        // `cur` is the code read so far minus the first code of this length.
        let mut cur = 0i32;
        let mut first = 0usize;

        for len in 1..=MAX_CODE_LENGTH {
            cur = (cur << 1) | reader.read_bits(1)? as i32;
            let count = i32::from(self.counts[len]);
            first += count as usize;
            cur -= count;

            if cur < 0 {
                let index = first as i32 + cur;
                return self.symbols.get(index as usize).copied().ok_or_else(|| {
                    DecodeError::corrupt_huffman(
                        reader.bit_position(),
                        "translation index out of range",
                    )
                });
            }
        }

        Err(DecodeError::corrupt_huffman(
            reader.bit_position(),
            "no code matches input bits",
        ))
    }
}

/// Builder for creating Huffman code lengths from frequencies.
#[derive(Debug, Clone)]
pub struct HuffmanBuilder {
    frequencies: Vec<u32>,
    max_length: u8,
}

impl HuffmanBuilder {
    /// Create a new Huffman builder.
    pub fn new(alphabet_size: usize, max_length: u8) -> Self {
        debug_assert!((1..=MAX_CODE_LENGTH as u8).contains(&max_length));
        Self {
            frequencies: vec![0; alphabet_size],
            max_length,
        }
    }

    /// Add a symbol occurrence.
    pub fn add(&mut self, symbol: u16) {
        self.add_count(symbol, 1);
    }

    /// Add multiple occurrences of a symbol.
    pub fn add_count(&mut self, symbol: u16, count: u32) {
        if let Some(freq) = self.frequencies.get_mut(symbol as usize) {
            *freq = freq.saturating_add(count);
        }
    }

    /// Current frequency table.
    pub fn frequencies(&self) -> &[u32] {
        &self.frequencies
    }

    /// Build code lengths from frequencies.
    ///
    /// Returns an array where `result[i]` is the code length for symbol `i`.
    pub fn build_lengths(&self) -> Vec<u8> {
        let mut lengths = vec![0u8; self.frequencies.len()];

        let mut leaves: Vec<(u64, usize)> = self
            .frequencies
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f > 0)
            .map(|(i, &f)| (u64::from(f), i))
            .collect();

        match leaves.len() {
            0 => return lengths,
            1 => {
                lengths[leaves[0].1] = 1;
                return lengths;
            }
            _ => {}
        }

        leaves.sort_unstable();

        let limit = self.max_length.min(huffman_height(&leaves));
        debug_assert!(leaves.len() <= 1 << limit, "alphabet too large for limit");

        for (i, len) in package_merge(&leaves, limit).into_iter().enumerate() {
            lengths[leaves[i].1] = len;
        }

        lengths
    }
}

/// Height of the unrestricted Huffman tree for sorted `(weight, symbol)` leaves.
fn huffman_height(leaves: &[(u64, usize)]) -> u8 {
    let mut heap: BinaryHeap<Reverse<(u64, u8)>> =
        leaves.iter().map(|&(w, _)| Reverse((w, 0))).collect();

    while heap.len() > 1 {
        let (Some(Reverse((w1, h1))), Some(Reverse((w2, h2)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        heap.push(Reverse((w1 + w2, h1.max(h2) + 1)));
    }

    heap.peek().map_or(0, |Reverse((_, h))| *h)
}

/// Node of the package-merge arena.
#[derive(Debug, Clone, Copy)]
enum Item {
    /// Index into the sorted leaf list.
    Leaf(usize),
    /// Two earlier items packaged together.
    Package(usize, usize),
}

/// Length-limited code lengths for sorted leaves (package-merge).
///
/// Starting from the leaf list, each round pairs adjacent items into
/// packages and merges them back with the leaves by weight. After
/// `limit - 1` rounds the first `2n - 2` items are selected, and a leaf's
/// code length is the number of times it occurs inside them.
fn package_merge(leaves: &[(u64, usize)], limit: u8) -> Vec<u8> {
    let n = leaves.len();
    let mut arena: Vec<Item> = (0..n).map(Item::Leaf).collect();
    let mut weights: Vec<u64> = leaves.iter().map(|&(w, _)| w).collect();

    let mut list: Vec<usize> = (0..n).collect();
    for _ in 1..limit {
        let mut packages = Vec::with_capacity(list.len() / 2);
        for pair in list.chunks_exact(2) {
            arena.push(Item::Package(pair[0], pair[1]));
            weights.push(weights[pair[0]] + weights[pair[1]]);
            packages.push(arena.len() - 1);
        }

        // Merge, preferring leaves on equal weight.
        let mut merged = Vec::with_capacity(n + packages.len());
        let (mut a, mut b) = (0, 0);
        while a < n || b < packages.len() {
            let take_leaf =
                b == packages.len() || (a < n && weights[a] <= weights[packages[b]]);
            if take_leaf {
                merged.push(a);
                a += 1;
            } else {
                merged.push(packages[b]);
                b += 1;
            }
        }
        list = merged;
    }

    let mut lengths = vec![0u8; n];
    let mut stack: Vec<usize> = list.iter().take(2 * n - 2).copied().collect();
    while let Some(item) = stack.pop() {
        match arena[item] {
            Item::Leaf(leaf) => lengths[leaf] += 1,
            Item::Package(left, right) => {
                stack.push(left);
                stack.push(right);
            }
        }
    }

    lengths
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkpack_core::bitstream::BitWriter;
    use proptest::prelude::*;

    fn kraft_sum(lengths: &[u8]) -> u64 {
        lengths
            .iter()
            .filter(|&&l| l > 0)
            .map(|&l| 1u64 << (MAX_CODE_LENGTH as u8 - l))
            .sum()
    }

    fn is_prefix_free(table: &CodeTable) -> bool {
        let used: Vec<CanonicalCode> = (0..table.len())
            .map(|s| table.get(s))
            .filter(|c| c.length > 0)
            .collect();
        for (i, a) in used.iter().enumerate() {
            for (j, b) in used.iter().enumerate() {
                if i != j && a.length <= b.length {
                    // LSB-first: the first bits sent are the low bits.
                    let mask = (1u32 << a.length) - 1;
                    if u32::from(b.code) & mask == u32::from(a.code) {
                        return false;
                    }
                }
            }
        }
        true
    }

    #[test]
    fn test_huffman_tree_simple() {
        // Simple tree: A=0, B=10, C=11
        // In LSB-first: A=0, B=01 (reversed from 10), C=11 (reversed from 11)
        let lengths = [1u8, 2, 2];
        let tree = HuffmanTree::from_code_lengths(&lengths).unwrap();

        // Bits: 0 (A) + 01 (B) + 11 (C) + 0 (A), packed LSB-first = 0b00011010
        let data = [0b00011010u8];
        let mut reader = BitReader::new(&data);

        assert_eq!(tree.decode(&mut reader).unwrap(), 0);
        assert_eq!(tree.decode(&mut reader).unwrap(), 1);
        assert_eq!(tree.decode(&mut reader).unwrap(), 2);
        assert_eq!(tree.decode(&mut reader).unwrap(), 0);
    }

    #[test]
    fn test_rfc_example_codes() {
        // RFC 1951 Section 3.2.2: ABCDEFGH with lengths (3,3,3,3,3,2,4,4).
        let table = CodeTable::from_lengths(&[3, 3, 3, 3, 3, 2, 4, 4]);
        let expected = [0b010, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111];
        for (symbol, &code) in expected.iter().enumerate() {
            let c = table.get(symbol);
            assert_eq!(reverse_bits(c.code, c.length), code, "symbol {}", symbol);
        }
    }

    #[test]
    fn test_huffman_builder() {
        let mut builder = HuffmanBuilder::new(4, 15);
        builder.add_count(0, 100);
        builder.add_count(1, 50);
        builder.add_count(2, 25);
        builder.add_count(3, 25);

        assert_eq!(builder.build_lengths(), vec![1, 2, 3, 3]);
    }

    #[test]
    fn test_builder_empty_and_single() {
        let builder = HuffmanBuilder::new(30, 15);
        assert_eq!(builder.build_lengths(), vec![0; 30]);

        let mut single = HuffmanBuilder::new(30, 15);
        single.add(7);
        single.add(7);
        let lengths = single.build_lengths();
        assert_eq!(lengths[7], 1);
        assert_eq!(lengths.iter().filter(|&&l| l > 0).count(), 1);
    }

    #[test]
    fn test_builder_ignores_out_of_range_symbol() {
        let mut builder = HuffmanBuilder::new(2, 15);
        builder.add(5);
        assert_eq!(builder.frequencies(), &[0, 0]);
    }

    #[test]
    fn test_length_limit_enforced() {
        // Fibonacci weights force a degenerate unrestricted tree of height 19.
        let mut freqs = vec![1u32, 1];
        while freqs.len() < 20 {
            let next = freqs[freqs.len() - 1] + freqs[freqs.len() - 2];
            freqs.push(next);
        }

        for limit in [5u8, 7, 15] {
            let table = build_canonical_code(&freqs, limit);
            let lengths = table.lengths();
            assert!(lengths.iter().all(|&l| l > 0 && l <= limit));
            assert!(kraft_sum(&lengths) <= 1 << MAX_CODE_LENGTH);
            assert!(is_prefix_free(&table));
        }
    }

    #[test]
    fn test_height_clamp() {
        let leaves = [(1u64, 0usize), (1, 1)];
        assert_eq!(huffman_height(&leaves), 1);
        let table = build_canonical_code(&[10, 20], 15);
        assert_eq!(table.lengths(), vec![1, 1]);
    }

    #[test]
    fn test_empty_tree() {
        let tree = HuffmanTree::from_code_lengths(&[0, 0, 0, 0]).unwrap();
        assert!(tree.is_empty());

        let data = [0xFFu8, 0xFF];
        let mut reader = BitReader::new(&data);
        assert!(matches!(
            tree.decode(&mut reader),
            Err(DecodeError::CorruptHuffmanStream { .. })
        ));
    }

    #[test]
    fn test_single_symbol() {
        let tree = HuffmanTree::from_code_lengths(&[1u8, 0, 0, 0]).unwrap();

        let data = [0b00000000u8];
        let mut reader = BitReader::new(&data);
        assert_eq!(tree.decode(&mut reader).unwrap(), 0);

        // The unused half of an incomplete code is corrupt input.
        let data = [0b00000001u8, 0xFF];
        let mut reader = BitReader::new(&data);
        assert!(tree.decode(&mut reader).is_err());
    }

    #[test]
    fn test_over_subscribed_rejected() {
        assert!(matches!(
            HuffmanTree::from_code_lengths(&[1, 1, 1]),
            Err(DecodeError::CorruptHuffmanStream { .. })
        ));
        assert!(HuffmanTree::from_code_lengths(&[16, 1]).is_err());
    }

    #[test]
    fn test_decode_truncated() {
        let tree = HuffmanTree::from_code_lengths(&[2, 2, 2, 2]).unwrap();
        let mut reader = BitReader::new(&[]);
        assert!(matches!(
            tree.decode(&mut reader),
            Err(DecodeError::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b101, 3), 0b101);
        assert_eq!(reverse_bits(0b1100, 4), 0b0011);
        assert_eq!(reverse_bits(0b10101010, 8), 0b01010101);
        assert_eq!(reverse_bits(0, 0), 0);
    }

    proptest! {
        #[test]
        fn prop_codes_are_valid(
            freqs in proptest::collection::vec(0u32..10_000, 2..300),
            limit in 9u8..=15,
        ) {
            let table = build_canonical_code(&freqs, limit);
            let lengths = table.lengths();
            prop_assert!(lengths.iter().all(|&l| l <= limit));
            prop_assert!(kraft_sum(&lengths) <= 1 << MAX_CODE_LENGTH);
            for (&f, &l) in freqs.iter().zip(&lengths) {
                prop_assert_eq!(f > 0, l > 0);
            }
            prop_assert!(is_prefix_free(&table));
        }

        #[test]
        fn prop_codelen_tree_within_seven_bits(
            freqs in proptest::collection::vec(0u32..100_000, CODELEN_ALPHABET_SIZE),
        ) {
            let lengths = build_canonical_code(&freqs, MAX_CODELEN_CODE_LENGTH as u8).lengths();
            prop_assert!(lengths.iter().all(|&l| l as usize <= MAX_CODELEN_CODE_LENGTH));
            prop_assert!(kraft_sum(&lengths) <= 1 << MAX_CODE_LENGTH);
        }

        #[test]
        fn prop_encode_then_decode_symbols(
            symbols in proptest::collection::vec(0u16..40, 1..200),
        ) {
            let mut freqs = vec![0u32; 40];
            for &s in &symbols {
                freqs[s as usize] += 1;
            }
            let table = build_canonical_code(&freqs, 15);
            let tree = HuffmanTree::from_code_lengths(&table.lengths()).unwrap();

            let mut writer = BitWriter::new();
            for &s in &symbols {
                let c = table.get(s as usize);
                writer.write_bits(u32::from(c.code), c.length);
            }
            let bytes = writer.finish();

            let mut reader = BitReader::new(&bytes);
            for &s in &symbols {
                prop_assert_eq!(tree.decode(&mut reader).unwrap(), s);
            }
        }
    }
}
