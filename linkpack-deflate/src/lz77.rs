//! LZ77 match finding for DEFLATE.
//!
//! This module replaces repeated byte sequences with back-references
//! (length, distance pairs) into the data already seen.
//!
//! # Algorithm
//!
//! A prefix index maps every 3-byte prefix to the most recent position where
//! it occurred. For each position:
//! - If the prefix was never seen, or was last seen more than one window
//!   back, a literal is emitted.
//! - Otherwise the match is extended byte by byte up to 258 bytes and a
//!   (length, distance) pair is emitted. Every position covered by the match
//!   is indexed, so later matches may point into it.
//!
//! Only the most recent occurrence of each prefix is kept, so there is no
//! chain to search. This cannot fail: the worst case is all literals.

use crate::config::MAX_WINDOW_SIZE;
use std::collections::HashMap;

/// Minimum match length.
pub const MIN_MATCH: usize = 3;

/// Maximum match length.
pub const MAX_MATCH: usize = 258;

/// Inputs shorter than this use a hash map index instead of buckets.
const SMALL_INPUT_LIMIT: usize = 16 * 1024;

/// Number of buckets in the large index (one per upper 16 prefix bits).
const BUCKET_COUNT: usize = 1 << 16;

/// A token produced by LZ77 compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Token {
    /// A literal byte.
    Literal(u8),
    /// A back-reference to previously seen data.
    Match {
        /// Number of bytes to copy (3-258).
        length: u16,
        /// Distance back into the window (1-32768).
        distance: u16,
    },
}

impl Lz77Token {
    /// Number of input bytes this token stands for.
    #[inline]
    pub fn input_len(&self) -> usize {
        match self {
            Lz77Token::Literal(_) => 1,
            Lz77Token::Match { length, .. } => *length as usize,
        }
    }
}

/// Most recent position of each 3-byte prefix.
#[derive(Debug)]
enum PrefixIndex {
    /// Plain map, for small inputs.
    Small(HashMap<u32, usize>),
    /// Buckets keyed by the upper 16 bits, each resolved by the low 8 bits.
    Large(Vec<Vec<(u8, usize)>>),
}

impl PrefixIndex {
    fn for_input_len(len: usize) -> Self {
        if len < SMALL_INPUT_LIMIT {
            PrefixIndex::Small(HashMap::with_capacity(len))
        } else {
            PrefixIndex::Large(vec![Vec::new(); BUCKET_COUNT])
        }
    }

    #[inline]
    fn get(&self, prefix: u32) -> Option<usize> {
        match self {
            PrefixIndex::Small(map) => map.get(&prefix).copied(),
            PrefixIndex::Large(buckets) => {
                let low = prefix as u8;
                buckets[(prefix >> 8) as usize]
                    .iter()
                    .find(|&&(key, _)| key == low)
                    .map(|&(_, pos)| pos)
            }
        }
    }

    #[inline]
    fn insert(&mut self, prefix: u32, pos: usize) {
        match self {
            PrefixIndex::Small(map) => {
                map.insert(prefix, pos);
            }
            PrefixIndex::Large(buckets) => {
                let low = prefix as u8;
                let bucket = &mut buckets[(prefix >> 8) as usize];
                match bucket.iter_mut().find(|(key, _)| *key == low) {
                    Some(entry) => entry.1 = pos,
                    None => bucket.push((low, pos)),
                }
            }
        }
    }
}

/// The 24-bit prefix starting at `pos`. Requires `pos + 3 <= input.len()`.
#[inline(always)]
fn prefix_at(input: &[u8], pos: usize) -> u32 {
    (u32::from(input[pos]) << 16) | (u32::from(input[pos + 1]) << 8) | u32::from(input[pos + 2])
}

/// LZ77 encoder for DEFLATE compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lz77Encoder {
    window_size: usize,
}

impl Lz77Encoder {
    /// Create an encoder whose matches reach at most `window_size` bytes back
    /// (clamped to 1-32768).
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.clamp(1, MAX_WINDOW_SIZE),
        }
    }

    /// Get the window size in use.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Compress input data to LZ77 tokens.
    pub fn compress(&self, input: &[u8]) -> Vec<Lz77Token> {
        let mut tokens = Vec::with_capacity(input.len() / 2);
        let mut index = PrefixIndex::for_input_len(input.len());
        let mut pos = 0;

        while pos + MIN_MATCH <= input.len() {
            let prefix = prefix_at(input, pos);

            let candidate = index
                .get(prefix)
                .filter(|&prev| pos - prev <= self.window_size);

            let Some(prev) = candidate else {
                tokens.push(Lz77Token::Literal(input[pos]));
                index.insert(prefix, pos);
                pos += 1;
                continue;
            };

            let max_len = MAX_MATCH.min(input.len() - pos);
            let mut length = MIN_MATCH;
            while length < max_len && input[prev + length] == input[pos + length] {
                length += 1;
            }

            tokens.push(Lz77Token::Match {
                length: length as u16,
                distance: (pos - prev) as u16,
            });

            let indexed_end = (pos + length).min(input.len() + 1 - MIN_MATCH);
            for p in pos..indexed_end {
                index.insert(prefix_at(input, p), p);
            }
            pos += length;
        }

        tokens.extend(input[pos..].iter().map(|&b| Lz77Token::Literal(b)));
        tokens
    }
}

impl Default for Lz77Encoder {
    fn default() -> Self {
        Self::new(MAX_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn replay(tokens: &[Lz77Token]) -> Vec<u8> {
        let mut output = Vec::new();
        for token in tokens {
            match *token {
                Lz77Token::Literal(b) => output.push(b),
                Lz77Token::Match { length, distance } => {
                    for _ in 0..length {
                        let pos = output.len() - distance as usize;
                        output.push(output[pos]);
                    }
                }
            }
        }
        output
    }

    #[test]
    fn test_literals_only() {
        let input = b"abcdefgh";
        let tokens = Lz77Encoder::default().compress(input);

        assert!(tokens.iter().all(|t| matches!(t, Lz77Token::Literal(_))));
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_short_inputs() {
        let encoder = Lz77Encoder::default();
        assert!(encoder.compress(b"").is_empty());
        assert_eq!(
            encoder.compress(b"ab"),
            vec![Lz77Token::Literal(b'a'), Lz77Token::Literal(b'b')]
        );
    }

    #[test]
    fn test_simple_match() {
        let tokens = Lz77Encoder::default().compress(b"abcabcabc");
        assert_eq!(
            tokens,
            vec![
                Lz77Token::Literal(b'a'),
                Lz77Token::Literal(b'b'),
                Lz77Token::Literal(b'c'),
                Lz77Token::Match {
                    length: 6,
                    distance: 3
                },
            ]
        );
    }

    #[test]
    fn test_overlapping_run() {
        let input = vec![b'A'; 1000];
        let tokens = Lz77Encoder::default().compress(&input);

        assert_eq!(tokens[0], Lz77Token::Literal(b'A'));
        assert_eq!(
            tokens[1],
            Lz77Token::Match {
                length: 258,
                distance: 1
            }
        );
        assert!(tokens.len() < 10);
        assert_eq!(replay(&tokens), input);
    }

    #[test]
    fn test_window_limit() {
        // The repeat sits 20 bytes back, beyond a 16-byte window.
        let mut input = b"xyz".to_vec();
        input.extend((0..17u8).map(|i| b'a' + i));
        input.extend_from_slice(b"xyz");

        let narrow = Lz77Encoder::new(16).compress(&input);
        assert!(narrow.iter().all(|t| matches!(t, Lz77Token::Literal(_))));

        let wide = Lz77Encoder::new(32).compress(&input);
        assert_eq!(
            wide.last(),
            Some(&Lz77Token::Match {
                length: 3,
                distance: 20
            })
        );
    }

    #[test]
    fn test_window_clamped() {
        assert_eq!(Lz77Encoder::new(0).window_size(), 1);
        assert_eq!(Lz77Encoder::new(1 << 20).window_size(), MAX_WINDOW_SIZE);
    }

    #[test]
    fn test_large_index_matches_small() {
        // Same data above and below the bucket threshold must replay exactly.
        let pattern = b"The quick brown fox jumps over the lazy dog. ";
        let input: Vec<u8> = pattern.iter().copied().cycle().take(40_000).collect();
        let tokens = Lz77Encoder::default().compress(&input);
        assert_eq!(replay(&tokens), input);
        assert!(tokens.len() < 1000);
    }

    #[test]
    fn test_decode_matches() {
        let input = b"Hello, Hello, Hello!";
        let tokens = Lz77Encoder::default().compress(input);
        assert_eq!(replay(&tokens), input);
    }

    proptest! {
        #[test]
        fn prop_tokens_replay_exactly(
            input in proptest::collection::vec(0u8..4, 0..2000),
            window in 1usize..=MAX_WINDOW_SIZE,
        ) {
            let tokens = Lz77Encoder::new(window).compress(&input);

            let mut produced = 0usize;
            for token in &tokens {
                if let Lz77Token::Match { length, distance } = *token {
                    prop_assert!((3..=258).contains(&length));
                    prop_assert!(distance >= 1 && distance as usize <= window);
                    prop_assert!(distance as usize <= produced);
                }
                produced += token.input_len();
            }

            prop_assert_eq!(replay(&tokens), input);
        }
    }
}
