//! DEFLATE compression.
//!
//! This module implements DEFLATE compression as specified in RFC 1951.
//! It supports:
//! - Stored blocks (no compression)
//! - Fixed Huffman codes
//! - Dynamic Huffman codes
//!
//! LZ77 runs once over the whole input. The resulting token stream is then
//! cut into blocks covering at most `block_size` input bytes each, and every
//! block is written with the configured [`BlockStrategy`]. Only the last
//! block carries the final flag. Compression cannot fail.

use crate::config::{BlockStrategy, DeflateOptions};
use crate::huffman::{
    CODELEN_ALPHABET_SIZE, CodeTable, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, LITLEN_ALPHABET_SIZE,
    MAX_CODE_LENGTH, MAX_CODELEN_CODE_LENGTH, build_canonical_code,
};
use crate::lz77::{Lz77Encoder, Lz77Token};
use crate::tables::{
    CODE_LENGTH_ORDER, distance_symbol, fixed_distance_codes, fixed_litlen_codes, length_symbol,
};
use linkpack_core::bitstream::BitWriter;
use linkpack_core::traits::Compressor;

/// Largest payload of a single stored block.
pub const MAX_STORED_BLOCK: usize = 65535;

/// Block type field values.
const BTYPE_STORED: u32 = 0b00;
const BTYPE_FIXED: u32 = 0b01;
const BTYPE_DYNAMIC: u32 = 0b10;

/// A block of tokens together with the input bytes it covers.
struct Block<'a> {
    tokens: &'a [Lz77Token],
    input: &'a [u8],
    is_final: bool,
}

/// One symbol of the run-length encoded code length sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RleSymbol {
    /// 0-15 (literal length), 16 (repeat previous), 17/18 (repeat zero).
    symbol: u8,
    extra_bits: u8,
    extra_value: u8,
}

impl RleSymbol {
    fn length(symbol: u8) -> Self {
        Self {
            symbol,
            extra_bits: 0,
            extra_value: 0,
        }
    }

    fn repeat(symbol: u8, extra_bits: u8, extra_value: usize) -> Self {
        Self {
            symbol,
            extra_bits,
            extra_value: extra_value as u8,
        }
    }
}

/// Everything needed to write a dynamic block header.
#[derive(Debug)]
struct DynamicTables {
    litlen: CodeTable,
    dist: CodeTable,
    codelen: CodeTable,
    /// Number of literal/length codes sent (257-286).
    num_litlen: usize,
    /// Number of distance codes sent (1-30).
    num_dist: usize,
    /// Number of code length codes sent (4-19).
    num_codelen: usize,
    rle: Vec<RleSymbol>,
}

impl DynamicTables {
    /// Build the tables for one block of tokens.
    fn build(tokens: &[Lz77Token]) -> Self {
        let (litlen_freq, mut dist_freq) = count_frequencies(tokens);

        // An empty distance tree cannot be transmitted.
        if dist_freq.iter().all(|&f| f == 0) {
            dist_freq[0] = 1;
        }

        let litlen = build_canonical_code(&litlen_freq, MAX_CODE_LENGTH as u8);
        let dist = build_canonical_code(&dist_freq, MAX_CODE_LENGTH as u8);

        let litlen_lengths = litlen.lengths();
        let dist_lengths = dist.lengths();
        let num_litlen = count_used(&litlen_lengths, 257);
        let num_dist = count_used(&dist_lengths, 1);

        let mut combined = Vec::with_capacity(num_litlen + num_dist);
        combined.extend_from_slice(&litlen_lengths[..num_litlen]);
        combined.extend_from_slice(&dist_lengths[..num_dist]);
        let rle = rle_encode_lengths(&combined);

        let mut codelen_freq = [0u32; CODELEN_ALPHABET_SIZE];
        for sym in &rle {
            codelen_freq[sym.symbol as usize] += 1;
        }
        // Strict decoders reject an incomplete code length code, which is
        // what a lone symbol would produce.
        if codelen_freq.iter().filter(|&&f| f > 0).count() < 2 {
            let spare = if codelen_freq[0] == 0 { 0 } else { 1 };
            codelen_freq[spare] = 1;
        }
        let codelen = build_canonical_code(&codelen_freq, MAX_CODELEN_CODE_LENGTH as u8);

        let num_codelen = CODE_LENGTH_ORDER
            .iter()
            .rposition(|&sym| codelen.get(sym).length > 0)
            .map_or(0, |i| i + 1)
            .max(4);

        Self {
            litlen,
            dist,
            codelen,
            num_litlen,
            num_dist,
            num_codelen,
            rle,
        }
    }

    /// Size of the header after the 3 block type bits.
    fn header_bits(&self) -> u64 {
        let rle_bits: u64 = self
            .rle
            .iter()
            .map(|s| u64::from(self.codelen.get(s.symbol as usize).length) + u64::from(s.extra_bits))
            .sum();
        5 + 5 + 4 + 3 * self.num_codelen as u64 + rle_bits
    }

    fn write_header(&self, writer: &mut BitWriter) {
        let hlit = self.num_litlen - 257;
        let hdist = self.num_dist - 1;
        let hclen = self.num_codelen - 4;
        tracing::trace!(
            "Deflate: dynamic header HLIT={} HDIST={} HCLEN={} ({} RLE symbols)",
            hlit,
            hdist,
            hclen,
            self.rle.len()
        );

        writer.write_bits(hlit as u32, 5);
        writer.write_bits(hdist as u32, 5);
        writer.write_bits(hclen as u32, 4);

        for &sym in &CODE_LENGTH_ORDER[..self.num_codelen] {
            writer.write_bits(u32::from(self.codelen.get(sym).length), 3);
        }

        for sym in &self.rle {
            let code = self.codelen.get(sym.symbol as usize);
            writer.write_bits(u32::from(code.code), code.length);
            if sym.extra_bits > 0 {
                writer.write_bits(u32::from(sym.extra_value), sym.extra_bits);
            }
        }
    }
}

/// Count literal/length and distance symbol frequencies, including one EOB.
fn count_frequencies(
    tokens: &[Lz77Token],
) -> ([u32; LITLEN_ALPHABET_SIZE], [u32; DISTANCE_ALPHABET_SIZE]) {
    let mut litlen_freq = [0u32; LITLEN_ALPHABET_SIZE];
    let mut dist_freq = [0u32; DISTANCE_ALPHABET_SIZE];

    for token in tokens {
        match *token {
            Lz77Token::Literal(byte) => litlen_freq[byte as usize] += 1,
            Lz77Token::Match { length, distance } => {
                litlen_freq[length_symbol(length).symbol as usize] += 1;
                dist_freq[distance_symbol(distance).symbol as usize] += 1;
            }
        }
    }
    litlen_freq[END_OF_BLOCK as usize] += 1;

    (litlen_freq, dist_freq)
}

/// Number of leading entries to transmit: up to the last nonzero, at least `min`.
fn count_used(lengths: &[u8], min: usize) -> usize {
    lengths
        .iter()
        .rposition(|&len| len > 0)
        .map_or(0, |i| i + 1)
        .max(min)
}

/// Run-length encode a code length sequence with symbols 16, 17 and 18.
fn rle_encode_lengths(lengths: &[u8]) -> Vec<RleSymbol> {
    let mut symbols = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == len).count();
        let mut left = run;

        if len == 0 {
            while left >= 11 {
                let n = left.min(138);
                symbols.push(RleSymbol::repeat(18, 7, n - 11));
                left -= n;
            }
            if left >= 3 {
                symbols.push(RleSymbol::repeat(17, 3, left - 3));
                left = 0;
            }
        } else {
            symbols.push(RleSymbol::length(len));
            left -= 1;
            while left >= 3 {
                let n = left.min(6);
                symbols.push(RleSymbol::repeat(16, 2, n - 3));
                left -= n;
            }
        }

        symbols.extend(std::iter::repeat_n(RleSymbol::length(len), left));
        i += run;
    }

    symbols
}

/// Bits needed for `tokens` plus EOB under the given tables.
fn symbols_bits(tokens: &[Lz77Token], litlen: &CodeTable, dist: &CodeTable) -> u64 {
    let mut bits = u64::from(litlen.get(END_OF_BLOCK as usize).length);
    for token in tokens {
        bits += match *token {
            Lz77Token::Literal(byte) => u64::from(litlen.get(byte as usize).length),
            Lz77Token::Match { length, distance } => {
                let len = length_symbol(length);
                let d = distance_symbol(distance);
                u64::from(litlen.get(len.symbol as usize).length)
                    + u64::from(len.extra_bits)
                    + u64::from(dist.get(d.symbol as usize).length)
                    + u64::from(d.extra_bits)
            }
        };
    }
    bits
}

/// Bits needed to store `len` bytes starting at bit offset `bit_position`.
fn stored_bits(bit_position: u64, len: usize) -> u64 {
    let chunks = len.div_ceil(MAX_STORED_BLOCK).max(1);
    let mut position = bit_position;
    for i in 0..chunks {
        let chunk = (len - i * MAX_STORED_BLOCK).min(MAX_STORED_BLOCK);
        position += 3;
        position = position.div_ceil(8) * 8;
        position += 32 + 8 * chunk as u64;
    }
    position - bit_position
}

/// Write `tokens` followed by EOB.
fn write_symbols(
    writer: &mut BitWriter,
    tokens: &[Lz77Token],
    litlen: &CodeTable,
    dist: &CodeTable,
) {
    for token in tokens {
        match *token {
            Lz77Token::Literal(byte) => {
                let code = litlen.get(byte as usize);
                writer.write_bits(u32::from(code.code), code.length);
            }
            Lz77Token::Match { length, distance } => {
                let len = length_symbol(length);
                let code = litlen.get(len.symbol as usize);
                writer.write_bits(u32::from(code.code), code.length);
                writer.write_bits(u32::from(len.extra_value), len.extra_bits);

                let d = distance_symbol(distance);
                let code = dist.get(d.symbol as usize);
                writer.write_bits(u32::from(code.code), code.length);
                writer.write_bits(u32::from(d.extra_value), d.extra_bits);
            }
        }
    }

    let eob = litlen.get(END_OF_BLOCK as usize);
    writer.write_bits(u32::from(eob.code), eob.length);
}

/// DEFLATE compressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deflater {
    options: DeflateOptions,
}

impl Deflater {
    /// Create a new DEFLATE compressor.
    pub fn new(options: DeflateOptions) -> Self {
        Self { options }
    }

    /// Get the options in use.
    pub fn options(&self) -> &DeflateOptions {
        &self.options
    }

    /// Compress `data` into a new raw DEFLATE stream.
    pub fn compress_to_vec(&self, data: &[u8]) -> Vec<u8> {
        let mut writer = BitWriter::with_capacity(data.len() / 2 + 16);
        self.deflate_into(data, &mut writer);
        writer.finish()
    }

    /// Append a complete DEFLATE stream for `data` to `writer`.
    ///
    /// The stream always ends with a final block, even for empty input.
    pub fn deflate_into(&self, data: &[u8], writer: &mut BitWriter) {
        let block_size = self.options.effective_block_size();

        if self.options.strategy == BlockStrategy::Stored {
            let mut chunks = data.chunks(block_size).peekable();
            if chunks.peek().is_none() {
                write_stored_block(writer, &[], true);
            }
            while let Some(chunk) = chunks.next() {
                write_stored_block(writer, chunk, chunks.peek().is_none());
            }
            return;
        }

        let tokens = Lz77Encoder::new(self.options.effective_window_size()).compress(data);

        let mut token_start = 0;
        let mut input_start = 0;
        loop {
            let mut token_end = token_start;
            let mut input_end = input_start;
            while token_end < tokens.len() && input_end - input_start < block_size {
                input_end += tokens[token_end].input_len();
                token_end += 1;
            }

            let block = Block {
                tokens: &tokens[token_start..token_end],
                input: &data[input_start..input_end],
                is_final: token_end == tokens.len(),
            };
            self.write_block(writer, &block);

            if block.is_final {
                break;
            }
            token_start = token_end;
            input_start = input_end;
        }
    }

    fn write_block(&self, writer: &mut BitWriter, block: &Block<'_>) {
        match self.options.strategy {
            BlockStrategy::Stored => write_stored_block(writer, block.input, block.is_final),
            BlockStrategy::Fixed => write_fixed_block(writer, block),
            BlockStrategy::Dynamic => {
                write_dynamic_block(writer, block, &DynamicTables::build(block.tokens))
            }
            BlockStrategy::Smallest => {
                let tables = DynamicTables::build(block.tokens);
                let dynamic =
                    3 + tables.header_bits() + symbols_bits(block.tokens, &tables.litlen, &tables.dist);
                let fixed = 3 + symbols_bits(
                    block.tokens,
                    fixed_litlen_codes(),
                    fixed_distance_codes(),
                );
                let stored = stored_bits(writer.bits_written(), block.input.len());

                tracing::trace!(
                    "Deflate: block costs stored={} fixed={} dynamic={} bits",
                    stored,
                    fixed,
                    dynamic
                );

                if stored < fixed && stored < dynamic {
                    write_stored_block(writer, block.input, block.is_final);
                } else if fixed <= dynamic {
                    write_fixed_block(writer, block);
                } else {
                    write_dynamic_block(writer, block, &tables);
                }
            }
        }
    }
}

/// Write `data` as one or more stored blocks; only the last may be final.
fn write_stored_block(writer: &mut BitWriter, data: &[u8], is_final: bool) {
    let mut chunks = data.chunks(MAX_STORED_BLOCK).peekable();
    if chunks.peek().is_none() {
        write_stored_chunk(writer, &[], is_final);
    }
    while let Some(chunk) = chunks.next() {
        write_stored_chunk(writer, chunk, is_final && chunks.peek().is_none());
    }
}

fn write_stored_chunk(writer: &mut BitWriter, chunk: &[u8], is_final: bool) {
    writer.write_bit(is_final);
    writer.write_bits(BTYPE_STORED, 2);
    writer.align_to_byte();

    let len = chunk.len() as u16;
    writer.write_bits(u32::from(len), 16);
    writer.write_bits(u32::from(!len), 16);
    writer.write_bytes(chunk);

    tracing::debug!(
        "Deflate: wrote stored block (final={}, {} bytes)",
        is_final,
        chunk.len()
    );
}

fn write_fixed_block(writer: &mut BitWriter, block: &Block<'_>) {
    let start = writer.bits_written();
    writer.write_bit(block.is_final);
    writer.write_bits(BTYPE_FIXED, 2);
    write_symbols(
        writer,
        block.tokens,
        fixed_litlen_codes(),
        fixed_distance_codes(),
    );

    tracing::debug!(
        "Deflate: wrote fixed block (final={}, {} tokens, {} input bytes, {} bits)",
        block.is_final,
        block.tokens.len(),
        block.input.len(),
        writer.bits_written() - start
    );
}

fn write_dynamic_block(writer: &mut BitWriter, block: &Block<'_>, tables: &DynamicTables) {
    let start = writer.bits_written();
    writer.write_bit(block.is_final);
    writer.write_bits(BTYPE_DYNAMIC, 2);
    tables.write_header(writer);
    write_symbols(writer, block.tokens, &tables.litlen, &tables.dist);

    tracing::debug!(
        "Deflate: wrote dynamic block (final={}, {} tokens, {} input bytes, {} bits)",
        block.is_final,
        block.tokens.len(),
        block.input.len(),
        writer.bits_written() - start
    );
}

impl Compressor for Deflater {
    fn compress(&self, input: &[u8]) -> Vec<u8> {
        self.compress_to_vec(input)
    }
}

/// Compress data into a raw DEFLATE stream.
pub fn deflate(data: &[u8], options: &DeflateOptions) -> Vec<u8> {
    Deflater::new(*options).compress_to_vec(data)
}
