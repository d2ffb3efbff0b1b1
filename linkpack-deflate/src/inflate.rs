//! DEFLATE decompression (inflate).
//!
//! This module implements the DEFLATE decompression algorithm as specified
//! in RFC 1951. It supports all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! Decoding stops after the block marked final. Any bytes after it are left
//! to the caller, which is how the GZIP trailer is found.

use crate::huffman::{
    CODELEN_ALPHABET_SIZE, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, HuffmanTree, LITLEN_ALPHABET_SIZE,
};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_BASE, DISTANCE_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS,
    fixed_distance_tree, fixed_litlen_tree,
};
use linkpack_core::bitstream::BitReader;
use linkpack_core::buffer::ByteBuffer;
use linkpack_core::error::{DecodeError, Result};
use linkpack_core::traits::Decompressor;

/// Upper bound on the output capacity reserved before decoding starts.
const MAX_INITIAL_CAPACITY: usize = 1 << 20;

/// DEFLATE decompressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inflater;

impl Inflater {
    /// Create a new DEFLATE decompressor.
    pub fn new() -> Self {
        Self
    }

    /// Decompress one DEFLATE stream from the start of `data`.
    ///
    /// Returns the decoded bytes and the number of input bytes the stream
    /// occupied, counting a partially used last byte.
    pub fn inflate_prefix(&self, data: &[u8]) -> Result<(Vec<u8>, usize)> {
        let mut reader = BitReader::new(data);
        let output = self.inflate_reader(&mut reader)?;
        Ok((output, reader.bytes_consumed()))
    }

    /// Decompress blocks from `reader` up to and including the final one.
    pub fn inflate_reader(&self, reader: &mut BitReader<'_>) -> Result<Vec<u8>> {
        let mut output = ByteBuffer::with_capacity(output_size_hint(reader.remaining().len()));

        loop {
            let is_final = reader.read_bit()?;
            let block_type = reader.read_bits(2)? as u8;
            let start = output.len();

            match block_type {
                0 => inflate_stored(reader, &mut output)?,
                1 => inflate_huffman(reader, &mut output, fixed_litlen_tree(), fixed_distance_tree())?,
                2 => inflate_dynamic(reader, &mut output)?,
                _ => return Err(DecodeError::invalid_block_type(block_type)),
            }

            tracing::debug!(
                "Inflate: read block type {} (final={}, {} bytes out)",
                block_type,
                is_final,
                output.len() - start
            );

            if is_final {
                break;
            }
        }

        Ok(output.into_vec())
    }
}

/// Initial output capacity for `input_len` compressed bytes.
fn output_size_hint(input_len: usize) -> usize {
    input_len.saturating_mul(3).min(MAX_INITIAL_CAPACITY)
}

/// Decompress a stored (uncompressed) block.
fn inflate_stored(reader: &mut BitReader<'_>, output: &mut ByteBuffer) -> Result<()> {
    let len = reader.read_u16_le()?;
    let nlen = reader.read_u16_le()?;

    if len != !nlen {
        return Err(DecodeError::corrupt_stored(len, nlen));
    }

    output.extend_from_slice(reader.read_aligned_bytes(len as usize)?);
    Ok(())
}

/// Decompress a block with dynamic Huffman codes.
fn inflate_dynamic(reader: &mut BitReader<'_>, output: &mut ByteBuffer) -> Result<()> {
    let hlit = reader.read_bits(5)? as usize + 257;
    let hdist = reader.read_bits(5)? as usize + 1;
    let hclen = reader.read_bits(4)? as usize + 4;
    tracing::trace!(
        "Inflate: dynamic header HLIT={} HDIST={} HCLEN={}",
        hlit - 257,
        hdist - 1,
        hclen - 4
    );

    let mut code_length_lengths = [0u8; CODELEN_ALPHABET_SIZE];
    for &symbol in &CODE_LENGTH_ORDER[..hclen] {
        code_length_lengths[symbol] = reader.read_bits(3)? as u8;
    }
    let code_length_tree = HuffmanTree::from_code_lengths(&code_length_lengths)
        .map_err(|e| e.at_bit_position(reader.bit_position()))?;

    let mut lengths = vec![0u8; hlit + hdist];
    let mut i = 0;
    while i < lengths.len() {
        let (value, repeat) = match code_length_tree.decode(reader)? {
            symbol @ 0..=15 => (symbol as u8, 1),
            16 => {
                let Some(&prev) = i.checked_sub(1).map(|p| &lengths[p]) else {
                    return Err(DecodeError::corrupt_huffman(
                        reader.bit_position(),
                        "repeat code with no previous length",
                    ));
                };
                (prev, reader.read_bits(2)? as usize + 3)
            }
            17 => (0, reader.read_bits(3)? as usize + 3),
            18 => (0, reader.read_bits(7)? as usize + 11),
            symbol => {
                return Err(DecodeError::corrupt_huffman(
                    reader.bit_position(),
                    format!("invalid code length symbol {}", symbol),
                ));
            }
        };

        let Some(run) = lengths.get_mut(i..i + repeat) else {
            return Err(DecodeError::corrupt_huffman(
                reader.bit_position(),
                "code length run overflows HLIT + HDIST",
            ));
        };
        run.fill(value);
        i += repeat;
    }

    if lengths[END_OF_BLOCK as usize] == 0 {
        return Err(DecodeError::corrupt_huffman(
            reader.bit_position(),
            "no code for end of block",
        ));
    }

    let litlen_tree = HuffmanTree::from_code_lengths(&lengths[..hlit])
        .map_err(|e| e.at_bit_position(reader.bit_position()))?;
    let dist_tree = HuffmanTree::from_code_lengths(&lengths[hlit..])
        .map_err(|e| e.at_bit_position(reader.bit_position()))?;

    inflate_huffman(reader, output, &litlen_tree, &dist_tree)
}

/// Decompress Huffman-coded symbols up to the end of block.
fn inflate_huffman(
    reader: &mut BitReader<'_>,
    output: &mut ByteBuffer,
    litlen_tree: &HuffmanTree,
    dist_tree: &HuffmanTree,
) -> Result<()> {
    loop {
        let symbol = litlen_tree.decode(reader)?;

        match symbol {
            0..=255 => output.push(symbol as u8),
            END_OF_BLOCK => return Ok(()),
            257..=285 => {
                let index = (symbol - 257) as usize;
                let length = LENGTH_BASE[index] as usize
                    + reader.read_bits(LENGTH_EXTRA_BITS[index])? as usize;

                if dist_tree.is_empty() {
                    return Err(DecodeError::corrupt_huffman(
                        reader.bit_position(),
                        "length code in a block without distance codes",
                    ));
                }
                let dist_symbol = dist_tree.decode(reader)? as usize;
                if dist_symbol >= DISTANCE_ALPHABET_SIZE {
                    return Err(DecodeError::corrupt_huffman(
                        reader.bit_position(),
                        format!("invalid distance symbol {}", dist_symbol),
                    ));
                }
                let distance = DISTANCE_BASE[dist_symbol] as usize
                    + reader.read_bits(DISTANCE_EXTRA_BITS[dist_symbol])? as usize;

                output.copy_match(distance, length)?;
            }
            _ => {
                debug_assert!(symbol as usize >= LITLEN_ALPHABET_SIZE);
                return Err(DecodeError::corrupt_huffman(
                    reader.bit_position(),
                    format!("invalid literal/length symbol {}", symbol),
                ));
            }
        }
    }
}

impl Decompressor for Inflater {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.inflate_prefix(input).map(|(output, _)| output)
    }
}

/// Decompress a raw DEFLATE stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    Inflater::new().decompress(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkpack_core::bitstream::BitWriter;

    #[test]
    fn test_inflate_stored() {
        let compressed = vec![
            0x01, // BFINAL=1, BTYPE=00, padding
            0x05, 0x00, // LEN=5
            0xFA, 0xFF, // NLEN
            b'H', b'e', b'l', b'l', b'o',
        ];

        assert_eq!(inflate(&compressed).unwrap(), b"Hello");
    }

    #[test]
    fn test_inflate_empty() {
        let compressed = vec![0x01, 0x00, 0x00, 0xFF, 0xFF];
        assert!(inflate(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_inflate_fixed_reference() {
        // "Hello" with fixed codes, as produced by zlib.
        let compressed = [0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x07, 0x00];
        assert_eq!(inflate(&compressed).unwrap(), b"Hello");
    }

    #[test]
    fn test_stored_len_mismatch() {
        let compressed = vec![0x01, 0x05, 0x00, 0xFB, 0xFF, b'H', b'e', b'l', b'l', b'o'];
        assert_eq!(
            inflate(&compressed),
            Err(DecodeError::corrupt_stored(5, 0xFFFB))
        );
    }

    #[test]
    fn test_reserved_block_type() {
        // BFINAL=1, BTYPE=11
        assert_eq!(inflate(&[0x07]), Err(DecodeError::invalid_block_type(3)));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            inflate(&[]),
            Err(DecodeError::UnexpectedEndOfInput { .. })
        ));
        assert!(matches!(
            inflate(&[0x01, 0x05, 0x00, 0xFA, 0xFF, b'H']),
            Err(DecodeError::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn test_distance_before_start() {
        // Fixed block whose first symbol is length 3 (257, code 0000001),
        // distance symbol 0 (code 00000).
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b01, 2);
        writer.write_bits(0b1000000, 7);
        writer.write_bits(0, 5);
        let compressed = writer.finish();

        assert_eq!(
            inflate(&compressed),
            Err(DecodeError::invalid_distance(1, 0))
        );
    }

    #[test]
    fn test_invalid_literal_symbol() {
        // Symbol 286 in the fixed code: 8-bit code 11000110, sent MSB-first.
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b01, 2);
        writer.write_bits(0b0110_0011, 8);
        let compressed = writer.finish();

        assert!(matches!(
            inflate(&compressed),
            Err(DecodeError::CorruptHuffmanStream { .. })
        ));
    }

    #[test]
    fn test_match_without_distance_codes() {
        // Dynamic block: literal/length codes for 256 and 257 only, one
        // distance code length of zero, then symbol 257.
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(0b10, 2);
        writer.write_bits(1, 5); // HLIT: 258 codes
        writer.write_bits(0, 5); // HDIST: 1 code
        writer.write_bits(14, 4); // HCLEN: 18 codes, up to symbol 1
        for &symbol in &CODE_LENGTH_ORDER[..18] {
            let len = if symbol <= 1 { 1 } else { 0 };
            writer.write_bits(len, 3);
        }
        // Code length symbol 0 is code 0, symbol 1 is code 1.
        for _ in 0..256 {
            writer.write_bit(false);
        }
        writer.write_bit(true);
        writer.write_bit(true);
        writer.write_bit(false);
        // Literal/length symbol 257 (code 1).
        writer.write_bit(true);
        let compressed = writer.finish();

        assert!(matches!(
            inflate(&compressed),
            Err(DecodeError::CorruptHuffmanStream { reason, .. })
                if reason.contains("without distance codes")
        ));
    }

    #[test]
    fn test_output_size_hint_is_bounded() {
        assert_eq!(output_size_hint(0), 0);
        assert_eq!(output_size_hint(100), 300);
        assert_eq!(output_size_hint(usize::MAX), MAX_INITIAL_CAPACITY);
    }

    #[test]
    fn test_inflate_prefix_reports_consumed() {
        let mut data = vec![0x01, 0x02, 0x00, 0xFD, 0xFF, b'h', b'i'];
        data.extend_from_slice(b"TRAILER!");

        let (output, consumed) = Inflater::new().inflate_prefix(&data).unwrap();
        assert_eq!(output, b"hi");
        assert_eq!(consumed, 7);
        assert_eq!(&data[consumed..], b"TRAILER!");
    }

    #[test]
    fn test_multiple_blocks() {
        let compressed = vec![
            0x00, 0x02, 0x00, 0xFD, 0xFF, b'a', b'b', // non-final stored
            0x01, 0x01, 0x00, 0xFE, 0xFF, b'c', // final stored
        ];
        assert_eq!(inflate(&compressed).unwrap(), b"abc");
    }
}
