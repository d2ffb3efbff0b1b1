//! Bit-level I/O over byte buffers.
//!
//! This module provides `BitReader` and `BitWriter` for reading and writing
//! data at the bit level, as needed by the variable-length Huffman codes and
//! the extra-bit fields of DEFLATE.
//!
//! # Bit Ordering
//!
//! DEFLATE packs bits LSB-first within each byte: the first bit written lands
//! in bit 0 of the first byte. Multi-bit values are written with their least
//! significant bit first.
//!
//! # Example
//!
//! ```
//! use linkpack_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0b1100, 4);
//! let output = writer.finish();
//!
//! let mut reader = BitReader::new(&output);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
//! ```

use crate::error::{DecodeError, Result};

/// Widest value that may be written or read in one call.
pub const MAX_BITS_PER_CALL: u8 = 16;

/// A bit-level writer that accumulates output in a growable byte vector.
///
/// Bits are collected in a 32-bit tag register. Whenever 16 or more bits are
/// buffered, the low 16 bits are emitted as a little-endian unit. Writing
/// into a `Vec` cannot fail, so none of the methods return `Result`.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    /// Bytes already flushed from the tag register.
    output: Vec<u8>,
    /// Pending bits (LSB-first).
    tag: u32,
    /// Number of valid bits in `tag` (always below 16 between calls).
    bits_in_tag: u8,
    /// Total bits written, including alignment padding.
    total_bits_written: u64,
}

impl BitWriter {
    /// Create an empty `BitWriter`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `BitWriter` with room for `capacity` output bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.total_bits_written
    }

    /// Check whether the next bit starts a new byte.
    pub fn is_byte_aligned(&self) -> bool {
        self.bits_in_tag % 8 == 0
    }

    /// Write up to 16 bits, least significant bit first.
    ///
    /// Bits of `value` above `count` are ignored.
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(
            count <= MAX_BITS_PER_CALL,
            "Cannot write more than 16 bits at once"
        );

        if count == 0 {
            return;
        }

        let value = value & ((1u32 << count) - 1);
        self.tag |= value << self.bits_in_tag;
        self.bits_in_tag += count;
        self.total_bits_written += u64::from(count);

        if self.bits_in_tag >= 16 {
            self.output
                .extend_from_slice(&((self.tag & 0xFFFF) as u16).to_le_bytes());
            self.tag >>= 16;
            self.bits_in_tag -= 16;
        }
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        let partial = self.bits_in_tag % 8;
        if partial != 0 {
            self.write_bits(0, 8 - partial);
        }
    }

    /// Write whole bytes directly to the output.
    ///
    /// The writer is aligned to a byte boundary first.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.align_to_byte();

        // An aligned tag holds either nothing or exactly one byte.
        if self.bits_in_tag == 8 {
            self.output.push((self.tag & 0xFF) as u8);
            self.tag = 0;
            self.bits_in_tag = 0;
        }

        self.output.extend_from_slice(bytes);
        self.total_bits_written += bytes.len() as u64 * 8;
    }

    /// Emit any buffered bits as one or two trailing bytes, zero padded.
    pub fn flush(&mut self) {
        self.align_to_byte();
        while self.bits_in_tag > 0 {
            self.output.push((self.tag & 0xFF) as u8);
            self.tag >>= 8;
            self.bits_in_tag = self.bits_in_tag.saturating_sub(8);
        }
    }

    /// Flush and return the written bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.output
    }
}

/// A bit-level reader over a borrowed byte slice.
///
/// The reader keeps two registers: `tag` holds the bits about to be consumed,
/// and `reserve` holds bits fetched from the input but not yet moved into
/// `tag`. The reserve is refilled with 1 to 4 bytes at a time, never past the
/// end of the input.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// The whole input.
    input: &'a [u8],
    /// Index of the next byte to fetch into the reserve.
    position: usize,
    /// Bits ready for consumption (LSB-first).
    tag: u32,
    /// Number of valid bits in `tag`.
    tag_bits: u8,
    /// Pre-fetched bits that follow `tag`.
    reserve: u32,
    /// Number of valid bits in `reserve`.
    reserve_bits: u8,
}

impl<'a> BitReader<'a> {
    /// Create a new `BitReader` over `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            tag: 0,
            tag_bits: 0,
            reserve: 0,
            reserve_bits: 0,
        }
    }

    /// Number of bits buffered in both registers.
    #[inline]
    fn buffered_bits(&self) -> usize {
        usize::from(self.tag_bits) + usize::from(self.reserve_bits)
    }

    /// Get the number of bits consumed so far.
    pub fn bit_position(&self) -> u64 {
        (self.position * 8 - self.buffered_bits()) as u64
    }

    /// Get the number of input bytes touched so far, counting a partially
    /// consumed byte as consumed.
    pub fn bytes_consumed(&self) -> usize {
        self.bit_position().div_ceil(8) as usize
    }

    /// Get the input that follows the consumed bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.bytes_consumed().min(self.input.len())..]
    }

    /// Load the next 1-4 input bytes into an empty reserve.
    #[inline]
    fn refill_reserve(&mut self) {
        debug_assert_eq!(self.reserve_bits, 0);

        let width = (self.input.len() - self.position).min(4);
        let mut reserve = 0u32;
        for (i, &byte) in self.input[self.position..self.position + width]
            .iter()
            .enumerate()
        {
            reserve |= u32::from(byte) << (8 * i);
        }

        self.reserve = reserve;
        self.reserve_bits = (width * 8) as u8;
        self.position += width;
    }

    /// Ensure at least `count` bits are in the tag register.
    #[inline]
    fn ensure(&mut self, count: u8) -> Result<()> {
        while self.tag_bits < count {
            if self.reserve_bits == 0 {
                self.refill_reserve();
                if self.reserve_bits == 0 {
                    return Err(DecodeError::unexpected_end(self.bit_position()));
                }
            }

            let take = (32 - self.tag_bits).min(self.reserve_bits);
            let chunk = u64::from(self.reserve) & ((1u64 << take) - 1);
            self.tag |= (chunk << self.tag_bits) as u32;
            self.reserve = (u64::from(self.reserve) >> take) as u32;
            self.tag_bits += take;
            self.reserve_bits -= take;
        }
        Ok(())
    }

    /// Read up to 16 bits from the stream.
    ///
    /// The first bit read ends up in the least significant position.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(
            count <= MAX_BITS_PER_CALL,
            "Cannot read more than 16 bits at once"
        );

        if count == 0 {
            return Ok(0);
        }

        self.ensure(count)?;

        let result = self.tag & ((1u32 << count) - 1);
        self.tag >>= count;
        self.tag_bits -= count;

        Ok(result)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Discard bits up to the next byte boundary.
    ///
    /// Whole bytes still sitting in the registers are handed back to the
    /// input, so the next read starts exactly at the aligned byte.
    pub fn align_to_byte(&mut self) {
        let partial = (self.buffered_bits() % 8) as u8;
        if partial > 0 {
            // The partial bits are always buffered, so this cannot fail.
            if self.ensure(partial).is_ok() {
                self.tag >>= partial;
                self.tag_bits -= partial;
            }
        }

        self.position -= self.buffered_bits() / 8;
        self.tag = 0;
        self.tag_bits = 0;
        self.reserve = 0;
        self.reserve_bits = 0;
    }

    /// Align to a byte boundary and borrow the next `len` input bytes.
    pub fn read_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.align_to_byte();

        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| DecodeError::unexpected_end(self.bit_position()))?;

        let bytes = &self.input[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Align to a byte boundary and read a little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_aligned_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}
