//! Error types for linkpack decoding.
//!
//! Compression never fails, so every variant here describes a way in which a
//! compressed buffer can be malformed. The first failure aborts the whole
//! decode; there is no partial output.

use thiserror::Error;

/// The error type returned by every decode step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended before the stream was complete.
    #[error("Unexpected end of input at bit position {bit_position}")]
    UnexpectedEndOfInput {
        /// Bit position at which more input was required.
        bit_position: u64,
    },

    /// A DEFLATE block header carried the reserved block type.
    #[error("Invalid block type {block_type}")]
    InvalidBlockType {
        /// The block type read from the header.
        block_type: u8,
    },

    /// A stored block whose LEN is not the one's complement of NLEN.
    #[error("Corrupt stored block: LEN {len:#06x} does not match NLEN {nlen:#06x}")]
    CorruptStoredBlock {
        /// LEN field.
        len: u16,
        /// NLEN field.
        nlen: u16,
    },

    /// The Huffman-coded part of a block cannot be decoded.
    #[error("Corrupt Huffman stream at bit position {bit_position}: {reason}")]
    CorruptHuffmanStream {
        /// Bit position where the corruption was detected.
        bit_position: u64,
        /// What was wrong.
        reason: String,
    },

    /// A back-reference reaches before the start of the output.
    #[error("Invalid back-reference distance {distance}: only {available} bytes decoded")]
    InvalidDistance {
        /// Distance requested by the match.
        distance: usize,
        /// Number of bytes available for copying.
        available: usize,
    },

    /// The GZIP magic bytes or compression method are wrong.
    #[error("Invalid GZIP magic {magic:02x?} or method {method}")]
    InvalidGzipMagicOrMethod {
        /// The first two bytes of the input.
        magic: [u8; 2],
        /// The CM byte.
        method: u8,
    },

    /// Reserved FLG bits are set in the GZIP header.
    #[error("Reserved GZIP header flags set: {flags:#04x}")]
    ReservedGzipFlags {
        /// The full FLG byte.
        flags: u8,
    },

    /// The FHCRC field does not match the header bytes.
    #[error("Header checksum mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    HeaderChecksumMismatch {
        /// CRC16 stored in the header.
        expected: u16,
        /// Low 16 bits of the CRC-32 of the header bytes.
        computed: u16,
    },

    /// The trailer CRC-32 does not match the decoded payload.
    #[error("Trailer checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    TrailerChecksumMismatch {
        /// CRC-32 stored in the trailer.
        expected: u32,
        /// CRC-32 of the decoded payload.
        computed: u32,
    },

    /// The trailer ISIZE does not match the decoded payload length.
    #[error("Trailer size mismatch: expected {expected}, decoded {actual}")]
    TrailerSizeMismatch {
        /// ISIZE stored in the trailer.
        expected: u32,
        /// Decoded length modulo 2^32.
        actual: u32,
    },
}

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

impl DecodeError {
    /// Create an unexpected end of input error.
    pub fn unexpected_end(bit_position: u64) -> Self {
        Self::UnexpectedEndOfInput { bit_position }
    }

    /// Create an invalid block type error.
    pub fn invalid_block_type(block_type: u8) -> Self {
        Self::InvalidBlockType { block_type }
    }

    /// Create a corrupt stored block error.
    pub fn corrupt_stored(len: u16, nlen: u16) -> Self {
        Self::CorruptStoredBlock { len, nlen }
    }

    /// Create a corrupt Huffman stream error.
    pub fn corrupt_huffman(bit_position: u64, reason: impl Into<String>) -> Self {
        Self::CorruptHuffmanStream {
            bit_position,
            reason: reason.into(),
        }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, available: usize) -> Self {
        Self::InvalidDistance {
            distance,
            available,
        }
    }

    /// Create an invalid magic/method error.
    pub fn invalid_magic_or_method(magic: [u8; 2], method: u8) -> Self {
        Self::InvalidGzipMagicOrMethod { magic, method }
    }

    /// Create a reserved flags error.
    pub fn reserved_flags(flags: u8) -> Self {
        Self::ReservedGzipFlags { flags }
    }

    /// Create a header checksum mismatch error.
    pub fn header_crc_mismatch(expected: u16, computed: u16) -> Self {
        Self::HeaderChecksumMismatch { expected, computed }
    }

    /// Create a trailer checksum mismatch error.
    pub fn trailer_crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::TrailerChecksumMismatch { expected, computed }
    }

    /// Create a trailer size mismatch error.
    pub fn trailer_size_mismatch(expected: u32, actual: u32) -> Self {
        Self::TrailerSizeMismatch { expected, actual }
    }

    /// Replace the bit position of a positional error.
    ///
    /// Helpers that see only part of the stream report position 0; the
    /// caller holding the reader fills in the real one.
    pub fn at_bit_position(self, position: u64) -> Self {
        match self {
            Self::UnexpectedEndOfInput { .. } => Self::unexpected_end(position),
            Self::CorruptHuffmanStream { reason, .. } => Self::CorruptHuffmanStream {
                bit_position: position,
                reason,
            },
            other => other,
        }
    }
}
