//! # linkpack Core
//!
//! Core components for the linkpack codec.
//!
//! This crate provides the fundamental building blocks shared by the DEFLATE
//! codec and the GZIP container:
//!
//! - [`bitstream`]: LSB-first bit-level I/O over byte buffers
//! - [`buffer`]: Append-only output buffer with overlapping back-reference copy
//! - [`crc`]: Nibble-table CRC-32
//! - [`traits`]: One-shot compressor/decompressor seams
//! - [`error`]: Decode error taxonomy
//!
//! ## Architecture
//!
//! linkpack is layered the same way as a classic archiver stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Container                                           │
//! │     GZIP header/trailer, compress/decompress API        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Deflate (LZ77 + canonical Huffman)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader/BitWriter, ByteBuffer, CRC-32             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use linkpack_core::bitstream::{BitReader, BitWriter};
//! use linkpack_core::crc::Crc32;
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0xABC, 12);
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bits(12).unwrap(), 0xABC);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod buffer;
pub mod crc;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use buffer::ByteBuffer;
pub use crc::Crc32;
pub use error::{DecodeError, Result};
pub use traits::{Compressor, Decompressor};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitReader, BitWriter};
    pub use crate::buffer::ByteBuffer;
    pub use crate::crc::Crc32;
    pub use crate::error::{DecodeError, Result};
    pub use crate::traits::{Compressor, Decompressor};
}
