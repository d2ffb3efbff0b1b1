//! # linkpack
//!
//! GZIP compression for payloads that travel inside shareable links and QR
//! codes.
//!
//! linkpack produces standard RFC 1952 GZIP streams holding RFC 1951 DEFLATE
//! data, so anything it writes can be read back with `gzip -d`, zlib or a
//! browser's `DecompressionStream`, and it reads the streams those produce.
//!
//! ## Example
//!
//! ```rust
//! use linkpack::{compress, decompress};
//!
//! let state = br#"{"filters":["region=emea","year=2024"],"sort":"revenue"}"#;
//! let compressed = compress(state);
//! assert_eq!(&compressed[..2], &[0x1F, 0x8B]);
//!
//! let restored = decompress(&compressed).unwrap();
//! assert_eq!(restored, state);
//! ```
//!
//! ## Options
//!
//! ```rust
//! use linkpack::{BlockStrategy, CompressOptions, DecompressOptions};
//!
//! let options = CompressOptions::default()
//!     .with_strategy(BlockStrategy::Smallest)
//!     .with_header_crc(true);
//! let compressed = linkpack::compress_with(b"aaaaaaaaaaaaaaaa", &options);
//!
//! let data = linkpack::decompress_with(&compressed, &DecompressOptions::LENIENT).unwrap();
//! assert_eq!(data, b"aaaaaaaaaaaaaaaa");
//! ```
//!
//! ## Crates
//!
//! - `linkpack-core`: bit I/O, CRC-32, error types
//! - `linkpack-deflate`: LZ77 match finding, Huffman coding, DEFLATE blocks
//! - `linkpack` (this crate): GZIP container and the top-level API

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod gzip;

pub use config::{CompressOptions, DecompressOptions};
pub use gzip::{GzipDecoder, GzipEncoder, GzipHeader, GzipMember, GzipTrailer};
pub use linkpack_core::{Compressor, Crc32, DecodeError, Decompressor, Result};
pub use linkpack_deflate::{BlockStrategy, DeflateOptions, deflate, inflate};

/// Compress `data` into a GZIP stream with default options.
pub fn compress(data: &[u8]) -> Vec<u8> {
    compress_with(data, &CompressOptions::DEFAULT)
}

/// Compress `data` into a GZIP stream.
pub fn compress_with(data: &[u8], options: &CompressOptions) -> Vec<u8> {
    GzipEncoder::new(options).encode(data)
}

/// Decompress a GZIP stream, verifying its trailer.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_with(data, &DecompressOptions::DEFAULT)
}

/// Decompress a GZIP stream.
pub fn decompress_with(data: &[u8], options: &DecompressOptions) -> Result<Vec<u8>> {
    GzipDecoder::new(*options).decode(data).map(|member| member.data)
}
