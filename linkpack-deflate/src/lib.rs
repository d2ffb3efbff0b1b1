//! # linkpack Deflate
//!
//! Pure Rust implementation of the DEFLATE compression algorithm (RFC 1951).
//!
//! This crate provides compression and decompression of raw DEFLATE data,
//! the codec inside the linkpack GZIP container.
//!
//! ## Features
//!
//! - **Decompression**: Full support for all DEFLATE block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - **Compression**: LZ77 + Huffman encoding
//!   - Prefix-indexed LZ77 with a configurable window (up to 32 KB)
//!   - Length-limited canonical codes built with package-merge
//!   - Stored, fixed, dynamic, or smallest-per-block output
//!
//! ## Example
//!
//! ```rust
//! use linkpack_deflate::{DeflateOptions, deflate, inflate};
//!
//! let original = b"Hello, World! Hello, World!";
//! let compressed = deflate(original, &DeflateOptions::default());
//!
//! let decompressed = inflate(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```
//!
//! ## Block Strategies
//!
//! - `Stored`: No compression (raw blocks of up to 65535 bytes)
//! - `Fixed`: RFC 1951 fixed codes, no table overhead
//! - `Dynamic`: Per-block codes (default)
//! - `Smallest`: Exact cost of all three, cheapest wins

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod deflate;
pub mod huffman;
pub mod inflate;
pub mod lz77;
pub mod tables;

// Re-exports
pub use config::{BlockStrategy, DeflateOptions};
pub use deflate::{Deflater, deflate};
pub use huffman::{CanonicalCode, CodeTable, HuffmanBuilder, HuffmanTree, build_canonical_code};
pub use inflate::{Inflater, inflate};
pub use lz77::{Lz77Encoder, Lz77Token};
