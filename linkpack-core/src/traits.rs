//! Core traits for one-shot compression and decompression.
//!
//! Every codec in linkpack works on whole in-memory buffers. Compression
//! always produces a valid stream; decompression reports the first problem
//! it finds and produces nothing else.

use crate::error::Result;

/// A one-shot compressor (encoder).
///
/// Implemented by the raw DEFLATE encoder and the GZIP encoder.
pub trait Compressor {
    /// Compress `input` into a freshly allocated buffer.
    fn compress(&self, input: &[u8]) -> Vec<u8>;

    /// Compress `input` and append the result to `output`.
    fn compress_into(&self, input: &[u8], output: &mut Vec<u8>) {
        output.extend_from_slice(&self.compress(input));
    }
}

/// A one-shot decompressor (decoder).
///
/// Implemented by the raw DEFLATE decoder and the GZIP decoder.
pub trait Decompressor {
    /// Decompress `input` into a freshly allocated buffer.
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;
}

impl<T: Compressor + ?Sized> Compressor for &T {
    fn compress(&self, input: &[u8]) -> Vec<u8> {
        (**self).compress(input)
    }
}

impl<T: Decompressor + ?Sized> Decompressor for &T {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        (**self).decompress(input)
    }
}
