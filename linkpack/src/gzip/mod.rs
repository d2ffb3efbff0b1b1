//! GZIP format support (RFC 1952).
//!
//! A GZIP stream here is a single member: header, one DEFLATE stream, and
//! an 8-byte trailer holding the CRC-32 and length of the payload. The
//! trailer is located right after the final DEFLATE block; anything after
//! it is ignored.
//!
//! ## Example
//!
//! ```rust
//! use linkpack::CompressOptions;
//! use linkpack::gzip::{GzipDecoder, GzipEncoder, GzipHeader};
//!
//! let encoder = GzipEncoder::new(&CompressOptions::default())
//!     .with_header(GzipHeader::new().with_filename("view.json"));
//! let compressed = encoder.encode(b"{\"rows\":[]}");
//!
//! let member = GzipDecoder::default().decode(&compressed).unwrap();
//! assert_eq!(member.header.filename.as_deref(), Some("view.json"));
//! assert_eq!(member.data, b"{\"rows\":[]}");
//! ```

mod header;

pub use header::{
    CM_DEFLATE, FIXED_HEADER_LEN, GZIP_MAGIC, GzipHeader, GzipTrailer, MAX_EXTRA_LEN, OS_UNKNOWN,
    TRAILER_LEN, flags,
};

use crate::config::{CompressOptions, DecompressOptions};
use linkpack_core::error::Result;
use linkpack_core::traits::{Compressor, Decompressor};
use linkpack_deflate::{DeflateOptions, Deflater, Inflater};

/// One decoded GZIP member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipMember {
    /// Parsed header.
    pub header: GzipHeader,
    /// Decompressed payload.
    pub data: Vec<u8>,
    /// Trailer as stored in the stream.
    pub trailer: GzipTrailer,
}

/// GZIP encoder.
#[derive(Debug, Clone, Default)]
pub struct GzipEncoder {
    /// Header to write.
    header: GzipHeader,
    /// DEFLATE parameters.
    deflate: DeflateOptions,
}

impl GzipEncoder {
    /// Create an encoder from compression options.
    pub fn new(options: &CompressOptions) -> Self {
        Self {
            header: GzipHeader::new()
                .with_mtime(options.mtime)
                .with_header_crc(options.header_crc),
            deflate: options.deflate,
        }
    }

    /// Replace the header to write.
    pub fn with_header(mut self, header: GzipHeader) -> Self {
        self.header = header;
        self
    }

    /// Get the header.
    pub fn header(&self) -> &GzipHeader {
        &self.header
    }

    /// Compress `data` into a complete GZIP stream.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() / 2 + 32);
        self.header.write_to(&mut out);

        out.extend_from_slice(&Deflater::new(self.deflate).compress_to_vec(data));

        let trailer = GzipTrailer::for_data(data);
        trailer.write_to(&mut out);

        tracing::debug!(
            "Gzip: encoded {} bytes into {} (crc32={:#010x})",
            data.len(),
            out.len(),
            trailer.crc32
        );

        out
    }
}

impl Compressor for GzipEncoder {
    fn compress(&self, input: &[u8]) -> Vec<u8> {
        self.encode(input)
    }
}

/// GZIP decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GzipDecoder {
    options: DecompressOptions,
}

impl GzipDecoder {
    /// Create a decoder with the given options.
    pub fn new(options: DecompressOptions) -> Self {
        Self { options }
    }

    /// Decode the member at the start of `data`.
    ///
    /// Fails on the first problem found; nothing is returned on failure.
    pub fn decode(&self, data: &[u8]) -> Result<GzipMember> {
        let (header, header_len) = GzipHeader::parse(data)?;

        let body = &data[header_len..];
        let (payload, body_len) = Inflater::new().inflate_prefix(body)?;

        let trailer = GzipTrailer::parse(&body[body_len..])
            .map_err(|e| e.at_bit_position(data.len() as u64 * 8))?;
        if self.options.verify_trailer {
            trailer.verify(&payload)?;
        }

        let trailing = body.len() - body_len - TRAILER_LEN;
        if trailing > 0 {
            tracing::debug!("Gzip: ignoring {} bytes after the trailer", trailing);
        }
        tracing::debug!(
            "Gzip: decoded {} bytes from {} (crc32={:#010x}, verified={})",
            payload.len(),
            data.len(),
            trailer.crc32,
            self.options.verify_trailer
        );

        Ok(GzipMember {
            header,
            data: payload,
            trailer,
        })
    }
}

impl Decompressor for GzipDecoder {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.decode(input).map(|member| member.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkpack_core::DecodeError;

    #[test]
    fn test_gzip_roundtrip() {
        let original = b"Hello, GZIP World! This is a test of compression.";
        let compressed = GzipEncoder::default().encode(original);

        let member = GzipDecoder::default().decode(&compressed).unwrap();
        assert_eq!(member.data, original);
        assert_eq!(member.header, GzipHeader::default());
        assert_eq!(member.trailer, GzipTrailer::for_data(original));
    }

    #[test]
    fn test_gzip_roundtrip_with_filename() {
        let original = b"Test data with filename";
        let header = GzipHeader::new()
            .with_filename("data.txt")
            .with_comment("exported view")
            .with_header_crc(true);
        let compressed = GzipEncoder::default()
            .with_header(header.clone())
            .encode(original);

        let member = GzipDecoder::default().decode(&compressed).unwrap();
        assert_eq!(member.header, header);
        assert_eq!(member.data, original);
    }

    #[test]
    fn test_options_reach_header() {
        let options = CompressOptions::default()
            .with_mtime(0x01020304)
            .with_header_crc(true);
        let encoder = GzipEncoder::new(&options);
        assert_eq!(encoder.header().mtime, 0x01020304);
        assert!(encoder.header().header_crc);

        let compressed = encoder.encode(b"x");
        assert_eq!(&compressed[4..8], &[4, 3, 2, 1]);
        assert_eq!(compressed[3], flags::FHCRC);
    }

    #[test]
    fn test_trailing_garbage_ignored() {
        let mut compressed = GzipEncoder::default().encode(b"payload");
        compressed.extend_from_slice(b"\0\0junk");
        assert_eq!(
            GzipDecoder::default().decompress(&compressed).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn test_missing_trailer() {
        let compressed = GzipEncoder::default().encode(b"payload");
        let truncated = &compressed[..compressed.len() - 3];
        assert!(matches!(
            GzipDecoder::default().decode(truncated),
            Err(DecodeError::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn test_lenient_skips_trailer_check() {
        let mut compressed = GzipEncoder::default().encode(b"payload");
        let crc_at = compressed.len() - TRAILER_LEN;
        compressed[crc_at] ^= 0xFF;

        assert!(matches!(
            GzipDecoder::default().decode(&compressed),
            Err(DecodeError::TrailerChecksumMismatch { .. })
        ));
        let member = GzipDecoder::new(DecompressOptions::LENIENT)
            .decode(&compressed)
            .unwrap();
        assert_eq!(member.data, b"payload");
    }

    #[test]
    fn test_size_mismatch() {
        let mut compressed = GzipEncoder::default().encode(b"payload");
        let last = compressed.len() - 1;
        compressed[last] = 1;
        assert!(matches!(
            GzipDecoder::default().decode(&compressed),
            Err(DecodeError::TrailerSizeMismatch { .. })
        ));
    }
}
