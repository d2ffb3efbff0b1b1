//! GZIP header and trailer parsing and writing.

use linkpack_core::Crc32;
use linkpack_core::error::{DecodeError, Result};

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// OS field value for "unknown".
pub const OS_UNKNOWN: u8 = 0xFF;

/// Size of the fixed part of the header.
pub const FIXED_HEADER_LEN: usize = 10;

/// Size of the trailer (CRC32 + ISIZE).
pub const TRAILER_LEN: usize = 8;

/// Largest FEXTRA payload XLEN can describe.
pub const MAX_EXTRA_LEN: usize = u16::MAX as usize;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits 5-7, which must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// GZIP member header.
///
/// The FLG byte is derived from which optional fields are present, so a
/// header built here can never claim a field it does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader {
    /// FTEXT: the payload is probably text.
    pub is_text: bool,
    /// Modification time (Unix timestamp, 0 = none).
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
    /// FEXTRA payload (at most [`MAX_EXTRA_LEN`] bytes are written).
    pub extra: Option<Vec<u8>>,
    /// Original filename (FNAME), written up to the first NUL.
    pub filename: Option<String>,
    /// Comment (FCOMMENT), written up to the first NUL.
    pub comment: Option<String>,
    /// Write (or, after parsing, carried) an FHCRC checksum.
    pub header_crc: bool,
}

impl Default for GzipHeader {
    fn default() -> Self {
        Self {
            is_text: false,
            mtime: 0,
            xfl: 0,
            os: OS_UNKNOWN,
            extra: None,
            filename: None,
            comment: None,
            header_crc: false,
        }
    }
}

impl GzipHeader {
    /// Create a new GZIP header with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a header with filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the extra field, truncated to [`MAX_EXTRA_LEN`] bytes.
    pub fn with_extra(mut self, extra: impl Into<Vec<u8>>) -> Self {
        let mut extra = extra.into();
        extra.truncate(MAX_EXTRA_LEN);
        self.extra = Some(extra);
        self
    }

    /// Set the modification time.
    pub fn with_mtime(mut self, mtime: u32) -> Self {
        self.mtime = mtime;
        self
    }

    /// Enable or disable the header checksum.
    pub fn with_header_crc(mut self, header_crc: bool) -> Self {
        self.header_crc = header_crc;
        self
    }

    /// The FLG byte this header is written with.
    pub fn flags(&self) -> u8 {
        let mut flg = 0;
        if self.is_text {
            flg |= flags::FTEXT;
        }
        if self.header_crc {
            flg |= flags::FHCRC;
        }
        if self.extra.is_some() {
            flg |= flags::FEXTRA;
        }
        if self.filename.is_some() {
            flg |= flags::FNAME;
        }
        if self.comment.is_some() {
            flg |= flags::FCOMMENT;
        }
        flg
    }

    /// Append the encoded header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let start = out.len();

        out.extend_from_slice(&GZIP_MAGIC);
        out.push(CM_DEFLATE);
        out.push(self.flags());
        out.extend_from_slice(&self.mtime.to_le_bytes());
        out.push(self.xfl);
        out.push(self.os);

        if let Some(extra) = &self.extra {
            if extra.len() > MAX_EXTRA_LEN {
                tracing::debug!(
                    "Gzip: truncating {}-byte extra field to {} bytes",
                    extra.len(),
                    MAX_EXTRA_LEN
                );
            }
            let extra = &extra[..extra.len().min(MAX_EXTRA_LEN)];
            out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            out.extend_from_slice(extra);
        }
        if let Some(filename) = &self.filename {
            write_zero_terminated(out, filename);
        }
        if let Some(comment) = &self.comment {
            write_zero_terminated(out, comment);
        }
        if self.header_crc {
            let crc16 = Crc32::compute(&out[start..]) as u16;
            out.extend_from_slice(&crc16.to_le_bytes());
        }
    }

    /// Encode the header into a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_HEADER_LEN);
        self.write_to(&mut out);
        out
    }

    /// Parse a header from the start of `data`.
    ///
    /// Returns the header and its encoded length.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = ByteCursor::new(data);

        let fixed = cursor.take(FIXED_HEADER_LEN)?;
        let magic = [fixed[0], fixed[1]];
        let method = fixed[2];
        if magic != GZIP_MAGIC || method != CM_DEFLATE {
            return Err(DecodeError::invalid_magic_or_method(magic, method));
        }

        let flg = fixed[3];
        if flg & flags::RESERVED != 0 {
            return Err(DecodeError::reserved_flags(flg));
        }

        let mut header = Self {
            is_text: flg & flags::FTEXT != 0,
            mtime: u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]),
            xfl: fixed[8],
            os: fixed[9],
            extra: None,
            filename: None,
            comment: None,
            header_crc: flg & flags::FHCRC != 0,
        };

        if flg & flags::FEXTRA != 0 {
            let xlen = cursor.take(2)?;
            let xlen = u16::from_le_bytes([xlen[0], xlen[1]]) as usize;
            header.extra = Some(cursor.take(xlen)?.to_vec());
        }
        if flg & flags::FNAME != 0 {
            header.filename = Some(cursor.take_zero_terminated()?);
        }
        if flg & flags::FCOMMENT != 0 {
            header.comment = Some(cursor.take_zero_terminated()?);
        }

        if header.header_crc {
            let computed = Crc32::compute(&data[..cursor.position]) as u16;
            let stored = cursor.take(2)?;
            let expected = u16::from_le_bytes([stored[0], stored[1]]);
            if expected != computed {
                return Err(DecodeError::header_crc_mismatch(expected, computed));
            }
        }

        tracing::debug!(
            "Gzip: parsed header (flags={:#04x}, mtime={}, os={}, {} bytes)",
            flg,
            header.mtime,
            header.os,
            cursor.position
        );

        Ok((header, cursor.position))
    }
}

fn write_zero_terminated(out: &mut Vec<u8>, text: &str) {
    out.extend(text.bytes().take_while(|&b| b != 0));
    out.push(0);
}

/// GZIP member trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipTrailer {
    /// CRC-32 of the uncompressed payload.
    pub crc32: u32,
    /// Payload length modulo 2^32.
    pub isize: u32,
}

impl GzipTrailer {
    /// Compute the trailer for `data`.
    pub fn for_data(data: &[u8]) -> Self {
        Self {
            crc32: Crc32::compute(data),
            isize: data.len() as u32,
        }
    }

    /// Append the encoded trailer to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.isize.to_le_bytes());
    }

    /// Parse a trailer from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let bytes = ByteCursor::new(data).take(TRAILER_LEN)?;
        Ok(Self {
            crc32: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            isize: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }

    /// Check the trailer against a decoded payload.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        let computed = Crc32::compute(data);
        if computed != self.crc32 {
            return Err(DecodeError::trailer_crc_mismatch(self.crc32, computed));
        }

        let actual = data.len() as u32;
        if actual != self.isize {
            return Err(DecodeError::trailer_size_mismatch(self.isize, actual));
        }

        Ok(())
    }
}

/// Byte-granular reader over the header bytes.
struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.position + len;
        let bytes = self
            .data
            .get(self.position..end)
            .ok_or_else(|| DecodeError::unexpected_end(self.data.len() as u64 * 8))?;
        self.position = end;
        Ok(bytes)
    }

    fn take_zero_terminated(&mut self) -> Result<String> {
        let rest = &self.data[self.position..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| DecodeError::unexpected_end(self.data.len() as u64 * 8))?;
        self.position += len + 1;
        Ok(String::from_utf8_lossy(&rest[..len]).into_owned())
    }
}
