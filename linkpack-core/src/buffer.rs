//! Append-only output buffer for LZ77 decompression.
//!
//! The whole decoded payload stays in memory, so back-references are resolved
//! directly against the output instead of a separate ring buffer. The buffer
//! is owned by one decoder at a time and handed over with [`ByteBuffer::into_vec`].

use crate::error::{DecodeError, Result};

/// Largest distance a DEFLATE back-reference may use (32 KB).
pub const MAX_DISTANCE: usize = 32768;

/// A growable byte buffer that supports overlapping match copies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with a capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Append a literal byte.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    /// Append a run of literal bytes.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Copy `length` bytes starting `distance` bytes back from the end.
    ///
    /// The source may overlap the bytes being produced (`distance < length`),
    /// in which case the copy repeats the most recent `distance` bytes.
    pub fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.bytes.len() || distance > MAX_DISTANCE {
            return Err(DecodeError::invalid_distance(distance, self.bytes.len()));
        }

        self.bytes.reserve(length);
        let start = self.bytes.len() - distance;

        if distance >= length {
            self.bytes.extend_from_within(start..start + length);
        } else {
            for i in 0..length {
                let byte = self.bytes[start + i];
                self.bytes.push(byte);
            }
        }

        Ok(())
    }

    /// Consume the buffer and return the written bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<ByteBuffer> for Vec<u8> {
    fn from(buffer: ByteBuffer) -> Self {
        buffer.into_vec()
    }
}
