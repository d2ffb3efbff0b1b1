//! Container-level configuration.

use linkpack_deflate::{BlockStrategy, DeflateOptions};

/// Options for producing a GZIP stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompressOptions {
    /// DEFLATE encoder parameters.
    pub deflate: DeflateOptions,
    /// Write an FHCRC header checksum.
    pub header_crc: bool,
    /// MTIME header field (0 = no timestamp).
    pub mtime: u32,
}

impl CompressOptions {
    /// Dynamic Huffman blocks, full window, minimal header.
    pub const DEFAULT: Self = Self {
        deflate: DeflateOptions::DEFAULT,
        header_crc: false,
        mtime: 0,
    };

    /// Fixed Huffman blocks.
    pub const FAST: Self = Self {
        deflate: DeflateOptions::FAST,
        ..Self::DEFAULT
    };

    /// Stored blocks only.
    pub const STORE: Self = Self {
        deflate: DeflateOptions::STORE,
        ..Self::DEFAULT
    };

    /// Smallest block type per block.
    pub const BEST: Self = Self {
        deflate: DeflateOptions::BEST,
        ..Self::DEFAULT
    };

    /// Replace the DEFLATE parameters.
    pub fn with_deflate(mut self, deflate: DeflateOptions) -> Self {
        self.deflate = deflate;
        self
    }

    /// Set the block strategy.
    pub fn with_strategy(mut self, strategy: BlockStrategy) -> Self {
        self.deflate = self.deflate.with_strategy(strategy);
        self
    }

    /// Set the match window, clamped to 1-32768.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.deflate = self.deflate.with_window_size(window_size);
        self
    }

    /// Enable or disable the header checksum.
    pub fn with_header_crc(mut self, header_crc: bool) -> Self {
        self.header_crc = header_crc;
        self
    }

    /// Set the MTIME header field.
    pub fn with_mtime(mut self, mtime: u32) -> Self {
        self.mtime = mtime;
        self
    }
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Options for reading a GZIP stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecompressOptions {
    /// Check the trailer CRC-32 and ISIZE against the decoded payload.
    pub verify_trailer: bool,
}

impl DecompressOptions {
    /// Verify the trailer.
    pub const DEFAULT: Self = Self {
        verify_trailer: true,
    };

    /// Trust the payload and skip trailer checks.
    pub const LENIENT: Self = Self {
        verify_trailer: false,
    };

    /// Enable or disable trailer verification.
    pub fn with_verify_trailer(mut self, verify_trailer: bool) -> Self {
        self.verify_trailer = verify_trailer;
        self
    }
}

impl Default for DecompressOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
