//! CRC-32 (ISO 3309) as used by the GZIP trailer and header checksum.
//!
//! The implementation is table-driven with a 16-entry nibble table: the
//! running value absorbs four input bytes at a time (or the 1-3 byte
//! remainder) and is then folded one nibble at a time. The table is 64 bytes,
//! which keeps the codec small enough to ship inside a web page.

/// Reflected CRC-32 polynomial.
const POLYNOMIAL: u32 = 0xEDB88320;

/// CRC-32 nibble lookup table (polynomial 0xEDB88320, reflected).
const CRC32_NIBBLE_TABLE: [u32; 16] = {
    let mut table = [0u32; 16];
    let mut i = 0usize;
    while i < 16 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 4 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// # Example
///
/// ```
/// use linkpack_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// assert_eq!(Crc32::compute(b""), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    pub fn update(&mut self, data: &[u8]) {
        let mut c = self.crc;

        let mut words = data.chunks_exact(4);
        for word in &mut words {
            c ^= u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            c = fold_nibbles(c, 8);
        }

        for &byte in words.remainder() {
            c ^= u32::from(byte);
            c = fold_nibbles(c, 2);
        }

        self.crc = c;
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Shift `count` nibbles out of `crc` through the table.
#[inline(always)]
fn fold_nibbles(mut crc: u32, count: usize) -> u32 {
    for _ in 0..count {
        crc = (crc >> 4) ^ CRC32_NIBBLE_TABLE[(crc & 0xF) as usize];
    }
    crc
}
