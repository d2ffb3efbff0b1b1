//! DEFLATE encoder configuration.

/// Largest LZ77 window DEFLATE can address (32 KB).
pub const MAX_WINDOW_SIZE: usize = 32768;

/// Default amount of input covered by one block (1 MiB).
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20;

/// Which block type the encoder writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlockStrategy {
    /// Raw (stored) blocks only; no LZ77 or Huffman coding.
    Stored,
    /// Fixed Huffman codes from RFC 1951; no table is transmitted.
    Fixed,
    /// Per-block Huffman codes built from symbol frequencies.
    #[default]
    Dynamic,
    /// Whichever of stored, fixed and dynamic is smallest for each block.
    Smallest,
}

/// DEFLATE encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeflateOptions {
    /// How far back matches may reach (1-32768).
    pub window_size: usize,
    /// Input bytes per block (at least 1).
    pub block_size: usize,
    /// Block type selection.
    pub strategy: BlockStrategy,
}

impl DeflateOptions {
    /// Dynamic Huffman blocks with the full 32 KB window.
    pub const DEFAULT: Self = Self {
        window_size: MAX_WINDOW_SIZE,
        block_size: DEFAULT_BLOCK_SIZE,
        strategy: BlockStrategy::Dynamic,
    };

    /// Fixed Huffman blocks; skips building per-block tables.
    pub const FAST: Self = Self {
        strategy: BlockStrategy::Fixed,
        ..Self::DEFAULT
    };

    /// Stored blocks only.
    pub const STORE: Self = Self {
        strategy: BlockStrategy::Stored,
        ..Self::DEFAULT
    };

    /// Smallest of the three block types, per block.
    pub const BEST: Self = Self {
        strategy: BlockStrategy::Smallest,
        ..Self::DEFAULT
    };

    /// Create options with the given strategy and default sizes.
    pub fn new(strategy: BlockStrategy) -> Self {
        Self {
            strategy,
            ..Self::DEFAULT
        }
    }

    /// Set the match window, clamped to 1-32768.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.clamp(1, MAX_WINDOW_SIZE);
        self
    }

    /// Set the block size, at least 1 byte.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Set the block strategy.
    pub fn with_strategy(mut self, strategy: BlockStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Window size after clamping, for options built by struct literal.
    pub fn effective_window_size(&self) -> usize {
        self.window_size.clamp(1, MAX_WINDOW_SIZE)
    }

    /// Block size after clamping, for options built by struct literal.
    pub fn effective_block_size(&self) -> usize {
        self.block_size.max(1)
    }
}

impl Default for DeflateOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = DeflateOptions::default();
        assert_eq!(options.window_size, 32768);
        assert_eq!(options.block_size, 1 << 20);
        assert_eq!(options.strategy, BlockStrategy::Dynamic);
    }

    #[test]
    fn test_presets() {
        assert_eq!(DeflateOptions::FAST.strategy, BlockStrategy::Fixed);
        assert_eq!(DeflateOptions::STORE.strategy, BlockStrategy::Stored);
        assert_eq!(DeflateOptions::BEST.strategy, BlockStrategy::Smallest);
        assert_eq!(DeflateOptions::FAST.window_size, MAX_WINDOW_SIZE);
    }

    #[test]
    fn test_builders_clamp() {
        let options = DeflateOptions::new(BlockStrategy::Fixed)
            .with_window_size(100_000)
            .with_block_size(0);
        assert_eq!(options.window_size, MAX_WINDOW_SIZE);
        assert_eq!(options.block_size, 1);

        let options = DeflateOptions::DEFAULT.with_window_size(0);
        assert_eq!(options.window_size, 1);
    }

    #[test]
    fn test_effective_sizes_for_literals() {
        let options = DeflateOptions {
            window_size: 0,
            block_size: 0,
            strategy: BlockStrategy::Stored,
        };
        assert_eq!(options.effective_window_size(), 1);
        assert_eq!(options.effective_block_size(), 1);
    }
}
