use log::warn;

use crate::error::ConfigError;

/// Arena and block sizing for an [`Allocator`](crate::Allocator).
///
/// Both values are fixed for the lifetime of the allocator built from them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocatorConfig {
  /// Total arena size in bytes.
  pub arena_size: usize,
  /// Allocation granularity in bytes.
  pub block_size: usize,
}

impl AllocatorConfig {
  pub const DEFAULT_ARENA_SIZE: usize = 40 * 1024;
  pub const DEFAULT_BLOCK_SIZE: usize = 32;

  pub fn new(
    arena_size: usize,
    block_size: usize,
  ) -> Self {
    Self {
      arena_size,
      block_size,
    }
  }

  /// Checks that the arena holds at least one whole block.
  ///
  /// A block size that does not divide the arena size is accepted; the
  /// trailing bytes are never handed out.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.block_size == 0 {
      return Err(ConfigError::ZeroBlockSize);
    }

    if self.arena_size < self.block_size {
      return Err(ConfigError::ArenaTooSmall {
        arena_size: self.arena_size,
        block_size: self.block_size,
      });
    }

    let tail = self.arena_size % self.block_size;
    if tail != 0 {
      warn!(
        "arena size {} is not a multiple of block size {}, last {} bytes are unaddressable",
        self.arena_size, self.block_size, tail
      );
    }

    Ok(())
  }

  /// Number of whole blocks in the arena. Assumes a validated config.
  pub fn block_count(&self) -> usize {
    self.arena_size / self.block_size
  }

  /// Bytes of status table needed for [`block_count`](Self::block_count) blocks.
  pub fn metadata_bytes(&self) -> usize {
    self.block_count().div_ceil(4)
  }
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self::new(Self::DEFAULT_ARENA_SIZE, Self::DEFAULT_BLOCK_SIZE)
  }
}
