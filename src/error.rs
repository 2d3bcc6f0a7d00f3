//! Error types returned by the allocator and its configuration.

use thiserror::Error;

/// Why an address was rejected by [`Allocator::locate`](crate::Allocator::locate).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PointerFault {
  /// Below the arena base or past the last addressable block.
  #[error("outside the arena")]
  OutOfRange,
  /// Inside the arena but not on a block boundary.
  #[error("not on a block boundary")]
  Misaligned,
  /// On a block boundary that is free or in the middle of a run.
  #[error("not the start of an allocation")]
  NotAllocated,
}

/// Errors reported by allocation operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AllocError {
  /// A zero-byte request. Nothing is allocated.
  #[error("zero-sized allocation request")]
  ZeroSize,

  /// No contiguous free run is long enough.
  #[error("out of memory: requested {requested} bytes ({blocks} blocks)")]
  OutOfMemory { requested: usize, blocks: usize },

  /// `count * size` does not fit in `usize`.
  #[error("allocation size overflow: {count} * {size}")]
  SizeOverflow { count: usize, size: usize },

  /// The address was not handed out by this allocator, or is no longer live.
  #[error("invalid pointer {addr:#x}: {reason}")]
  InvalidPointer { addr: usize, reason: PointerFault },
}

/// Errors reported when validating an [`AllocatorConfig`](crate::AllocatorConfig).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("block size must be greater than zero")]
  ZeroBlockSize,

  #[error("arena of {arena_size} bytes cannot hold one block of {block_size} bytes")]
  ArenaTooSmall {
    arena_size: usize,
    block_size: usize,
  },
}
