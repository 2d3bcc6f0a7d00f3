//! # tablealloc - A First-Fit Block Table Allocator
//!
//! This crate provides a heap allocator for targets without virtual memory.
//! A fixed arena is split into equal blocks and a packed status table records
//! which blocks belong to which allocation.
//!
//! ## Overview
//!
//! ```text
//!   Arena (40960 bytes, 1280 blocks of 32 bytes):
//!
//!   ┌──────┬──────┬──────┬──────┬──────┬──────┬──────┬─────────────────┐
//!   │ blk0 │ blk1 │ blk2 │ blk3 │ blk4 │ blk5 │ blk6 │  ...  blk1279   │
//!   └──────┴──────┴──────┴──────┴──────┴──────┴──────┴─────────────────┘
//!   ▲
//!   └── address returned for a run starting at block 0
//!
//!   Status table (2 bits per block, 4 blocks per byte, 320 bytes):
//!
//!      2      2      1      0      2      1      0     ...
//!   USED   USED   END    FREE   USED   END    FREE
//!   └──── run A ────┘           └ run B ┘
//! ```
//!
//! A run is a stretch of `USED` blocks closed by one `END` block. The table is
//! the only record of an allocation: its size is recovered by scanning from
//! the first block to the `END`.
//!
//! ## Crate Structure
//!
//! ```text
//!   tablealloc
//!   ├── allocator - first-fit engine (allocate, free, reallocate, ...)
//!   ├── arena     - fixed byte storage (internal)
//!   ├── config    - validated arena / block sizing
//!   ├── dump      - table dump and occupancy statistics
//!   ├── error     - AllocError, ConfigError
//!   ├── shared    - mutex-wrapped allocator (feature `sync`)
//!   └── table     - packed 2-bit status table
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tablealloc::{Allocator, AllocatorConfig};
//!
//! let mut allocator = Allocator::new(AllocatorConfig::default()).unwrap();
//!
//! let ptr = allocator.allocate(198).unwrap();
//! allocator.allocation_mut(ptr.as_ptr()).unwrap()[..4].copy_from_slice(b"data");
//!
//! let grown = allocator.reallocate(ptr.as_ptr(), 260).unwrap();
//! assert_eq!(&allocator.allocation(grown.as_ptr()).unwrap()[..4], b"data");
//!
//! allocator.free(grown.as_ptr()).unwrap();
//! ```
//!
//! ## Allocation Strategy
//!
//! Requests are rounded up to whole blocks and served from the earliest free
//! run that is long enough (first fit). Reallocation never shrinks a run; a
//! growing reallocation moves the contents to a new run and frees the old one.
//!
//! ## Limitations
//!
//! - **Single-threaded**: `Allocator` takes `&mut self`; enable the `sync`
//!   feature for `SharedAllocator`
//! - **No compaction**: freed runs are only reused as they are
//! - **Block alignment only**: addresses are aligned to the block size
//!   relative to the arena base

mod allocator;
mod arena;
pub mod config;
mod dump;
pub mod error;
#[cfg(feature = "sync")]
mod shared;
mod table;

pub use allocator::{Allocator, Lookup};
pub use config::AllocatorConfig;
pub use dump::{TableDump, TableStats, print_table};
pub use error::{AllocError, ConfigError, PointerFault};
#[cfg(feature = "sync")]
pub use shared::SharedAllocator;
pub use table::BlockStatus;
