use std::ptr::NonNull;

use log::{debug, trace, warn};

use crate::arena::Arena;
use crate::config::AllocatorConfig;
use crate::dump::{TableDump, TableStats};
use crate::error::{AllocError, ConfigError, PointerFault};
use crate::table::{BlockStatus, StatusTable};

/// Result of resolving an address against the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
  /// The address is the first block of a live run.
  Run(usize),
  /// The address cannot be freed or reallocated.
  Invalid(PointerFault),
}

/// First-fit allocator over a fixed arena.
///
/// Every returned address is `base + index * block_size` for the first block
/// `index` of a run. Runs are recorded only in the status table; the run
/// length is recovered by scanning forward to its `End` block.
pub struct Allocator {
  arena: Arena,
  table: StatusTable,
  block_size: usize,
}

impl Allocator {
  /// Builds an allocator with every block free.
  pub fn new(config: AllocatorConfig) -> Result<Self, ConfigError> {
    config.validate()?;

    let table = StatusTable::new(config.block_count());
    debug!(
      "arena of {} bytes split into {} blocks of {} bytes ({} bytes of status table)",
      config.arena_size,
      table.len(),
      config.block_size,
      table.metadata_bytes()
    );

    Ok(Self {
      arena: Arena::new(config.arena_size),
      table,
      block_size: config.block_size,
    })
  }

  /// Marks every block free, releasing all outstanding allocations.
  pub fn init(&mut self) {
    self.table.clear();
    debug!("status table reset, {} blocks free", self.table.len());
  }

  pub fn block_size(&self) -> usize {
    self.block_size
  }

  pub fn block_count(&self) -> usize {
    self.table.len()
  }

  /// Addressable bytes, excluding any partial block at the end of the arena.
  pub fn capacity(&self) -> usize {
    self.table.len() * self.block_size
  }

  pub fn base(&self) -> *const u8 {
    self.arena.base()
  }

  /// Status of block `index`, or `None` past the end of the table.
  pub fn status(
    &self,
    index: usize,
  ) -> Option<BlockStatus> {
    (index < self.table.len()).then(|| self.table.get(index))
  }

  pub fn statuses(&self) -> impl Iterator<Item = BlockStatus> + '_ {
    self.table.iter()
  }

  /// Allocates at least `size` bytes from the earliest free run that fits.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let index = self.allocate_run(size)?;
    Ok(self.pointer_at(index))
  }

  /// Allocates `count * size` bytes and zeroes exactly that many.
  pub fn allocate_zeroed(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = count
      .checked_mul(size)
      .ok_or(AllocError::SizeOverflow { count, size })?;

    let index = self.allocate_run(total)?;
    let offset = index * self.block_size;
    self.arena.fill(offset, total, 0);

    Ok(self.pointer_at(index))
  }

  /// Releases the run starting at `ptr`. A null pointer is a no-op.
  ///
  /// Addresses that are not the start of a live run are rejected and the
  /// table is left unchanged.
  pub fn free(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    if ptr.is_null() {
      return Ok(());
    }

    let index = self.run_index(ptr)?;
    let released = self.release(index);
    debug!("freed {released} blocks starting at block {index}");

    Ok(())
  }

  /// Grows the run at `ptr` to hold `new_size` bytes.
  ///
  /// A null pointer allocates. If the run already holds `new_size` bytes the
  /// same address is returned and nothing changes; runs are never shrunk.
  /// Otherwise the contents move to a new run and the old one is freed. If no
  /// new run is available the error is returned and the old run stays
  /// allocated.
  pub fn reallocate(
    &mut self,
    ptr: *mut u8,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let Some(current) = NonNull::new(ptr) else {
      return self.allocate(new_size);
    };

    let index = self.run_index(ptr)?;
    let old_size = self.run_size(index);
    if old_size >= new_size {
      trace!("block {index} already holds {old_size} >= {new_size} bytes");
      return Ok(current);
    }

    let new_index = self.allocate_run(new_size)?;

    let from = index * self.block_size;
    let to = new_index * self.block_size;
    self.arena.copy_within(from, to, old_size);
    self.release(index);
    debug!("moved {old_size} bytes from block {index} to block {new_index}");

    Ok(self.pointer_at(new_index))
  }

  /// Bytes available in the run starting at `ptr`.
  pub fn usable_size(
    &self,
    ptr: *const u8,
  ) -> Result<usize, AllocError> {
    let index = self.run_index(ptr)?;
    Ok(self.run_size(index))
  }

  /// The whole run starting at `ptr`.
  pub fn allocation(
    &self,
    ptr: *const u8,
  ) -> Result<&[u8], AllocError> {
    let index = self.run_index(ptr)?;
    let offset = index * self.block_size;
    Ok(self.arena.slice(offset, self.run_size(index)))
  }

  pub fn allocation_mut(
    &mut self,
    ptr: *const u8,
  ) -> Result<&mut [u8], AllocError> {
    let index = self.run_index(ptr)?;
    let offset = index * self.block_size;
    let size = self.run_size(index);
    Ok(self.arena.slice_mut(offset, size))
  }

  /// Whether `ptr` falls inside the addressable part of the arena.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    ptr
      .addr()
      .checked_sub(self.arena.base().addr())
      .is_some_and(|offset| offset < self.capacity())
  }

  /// Resolves `ptr` to the block index of the run it starts.
  pub fn locate(
    &self,
    ptr: *const u8,
  ) -> Lookup {
    let Some(offset) = ptr.addr().checked_sub(self.arena.base().addr()) else {
      return Lookup::Invalid(PointerFault::OutOfRange);
    };

    let index = offset / self.block_size;
    if index >= self.table.len() {
      return Lookup::Invalid(PointerFault::OutOfRange);
    }
    if offset % self.block_size != 0 {
      return Lookup::Invalid(PointerFault::Misaligned);
    }
    if !self.is_run_start(index) {
      return Lookup::Invalid(PointerFault::NotAllocated);
    }

    Lookup::Run(index)
  }

  /// Checks that every `Used` block is followed by `Used` or `End`, so each
  /// run terminates in exactly one `End`.
  pub fn is_consistent(&self) -> bool {
    let mut open = false;
    for status in self.table.iter() {
      match status {
        BlockStatus::Used => open = true,
        BlockStatus::End => open = false,
        BlockStatus::Free if open => return false,
        BlockStatus::Free => {}
      }
    }
    !open
  }

  pub fn stats(&self) -> TableStats {
    TableStats::collect(&self.table)
  }

  pub fn table_dump(&self) -> TableDump<'_> {
    TableDump::new(&self.table)
  }

  fn allocate_run(
    &mut self,
    size: usize,
  ) -> Result<usize, AllocError> {
    if size == 0 {
      return Err(AllocError::ZeroSize);
    }

    let blocks = size.div_ceil(self.block_size);
    let Some(start) = self.find_free_run(blocks) else {
      debug!("no run of {blocks} free blocks for {size} bytes");
      return Err(AllocError::OutOfMemory {
        requested: size,
        blocks,
      });
    };

    self.claim(start, blocks);
    debug!(
      "allocated {size} bytes at blocks {start}..={}",
      start + blocks - 1
    );

    Ok(start)
  }

  fn find_free_run(
    &self,
    blocks: usize,
  ) -> Option<usize> {
    let mut start = 0;
    let mut run = 0;

    for index in 0..self.table.len() {
      if self.table.get(index) != BlockStatus::Free {
        run = 0;
        continue;
      }

      if run == 0 {
        start = index;
      }
      run += 1;

      if run == blocks {
        return Some(start);
      }
    }

    None
  }

  fn claim(
    &mut self,
    start: usize,
    blocks: usize,
  ) {
    let end = start + blocks - 1;
    for index in start..end {
      self.table.set(index, BlockStatus::Used);
    }
    self.table.set(end, BlockStatus::End);
  }

  /// Frees blocks from `start` up to and including the first `End`.
  fn release(
    &mut self,
    start: usize,
  ) -> usize {
    let mut released = 0;

    for index in start..self.table.len() {
      let status = self.table.get(index);
      self.table.set(index, BlockStatus::Free);
      released += 1;

      if status == BlockStatus::End {
        break;
      }
    }

    released
  }

  /// Size in bytes of the run containing `index`, counted from `index`
  /// through its `End` block. Zero for a free block.
  fn run_size(
    &self,
    index: usize,
  ) -> usize {
    if self.table.get(index) == BlockStatus::Free {
      return 0;
    }

    let mut count = 0;
    for i in index..self.table.len() {
      count += 1;
      if self.table.get(i) == BlockStatus::End {
        return count * self.block_size;
      }
    }

    0
  }

  fn is_run_start(
    &self,
    index: usize,
  ) -> bool {
    self.table.get(index) != BlockStatus::Free
      && (index == 0 || self.table.get(index - 1) != BlockStatus::Used)
  }

  fn run_index(
    &self,
    ptr: *const u8,
  ) -> Result<usize, AllocError> {
    match self.locate(ptr) {
      Lookup::Run(index) => Ok(index),
      Lookup::Invalid(reason) => {
        warn!("rejected pointer {ptr:p}: {reason}");
        Err(AllocError::InvalidPointer {
          addr: ptr.addr(),
          reason,
        })
      }
    }
  }

  fn pointer_at(
    &self,
    index: usize,
  ) -> NonNull<u8> {
    self.arena.ptr_at(index * self.block_size)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use test_log::test;

  fn small(blocks: usize) -> Allocator {
    Allocator::new(AllocatorConfig::new(blocks * 8, 8)).unwrap()
  }

  fn digits(allocator: &Allocator) -> String {
    allocator.statuses().map(BlockStatus::digit).collect()
  }

  #[test]
  fn zero_size_is_rejected() {
    let mut allocator = small(4);

    assert_eq!(allocator.allocate(0), Err(AllocError::ZeroSize));
    assert_eq!(digits(&allocator), "0000");
  }

  #[test]
  fn claims_ceil_blocks() {
    let mut allocator = small(8);

    let ptr = allocator.allocate(17).unwrap();

    assert_eq!(ptr.as_ptr().cast_const(), allocator.base());
    assert_eq!(digits(&allocator), "22100000");
    assert_eq!(allocator.usable_size(ptr.as_ptr()), Ok(24));
  }

  #[test]
  fn first_fit_takes_earliest_hole() {
    let mut allocator = small(10);

    let a = allocator.allocate(16).unwrap();
    let _b = allocator.allocate(8).unwrap();
    let c = allocator.allocate(24).unwrap();
    allocator.free(a.as_ptr()).unwrap();
    allocator.free(c.as_ptr()).unwrap();
    assert_eq!(digits(&allocator), "0010000000");

    let d = allocator.allocate(8).unwrap();
    assert_eq!(d, a);

    let e = allocator.allocate(16).unwrap();
    assert_eq!(allocator.locate(e.as_ptr()), Lookup::Run(3));
    assert_eq!(digits(&allocator), "1012100000");
  }

  #[test]
  fn free_stops_at_end_of_run() {
    let mut allocator = small(6);

    let a = allocator.allocate(16).unwrap();
    let _b = allocator.allocate(16).unwrap();
    allocator.free(a.as_ptr()).unwrap();

    assert_eq!(digits(&allocator), "002100");
  }

  #[test]
  fn free_null_is_noop() {
    let mut allocator = small(2);

    assert_eq!(allocator.free(std::ptr::null_mut()), Ok(()));
  }

  #[test]
  fn locate_classifies_addresses() {
    let mut allocator = small(4);
    let ptr = allocator.allocate(16).unwrap().as_ptr();

    assert_eq!(allocator.locate(ptr), Lookup::Run(0));
    assert_eq!(
      allocator.locate(ptr.wrapping_add(3)),
      Lookup::Invalid(PointerFault::Misaligned)
    );
    assert_eq!(
      allocator.locate(ptr.wrapping_add(8)),
      Lookup::Invalid(PointerFault::NotAllocated)
    );
    assert_eq!(
      allocator.locate(ptr.wrapping_add(16)),
      Lookup::Invalid(PointerFault::NotAllocated)
    );
    assert_eq!(
      allocator.locate(ptr.wrapping_add(32)),
      Lookup::Invalid(PointerFault::OutOfRange)
    );
    assert_eq!(
      allocator.locate(ptr.wrapping_sub(8)),
      Lookup::Invalid(PointerFault::OutOfRange)
    );
  }

  #[test]
  fn interior_pointer_free_is_rejected() {
    let mut allocator = small(4);
    let ptr = allocator.allocate(24).unwrap().as_ptr();

    let err = allocator.free(ptr.wrapping_add(8)).unwrap_err();

    assert!(matches!(
      err,
      AllocError::InvalidPointer {
        reason: PointerFault::NotAllocated,
        ..
      }
    ));
    assert_eq!(digits(&allocator), "2210");
  }

  #[test]
  fn double_free_is_rejected() {
    let mut allocator = small(4);
    let a = allocator.allocate(8).unwrap().as_ptr();
    let _b = allocator.allocate(8).unwrap();

    allocator.free(a).unwrap();
    assert!(allocator.free(a).is_err());
    assert_eq!(digits(&allocator), "0100");
  }

  #[test]
  fn reallocate_within_capacity_keeps_address() {
    let mut allocator = small(4);
    let ptr = allocator.allocate(10).unwrap();

    assert_eq!(allocator.reallocate(ptr.as_ptr(), 16), Ok(ptr));
    assert_eq!(allocator.reallocate(ptr.as_ptr(), 1), Ok(ptr));
    assert_eq!(digits(&allocator), "2100");
  }

  #[test]
  fn reallocate_grows_and_copies() {
    let mut allocator = small(8);
    let ptr = allocator.allocate(8).unwrap();
    allocator
      .allocation_mut(ptr.as_ptr())
      .unwrap()
      .copy_from_slice(b"abcdefgh");

    let grown = allocator.reallocate(ptr.as_ptr(), 20).unwrap();

    assert_ne!(grown, ptr);
    assert_eq!(digits(&allocator), "02210000");
    assert_eq!(&allocator.allocation(grown.as_ptr()).unwrap()[..8], b"abcdefgh");
  }

  #[test]
  fn failed_grow_keeps_original() {
    let mut allocator = small(3);
    let ptr = allocator.allocate(16).unwrap();

    let err = allocator.reallocate(ptr.as_ptr(), 24).unwrap_err();

    assert_eq!(
      err,
      AllocError::OutOfMemory {
        requested: 24,
        blocks: 3,
      }
    );
    assert_eq!(digits(&allocator), "210");
  }

  #[test]
  fn reallocate_null_allocates() {
    let mut allocator = small(2);

    let ptr = allocator.reallocate(std::ptr::null_mut(), 4).unwrap();

    assert_eq!(allocator.locate(ptr.as_ptr()), Lookup::Run(0));
  }

  #[test]
  fn reallocate_foreign_pointer_is_rejected() {
    let mut allocator = small(2);
    let mut outside = [0u8; 8];

    let err = allocator.reallocate(outside.as_mut_ptr(), 4).unwrap_err();

    assert!(matches!(
      err,
      AllocError::InvalidPointer {
        reason: PointerFault::OutOfRange,
        ..
      }
    ));
    assert_eq!(digits(&allocator), "00");
  }

  #[test]
  fn zeroed_allocation_clears_dirty_memory() {
    let mut allocator = small(4);
    let ptr = allocator.allocate(32).unwrap();
    allocator.allocation_mut(ptr.as_ptr()).unwrap().fill(0xAA);
    allocator.free(ptr.as_ptr()).unwrap();

    let zeroed = allocator.allocate_zeroed(3, 5).unwrap();

    let bytes = allocator.allocation(zeroed.as_ptr()).unwrap();
    assert_eq!(bytes.len(), 16);
    assert!(bytes[..15].iter().all(|&byte| byte == 0));
    assert_eq!(bytes[15], 0xAA);
  }

  #[test]
  fn zeroed_overflow_is_reported() {
    let mut allocator = small(2);

    assert_eq!(
      allocator.allocate_zeroed(usize::MAX, 2),
      Err(AllocError::SizeOverflow {
        count: usize::MAX,
        size: 2,
      })
    );
  }

  #[test]
  fn init_releases_everything() {
    let mut allocator = small(4);
    allocator.allocate(8).unwrap();
    allocator.allocate(16).unwrap();

    allocator.init();

    assert_eq!(digits(&allocator), "0000");
  }

  #[test]
  fn consistency_detects_orphaned_used_block() {
    let mut allocator = small(4);
    allocator.allocate(16).unwrap();
    assert!(allocator.is_consistent());

    allocator.table.set(1, BlockStatus::Free);
    assert!(!allocator.is_consistent());
  }

  #[test]
  fn partial_tail_is_never_handed_out() {
    let mut allocator = Allocator::new(AllocatorConfig::new(20, 8)).unwrap();

    assert_eq!(allocator.block_count(), 2);
    assert_eq!(allocator.capacity(), 16);
    assert!(allocator.allocate(17).is_err());
    assert!(allocator.allocate(16).is_ok());
  }
}
