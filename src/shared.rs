use std::ptr::NonNull;

use parking_lot::{Mutex, MutexGuard};

use crate::allocator::Allocator;
use crate::config::AllocatorConfig;
use crate::error::{AllocError, ConfigError};

/// An [`Allocator`] behind a mutex, for callers that share one arena across
/// threads.
///
/// Each call takes the lock for its own duration. Use [`lock`](Self::lock)
/// when several operations must observe the same table state.
pub struct SharedAllocator {
  inner: Mutex<Allocator>,
}

impl SharedAllocator {
  pub fn new(config: AllocatorConfig) -> Result<Self, ConfigError> {
    Ok(Self::from(Allocator::new(config)?))
  }

  pub fn lock(&self) -> MutexGuard<'_, Allocator> {
    self.inner.lock()
  }

  pub fn init(&self) {
    self.inner.lock().init();
  }

  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.inner.lock().allocate(size)
  }

  pub fn allocate_zeroed(
    &self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.inner.lock().allocate_zeroed(count, size)
  }

  pub fn reallocate(
    &self,
    ptr: *mut u8,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.inner.lock().reallocate(ptr, new_size)
  }

  pub fn free(
    &self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    self.inner.lock().free(ptr)
  }

  pub fn into_inner(self) -> Allocator {
    self.inner.into_inner()
  }
}

impl From<Allocator> for SharedAllocator {
  fn from(allocator: Allocator) -> Self {
    Self {
      inner: Mutex::new(allocator),
    }
  }
}
