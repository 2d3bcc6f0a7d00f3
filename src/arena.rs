use std::ptr::{self, NonNull};

/// Fixed byte storage the allocator carves into blocks. Never resized.
///
/// The buffer is held through one raw base pointer taken from
/// `Box::into_raw`. Every address and slice handed out is derived from that
/// base, so earlier addresses stay usable after later arena accesses.
pub struct Arena {
  base: NonNull<u8>,
  len: usize,
}

// The arena uniquely owns its buffer, like the `Box` it was built from.
unsafe impl Send for Arena {}

impl Arena {
  pub fn new(size: usize) -> Self {
    let bytes: *mut [u8] = Box::into_raw(vec![0u8; size].into_boxed_slice());
    let base = NonNull::new(bytes.cast::<u8>()).unwrap_or(NonNull::dangling());

    Self { base, len: size }
  }

  pub fn base(&self) -> *const u8 {
    self.base.as_ptr()
  }

  /// Address of byte `offset`. `offset` must not exceed the arena length.
  pub fn ptr_at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    assert!(offset <= self.len, "offset {offset} past arena of {} bytes", self.len);
    // SAFETY: in bounds of the buffer (or one past its end).
    unsafe { self.base.add(offset) }
  }

  pub fn slice(
    &self,
    offset: usize,
    len: usize,
  ) -> &[u8] {
    self.check_range(offset, len);
    // SAFETY: range checked; the buffer lives as long as `self`.
    unsafe { std::slice::from_raw_parts(self.base.as_ptr().add(offset), len) }
  }

  pub fn slice_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> &mut [u8] {
    self.check_range(offset, len);
    // SAFETY: range checked; `&mut self` keeps other arena views out.
    unsafe { std::slice::from_raw_parts_mut(self.base.as_ptr().add(offset), len) }
  }

  pub fn fill(
    &mut self,
    offset: usize,
    len: usize,
    byte: u8,
  ) {
    self.check_range(offset, len);
    // SAFETY: range checked.
    unsafe { ptr::write_bytes(self.base.as_ptr().add(offset), byte, len) }
  }

  /// Copies `len` bytes from `from` to `to` within the arena.
  pub fn copy_within(
    &mut self,
    from: usize,
    to: usize,
    len: usize,
  ) {
    self.check_range(from, len);
    self.check_range(to, len);
    // SAFETY: both ranges checked; `ptr::copy` allows overlap.
    unsafe {
      let base = self.base.as_ptr();
      ptr::copy(base.add(from), base.add(to), len);
    }
  }

  fn check_range(
    &self,
    offset: usize,
    len: usize,
  ) {
    assert!(
      offset.checked_add(len).is_some_and(|end| end <= self.len),
      "range {offset}+{len} past arena of {} bytes",
      self.len
    );
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    let bytes = ptr::slice_from_raw_parts_mut(self.base.as_ptr(), self.len);
    // SAFETY: `bytes` is the pointer produced by `Box::into_raw` in `new`.
    drop(unsafe { Box::from_raw(bytes) });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn earlier_addresses_survive_later_views() {
    let mut arena = Arena::new(64);
    let first = arena.ptr_at(0);

    arena.fill(32, 32, 0xEE);
    arena.slice_mut(32, 8)[0] = 1;
    arena.copy_within(32, 48, 8);

    unsafe {
      first.as_ptr().write(9);
      assert_eq!(first.as_ptr().read(), 9);
    }
    assert_eq!(arena.slice(0, 1), &[9]);
    assert_eq!(arena.slice(48, 2), &[1, 0xEE]);
  }

  #[test]
  #[should_panic]
  fn slice_past_end_panics() {
    let arena = Arena::new(16);
    let _ = arena.slice(8, 9);
  }
}
