//! Packed per-block status codes.
//!
//! ```text
//!   byte 0                      byte 1
//!   ┌──────┬──────┬──────┬──────┐┌──────┬──────┬─── ...
//!   │ b3   │ b2   │ b1   │ b0   ││ b7   │ b6   │
//!   └──────┴──────┴──────┴──────┘└──────┴──────┴─── ...
//!    bits 7-6 ...        bits 1-0
//! ```
//!
//! Block `i` lives in byte `i / 4` at bit offset `(i % 4) * 2`.

const CODE_MASK: u8 = 0b11;
const CODES_PER_BYTE: usize = 4;

/// State of a single block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BlockStatus {
  /// Not part of any allocation.
  Free = 0,
  /// Last block of an allocation.
  End = 1,
  /// Part of an allocation, followed by more blocks of the same run.
  Used = 2,
}

impl BlockStatus {
  fn from_code(code: u8) -> Self {
    match code {
      0 => Self::Free,
      1 => Self::End,
      2 => Self::Used,
      // `set` only stores a `BlockStatus`, so code 3 cannot appear.
      _ => unreachable!("status code {code} is never written"),
    }
  }

  pub fn digit(self) -> char {
    match self {
      Self::Free => '0',
      Self::End => '1',
      Self::Used => '2',
    }
  }
}

/// One 2-bit [`BlockStatus`] per arena block, four blocks per byte.
pub struct StatusTable {
  bits: Box<[u8]>,
  len: usize,
}

impl StatusTable {
  /// Creates a table of `len` entries, all [`BlockStatus::Free`].
  pub fn new(len: usize) -> Self {
    Self {
      bits: vec![0u8; len.div_ceil(CODES_PER_BYTE)].into_boxed_slice(),
      len,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Size of the packed table in bytes.
  pub fn metadata_bytes(&self) -> usize {
    self.bits.len()
  }

  pub fn get(
    &self,
    index: usize,
  ) -> BlockStatus {
    debug_assert!(index < self.len, "block {index} out of range {}", self.len);

    let shift = (index % CODES_PER_BYTE) * 2;
    BlockStatus::from_code((self.bits[index / CODES_PER_BYTE] >> shift) & CODE_MASK)
  }

  pub fn set(
    &mut self,
    index: usize,
    status: BlockStatus,
  ) {
    debug_assert!(index < self.len, "block {index} out of range {}", self.len);

    let shift = (index % CODES_PER_BYTE) * 2;
    let byte = &mut self.bits[index / CODES_PER_BYTE];
    *byte &= !(CODE_MASK << shift);
    *byte |= (status as u8) << shift;
  }

  /// Marks every block free.
  pub fn clear(&mut self) {
    self.bits.fill(0);
  }

  pub fn iter(&self) -> impl Iterator<Item = BlockStatus> + '_ {
    (0..self.len).map(|index| self.get(index))
  }
}
