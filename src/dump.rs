use std::fmt;

use crate::allocator::Allocator;
use crate::table::{BlockStatus, StatusTable};

const DIGITS_PER_ROW: usize = 32;

/// Prints one status digit per block to stdout, 32 blocks per row.
pub fn print_table(allocator: &Allocator) {
  print!("{}", allocator.table_dump());
}

/// Display adapter for the status table.
///
/// ```text
/// Memory Table begin:
/// 2 2 2 2 2 2 1 0 0 0 ...
/// ...
/// Memory Table end !
/// ```
pub struct TableDump<'a> {
  table: &'a StatusTable,
}

impl<'a> TableDump<'a> {
  pub(crate) fn new(table: &'a StatusTable) -> Self {
    Self { table }
  }
}

impl fmt::Display for TableDump<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Memory Table begin:")?;
    for (index, status) in self.table.iter().enumerate() {
      write!(f, "{} ", status.digit())?;
      if index % DIGITS_PER_ROW == DIGITS_PER_ROW - 1 {
        writeln!(f)?;
      }
    }
    writeln!(f)?;
    writeln!(f, "Memory Table end !")
  }
}

/// Block counts by status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
  pub free: usize,
  pub used: usize,
  pub end: usize,
  /// Live allocations; one per `End` block.
  pub runs: usize,
  /// Longest stretch of consecutive free blocks.
  pub largest_free_run: usize,
}

impl TableStats {
  pub(crate) fn collect(table: &StatusTable) -> Self {
    let mut stats = Self::default();
    let mut free_run = 0;

    for status in table.iter() {
      match status {
        BlockStatus::Free => {
          stats.free += 1;
          free_run += 1;
          stats.largest_free_run = stats.largest_free_run.max(free_run);
          continue;
        }
        BlockStatus::Used => stats.used += 1,
        BlockStatus::End => {
          stats.end += 1;
          stats.runs += 1;
        }
      }
      free_run = 0;
    }

    stats
  }

  /// Blocks belonging to some allocation.
  pub fn allocated(&self) -> usize {
    self.used + self.end
  }
}
