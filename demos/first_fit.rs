use anyhow::Result;
use tablealloc::{Allocator, AllocatorConfig, print_table};

fn main() -> Result<()> {
  env_logger::init();

  // Default layout: 40 KiB arena, 32-byte blocks, 1280 table entries.
  let mut allocator = Allocator::new(AllocatorConfig::default())?;
  allocator.init();

  // --------------------------------------------------------------------
  // 1) Allocate 198 bytes. That rounds up to 7 blocks (224 bytes), so
  //    the table shows six USED (2) entries closed by one END (1).
  // --------------------------------------------------------------------
  let first = allocator.allocate(198)?;
  for (i, byte) in allocator
    .allocation_mut(first.as_ptr())?
    .iter_mut()
    .take(198)
    .enumerate()
  {
    *byte = i as u8;
  }
  println!("\n[1] Allocated 198 bytes at {:?}", first);
  println!("[1] p[100] = {}", allocator.allocation(first.as_ptr())?[100]);
  print_table(&allocator);

  // --------------------------------------------------------------------
  // 2) Grow to 260 bytes (9 blocks). The run cannot grow in place, so the
  //    data moves to blocks 7..=15 and blocks 0..=6 become free again.
  // --------------------------------------------------------------------
  let second = allocator.reallocate(first.as_ptr(), 260)?;
  println!("\n[2] Reallocated to 260 bytes at {:?}", second);
  println!("[2] p[100] = {}", allocator.allocation(second.as_ptr())?[100]);
  print_table(&allocator);

  // --------------------------------------------------------------------
  // 3) Shrinking keeps the address; runs are never trimmed.
  // --------------------------------------------------------------------
  let third = allocator.reallocate(second.as_ptr(), 16)?;
  println!(
    "\n[3] Shrink to 16 bytes kept the address? {}",
    if third == second { "yes" } else { "no" }
  );

  // --------------------------------------------------------------------
  // 4) Pointers that did not come from the allocator are reported.
  // --------------------------------------------------------------------
  let mut outside = [0u8; 32];
  if let Err(err) = allocator.free(outside.as_mut_ptr()) {
    println!("\n[4] free(foreign) rejected: {err}");
  }

  allocator.free(third.as_ptr())?;
  println!("\n[5] Freed everything: {:?}", allocator.stats());

  Ok(())
}
