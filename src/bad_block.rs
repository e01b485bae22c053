use std::{ptr, sync::Once};

use log::{trace, warn};

use crate::config::BAD_BLOCK;

static SEED: Once = Once::new();

/// Source of the raw numbers the injector reduces to arena indices.
pub trait RandomSource {
  fn next_u32(&mut self) -> u32;
}

impl<F> RandomSource for F
where
  F: FnMut() -> u32,
{
  fn next_u32(&mut self) -> u32 {
    self()
  }
}

/// libc's `rand()`, seeded from `time(NULL)` the first time one is created.
#[derive(Debug)]
pub struct LibcRandom {
  _seeded: (),
}

impl LibcRandom {
  pub fn new() -> Self {
    SEED.call_once(|| unsafe {
      let now = libc::time(ptr::null_mut());
      libc::srand(now as libc::c_uint);
    });

    Self { _seeded: () }
  }
}

impl Default for LibcRandom {
  fn default() -> Self {
    Self::new()
  }
}

impl RandomSource for LibcRandom {
  fn next_u32(&mut self) -> u32 {
    // rand() is never negative.
    unsafe { libc::rand() as u32 }
  }
}

/// Overwrites `count` pseudo-random cells of `memory` with [`BAD_BLOCK`].
///
/// Indices are drawn from `[0, memory.len() - 1)`, so the last byte is never
/// touched. Repeats are possible, and nothing stops an index from landing in
/// a block header. Returns the indices in the order they were written.
pub fn mark_bad_blocks<R: RandomSource + ?Sized>(
  memory: &mut [u8],
  count: usize,
  rng: &mut R,
) -> Vec<usize> {
  if memory.len() < 2 {
    warn!("arena of {} bytes is too small to mark bad blocks", memory.len());
    return Vec::new();
  }

  let bound = memory.len() - 1;

  (0..count)
    .map(|_| {
      let index = rng.next_u32() as usize % bound;
      memory[index] = BAD_BLOCK;
      trace!("marked bad block at index {}", index);
      index
    })
    .collect()
}
