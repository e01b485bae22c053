use crate::error::ArenaError;

/// Bytes occupied by a header inside the arena.
///
/// Matches the natural layout of `{ size: u64, free: bool, next: u64 }`:
///
/// ```text
///   0        8    9          16         24
///   ┌────────┬────┬──────────┬──────────┐
///   │  size  │free│ padding  │   next   │
///   └────────┴────┴──────────┴──────────┘
/// ```
pub const HEADER_SIZE: usize = 24;

const SIZE_FIELD: usize = 0;
const FREE_FIELD: usize = 8;
const NEXT_FIELD: usize = 16;
const NO_NEXT: u64 = u64::MAX;

/// Decoded copy of a block header. `next` is an arena offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub size: usize,
  pub is_free: bool,
  pub next: Option<usize>,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: Option<usize>,
  ) -> Self {
    Self { size, is_free, next }
  }

  /// Decodes the header at `offset` and checks that it tiles the arena:
  /// the block must fit, and end exactly where `next` starts (or at the
  /// end of `memory` for the last block).
  pub fn read(
    memory: &[u8],
    offset: usize,
  ) -> Result<Self, ArenaError> {
    let corrupt = |reason: &'static str| ArenaError::CorruptHeader { offset, reason };

    let payload = offset
      .checked_add(HEADER_SIZE)
      .filter(|&end| end <= memory.len())
      .ok_or(corrupt("header runs past the end of the arena"))?;

    let size = usize::try_from(read_u64(memory, offset + SIZE_FIELD))
      .map_err(|_| corrupt("size does not fit in usize"))?;
    let is_free = memory[offset + FREE_FIELD] != 0;
    let next = match read_u64(memory, offset + NEXT_FIELD) {
      NO_NEXT => None,
      raw => Some(usize::try_from(raw).map_err(|_| corrupt("next does not fit in usize"))?),
    };

    let end = payload
      .checked_add(size)
      .filter(|&end| end <= memory.len())
      .ok_or(corrupt("payload runs past the end of the arena"))?;

    match next {
      Some(next) if next != end => return Err(corrupt("next does not follow the payload")),
      None if end != memory.len() => return Err(corrupt("last block does not reach the end of the arena")),
      _ => {},
    }

    Ok(Self { size, is_free, next })
  }

  pub fn write(
    &self,
    memory: &mut [u8],
    offset: usize,
  ) {
    let header = &mut memory[offset..offset + HEADER_SIZE];

    header[SIZE_FIELD..FREE_FIELD].copy_from_slice(&(self.size as u64).to_le_bytes());
    header[FREE_FIELD] = self.is_free as u8;
    header[FREE_FIELD + 1..NEXT_FIELD].fill(0);

    let next = self.next.map_or(NO_NEXT, |next| next as u64);
    header[NEXT_FIELD..HEADER_SIZE].copy_from_slice(&next.to_le_bytes());
  }
}

fn read_u64(
  memory: &[u8],
  at: usize,
) -> u64 {
  let mut bytes = [0u8; 8];
  bytes.copy_from_slice(&memory[at..at + 8]);
  u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_write_then_read() {
    let mut memory = [0u8; 64];

    Block::new(8, false, Some(32)).write(&mut memory, 0);
    Block::new(8, true, None).write(&mut memory, 32);

    assert_eq!(Block::read(&memory, 0), Ok(Block::new(8, false, Some(32))));
    assert_eq!(Block::read(&memory, 32), Ok(Block::new(8, true, None)));
  }

  #[test]
  fn test_header_layout() {
    let mut memory = [0xAAu8; HEADER_SIZE];

    Block::new(0x0102, true, None).write(&mut memory, 0);

    assert_eq!(&memory[0..8], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
    assert_eq!(memory[8], 1);
    assert!(memory[9..16].iter().all(|&b| b == 0));
    assert!(memory[16..24].iter().all(|&b| b == 0xFF));
  }

  #[test]
  fn test_any_nonzero_free_byte_reads_as_free() {
    let mut memory = [0u8; 32];

    Block::new(8, false, None).write(&mut memory, 0);
    memory[FREE_FIELD] = b'X';

    assert!(Block::read(&memory, 0).unwrap().is_free);
  }

  #[test]
  fn test_rejects_size_past_end() {
    let mut memory = [0u8; 32];

    Block::new(8, true, None).write(&mut memory, 0);
    memory[SIZE_FIELD + 3] = b'X';

    assert!(matches!(
      Block::read(&memory, 0),
      Err(ArenaError::CorruptHeader { offset: 0, .. })
    ));
  }

  #[test]
  fn test_rejects_next_not_adjacent() {
    let mut memory = [0u8; 64];

    Block::new(8, true, Some(40)).write(&mut memory, 0);

    assert!(Block::read(&memory, 0).is_err());
  }

  #[test]
  fn test_rejects_short_last_block() {
    let mut memory = [0u8; 64];

    Block::new(8, true, None).write(&mut memory, 0);

    assert!(Block::read(&memory, 0).is_err());
  }

  #[test]
  fn test_rejects_header_past_end() {
    let memory = [0u8; 40];

    assert!(Block::read(&memory, 30).is_err());
  }
}
