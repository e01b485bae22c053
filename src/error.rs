use thiserror::Error;

/// Misuse and corruption reported by [`FreeListAllocator`](crate::FreeListAllocator).
///
/// Running out of memory is *not* an error: `allocate` returns `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
  #[error("arena has not been initialized")]
  NotInitialized,

  #[error("offset {offset} is not the payload of a block in this arena")]
  InvalidHandle { offset: usize },

  #[error("corrupt block header at offset {offset}: {reason}")]
  CorruptHeader {
    offset: usize,
    reason: &'static str,
  },
}
