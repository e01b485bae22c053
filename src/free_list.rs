use log::{debug, warn};

use crate::{
  bad_block::{self, LibcRandom, RandomSource},
  block::{Block, HEADER_SIZE},
  config::MEMORY_SIZE,
  error::ArenaError,
};

/// Offset of a payload inside the arena, as returned by
/// [`FreeListAllocator::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
  pub fn offset(self) -> usize {
    self.0
  }
}

/// One entry of [`FreeListAllocator::chain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Offset of the header.
  pub offset: usize,
  pub size: usize,
  pub is_free: bool,
}

impl BlockInfo {
  pub fn payload(&self) -> Handle {
    Handle(self.offset + HEADER_SIZE)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
  pub blocks: usize,
  pub free_blocks: usize,
  pub used_bytes: usize,
  pub free_bytes: usize,
  pub largest_free: usize,
}

/// First-fit allocator over a fixed `N`-byte arena.
///
/// Headers live inside the arena and link to each other by offset. Freed
/// blocks are never merged with their neighbours.
pub struct FreeListAllocator<const N: usize = MEMORY_SIZE> {
  memory: [u8; N],
  initialized: bool,
}

impl<const N: usize> FreeListAllocator<N> {
  pub fn new() -> Self {
    const {
      assert!(N > HEADER_SIZE, "arena must be larger than a block header");
    }

    Self {
      memory: [0; N],
      initialized: false,
    }
  }

  /// Resets the arena to a single free block covering everything after the
  /// first header. Handles from before the reset must not be reused.
  pub fn initialize(&mut self) {
    if self.initialized {
      warn!("re-initializing arena, outstanding handles are invalidated");
    }

    Block::new(self.usable_capacity(), true, None).write(&mut self.memory, 0);
    self.initialized = true;

    debug!("initialized arena of {} bytes ({} usable)", N, self.usable_capacity());
  }

  pub fn is_initialized(&self) -> bool {
    self.initialized
  }

  /// Payload bytes of the head block right after [`initialize`](Self::initialize).
  pub const fn usable_capacity(&self) -> usize {
    N - HEADER_SIZE
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.memory
  }

  /// Scribbles `count` bad cells over the raw arena using libc's `rand`.
  pub fn mark_bad_blocks(
    &mut self,
    count: usize,
  ) -> Vec<usize> {
    self.mark_bad_blocks_with(count, &mut LibcRandom::new())
  }

  pub fn mark_bad_blocks_with<R: RandomSource + ?Sized>(
    &mut self,
    count: usize,
    rng: &mut R,
  ) -> Vec<usize> {
    let indices = bad_block::mark_bad_blocks(&mut self.memory, count, rng);
    debug!("marked {} bad blocks: {:?}", indices.len(), indices);
    indices
  }

  /// Finds the first free block with room for `size` bytes plus a header.
  ///
  /// If the block has at least one byte to spare beyond that, the tail is
  /// split off into a new free block. `Ok(None)` means no block qualified.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Option<Handle>, ArenaError> {
    self.ensure_initialized()?;

    let Some(needed) = size.checked_add(HEADER_SIZE) else {
      return Ok(None);
    };

    let mut cursor = Some(0);

    while let Some(offset) = cursor {
      let mut block = Block::read(&self.memory, offset)?;

      if block.is_free && block.size >= needed {
        if block.size > needed {
          let split_at = offset + needed;
          let rest = Block::new(block.size - needed, true, block.next);
          rest.write(&mut self.memory, split_at);

          debug!("split block at {}: {} + {} bytes", offset, size, rest.size);

          block.next = Some(split_at);
          block.size = size;
        }

        block.is_free = false;
        block.write(&mut self.memory, offset);

        let handle = Handle(offset + HEADER_SIZE);
        debug!("allocated {} bytes at offset {}", block.size, handle.0);

        return Ok(Some(handle));
      }

      cursor = block.next;
    }

    debug!("no free block can hold {} bytes", size);
    Ok(None)
  }

  /// Marks the block behind `handle` free. `None` is a no-op.
  ///
  /// The block keeps its size; adjacent free blocks stay separate.
  pub fn deallocate<H: Into<Option<Handle>>>(
    &mut self,
    handle: H,
  ) -> Result<(), ArenaError> {
    let Some(handle) = handle.into() else {
      return Ok(());
    };

    self.ensure_initialized()?;

    let (offset, mut block) = self.find_block(handle)?;

    if block.is_free {
      debug!("block at offset {} is already free", handle.0);
    }

    block.is_free = true;
    block.write(&mut self.memory, offset);

    debug!("freed {} bytes at offset {}", block.size, handle.0);
    Ok(())
  }

  pub fn payload(
    &self,
    handle: Handle,
  ) -> Result<&[u8], ArenaError> {
    let (offset, block) = self.find_allocated(handle)?;
    let start = offset + HEADER_SIZE;
    Ok(&self.memory[start..start + block.size])
  }

  pub fn payload_mut(
    &mut self,
    handle: Handle,
  ) -> Result<&mut [u8], ArenaError> {
    let (offset, block) = self.find_allocated(handle)?;
    let start = offset + HEADER_SIZE;
    Ok(&mut self.memory[start..start + block.size])
  }

  /// Every block in arena order.
  pub fn chain(&self) -> Result<Vec<BlockInfo>, ArenaError> {
    self.ensure_initialized()?;

    let mut blocks = Vec::new();
    let mut cursor = Some(0);

    while let Some(offset) = cursor {
      let block = Block::read(&self.memory, offset)?;
      blocks.push(BlockInfo {
        offset,
        size: block.size,
        is_free: block.is_free,
      });
      cursor = block.next;
    }

    Ok(blocks)
  }

  pub fn stats(&self) -> Result<ArenaStats, ArenaError> {
    let stats = self.chain()?.iter().fold(ArenaStats::default(), |mut stats, block| {
      stats.blocks += 1;

      if block.is_free {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.used_bytes += block.size;
      }

      stats
    });

    Ok(stats)
  }

  fn ensure_initialized(&self) -> Result<(), ArenaError> {
    if self.initialized {
      Ok(())
    } else {
      Err(ArenaError::NotInitialized)
    }
  }

  fn find_block(
    &self,
    handle: Handle,
  ) -> Result<(usize, Block), ArenaError> {
    let invalid = ArenaError::InvalidHandle { offset: handle.0 };
    let target = handle.0.checked_sub(HEADER_SIZE).ok_or(invalid.clone())?;

    let mut cursor = Some(0);

    while let Some(offset) = cursor {
      if offset > target {
        break;
      }

      let block = Block::read(&self.memory, offset)?;

      if offset == target {
        return Ok((offset, block));
      }

      cursor = block.next;
    }

    Err(invalid)
  }

  fn find_allocated(
    &self,
    handle: Handle,
  ) -> Result<(usize, Block), ArenaError> {
    self.ensure_initialized()?;

    match self.find_block(handle)? {
      (_, block) if block.is_free => Err(ArenaError::InvalidHandle { offset: handle.0 }),
      found => Ok(found),
    }
  }
}

impl<const N: usize> Default for FreeListAllocator<N> {
  fn default() -> Self {
    Self::new()
  }
}
