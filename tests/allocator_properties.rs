use rand::{Rng, SeedableRng, rngs::StdRng};
use rheap::{ArenaError, FreeListAllocator, HEADER_SIZE, Handle, config::BAD_BLOCK};

const SIZE: usize = 512;

fn assert_invariants(allocator: &FreeListAllocator<SIZE>) {
  let chain = allocator.chain().unwrap();

  let mut expected_offset = 0;
  for block in &chain {
    assert_eq!(block.offset, expected_offset, "blocks must tile without gaps");
    expected_offset += HEADER_SIZE + block.size;
  }
  assert_eq!(expected_offset, SIZE);
}

#[test]
fn randomized_alloc_free_simulation() {
  let mut allocator = FreeListAllocator::<SIZE>::new();
  allocator.initialize();

  let mut rng = StdRng::seed_from_u64(0x42);
  let mut live: Vec<(Handle, u8)> = vec![];

  for step in 0..500u32 {
    if rng.random_bool(0.6) {
      let size = rng.random_range(0..96);
      let tag = (step % 251) as u8;

      let before = allocator.chain().unwrap();
      let admissible = before
        .iter()
        .find(|block| block.is_free && block.size >= size + HEADER_SIZE)
        .map(|block| block.payload());

      let handle = allocator.allocate(size).unwrap();
      assert_eq!(handle, admissible, "first admissible block must be used");

      if let Some(handle) = handle {
        allocator.payload_mut(handle).unwrap().fill(tag);
        live.push((handle, tag));
      }
    } else if !live.is_empty() {
      let index = rng.random_range(0..live.len());
      let (handle, tag) = live.swap_remove(index);

      assert!(allocator.payload(handle).unwrap().iter().all(|&b| b == tag));
      allocator.deallocate(handle).unwrap();
    }

    assert_invariants(&allocator);

    // Live payloads are untouched by everything else.
    for &(handle, tag) in &live {
      assert!(allocator.payload(handle).unwrap().iter().all(|&b| b == tag));
    }
  }

  for (handle, _) in live {
    allocator.deallocate(handle).unwrap();
  }

  let stats = allocator.stats().unwrap();
  assert_eq!(stats.free_blocks, stats.blocks);
  assert_eq!(stats.used_bytes, 0);
}

#[test]
fn blocks_are_never_merged() {
  let mut allocator = FreeListAllocator::<SIZE>::new();
  allocator.initialize();

  let handles: Vec<Handle> = (0..4).map(|_| allocator.allocate(32).unwrap().unwrap()).collect();
  let count = allocator.chain().unwrap().len();

  for handle in handles {
    allocator.deallocate(handle).unwrap();
  }

  let chain = allocator.chain().unwrap();
  assert_eq!(chain.len(), count);
  assert!(chain.iter().all(|block| block.is_free));
  assert!(chain[..4].iter().all(|block| block.size == 32));
}

#[test]
fn fragmentation_defeats_large_requests() {
  let mut allocator = FreeListAllocator::<SIZE>::new();
  allocator.initialize();

  // Carve the arena into small blocks until nothing is left.
  let mut handles = vec![];
  while let Some(handle) = allocator.allocate(16).unwrap() {
    handles.push(handle);
  }

  for handle in handles {
    allocator.deallocate(handle).unwrap();
  }

  let stats = allocator.stats().unwrap();
  assert!(stats.free_bytes > 64 + HEADER_SIZE);
  assert_eq!(allocator.allocate(64).unwrap(), None);
}

#[test]
fn full_arena_round_trip() {
  let mut allocator = FreeListAllocator::<SIZE>::new();
  allocator.initialize();

  let capacity = allocator.usable_capacity();

  let handle = allocator.allocate(capacity - HEADER_SIZE).unwrap().unwrap();
  assert_eq!(allocator.allocate(1).unwrap(), None);

  allocator.deallocate(handle).unwrap();
  assert_eq!(allocator.allocate(capacity - HEADER_SIZE).unwrap(), Some(handle));
}

#[test]
fn bad_blocks_land_before_the_last_byte() {
  let mut allocator = FreeListAllocator::<SIZE>::new();
  allocator.initialize();

  let mut rng = StdRng::seed_from_u64(7);
  let mut source = || rng.random::<u32>();

  let indices = allocator.mark_bad_blocks_with(2000, &mut source);

  assert!(indices.iter().all(|&index| index < SIZE - 1));
  assert!(indices.iter().all(|&index| allocator.as_bytes()[index] == BAD_BLOCK));
  assert_ne!(allocator.as_bytes()[SIZE - 1], BAD_BLOCK);
}

#[test]
fn corrupted_arena_is_reported_not_panicked() {
  let mut allocator = FreeListAllocator::<SIZE>::new();
  allocator.initialize();

  let first = allocator.allocate(16).unwrap().unwrap();
  let mut next_header_size_byte = || (HEADER_SIZE + 16 + 1) as u32;
  allocator.mark_bad_blocks_with(1, &mut next_header_size_byte);

  assert!(matches!(
    allocator.allocate(32),
    Err(ArenaError::CorruptHeader { offset, .. }) if offset == HEADER_SIZE + 16
  ));
  assert!(allocator.chain().is_err());

  // The first block still decodes; its header is intact.
  assert!(allocator.payload(first).is_ok());
  assert!(allocator.deallocate(first).is_ok());
}
