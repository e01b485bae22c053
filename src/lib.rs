//! # rheap - A Simulated Heap on a Fixed Arena
//!
//! This crate manages a fixed-size byte arena with an intrusive, singly-linked
//! list of variable-size blocks. It can also sprinkle "bad block" bytes over the
//! raw arena to simulate unreliable memory.
//!
//! ## Overview
//!
//! Every block is a header followed by its payload, and the headers are stored
//! inside the arena itself. Blocks are linked in address order by arena offset:
//!
//! ```text
//!   Arena (N bytes):
//!
//!   0                                                                    N
//!   ┌────────┬──────────┬────────┬──────────┬────────┬──────────────────┐
//!   │ header │ payload  │ header │ payload  │ header │     payload      │
//!   │ used   │ (caller) │ free   │          │ free   │                  │
//!   └───┬────┴──────────┴───┬────┴──────────┴───┬────┴──────────────────┘
//!       │        next       ▲        next       ▲
//!       └───────────────────┘───────────────────┘
//! ```
//!
//! Allocation is **first fit**: a free block qualifies when its size is at least
//! the request *plus one header*. If it has a byte to spare beyond that, the
//! tail is split off into a new free block:
//!
//! ```text
//!   allocate(n) on a free block of size S (S > n + H):
//!
//!   before ┌───┬───────────────────────────────────────┐
//!          │ H │                S                      │
//!          └───┴───────────────────────────────────────┘
//!   after  ┌───┬─────────┬───┬─────────────────────────┐
//!          │ H │    n    │ H │       S - n - H         │
//!          └───┴─────────┴───┴─────────────────────────┘
//!                ▲ handle      (free)
//! ```
//!
//! Freeing only flips the header's flag. Neighbouring free blocks are **never
//! merged**, so the arena fragments over time.
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── bad_block  - Random bad-byte injector and its random sources
//!   ├── block      - Header layout and (de)serialization (internal)
//!   ├── config     - Arena size and bad-block constants
//!   ├── error      - ArenaError
//!   └── free_list  - FreeListAllocator implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::FreeListAllocator;
//!
//! let mut allocator: FreeListAllocator = FreeListAllocator::new();
//! allocator.initialize();
//!
//! let handle = allocator.allocate(8).unwrap().expect("arena has room");
//! allocator.payload_mut(handle).unwrap().copy_from_slice(&42u64.to_le_bytes());
//!
//! allocator.deallocate(handle).unwrap();
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: mutation needs `&mut self`, there is no locking
//! - **No coalescing**: adjacent free blocks stay separate
//! - **Bad blocks are not avoided**: the allocator never looks for them, though
//!   a header they land on is reported as [`ArenaError::CorruptHeader`]
//! - **Unix-only**: the default random source uses `libc`'s `rand`

pub mod bad_block;
mod block;
pub mod config;
mod error;
mod free_list;

pub use bad_block::{LibcRandom, RandomSource};
pub use block::HEADER_SIZE;
pub use error::ArenaError;
pub use free_list::{ArenaStats, BlockInfo, FreeListAllocator, Handle};
