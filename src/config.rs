/// Size in bytes of the default arena.
pub const MEMORY_SIZE: usize = 256;

/// Sentinel byte written over "bad" arena cells.
pub const BAD_BLOCK: u8 = b'X';

/// How many bad cells the command-line demo injects before allocating.
pub const BAD_BLOCK_COUNT: usize = 10;
