use std::{env, mem, process::ExitCode};

use anyhow::{Context, Result};
use log::error;
use rheap::{
  FreeListAllocator,
  config::{BAD_BLOCK_COUNT, MEMORY_SIZE},
};

/// Reads a count the way C's `atoi` does: optional leading whitespace and
/// sign, then as many digits as follow. Anything else yields 0.
fn parse_count(arg: &str) -> i64 {
  let trimmed = arg.trim_start();
  let (negative, digits) = match trimmed.as_bytes().first() {
    Some(b'-') => (true, &trimmed[1..]),
    Some(b'+') => (false, &trimmed[1..]),
    _ => (false, trimmed),
  };

  let value = digits
    .bytes()
    .take_while(u8::is_ascii_digit)
    .fold(0i64, |acc, digit| acc.saturating_mul(10).saturating_add((digit - b'0') as i64));

  if negative { -value } else { value }
}

/// Byte size for `count` integers, or `None` if no arena could hold it.
fn request_size(count: i64) -> Option<usize> {
  usize::try_from(count).ok()?.checked_mul(mem::size_of::<i32>())
}

fn run(
  allocator: &mut FreeListAllocator<MEMORY_SIZE>,
  count: i64,
) -> Result<bool> {
  let Some(size) = request_size(count) else {
    return Ok(false);
  };

  let Some(handle) = allocator
    .allocate(size)
    .with_context(|| format!("allocating {} bytes", size))?
  else {
    return Ok(false);
  };

  let payload = allocator
    .payload_mut(handle)
    .context("writing the array")?;

  for (i, cell) in payload[..size].chunks_exact_mut(mem::size_of::<i32>()).enumerate() {
    let value = (i as i32).wrapping_mul(i as i32);
    cell.copy_from_slice(&value.to_le_bytes());
    println!("Array[{}] = {}", i, value);
  }

  allocator
    .deallocate(handle)
    .context("freeing the array")?;
  println!("Memory successfully freed.");

  Ok(true)
}

fn main() -> ExitCode {
  pretty_env_logger::init();

  let args: Vec<String> = env::args().collect();

  if args.len() != 2 {
    let program = args.first().map_or("rheap", String::as_str);
    println!("Usage: {} <size_of_allocation>", program);
    return ExitCode::from(1);
  }

  let count = parse_count(&args[1]);

  let mut allocator = FreeListAllocator::<MEMORY_SIZE>::new();
  allocator.initialize();
  allocator.mark_bad_blocks(BAD_BLOCK_COUNT);

  match run(&mut allocator, count) {
    Ok(true) => {},
    Ok(false) => println!("Memory allocation failed."),
    Err(err) => {
      error!("{:#}", err);
      println!("Memory allocation failed.");
    },
  }

  ExitCode::SUCCESS
}
