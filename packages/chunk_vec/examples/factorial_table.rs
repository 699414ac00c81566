//! Fills pool-backed arrays with a table of factorials and prints them along with the state
//! of the pool they were allocated from.
//!
//! Run with `cargo run --example factorial_table`.

use chunk_pool::{PoolAllocator, Result};
use chunk_vec::PoolVec;

/// Number of elements each block of the pool is sized for.
const CHUNK_ELEMS: usize = 10;

/// Computes `n!`, or `None` if the result does not fit in a `u64` (any `n` above 20).
fn factorial(n: u64) -> Option<u64> {
    (1..=n).try_fold(1_u64, u64::checked_mul)
}

fn main() -> Result<()> {
    let allocator = PoolAllocator::<(u64, u64)>::builder()
        .chunk_elems(CHUNK_ELEMS)
        .build()?;

    let mut table = PoolVec::new_in(allocator.clone());

    for n in 0..10 {
        if let Some(value) = factorial(n) {
            table.push((n, value))?;
        }
    }

    println!("Factorial table:");
    for (n, value) in &table {
        println!("{n:>2}! = {value}");
    }

    // Values that no longer fit are reported instead of wrapping around.
    for n in [20, 21] {
        match factorial(n) {
            Some(value) => println!("{n}! = {value}"),
            None => println!("{n}! overflows u64"),
        }
    }

    // A second array drawing from a rebound pool for plain values.
    let values_allocator = allocator.rebind::<u64>()?;
    let mut values = PoolVec::with_capacity_in(CHUNK_ELEMS, values_allocator)?;
    values.try_extend(table.iter().map(|(_, value)| *value))?;

    println!("Values: {values:?}");

    if let Some(stats) = allocator.stats() {
        println!("Table pool: {stats:?}");
    }
    println!("Table pool blocks: {:?}", allocator.block_capacities());

    Ok(())
}
