//! Several `PoolVec` instances drawing from pools configured in different ways.

#![allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "test code doesn't need the same safety rigor as production code"
)]

use chunk_pool::{Error, PoolAllocator};
use chunk_vec::PoolVec;

#[test]
fn arrays_sharing_a_pool_grow_one_block_at_a_time() {
    let allocator = PoolAllocator::<u32>::builder()
        .chunk_elems(16)
        .build()
        .unwrap();

    let mut evens = PoolVec::with_capacity_in(8, allocator.clone()).unwrap();
    let mut odds = PoolVec::with_capacity_in(8, allocator.clone()).unwrap();

    for i in 0..8 {
        evens.push(i * 2).unwrap();
        odds.push(i * 2 + 1).unwrap();
    }

    // Both reservations fit exactly in the first block.
    assert_eq!(allocator.block_capacities(), vec![16]);
    assert_eq!(allocator.attached_count(), 3);

    evens.push(16).unwrap();
    assert_eq!(allocator.block_capacities().len(), 2);

    assert_eq!(evens.iter().sum::<u32>(), 72);
    assert_eq!(odds.iter().sum::<u32>(), 64);
}

#[test]
fn fixed_pool_refuses_growth_beyond_first_block() {
    let allocator = PoolAllocator::<u8>::builder()
        .chunk_elems(32)
        .expandable(false)
        .build()
        .unwrap();

    let mut bytes = PoolVec::with_capacity_in(32, allocator).unwrap();
    bytes.resize(32, 0xaa).unwrap();

    assert_eq!(
        bytes.push(0xbb),
        Err(Error::CapacityExceeded {
            requested: 64,
            chunk: 32
        })
    );
    assert_eq!(bytes.len(), 32);
}

#[test]
fn detached_allocator_cannot_back_new_storage() {
    let allocator = PoolAllocator::<u64>::new().unwrap();
    let mut values = PoolVec::new_in(allocator);
    values.push(1).unwrap();

    let mut sibling = PoolVec::new_in(values.allocator().clone());

    // Detaching only affects this copy of the allocator.
    let mut orphan_allocator = sibling.allocator().clone();
    orphan_allocator.detach();
    let mut orphan = PoolVec::new_in(orphan_allocator);

    assert_eq!(orphan.push(2), Err(Error::PoolReleased));
    sibling.push(3).unwrap();
    assert_eq!(values.as_slice(), &[1]);
    assert_eq!(sibling.as_slice(), &[3]);
}

#[test]
fn arrays_outlive_the_allocator_they_were_built_from() {
    let values = {
        let allocator = PoolAllocator::<String>::new().unwrap();
        let mut values = PoolVec::new_in(allocator);
        values
            .try_extend((0..25).map(|i| format!("item {i}")))
            .unwrap();
        values
    };

    assert_eq!(values.len(), 25);
    assert_eq!(values[24], "item 24");
    assert_eq!(values.allocator().attached_count(), 1);
}
