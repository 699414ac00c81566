//! Uses `PoolAllocator` the way a node-based container would: every node is its own
//! single-element allocation, released individually when removed.

#![allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "test code doesn't need the same safety rigor as production code"
)]

use std::ptr::NonNull;

use chunk_pool::PoolAllocator;

struct Node {
    value: u64,
    next: Option<NonNull<Node>>,
}

/// A minimal intrusive stack whose nodes come from a pool.
struct NodeStack {
    head: Option<NonNull<Node>>,
    len: usize,
    allocator: PoolAllocator<Node>,
}

impl NodeStack {
    fn new(allocator: PoolAllocator<Node>) -> Self {
        Self {
            head: None,
            len: 0,
            allocator,
        }
    }

    fn push(&mut self, value: u64) -> NonNull<Node> {
        let node = self.allocator.allocate(1).unwrap();

        unsafe {
            node.write(Node {
                value,
                next: self.head,
            });
        }

        self.head = Some(node);
        self.len += 1;
        node
    }

    fn pop(&mut self) -> Option<u64> {
        let node = self.head?;

        let Node { value, next } = unsafe { node.read() };
        unsafe { self.allocator.deallocate(node, 1) };

        self.head = next;
        self.len -= 1;
        Some(value)
    }

    fn values(&self) -> Vec<u64> {
        let mut values = Vec::with_capacity(self.len);
        let mut cursor = self.head;

        while let Some(node) = cursor {
            let node = unsafe { node.as_ref() };
            values.push(node.value);
            cursor = node.next;
        }

        values
    }
}

impl Drop for NodeStack {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

fn recycling_allocator(chunk: usize) -> PoolAllocator<Node> {
    PoolAllocator::builder()
        .chunk_elems(chunk)
        .per_element_free(true)
        .build()
        .unwrap()
}

#[test]
fn nodes_survive_growth() {
    let mut stack = NodeStack::new(recycling_allocator(4));

    for value in 0..25 {
        stack.push(value);
    }

    assert_eq!(stack.values(), (0..25).rev().collect::<Vec<_>>());
    assert_eq!(stack.allocator.block_capacities(), vec![4; 7]);
}

#[test]
fn churn_is_served_from_the_free_list() {
    let allocator = recycling_allocator(8);
    let mut stack = NodeStack::new(allocator.clone());

    for value in 0..8 {
        stack.push(value);
    }
    let before = allocator.stats().unwrap();

    for round in 0..100 {
        assert_eq!(stack.pop(), Some(7));
        stack.push(round);
        assert_eq!(stack.pop(), Some(round));
        stack.push(7);
    }

    let after = allocator.stats().unwrap();
    assert_eq!(after.block_count(), before.block_count());
    assert_eq!(after.bump_offset(), before.bump_offset());
}

#[test]
fn popped_node_slot_is_reused_by_next_push() {
    let mut stack = NodeStack::new(recycling_allocator(8));

    stack.push(1);
    let second = stack.push(2);
    stack.pop();

    let third = stack.push(3);

    assert_eq!(third, second);
    assert_eq!(stack.values(), vec![3, 1]);
}

#[test]
fn two_containers_share_one_pool() {
    let allocator = recycling_allocator(8);
    let mut left = NodeStack::new(allocator.clone());
    let mut right = NodeStack::new(allocator.clone());

    let released = left.push(10);
    left.pop();

    // A node released by one container is picked up by the other.
    assert_eq!(right.push(20), released);
    assert_eq!(allocator.attached_count(), 3);
}

#[test]
fn dropping_containers_tears_down_pool_deterministically() {
    let allocator = recycling_allocator(8);
    let mut stack = NodeStack::new(allocator.clone());
    stack.push(1);

    drop(allocator);
    assert_eq!(stack.allocator.attached_count(), 1);

    // The stack still owns the last reference and can keep working.
    stack.push(2);
    assert_eq!(stack.values(), vec![2, 1]);
}
