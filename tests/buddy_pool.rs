//! Integration tests for the buddy allocator
//!
//! Exercises the allocator through long mixed allocate/free sequences and
//! checks the tree invariants after every operation.

use buddy_sched::memory::{AllocError, BlockId, BuddyAllocator};
use buddy_sched::scheduler::ProcessId;

const POOL: usize = 1024;
const MIN_UNIT: usize = 8;

/// Small deterministic generator so failures are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn start_of(pool: &BuddyAllocator, id: BlockId) -> usize {
    pool.block(id).unwrap().start
}

#[test]
fn test_mixed_allocations_keep_invariants() {
    let mut pool = BuddyAllocator::new(POOL, MIN_UNIT).unwrap();
    let mut rng = Lcg(0x5eed);
    let mut live: Vec<(BlockId, usize)> = Vec::new();

    for step in 0..2_000 {
        let allocate = live.is_empty() || rng.next() % 3 != 0;
        if allocate {
            let demand = (rng.next() % 300 + 1) as usize;
            let size = pool.allocation_size(demand);
            match pool.allocate(ProcessId(step), size) {
                Ok(id) => {
                    let block = pool.block(id).unwrap();
                    assert_eq!(block.size, size);
                    assert_eq!(block.start % size, 0, "block not aligned to its size");
                    live.push((id, size));
                }
                Err(AllocError::NoMemory) => assert!(!pool.can_place(size)),
                Err(other) => panic!("unexpected {:?}", other),
            }
        } else {
            let index = (rng.next() as usize) % live.len();
            let (id, _) = live.swap_remove(index);
            pool.free(id).unwrap();
        }

        pool.check_invariants().unwrap();
        let bound: usize = live.iter().map(|(_, size)| size).sum();
        assert_eq!(pool.used_bytes(), bound);
        let free: usize = pool.free_ranges().iter().map(|(_, size)| size).sum();
        assert_eq!(free + bound, POOL);
    }

    for (id, _) in live.drain(..) {
        pool.free(id).unwrap();
    }
    assert_eq!(pool.free_ranges(), vec![(0, POOL)]);
    assert_eq!(pool.leaves().len(), 1);
}

#[test]
fn test_example_layout_and_coalescing() {
    let mut pool = BuddyAllocator::new(POOL, MIN_UNIT).unwrap();

    let big = pool.allocate(ProcessId(1), pool.allocation_size(300)).unwrap();
    assert_eq!(pool.block(big).map(|b| (b.start, b.end())), Some((0, 511)));

    let small = pool.allocate(ProcessId(2), pool.allocation_size(100)).unwrap();
    assert_eq!(pool.block(small).map(|b| (b.start, b.end())), Some((512, 639)));

    // The 128-byte block's ancestors stay split until it is freed
    pool.free(big).unwrap();
    assert_eq!(pool.free_ranges(), vec![(0, 512), (640, 128), (768, 256)]);

    pool.free(small).unwrap();
    assert_eq!(pool.free_ranges(), vec![(0, POOL)]);
    pool.check_invariants().unwrap();
}

#[test]
fn test_round_trip_returns_same_offset() {
    let mut pool = BuddyAllocator::new(POOL, MIN_UNIT).unwrap();
    let _keep = pool.allocate(ProcessId(1), 64).unwrap();

    for size in [8, 32, 128, 256] {
        let first = pool.allocate(ProcessId(2), size).unwrap();
        let offset = start_of(&pool, first);
        pool.free(first).unwrap();

        let second = pool.allocate(ProcessId(2), size).unwrap();
        assert_eq!(start_of(&pool, second), offset, "size {}", size);
        pool.free(second).unwrap();
    }
}

#[test]
fn test_free_of_unbound_block_is_rejected() {
    let mut pool = BuddyAllocator::new(POOL, MIN_UNIT).unwrap();
    let id = pool.allocate(ProcessId(1), 16).unwrap();
    pool.free(id).unwrap();

    assert_eq!(pool.free(id), Err(AllocError::NotAllocated));
    assert_eq!(pool.free(pool.root()), Err(AllocError::NotAllocated));
    pool.check_invariants().unwrap();
}
