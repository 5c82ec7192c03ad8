/*
 * Buddy Allocator
 *
 * This module implements the binary buddy system that places simulated
 * processes into a single power-of-two address range.
 *
 * The range is tracked as an explicit binary tree of blocks:
 * - A leaf is either free or bound to exactly one process
 * - An internal node always has both children (equal halves)
 * - Splitting halves a leaf until a block of the requested size exists
 * - Freeing walks upward and merges sibling leaves once both are free
 *
 * Blocks live in an arena and refer to each other by index. The parent
 * index is only used for the merge walk on free; ownership flows strictly
 * from parent to children.
 *
 * Allocation failure is an expected outcome: the scheduler defers the
 * process and retries on a later tick.
 */

use core::fmt;

use crate::scheduler::ProcessId;

use super::{AllocError, AllocResult};

/// Index of a block inside the allocator arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(usize);

impl BlockId {
    /// Get the raw arena index
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// A node of the buddy tree
#[derive(Debug, Clone)]
pub struct MemoryBlock {
    /// Block size in bytes (power of two)
    pub size: usize,
    /// Offset of the first byte inside the pool
    pub start: usize,
    /// Bound process, `None` when free (always `None` for internal nodes)
    pub owner: Option<ProcessId>,
    parent: Option<BlockId>,
    children: Option<(BlockId, BlockId)>,
}

impl MemoryBlock {
    fn leaf(size: usize, start: usize, parent: Option<BlockId>) -> Self {
        Self {
            size,
            start,
            owner: None,
            parent,
            children: None,
        }
    }

    /// Inclusive offset of the last byte in the block
    pub fn end(&self) -> usize {
        self.start + self.size - 1
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn is_free_leaf(&self) -> bool {
        self.is_leaf() && self.owner.is_none()
    }

    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    pub fn children(&self) -> Option<(BlockId, BlockId)> {
        self.children
    }
}

/// Outcome of searching the tree for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// A free leaf of exactly the requested size
    Exact(BlockId),
    /// The smallest free leaf strictly larger than the request
    Split(BlockId),
    /// No free leaf can hold the request right now
    Unavailable,
}

/// Binary buddy allocator over `[0, pool_size)`
pub struct BuddyAllocator {
    /// Block arena; `None` marks a slot released by a merge
    blocks: Vec<Option<MemoryBlock>>,
    /// Recycled arena slots
    vacant: Vec<usize>,
    root: BlockId,
    pool_size: usize,
    min_unit: usize,
    used_bytes: usize,
}

impl BuddyAllocator {
    /// Create an allocator owning a single free block of `pool_size` bytes
    ///
    /// Both sizes must be powers of two and `min_unit <= pool_size`.
    pub fn new(pool_size: usize, min_unit: usize) -> AllocResult<Self> {
        if !pool_size.is_power_of_two() || !min_unit.is_power_of_two() || min_unit > pool_size {
            return Err(AllocError::InvalidParam);
        }

        Ok(Self {
            blocks: vec![Some(MemoryBlock::leaf(pool_size, 0, None))],
            vacant: Vec::new(),
            root: BlockId(0),
            pool_size,
            min_unit,
            used_bytes: 0,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn min_unit(&self) -> usize {
        self.min_unit
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    /// Bytes currently bound to processes
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn available_bytes(&self) -> usize {
        self.pool_size - self.used_bytes
    }

    /// Smallest power of two holding `demand`, floored at the minimum unit
    pub fn allocation_size(&self, demand: usize) -> usize {
        demand.next_power_of_two().max(self.min_unit)
    }

    /// Look up a live block
    pub fn block(&self, id: BlockId) -> Option<&MemoryBlock> {
        self.blocks.get(id.0).and_then(Option::as_ref)
    }

    fn node(&self, id: BlockId) -> &MemoryBlock {
        match self.block(id) {
            Some(block) => block,
            None => panic!("buddy: dangling {}", id),
        }
    }

    fn node_mut(&mut self, id: BlockId) -> &mut MemoryBlock {
        match self.blocks.get_mut(id.0).and_then(Option::as_mut) {
            Some(block) => block,
            None => panic!("buddy: dangling {}", id),
        }
    }

    /// Search for a place for `size` bytes without modifying the tree
    ///
    /// Depth-first, left subtree first. The first exact-size free leaf wins
    /// immediately; otherwise the smallest strictly larger free leaf seen
    /// (leftmost on ties) is returned as the split candidate.
    pub fn find(&self, size: usize) -> Placement {
        let mut candidate: Option<BlockId> = None;
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            let block = self.node(id);

            if let Some((left, right)) = block.children {
                // Right pushed first so the left subtree is visited first
                stack.push(right);
                stack.push(left);
                continue;
            }

            if block.owner.is_some() || block.size < size {
                continue;
            }

            if block.size == size {
                return Placement::Exact(id);
            }

            let smaller = candidate.is_none_or(|c| block.size < self.node(c).size);
            if smaller {
                candidate = Some(id);
            }
        }

        match candidate {
            Some(id) => Placement::Split(id),
            None => Placement::Unavailable,
        }
    }

    /// Whether a request of `size` bytes could be placed right now
    pub fn can_place(&self, size: usize) -> bool {
        self.find(size) != Placement::Unavailable
    }

    /// Place `owner` into a block of exactly `size` bytes
    ///
    /// `size` must already be an allocation size (see [`Self::allocation_size`]).
    /// Returns `NoMemory` when no free leaf is large enough.
    pub fn allocate(&mut self, owner: ProcessId, size: usize) -> AllocResult<BlockId> {
        if !size.is_power_of_two() || size < self.min_unit || size > self.pool_size {
            return Err(AllocError::InvalidParam);
        }

        let block = match self.find(size) {
            Placement::Exact(id) => id,
            Placement::Split(id) => self.split(id, size)?,
            Placement::Unavailable => {
                log::debug!(
                    "buddy: no free block for {} bytes (process {}), {} of {} bytes in use",
                    size,
                    owner,
                    self.used_bytes,
                    self.pool_size
                );
                return Err(AllocError::NoMemory);
            }
        };

        self.bind(block, owner)?;
        Ok(block)
    }

    /// Halve a free leaf repeatedly until its leftmost descendant has `target` bytes
    ///
    /// Returns that descendant, still free. Only blocks on the path from
    /// `leaf` down to the result are touched.
    pub fn split(&mut self, leaf: BlockId, target: usize) -> AllocResult<BlockId> {
        let block = self.block(leaf).ok_or(AllocError::InvalidParam)?;
        if !block.is_free_leaf() || block.size < target || target < self.min_unit {
            return Err(AllocError::InvalidParam);
        }

        let mut current = leaf;
        loop {
            let (size, start) = {
                let block = self.node(current);
                (block.size, block.start)
            };
            if size == target {
                return Ok(current);
            }

            let half = size / 2;
            let left = self.insert(MemoryBlock::leaf(half, start, Some(current)));
            let right = self.insert(MemoryBlock::leaf(half, start + half, Some(current)));
            self.node_mut(current).children = Some((left, right));

            log::trace!(
                "buddy: split [{}, {}] into [{}, {}] + [{}, {}]",
                start,
                start + size - 1,
                start,
                start + half - 1,
                start + half,
                start + size - 1
            );

            current = left;
        }
    }

    fn bind(&mut self, id: BlockId, owner: ProcessId) -> AllocResult {
        let block = self.node_mut(id);
        if !block.is_free_leaf() {
            return Err(AllocError::InvalidParam);
        }
        block.owner = Some(owner);
        let size = block.size;
        self.used_bytes += size;
        Ok(())
    }

    /// Release a bound block and coalesce free buddies upward
    ///
    /// Freeing a block that is not a bound leaf is rejected with
    /// `NotAllocated`.
    pub fn free(&mut self, id: BlockId) -> AllocResult {
        let block = match self.blocks.get_mut(id.0).and_then(Option::as_mut) {
            Some(block) if block.is_leaf() && block.owner.is_some() => block,
            _ => return Err(AllocError::NotAllocated),
        };

        block.owner = None;
        let size = block.size;
        let mut parent = block.parent;
        self.used_bytes -= size;

        while let Some(pid) = parent {
            let (left, right) = match self.node(pid).children {
                Some(pair) => pair,
                None => break,
            };
            if !(self.node(left).is_free_leaf() && self.node(right).is_free_leaf()) {
                break;
            }

            self.remove(left);
            self.remove(right);
            let merged = self.node_mut(pid);
            merged.children = None;

            log::trace!("buddy: merged buddies into [{}, {}]", merged.start, merged.end());

            parent = merged.parent;
        }

        Ok(())
    }

    fn insert(&mut self, block: MemoryBlock) -> BlockId {
        match self.vacant.pop() {
            Some(slot) => {
                self.blocks[slot] = Some(block);
                BlockId(slot)
            }
            None => {
                self.blocks.push(Some(block));
                BlockId(self.blocks.len() - 1)
            }
        }
    }

    fn remove(&mut self, id: BlockId) {
        self.blocks[id.0] = None;
        self.vacant.push(id.0);
    }

    /// Leaves in address order
    pub fn leaves(&self) -> Vec<(BlockId, &MemoryBlock)> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let block = self.node(id);
            match block.children {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => out.push((id, block)),
            }
        }
        out
    }

    /// Free leaves as `(start, size)` pairs in address order
    pub fn free_ranges(&self) -> Vec<(usize, usize)> {
        self.leaves()
            .into_iter()
            .filter(|(_, block)| block.owner.is_none())
            .map(|(_, block)| (block.start, block.size))
            .collect()
    }

    /// Verify the structural invariants of the tree
    ///
    /// Every internal node has two equal halves laid out back to back,
    /// no internal node has two free leaf children, leaves tile the pool
    /// and `used_bytes` matches the bound leaves.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let block = self.node(id);
            if !block.size.is_power_of_two() || block.size < self.min_unit {
                return Err(format!("{} has invalid size {}", id, block.size));
            }
            if let Some((left, right)) = block.children {
                let (l, r) = (self.node(left), self.node(right));
                if block.owner.is_some() {
                    return Err(format!("internal {} has an owner", id));
                }
                if l.size != r.size || block.size != l.size + r.size || block.size != 2 * l.size {
                    return Err(format!("{} children are not equal halves", id));
                }
                if l.start != block.start || r.start != block.start + l.size {
                    return Err(format!("{} children are misplaced", id));
                }
                if l.parent != Some(id) || r.parent != Some(id) {
                    return Err(format!("{} children have a wrong parent", id));
                }
                if l.is_free_leaf() && r.is_free_leaf() {
                    return Err(format!("{} has two free leaf children", id));
                }
                stack.push(right);
                stack.push(left);
            }
        }

        let mut cursor = 0;
        let mut used = 0;
        for (id, leaf) in self.leaves() {
            if leaf.start != cursor {
                return Err(format!("{} leaves a gap at {}", id, cursor));
            }
            cursor += leaf.size;
            if leaf.owner.is_some() {
                used += leaf.size;
            }
        }
        if cursor != self.pool_size {
            return Err(format!("leaves cover {} of {} bytes", cursor, self.pool_size));
        }
        if used != self.used_bytes {
            return Err(format!("used bytes {} but bound leaves hold {}", self.used_bytes, used));
        }
        Ok(())
    }
}
