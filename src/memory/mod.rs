/*
 * Memory Management
 *
 * High-level module for the simulated memory pool:
 *  - Buddy allocator placing processes into power-of-two blocks (buddy)
 *  - Allocation error type shared with the scheduler
 */

pub mod buddy;

pub use buddy::{BlockId, BuddyAllocator, MemoryBlock, Placement};

/// Default size of the simulated memory pool in bytes
pub const DEFAULT_POOL_SIZE: usize = 1024;

/// Default smallest block the allocator hands out
pub const DEFAULT_MIN_UNIT: usize = 8;

/// The error type used for allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// Invalid size or geometry (not a power of two, out of range)
    InvalidParam,
    /// No free block can hold the request right now
    NoMemory,
    /// Freeing a block that is not bound to a process
    NotAllocated,
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AllocError::InvalidParam => write!(f, "Invalid allocation parameter"),
            AllocError::NoMemory => write!(f, "Not enough free memory"),
            AllocError::NotAllocated => write!(f, "Block is not allocated"),
        }
    }
}

impl std::error::Error for AllocError {}

/// A [`Result`] type with [`AllocError`] as the error type.
pub type AllocResult<T = ()> = Result<T, AllocError>;
