/*
 * Scheduler Subsystem
 *
 * This module provides the tick-driven CPU scheduler of the simulator.
 *
 * Architecture:
 * - Mechanism: SchedulingEngine (sched_core.rs) owns the ready queue, the
 *   buddy allocator and the process arena and runs one decision per tick
 * - Policy: SchedulingPolicy implementations (policies/) decide queue order
 *   and preemption
 * - Context: SimCtx (traits.rs) is how the engine reports events and drives
 *   the process runner
 *
 * Components:
 * - process.rs: ProcessRecord, ProcessId and the shared remaining-time cell
 * - ready_queue.rs: ordered intrusive queue of ready processes
 * - events.rs: lifecycle and memory events plus the EventClass trace mask
 * - types.rs: ordering keys, tick decisions and outcomes
 */

pub mod events;
pub mod policies;
pub mod process;
pub mod ready_queue;
pub mod sched_core;
pub mod traits;
pub mod types;

use crate::memory::AllocError;

/// Simulated time unit
pub type Tick = u64;

pub use events::{EventClass, MemoryEvent, MemoryEventKind, SchedEvent, SchedEventKind};
pub use process::{
    Completion, Priority, ProcessHandle, ProcessId, ProcessRecord, ProcessSpec, ProcessState,
    RemainingCell,
};
pub use ready_queue::ReadyQueue;
pub use sched_core::SchedulingEngine;
pub use traits::{EventRecorder, SchedulingPolicy, SimCtx, Tee};
pub use types::{OrderingKey, TickDecision, TickOutcome, TickView, TimeSliceTicks};

/// Errors that abort a scheduling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// The allocator rejected an operation that cannot be deferred
    Memory(AllocError),
}

impl core::fmt::Display for SchedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SchedError::Memory(err) => write!(f, "memory pool failure: {}", err),
        }
    }
}

impl std::error::Error for SchedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchedError::Memory(err) => Some(err),
        }
    }
}

impl From<AllocError> for SchedError {
    fn from(err: AllocError) -> Self {
        SchedError::Memory(err)
    }
}
