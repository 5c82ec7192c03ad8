/*
 * Process Records
 *
 * This module implements the simulated process abstraction.
 * A ProcessRecord carries everything the scheduler knows about one workload:
 * - Static description from the arrival feed (arrival, service time, priority, memory)
 * - Live execution state (remaining time, lifecycle state, bound memory block)
 * - Completion metrics once the process has finished
 *
 * Records are kept in an arena owned by the scheduling engine and addressed
 * by a stable ProcessHandle. Process ids come from the workload and are only
 * used for reporting; nothing indexes the arena by id.
 */

use core::fmt;
use std::sync::Arc;

use spin::Mutex;

use crate::memory::BlockId;

use super::Tick;

/// Unique identifier for a process, as given by the workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub usize);

impl ProcessId {
    /// Get the raw ID value
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process priority
///
/// Lower values are more urgent; HPF orders the ready queue ascending.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

/// Stable arena slot of a record inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessHandle(pub(crate) usize);

impl ProcessHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Process lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Waiting in the ready queue
    Ready,
    /// Owns the CPU this tick
    Running,
    /// Done; memory released, record kept for reporting
    Finished,
}

/// Static description of a process as delivered by the arrival feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSpec {
    pub id: ProcessId,
    pub arrival: Tick,
    pub service: u64,
    pub priority: Priority,
    pub mem_demand: usize,
}

/// Live remaining-time cell shared with the process runner
///
/// The engine decrements it once per running tick; the runner only reads.
#[derive(Debug, Clone)]
pub struct RemainingCell(Arc<Mutex<u64>>);

impl RemainingCell {
    pub fn new(value: u64) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    pub fn get(&self) -> u64 {
        *self.0.lock()
    }

    /// Decrement by one tick and return the new value
    fn decrement(&self) -> u64 {
        let mut remaining = self.0.lock();
        *remaining = remaining.saturating_sub(1);
        *remaining
    }
}

/// Metrics recorded when a process finishes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub id: ProcessId,
    pub finish: Tick,
    pub turnaround: u64,
    pub weighted_turnaround: f64,
    pub waiting: u64,
}

/// Scheduler-side record of one process
#[derive(Debug)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub arrival: Tick,
    pub service: u64,
    pub priority: Priority,
    pub mem_demand: usize,
    /// Power-of-two block size the allocator must provide
    pub alloc_size: usize,
    pub state: ProcessState,
    /// Bound block, present from first dispatch until finish
    pub block: Option<BlockId>,
    /// Waiting time as of the last event
    pub waiting: u64,
    pub completion: Option<Completion>,
    remaining: RemainingCell,
}

impl ProcessRecord {
    /// Create a Ready record for a freshly arrived process
    pub fn new(spec: ProcessSpec, alloc_size: usize) -> Self {
        Self {
            id: spec.id,
            arrival: spec.arrival,
            service: spec.service,
            priority: spec.priority,
            mem_demand: spec.mem_demand,
            alloc_size,
            state: ProcessState::Ready,
            block: None,
            waiting: 0,
            completion: None,
            remaining: RemainingCell::new(spec.service),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.get()
    }

    /// Handle on the live remaining-time cell
    pub fn remaining_cell(&self) -> RemainingCell {
        self.remaining.clone()
    }

    /// Has this process never been dispatched?
    pub fn is_fresh(&self) -> bool {
        self.remaining() == self.service
    }

    pub fn is_finished(&self) -> bool {
        self.state == ProcessState::Finished
    }

    /// Consume one tick of CPU time
    pub(crate) fn run_one_tick(&mut self) -> u64 {
        debug_assert_eq!(self.state, ProcessState::Running);
        self.remaining.decrement()
    }

    /// Waiting time at `now`: time since arrival not spent running
    pub fn waiting_at(&self, now: Tick) -> u64 {
        let executed = self.service - self.remaining();
        now.saturating_sub(self.arrival).saturating_sub(executed)
    }

    /// Mark finished and record completion metrics
    pub(crate) fn finish(&mut self, now: Tick) -> Completion {
        self.state = ProcessState::Finished;
        self.waiting = self.waiting_at(now);

        let turnaround = now - self.arrival;
        let completion = Completion {
            id: self.id,
            finish: now,
            turnaround,
            weighted_turnaround: turnaround as f64 / self.service as f64,
            waiting: self.waiting,
        };
        self.completion = Some(completion);
        completion
    }
}
