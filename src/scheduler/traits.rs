/*
 * Scheduler Trait Definitions
 *
 * This module defines the traits that separate scheduling policy from mechanism:
 *
 * - SchedulingPolicy: what differs between HPF, SRTN and RR (queue order,
 *   preemption rule, per-slice accounting)
 * - SimCtx: the interface the engine uses to report events and drive the
 *   process runner
 *
 * The engine (SchedulingEngine) owns the ready queue, the allocator and the
 * running slot; policies never touch them directly.
 */

use super::{
    ProcessId,
    events::{MemoryEvent, SchedEvent},
    process::{ProcessRecord, RemainingCell},
    types::{OrderingKey, TickDecision, TickView},
};

/// Scheduling policy trait
///
/// The engine holds a `Box<dyn SchedulingPolicy>` and consults it for:
/// - Where a record goes in the ready queue (ordering_key)
/// - Whether the running process should give up the CPU (on_tick)
/// - Resetting per-dispatch state (on_dispatch)
pub trait SchedulingPolicy: Send {
    /// Ready queue position for `record`
    ///
    /// Called on arrival and again when a preempted record rejoins the queue.
    fn ordering_key(&self, record: &ProcessRecord) -> OrderingKey;

    /// Can this policy take the CPU away from a running process?
    fn is_preemptive(&self) -> bool;

    /// React to a running tick that did not finish the running process
    fn on_tick(&mut self, view: &TickView<'_>) -> TickDecision;

    /// A process was just given the CPU
    fn on_dispatch(&mut self, _pid: ProcessId) {}

    /// Get the policy name for debugging
    fn name(&self) -> &'static str;
}

/// Engine context interface
///
/// The only way the engine talks to the world outside its own state: event
/// consumers (logs, report) and the process runner. Runner hooks default to
/// no-ops so pure event consumers only implement the two emit methods.
pub trait SimCtx {
    /// A process lifecycle event happened
    fn emit(&mut self, event: SchedEvent);

    /// A memory block was bound or released
    fn emit_memory(&mut self, event: MemoryEvent);

    /// First dispatch: start a workload that counts down `cell`
    fn spawn(&mut self, _pid: ProcessId, _cell: RemainingCell) {}

    /// Open the gate of a preempted workload
    fn resume(&mut self, _pid: ProcessId) {}

    /// Close the gate of a running workload
    fn pause(&mut self, _pid: ProcessId) {}

    /// Workload finished; drop its runner state
    fn reap(&mut self, _pid: ProcessId) {}
}

/// Collects every event in order; used by tests and dry runs
#[derive(Debug, Default)]
pub struct EventRecorder {
    pub sched: Vec<SchedEvent>,
    pub memory: Vec<MemoryEvent>,
}

impl SimCtx for EventRecorder {
    fn emit(&mut self, event: SchedEvent) {
        self.sched.push(event);
    }

    fn emit_memory(&mut self, event: MemoryEvent) {
        self.memory.push(event);
    }
}

/// Forwards every event and runner hook to two contexts, first `A` then `B`
#[derive(Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: SimCtx, B: SimCtx> SimCtx for Tee<A, B> {
    fn emit(&mut self, event: SchedEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }

    fn emit_memory(&mut self, event: MemoryEvent) {
        self.0.emit_memory(event);
        self.1.emit_memory(event);
    }

    fn spawn(&mut self, pid: ProcessId, cell: RemainingCell) {
        self.0.spawn(pid, cell.clone());
        self.1.spawn(pid, cell);
    }

    fn resume(&mut self, pid: ProcessId) {
        self.0.resume(pid);
        self.1.resume(pid);
    }

    fn pause(&mut self, pid: ProcessId) {
        self.0.pause(pid);
        self.1.pause(pid);
    }

    fn reap(&mut self, pid: ProcessId) {
        self.0.reap(pid);
        self.1.reap(pid);
    }
}
