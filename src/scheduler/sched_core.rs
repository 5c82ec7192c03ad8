/*
 * Scheduling Engine - Mechanism Layer
 *
 * This module implements SchedulingEngine, the single actor that mutates
 * scheduler state once per tick:
 * 1. Holds the active scheduling policy (Box<dyn SchedulingPolicy>)
 * 2. Owns the ready queue, the buddy allocator and the process arena
 * 3. Charges the running process, finishes it, or asks the policy
 *    whether to preempt it
 * 4. Dispatches the next process, placing it in memory on first dispatch
 * 5. Reports every transition through SimCtx and keeps utilization counters
 *
 * Memory is bound on first dispatch and kept across preemptions; it is
 * released only when the process finishes. A process whose block cannot be
 * placed yet stays Ready at its queue position and is retried on a later
 * tick while the dispatcher moves on to the next placeable process.
 */

use crate::memory::{AllocError, BuddyAllocator};
use crate::report::RunStats;

use super::{
    SchedError, Tick,
    events::{MemoryEvent, MemoryEventKind, SchedEvent, SchedEventKind},
    process::{ProcessHandle, ProcessRecord, ProcessSpec, ProcessState},
    ready_queue::ReadyQueue,
    traits::{SchedulingPolicy, SimCtx},
    types::{TickDecision, TickOutcome, TickView},
};

/// The scheduling engine
///
/// Constructed once per run by the simulation driver for a fixed, known
/// number of processes. Arrivals are admitted with [`admit`](Self::admit)
/// before the tick they arrive in is decided with [`tick`](Self::tick).
pub struct SchedulingEngine {
    /// The active scheduling policy
    policy: Box<dyn SchedulingPolicy>,

    ready: ReadyQueue,
    memory: BuddyAllocator,

    /// Every admitted process, indexed by ProcessHandle
    processes: Vec<ProcessRecord>,

    /// The process holding the CPU, if any
    running: Option<ProcessHandle>,

    /// Size of the process set this run will see
    expected: usize,
    finished: usize,

    /// Set by admit, consumed by the next tick
    arrived_this_tick: bool,

    wasted_ticks: u64,
    last_tick: Tick,
    completed_at: Option<Tick>,
}

impl SchedulingEngine {
    /// Create an engine for a run of `expected` processes
    pub fn new(policy: Box<dyn SchedulingPolicy>, memory: BuddyAllocator, expected: usize) -> Self {
        log::debug!(
            "SchedulingEngine initialized with policy {} for {} processes, pool {} bytes",
            policy.name(),
            expected,
            memory.pool_size()
        );

        Self {
            policy,
            ready: ReadyQueue::with_capacity(expected),
            memory,
            processes: Vec::with_capacity(expected),
            running: None,
            expected,
            finished: 0,
            arrived_this_tick: false,
            wasted_ticks: 0,
            last_tick: 0,
            completed_at: None,
        }
    }

    /// Get the name of the active policy
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    // ========================================================================
    // EXTERNAL API - What the simulation driver calls
    // ========================================================================

    /// Merge a newly arrived process into the ready queue
    pub fn admit(&mut self, spec: ProcessSpec) -> ProcessHandle {
        let alloc_size = self.memory.allocation_size(spec.mem_demand);
        let handle = ProcessHandle(self.processes.len());
        let record = ProcessRecord::new(spec, alloc_size);
        let key = self.policy.ordering_key(&record);

        log::debug!(
            "[t={}] process {} arrived: service {}, priority {}, {} bytes (block {})",
            spec.arrival,
            spec.id,
            spec.service,
            spec.priority.0,
            spec.mem_demand,
            alloc_size
        );

        self.processes.push(record);
        self.ready.enqueue(handle, key);
        self.arrived_this_tick = true;
        handle
    }

    /// Run the decision for tick `now`
    ///
    /// All arrivals of `now` must have been admitted already. Returns
    /// whether the CPU is busy until the next tick.
    pub fn tick(&mut self, now: Tick, ctx: &mut dyn SimCtx) -> Result<TickOutcome, SchedError> {
        let new_arrival = core::mem::take(&mut self.arrived_this_tick);
        self.last_tick = now;

        match self.running {
            Some(current) => {
                let remaining = self.processes[current.0].run_one_tick();
                if remaining == 0 {
                    self.finish(current, now, ctx)?;
                    self.dispatch_next(now, ctx)?;
                } else {
                    self.check_preemption(current, new_arrival, now, ctx)?;
                }
            }
            None => self.dispatch_next(now, ctx)?,
        }

        debug_assert!(self.running_count() <= 1, "more than one running process");

        let outcome = if self.is_complete() {
            self.completed_at.get_or_insert(now);
            TickOutcome::Complete
        } else if self.running.is_some() {
            TickOutcome::Busy
        } else {
            self.wasted_ticks += 1;
            TickOutcome::Idle
        };

        log::trace!(
            "[t={}] {:?}: running {:?}, {} ready, {} of {} bytes bound",
            now,
            outcome,
            self.running().map(|record| record.id),
            self.ready.len(),
            self.memory.used_bytes(),
            self.memory.pool_size()
        );

        Ok(outcome)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn running(&self) -> Option<&ProcessRecord> {
        self.running.map(|handle| &self.processes[handle.0])
    }

    pub fn record(&self, handle: ProcessHandle) -> Option<&ProcessRecord> {
        self.processes.get(handle.0)
    }

    /// All admitted records in admission order
    pub fn records(&self) -> &[ProcessRecord] {
        &self.processes
    }

    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready
    }

    pub fn memory(&self) -> &BuddyAllocator {
        &self.memory
    }

    /// Number of records currently in the Running state
    pub fn running_count(&self) -> usize {
        self.processes
            .iter()
            .filter(|record| record.state == ProcessState::Running)
            .count()
    }

    pub fn finished_count(&self) -> usize {
        self.finished
    }

    /// Has every expected process finished?
    pub fn is_complete(&self) -> bool {
        self.finished == self.expected
    }

    pub fn wasted_ticks(&self) -> u64 {
        self.wasted_ticks
    }

    /// Utilization counters and completion metrics of the run so far
    pub fn stats(&self) -> RunStats {
        let mut completions: Vec<_> = self
            .processes
            .iter()
            .filter_map(|record| record.completion)
            .collect();
        completions.sort_by_key(|completion| completion.id);

        RunStats {
            total_ticks: self.completed_at.unwrap_or(self.last_tick),
            wasted_ticks: self.wasted_ticks,
            completions,
        }
    }

    // ========================================================================
    // DISPATCH STATE MACHINE
    // ========================================================================

    /// First ready process, in queue order, that can take the CPU right now
    ///
    /// A process that already holds a block always can; a fresh one only if
    /// the allocator could place it.
    fn select_contender(&self) -> Option<ProcessHandle> {
        for handle in self.ready.iter() {
            let record = &self.processes[handle.0];
            if record.block.is_some() || self.memory.can_place(record.alloc_size) {
                return Some(handle);
            }
            log::debug!(
                "process {} deferred: no free block of {} bytes ({} in use)",
                record.id,
                record.alloc_size,
                self.memory.used_bytes()
            );
        }
        None
    }

    fn check_preemption(
        &mut self,
        current: ProcessHandle,
        new_arrival: bool,
        now: Tick,
        ctx: &mut dyn SimCtx,
    ) -> Result<(), SchedError> {
        let contender = self.select_contender();
        let view = TickView {
            running: &self.processes[current.0],
            contender: contender.map(|handle| &self.processes[handle.0]),
            new_arrival,
        };

        if self.policy.on_tick(&view) == TickDecision::Continue {
            return Ok(());
        }

        debug_assert!(self.policy.is_preemptive(), "{} preempted", self.policy.name());

        let Some(next) = contender else {
            return Ok(());
        };

        self.preempt(current, now, ctx);
        if !self.dispatch(next, now, ctx)? {
            self.dispatch_next(now, ctx)?;
        }
        Ok(())
    }

    fn dispatch_next(&mut self, now: Tick, ctx: &mut dyn SimCtx) -> Result<(), SchedError> {
        match self.select_contender() {
            Some(next) => {
                self.dispatch(next, now, ctx)?;
            }
            None if !self.ready.is_empty() => {
                log::debug!("[t={}] {} ready but none placeable, CPU idle", now, self.ready.len());
            }
            None => {}
        }
        Ok(())
    }

    /// Give the CPU to `handle`
    ///
    /// Binds memory on first dispatch. Returns `Ok(false)` and leaves the
    /// process queued if no block is available.
    fn dispatch(&mut self, handle: ProcessHandle, now: Tick, ctx: &mut dyn SimCtx) -> Result<bool, SchedError> {
        debug_assert!(self.running.is_none(), "dispatch while a process is running");

        if self.processes[handle.0].block.is_none() {
            let (pid, size) = {
                let record = &self.processes[handle.0];
                (record.id, record.alloc_size)
            };
            let block = match self.memory.allocate(pid, size) {
                Ok(block) => block,
                Err(AllocError::NoMemory) => {
                    log::debug!("process {} deferred: allocation of {} bytes failed", pid, size);
                    return Ok(false);
                }
                Err(err) => return Err(SchedError::Memory(err)),
            };

            let (start, end) = match self.memory.block(block) {
                Some(bound) => (bound.start, bound.end()),
                None => return Err(SchedError::Memory(AllocError::InvalidParam)),
            };
            let record = &mut self.processes[handle.0];
            record.block = Some(block);
            ctx.emit_memory(MemoryEvent {
                kind: MemoryEventKind::Allocated,
                tick: now,
                pid,
                requested: record.mem_demand,
                start,
                end,
            });
        }

        self.ready.remove(handle);
        self.running = Some(handle);
        self.policy.on_dispatch(self.processes[handle.0].id);

        let record = &mut self.processes[handle.0];
        record.state = ProcessState::Running;
        record.waiting = record.waiting_at(now);

        if record.is_fresh() {
            log::debug!("[t={}] process {} started", now, record.id);
            ctx.emit(sched_event(SchedEventKind::Started, record, now));
            ctx.spawn(record.id, record.remaining_cell());
        } else {
            log::debug!("[t={}] process {} resumed, remaining {}", now, record.id, record.remaining());
            ctx.emit(sched_event(SchedEventKind::Resumed, record, now));
            ctx.resume(record.id);
        }
        Ok(true)
    }

    /// Take the CPU away from `handle` and put it back in the ready queue
    fn preempt(&mut self, handle: ProcessHandle, now: Tick, ctx: &mut dyn SimCtx) {
        let key = self.policy.ordering_key(&self.processes[handle.0]);
        let record = &mut self.processes[handle.0];
        record.state = ProcessState::Ready;
        record.waiting = record.waiting_at(now);

        log::debug!("[t={}] process {} stopped, remaining {}", now, record.id, record.remaining());
        ctx.emit(sched_event(SchedEventKind::Stopped, record, now));
        ctx.pause(record.id);

        self.ready.enqueue(handle, key);
        self.running = None;
    }

    /// Retire the running process and release its memory
    fn finish(&mut self, handle: ProcessHandle, now: Tick, ctx: &mut dyn SimCtx) -> Result<(), SchedError> {
        let record = &mut self.processes[handle.0];
        let completion = record.finish(now);

        log::debug!(
            "[t={}] process {} finished: TA {}, WTA {:.2}, waited {}",
            now,
            record.id,
            completion.turnaround,
            completion.weighted_turnaround,
            completion.waiting
        );
        ctx.emit(sched_event(SchedEventKind::Finished, record, now));
        ctx.reap(record.id);

        self.running = None;
        self.finished += 1;

        let Some(block) = self.processes[handle.0].block.take() else {
            return Ok(());
        };
        let (start, end) = match self.memory.block(block) {
            Some(bound) => (bound.start, bound.end()),
            None => return Err(SchedError::Memory(AllocError::NotAllocated)),
        };
        self.memory.free(block).map_err(SchedError::Memory)?;

        let record = &self.processes[handle.0];
        ctx.emit_memory(MemoryEvent {
            kind: MemoryEventKind::Freed,
            tick: now,
            pid: record.id,
            requested: record.mem_demand,
            start,
            end,
        });
        Ok(())
    }
}

fn sched_event(kind: SchedEventKind, record: &ProcessRecord, now: Tick) -> SchedEvent {
    SchedEvent {
        kind,
        tick: now,
        pid: record.id,
        arrival: record.arrival,
        service: record.service,
        remaining: record.remaining(),
        waiting: record.waiting,
    }
}
