/*
 * Round-Robin Scheduling Policy
 *
 * This module implements a preemptive round-robin scheduling policy.
 * The ready queue is plain FIFO; every dispatch gets a fixed quantum.
 *
 * Features:
 * - FIFO ready queue (arrivals and preempted processes append at the tail)
 * - Slice counter incremented on every running tick
 * - Preemption once the quantum is used up and someone is waiting
 * - With nobody waiting the process keeps running and the counter is not
 *   reset, so a later arrival takes over at the first tick it is queued
 */

use super::super::{
    ProcessId,
    process::ProcessRecord,
    traits::SchedulingPolicy,
    types::{OrderingKey, TickDecision, TickView, TimeSliceTicks},
};

/// Round-Robin scheduling policy
pub struct RoundRobinPolicy {
    /// Ticks each dispatch may run before it can be preempted
    quantum: TimeSliceTicks,

    /// Ticks the running process has used in its current slice
    slice_used: u32,
}

impl RoundRobinPolicy {
    /// Create a new Round-Robin policy
    pub fn new(quantum: TimeSliceTicks) -> Self {
        Self {
            quantum,
            slice_used: 0,
        }
    }

    pub fn quantum(&self) -> TimeSliceTicks {
        self.quantum
    }

    /// Ticks used in the current slice
    pub fn slice_used(&self) -> u32 {
        self.slice_used
    }
}

impl SchedulingPolicy for RoundRobinPolicy {
    fn ordering_key(&self, _record: &ProcessRecord) -> OrderingKey {
        OrderingKey::Fifo
    }

    fn is_preemptive(&self) -> bool {
        true
    }

    fn on_tick(&mut self, view: &TickView<'_>) -> TickDecision {
        self.slice_used += 1;

        if self.slice_used < self.quantum.get() {
            return TickDecision::Continue;
        }

        match view.contender {
            Some(contender) => {
                log::debug!(
                    "[RR Policy] quantum of process {} expired after {} ticks, next is process {}",
                    view.running.id,
                    self.slice_used,
                    contender.id
                );
                TickDecision::Preempt
            }
            None => {
                log::trace!(
                    "[RR Policy] quantum of process {} expired, nobody waiting",
                    view.running.id
                );
                TickDecision::Continue
            }
        }
    }

    fn on_dispatch(&mut self, _pid: ProcessId) {
        self.slice_used = 0;
    }

    fn name(&self) -> &'static str {
        "Round-Robin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{Priority, ProcessSpec};

    fn record(id: usize, service: u64) -> ProcessRecord {
        ProcessRecord::new(
            ProcessSpec {
                id: ProcessId(id),
                arrival: 0,
                service,
                priority: Priority(0),
                mem_demand: 8,
            },
            8,
        )
    }

    #[test]
    fn test_preempts_only_with_contender() {
        let mut policy = RoundRobinPolicy::new(TimeSliceTicks(2));
        let running = record(1, 10);
        let waiting = record(2, 10);
        policy.on_dispatch(running.id);

        let alone = TickView { running: &running, contender: None, new_arrival: false };
        assert_eq!(policy.on_tick(&alone), TickDecision::Continue);
        assert_eq!(policy.on_tick(&alone), TickDecision::Continue);
        assert_eq!(policy.on_tick(&alone), TickDecision::Continue);
        assert_eq!(policy.slice_used(), 3);

        // Quantum already used up: preempt as soon as someone waits
        let crowded = TickView { running: &running, contender: Some(&waiting), new_arrival: true };
        assert_eq!(policy.on_tick(&crowded), TickDecision::Preempt);

        policy.on_dispatch(waiting.id);
        assert_eq!(policy.slice_used(), 0);
        assert_eq!(policy.on_tick(&crowded), TickDecision::Continue);
        assert_eq!(policy.on_tick(&crowded), TickDecision::Preempt);
    }
}
