/*
 * Scheduler Type Definitions
 *
 * This module defines the small value types shared by the engine (mechanism)
 * and the scheduling policies. They are Copy-able and carry no references
 * into engine state except TickView, which borrows records for one decision.
 */

use super::process::ProcessRecord;

/// Position of a record in the ready queue
///
/// `Ranked` keys are kept ascending; a new record goes in front of the first
/// record with a strictly greater key, so equal keys keep insertion order.
/// `Fifo` always appends at the tail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrderingKey {
    Fifo,
    Ranked(i64),
}

impl OrderingKey {
    /// Does a record with this key go in front of one keyed `other`?
    pub fn precedes(self, other: OrderingKey) -> bool {
        match (self, other) {
            (OrderingKey::Ranked(a), OrderingKey::Ranked(b)) => a < b,
            _ => false,
        }
    }
}

/// Round-robin quantum in ticks
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeSliceTicks(pub u32);

impl TimeSliceTicks {
    /// Get the value as u32
    pub fn get(self) -> u32 {
        self.0
    }
}

/// What the policy wants done with the running process this tick
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickDecision {
    /// Keep running
    Continue,
    /// Stop the running process and dispatch the contender
    Preempt,
}

/// Snapshot handed to a policy once per running tick
///
/// `running` has already been charged for this tick and did not finish.
/// `contender` is the first ready record that could be dispatched now
/// (memory permitting), if any.
pub struct TickView<'a> {
    pub running: &'a ProcessRecord,
    pub contender: Option<&'a ProcessRecord>,
    /// At least one process arrived this tick
    pub new_arrival: bool,
}

/// Result of one engine tick, used for utilization accounting
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A process holds the CPU until the next tick
    Busy,
    /// Nothing is running although processes remain
    Idle,
    /// Every known process has finished
    Complete,
}
