/*
 * Scheduler Event Definitions
 *
 * This module defines the events the scheduling engine reports to the
 * outside world: process lifecycle events (consumed by the event log and
 * the process runner) and memory events (consumed by the memory log).
 *
 * Events are plain values; the engine emits them through SimCtx in the
 * exact order the state changes happen within a tick.
 */

use bitflags::bitflags;

use super::{ProcessId, Tick};

/// Lifecycle transitions of a process
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchedEventKind {
    /// First dispatch
    Started,
    /// Preempted back to the ready queue
    Stopped,
    /// Ran to completion
    Finished,
    /// Dispatched again after a preemption
    Resumed,
}

/// A lifecycle event with the process accounting at that tick
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SchedEvent {
    pub kind: SchedEventKind,
    pub tick: Tick,
    pub pid: ProcessId,
    pub arrival: Tick,
    pub service: u64,
    pub remaining: u64,
    pub waiting: u64,
}

impl SchedEvent {
    /// Get a short name for logging
    pub fn name(&self) -> &'static str {
        match self.kind {
            SchedEventKind::Started => "started",
            SchedEventKind::Stopped => "stopped",
            SchedEventKind::Finished => "finished",
            SchedEventKind::Resumed => "resumed",
        }
    }

    pub fn class(&self) -> EventClass {
        match self.kind {
            SchedEventKind::Started => EventClass::STARTED,
            SchedEventKind::Stopped => EventClass::STOPPED,
            SchedEventKind::Finished => EventClass::FINISHED,
            SchedEventKind::Resumed => EventClass::RESUMED,
        }
    }

    /// Turnaround time, meaningful for `Finished` events only
    pub fn turnaround(&self) -> u64 {
        self.tick - self.arrival
    }

    /// Weighted turnaround, meaningful for `Finished` events only
    pub fn weighted_turnaround(&self) -> f64 {
        self.turnaround() as f64 / self.service as f64
    }
}

/// Memory pool transitions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemoryEventKind {
    Allocated,
    Freed,
}

/// A memory event; `start..=end` is the bound block
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
    pub kind: MemoryEventKind,
    pub tick: Tick,
    pub pid: ProcessId,
    /// Bytes the process asked for (before rounding to a block size)
    pub requested: usize,
    pub start: usize,
    pub end: usize,
}

impl MemoryEvent {
    pub fn name(&self) -> &'static str {
        match self.kind {
            MemoryEventKind::Allocated => "allocated",
            MemoryEventKind::Freed => "freed",
        }
    }

    pub fn class(&self) -> EventClass {
        match self.kind {
            MemoryEventKind::Allocated => EventClass::ALLOCATED,
            MemoryEventKind::Freed => EventClass::FREED,
        }
    }
}

bitflags! {
    /// Event classes, used to select which events are echoed to the log
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventClass: u8 {
        const STARTED = 1;
        const STOPPED = 1 << 1;
        const FINISHED = 1 << 2;
        const RESUMED = 1 << 3;
        const ALLOCATED = 1 << 4;
        const FREED = 1 << 5;

        const SCHED = Self::STARTED.bits()
            | Self::STOPPED.bits()
            | Self::FINISHED.bits()
            | Self::RESUMED.bits();
        const MEMORY = Self::ALLOCATED.bits() | Self::FREED.bits();
    }
}

impl EventClass {
    /// Parse a comma separated list such as `started,freed` or `sched`
    ///
    /// `all` and `none` are accepted as shorthands.
    pub fn parse_list(list: &str) -> Result<EventClass, String> {
        let mut mask = EventClass::empty();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let upper = name.to_ascii_uppercase();
            mask |= match upper.as_str() {
                "ALL" => EventClass::all(),
                "NONE" => EventClass::empty(),
                _ => EventClass::from_name(&upper)
                    .ok_or_else(|| format!("unknown event class '{}'", name))?,
            };
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_classes() {
        assert_eq!(
            EventClass::parse_list("started, Freed").unwrap(),
            EventClass::STARTED | EventClass::FREED
        );
        assert_eq!(EventClass::parse_list("sched").unwrap(), EventClass::SCHED);
        assert_eq!(EventClass::parse_list("all").unwrap(), EventClass::all());
        assert_eq!(EventClass::parse_list("").unwrap(), EventClass::empty());
        assert!(EventClass::parse_list("blocked").is_err());
    }

    #[test]
    fn test_finished_metrics() {
        let event = SchedEvent {
            kind: SchedEventKind::Finished,
            tick: 9,
            pid: ProcessId(2),
            arrival: 1,
            service: 4,
            remaining: 0,
            waiting: 4,
        };
        assert_eq!(event.turnaround(), 8);
        assert!((event.weighted_turnaround() - 2.0).abs() < f64::EPSILON);
        assert!(EventClass::SCHED.contains(event.class()));
    }
}
