/*
 * Process Runner
 *
 * This module simulates the workload processes the scheduler controls.
 * A workload does no real work: it watches the remaining-time cell it was
 * spawned with and exits once the engine has counted it down to zero.
 *
 * The runner only ever sees the engine through the SimCtx hooks:
 * - spawn: first dispatch, the workload starts with its gate open
 * - pause/resume: the gate closes on preemption and reopens on dispatch
 * - reap: the engine retired the process; the workload must have exited
 *
 * At most one gate may be open at a time. Breaking that is a scheduler bug,
 * so the runner asserts on it instead of reporting an error.
 */

use std::collections::BTreeMap;

use crate::scheduler::{MemoryEvent, ProcessId, RemainingCell, SchedEvent, SimCtx};

/// Whether a workload may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Running,
    Paused,
}

#[derive(Debug)]
struct Workload {
    cell: RemainingCell,
    gate: Gate,
    /// Ticks observed while the gate was open
    ticks_run: u64,
    last_seen: u64,
}

/// Table of live simulated workloads
#[derive(Debug, Default)]
pub struct ProcessTable {
    workloads: BTreeMap<ProcessId, Workload>,
    running: Option<ProcessId>,
    exited: Vec<ProcessId>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workload currently holding the open gate
    pub fn running(&self) -> Option<ProcessId> {
        self.running
    }

    pub fn gate(&self, pid: ProcessId) -> Option<Gate> {
        self.workloads.get(&pid).map(|workload| workload.gate)
    }

    /// Remaining time of `pid` as the workload sees it
    pub fn observed_remaining(&self, pid: ProcessId) -> Option<u64> {
        self.workloads.get(&pid).map(|workload| workload.cell.get())
    }

    /// Number of spawned, not yet reaped workloads
    pub fn live(&self) -> usize {
        self.workloads.len()
    }

    /// Reaped workloads in exit order
    pub fn exited(&self) -> &[ProcessId] {
        &self.exited
    }

    /// Let the running workload observe its cell
    ///
    /// Returns the running workload if it has counted down to zero and is
    /// waiting to be reaped.
    pub fn poll(&mut self) -> Option<ProcessId> {
        let pid = self.running?;
        let workload = self.workloads.get_mut(&pid)?;

        let remaining = workload.cell.get();
        workload.ticks_run += workload.last_seen.saturating_sub(remaining);
        workload.last_seen = remaining;

        (remaining == 0).then_some(pid)
    }

    fn open_gate(&mut self, pid: ProcessId) {
        assert!(
            self.running.is_none_or(|running| running == pid),
            "runner: process {} resumed while process {:?} is running",
            pid,
            self.running
        );
        self.running = Some(pid);
    }
}

impl SimCtx for ProcessTable {
    fn emit(&mut self, _event: SchedEvent) {}

    fn emit_memory(&mut self, _event: MemoryEvent) {}

    fn spawn(&mut self, pid: ProcessId, cell: RemainingCell) {
        self.open_gate(pid);
        let last_seen = cell.get();
        log::trace!("runner: spawned process {} with {} ticks", pid, last_seen);
        let previous = self.workloads.insert(
            pid,
            Workload {
                cell,
                gate: Gate::Running,
                ticks_run: 0,
                last_seen,
            },
        );
        assert!(previous.is_none(), "runner: process {} spawned twice", pid);
    }

    fn resume(&mut self, pid: ProcessId) {
        self.open_gate(pid);
        match self.workloads.get_mut(&pid) {
            Some(workload) => workload.gate = Gate::Running,
            None => panic!("runner: resume of unknown process {}", pid),
        }
    }

    fn pause(&mut self, pid: ProcessId) {
        self.poll();
        if let Some(workload) = self.workloads.get_mut(&pid) {
            workload.gate = Gate::Paused;
        }
        if self.running == Some(pid) {
            self.running = None;
        }
    }

    fn reap(&mut self, pid: ProcessId) {
        self.poll();
        let Some(workload) = self.workloads.remove(&pid) else {
            panic!("runner: reap of unknown process {}", pid);
        };
        assert_eq!(workload.cell.get(), 0, "runner: process {} reaped before exiting", pid);
        log::trace!("runner: process {} exited after {} ticks", pid, workload.ticks_run);

        if self.running == Some(pid) {
            self.running = None;
        }
        self.exited.push(pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_follows_hooks() {
        let mut table = ProcessTable::new();
        let cell = RemainingCell::new(2);

        table.spawn(ProcessId(1), cell.clone());
        assert_eq!(table.running(), Some(ProcessId(1)));
        assert_eq!(table.poll(), None);

        table.pause(ProcessId(1));
        assert_eq!(table.gate(ProcessId(1)), Some(Gate::Paused));
        assert_eq!(table.running(), None);

        table.spawn(ProcessId(2), RemainingCell::new(0));
        assert_eq!(table.poll(), Some(ProcessId(2)));
        table.reap(ProcessId(2));
        assert_eq!(table.exited(), &[ProcessId(2)]);

        table.resume(ProcessId(1));
        assert_eq!(table.observed_remaining(ProcessId(1)), Some(2));
        assert_eq!(table.live(), 1);
    }

    #[test]
    #[should_panic(expected = "while process")]
    fn test_two_running_workloads_panic() {
        let mut table = ProcessTable::new();
        table.spawn(ProcessId(1), RemainingCell::new(3));
        table.spawn(ProcessId(2), RemainingCell::new(3));
    }

    #[test]
    #[should_panic(expected = "reaped before exiting")]
    fn test_reap_before_exit_panics() {
        let mut table = ProcessTable::new();
        table.spawn(ProcessId(1), RemainingCell::new(3));
        table.reap(ProcessId(1));
    }
}
