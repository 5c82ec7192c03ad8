/*
 * Event Log Writers
 *
 * This module writes the two event logs of a run:
 * - scheduler.log: one line per process lifecycle event
 * - memory.log: one line per block allocation or release
 *
 * EventLog is a SimCtx, so the engine writes to it directly. SimCtx methods
 * cannot fail; the first I/O error is kept and returned by finish(), and
 * nothing more is written after it.
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::scheduler::{EventClass, MemoryEvent, MemoryEventKind, SchedEvent, SchedEventKind, SimCtx};

pub const SCHEDULER_LOG: &str = "scheduler.log";
pub const MEMORY_LOG: &str = "memory.log";

const SCHEDULER_HEADER: &str = "# At time x process y state arr w total z remain y wait k";
const MEMORY_HEADER: &str = "# At time x allocated y bytes for process z from i to j";

/// Format a lifecycle event as a scheduler.log line (without newline)
///
/// # Example
///
/// ```text
/// At time 3 process 1 stopped arr 0 total 8 remain 5 wait 0
/// At time 10 process 1 finished arr 0 total 8 remain 0 wait 2 TA 10 WTA 1.25
/// ```
pub fn format_sched_event(event: &SchedEvent) -> String {
    let mut line = format!(
        "At time {} process {} {} arr {} total {} remain {} wait {}",
        event.tick,
        event.pid,
        event.name(),
        event.arrival,
        event.service,
        event.remaining,
        event.waiting
    );
    if event.kind == SchedEventKind::Finished {
        line.push_str(&format!(
            " TA {} WTA {:.2}",
            event.turnaround(),
            event.weighted_turnaround()
        ));
    }
    line
}

/// Format a memory event as a memory.log line (without newline)
pub fn format_memory_event(event: &MemoryEvent) -> String {
    let preposition = match event.kind {
        MemoryEventKind::Allocated => "for",
        MemoryEventKind::Freed => "from",
    };
    format!(
        "At time {} {} {} bytes {} process {} from {} to {}",
        event.tick,
        event.name(),
        event.requested,
        preposition,
        event.pid,
        event.start,
        event.end
    )
}

/// Writer pair for scheduler.log and memory.log
pub struct EventLog<W: Write> {
    sched: W,
    memory: W,
    /// Events echoed through the logger
    trace: EventClass,
    error: Option<io::Error>,
    lines: usize,
}

impl EventLog<BufWriter<File>> {
    /// Create both log files in `dir`, truncating old ones
    pub fn create(dir: &Path, trace: EventClass) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let sched = BufWriter::new(File::create(dir.join(SCHEDULER_LOG))?);
        let memory = BufWriter::new(File::create(dir.join(MEMORY_LOG))?);
        Self::new(sched, memory, trace)
    }
}

impl<W: Write> EventLog<W> {
    /// Wrap two writers and write the headers
    ///
    /// # Arguments
    ///
    /// * `sched` - Receives scheduler.log lines
    /// * `memory` - Receives memory.log lines
    /// * `trace` - Event classes also echoed through `log::info!`
    pub fn new(mut sched: W, mut memory: W, trace: EventClass) -> io::Result<Self> {
        writeln!(sched, "{}", SCHEDULER_HEADER)?;
        writeln!(memory, "{}", MEMORY_HEADER)?;
        Ok(Self {
            sched,
            memory,
            trace,
            error: None,
            lines: 0,
        })
    }

    /// Event lines written so far, both logs together
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush both writers and hand them back
    ///
    /// # Errors
    ///
    /// The first error hit while writing, or a flush error.
    pub fn finish(mut self) -> io::Result<(W, W)> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.sched.flush()?;
        self.memory.flush()?;
        Ok((self.sched, self.memory))
    }

    fn record(&mut self, class: EventClass, line: String, to_memory: bool) {
        if self.trace.intersects(class) {
            log::info!("{}", line);
        }
        if self.error.is_some() {
            return;
        }

        let out = if to_memory { &mut self.memory } else { &mut self.sched };
        match writeln!(out, "{}", line) {
            Ok(()) => self.lines += 1,
            Err(err) => {
                log::error!("Event log write failed: {}", err);
                self.error = Some(err);
            }
        }
    }
}

impl<W: Write> SimCtx for EventLog<W> {
    fn emit(&mut self, event: SchedEvent) {
        self.record(event.class(), format_sched_event(&event), false);
    }

    fn emit_memory(&mut self, event: MemoryEvent) {
        self.record(event.class(), format_memory_event(&event), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ProcessId;

    fn sched_event(kind: SchedEventKind, tick: u64, remaining: u64, waiting: u64) -> SchedEvent {
        SchedEvent {
            kind,
            tick,
            pid: ProcessId(1),
            arrival: 0,
            service: 8,
            remaining,
            waiting,
        }
    }

    #[test]
    fn test_sched_line_format() {
        assert_eq!(
            format_sched_event(&sched_event(SchedEventKind::Stopped, 3, 5, 0)),
            "At time 3 process 1 stopped arr 0 total 8 remain 5 wait 0"
        );
        assert_eq!(
            format_sched_event(&sched_event(SchedEventKind::Finished, 10, 0, 2)),
            "At time 10 process 1 finished arr 0 total 8 remain 0 wait 2 TA 10 WTA 1.25"
        );
    }

    #[test]
    fn test_memory_line_format() {
        let mut event = MemoryEvent {
            kind: MemoryEventKind::Allocated,
            tick: 0,
            pid: ProcessId(1),
            requested: 300,
            start: 0,
            end: 511,
        };
        assert_eq!(
            format_memory_event(&event),
            "At time 0 allocated 300 bytes for process 1 from 0 to 511"
        );
        event.kind = MemoryEventKind::Freed;
        event.tick = 5;
        assert_eq!(
            format_memory_event(&event),
            "At time 5 freed 300 bytes from process 1 from 0 to 511"
        );
    }

    #[test]
    fn test_event_log_splits_streams() {
        let mut log = EventLog::new(Vec::new(), Vec::new(), EventClass::empty()).unwrap();
        log.emit(sched_event(SchedEventKind::Started, 0, 8, 0));
        log.emit_memory(MemoryEvent {
            kind: MemoryEventKind::Allocated,
            tick: 0,
            pid: ProcessId(1),
            requested: 8,
            start: 0,
            end: 7,
        });
        assert_eq!(log.lines(), 2);

        let (sched, memory) = log.finish().unwrap();
        let sched = String::from_utf8(sched).unwrap();
        let memory = String::from_utf8(memory).unwrap();
        assert_eq!(
            sched.lines().collect::<Vec<_>>(),
            vec![SCHEDULER_HEADER, "At time 0 process 1 started arr 0 total 8 remain 8 wait 0"]
        );
        assert_eq!(memory.lines().count(), 2);
        assert!(memory.starts_with(MEMORY_HEADER));
    }
}
