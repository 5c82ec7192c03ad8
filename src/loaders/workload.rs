/*
 * Workload Loader
 *
 * This module loads process workloads for the simulator and turns them into
 * an ArrivalFeed the simulation drains tick by tick.
 *
 * File Format:
 * ============
 *
 *   #id arrival runtime priority memsize
 *   1   0       5       3        200
 *   2   2       3       1        64
 *
 * - The first line is a header and is always skipped
 * - Blank lines and lines starting with '#' are ignored
 * - Every record has exactly five integer fields separated by whitespace
 *
 * Validation:
 * ===========
 *
 * A feed is rejected before the run if it is empty, repeats an id, has a
 * process with zero runtime, or lists arrivals out of order. Whether every
 * process fits the memory pool is checked separately against the
 * configured pool (ensure_fits).
 */

use std::collections::HashSet;
use std::path::Path;

use crate::scheduler::{Priority, ProcessId, ProcessSpec, Tick};

/// Number of fields in a workload record
const RECORD_FIELDS: usize = 5;

#[derive(Debug)]
pub enum WorkloadError {
    Io(std::io::Error),
    Parse { line: usize, reason: String },
    Empty,
    DuplicateId(ProcessId),
    ZeroService(ProcessId),
    ArrivalOutOfOrder { id: ProcessId, arrival: Tick, previous: Tick },
    DemandExceedsPool { id: ProcessId, demand: usize, pool: usize },
}

impl core::fmt::Display for WorkloadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WorkloadError::Io(err) => write!(f, "Cannot read workload: {}", err),
            WorkloadError::Parse { line, reason } => write!(f, "Line {}: {}", line, reason),
            WorkloadError::Empty => write!(f, "Workload contains no processes"),
            WorkloadError::DuplicateId(id) => write!(f, "Process id {} appears twice", id),
            WorkloadError::ZeroService(id) => write!(f, "Process {} has zero runtime", id),
            WorkloadError::ArrivalOutOfOrder { id, arrival, previous } => write!(
                f,
                "Process {} arrives at {} but follows an arrival at {}",
                id, arrival, previous
            ),
            WorkloadError::DemandExceedsPool { id, demand, pool } => write!(
                f,
                "Process {} needs {} bytes but the pool holds {}",
                id, demand, pool
            ),
        }
    }
}

impl std::error::Error for WorkloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkloadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WorkloadError {
    fn from(err: std::io::Error) -> Self {
        WorkloadError::Io(err)
    }
}

/// Parse one record line
fn parse_record(line_no: usize, line: &str) -> Result<ProcessSpec, WorkloadError> {
    let parse_error = |reason: String| WorkloadError::Parse { line: line_no, reason };

    let mut fields: heapless::Vec<&str, RECORD_FIELDS> = heapless::Vec::new();
    for field in line.split_whitespace() {
        fields
            .push(field)
            .map_err(|_| parse_error(format!("expected {} fields, found more", RECORD_FIELDS)))?;
    }
    if fields.len() != RECORD_FIELDS {
        return Err(parse_error(format!(
            "expected {} fields, found {}",
            RECORD_FIELDS,
            fields.len()
        )));
    }

    Ok(ProcessSpec {
        id: ProcessId(number(line_no, fields[0], "id")?),
        arrival: number(line_no, fields[1], "arrival time")?,
        service: number(line_no, fields[2], "runtime")?,
        priority: Priority(number(line_no, fields[3], "priority")?),
        mem_demand: number(line_no, fields[4], "memory size")?,
    })
}

fn number<T: core::str::FromStr>(line_no: usize, field: &str, name: &str) -> Result<T, WorkloadError> {
    field.parse().map_err(|_| WorkloadError::Parse {
        line: line_no,
        reason: format!("invalid {} '{}'", name, field),
    })
}

/// Parse a whole workload text into process specs, in file order
pub fn parse(text: &str) -> Result<Vec<ProcessSpec>, WorkloadError> {
    let mut specs = Vec::new();

    for (index, line) in text.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        specs.push(parse_record(index + 1, line)?);
    }

    Ok(specs)
}

/// Read and validate a workload file
pub fn load_workload(path: &Path) -> Result<ArrivalFeed, WorkloadError> {
    let text = std::fs::read_to_string(path)?;
    let feed = ArrivalFeed::parse(&text)?;
    log::info!("Loaded {} processes from {}", feed.len(), path.display());
    Ok(feed)
}

/// Validated processes, delivered in arrival order
#[derive(Debug, Clone)]
pub struct ArrivalFeed {
    specs: Vec<ProcessSpec>,
    /// Index of the first spec not delivered yet
    next: usize,
}

impl ArrivalFeed {
    /// Build a feed from specs in arrival order
    pub fn new(specs: Vec<ProcessSpec>) -> Result<Self, WorkloadError> {
        if specs.is_empty() {
            return Err(WorkloadError::Empty);
        }

        let mut seen = HashSet::with_capacity(specs.len());
        let mut previous = 0;
        for spec in &specs {
            if !seen.insert(spec.id) {
                return Err(WorkloadError::DuplicateId(spec.id));
            }
            if spec.service == 0 {
                return Err(WorkloadError::ZeroService(spec.id));
            }
            if spec.arrival < previous {
                return Err(WorkloadError::ArrivalOutOfOrder {
                    id: spec.id,
                    arrival: spec.arrival,
                    previous,
                });
            }
            previous = spec.arrival;
        }

        Ok(Self { specs, next: 0 })
    }

    /// Parse and validate workload text
    pub fn parse(text: &str) -> Result<Self, WorkloadError> {
        Self::new(parse(text)?)
    }

    /// Reject processes that could never be placed in a pool of `pool_size`
    pub fn ensure_fits(&self, pool_size: usize) -> Result<(), WorkloadError> {
        match self.specs.iter().find(|spec| spec.mem_demand > pool_size) {
            Some(spec) => Err(WorkloadError::DemandExceedsPool {
                id: spec.id,
                demand: spec.mem_demand,
                pool: pool_size,
            }),
            None => Ok(()),
        }
    }

    /// Total number of processes in the feed
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Processes not delivered yet
    pub fn pending(&self) -> usize {
        self.specs.len() - self.next
    }

    pub fn specs(&self) -> &[ProcessSpec] {
        &self.specs
    }

    /// Arrival tick of the next undelivered process
    pub fn next_arrival(&self) -> Option<Tick> {
        self.specs.get(self.next).map(|spec| spec.arrival)
    }

    /// Deliver every process arriving at or before `tick`, in file order
    pub fn drain_due(&mut self, tick: Tick) -> &[ProcessSpec] {
        let start = self.next;
        while self.next < self.specs.len() && self.specs[self.next].arrival <= tick {
            self.next += 1;
        }
        &self.specs[start..self.next]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "#id arrival runtime priority memsize\n\
                          1\t0\t5\t3\t200\n\
                          \n\
                          # comment\n\
                          2\t2\t3\t1\t64\n\
                          3 2 1 0 1024\n";

    #[test]
    fn test_parse_skips_header_and_comments() {
        let specs = parse(SAMPLE).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(
            specs[1],
            ProcessSpec {
                id: ProcessId(2),
                arrival: 2,
                service: 3,
                priority: Priority(1),
                mem_demand: 64,
            }
        );
    }

    #[test]
    fn test_header_is_skipped_even_if_numeric() {
        let specs = parse("1 0 5 3 200\n2 1 1 1 8\n").unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].id, ProcessId(2));
    }

    #[test]
    fn test_field_count_errors_name_the_line() {
        match parse("#hdr\n1 0 5 3\n") {
            Err(WorkloadError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse("#hdr\n1 0 5 3 8\n2 0 1 1 8 9\n"),
            Err(WorkloadError::Parse { line: 3, .. })
        ));
        assert!(matches!(
            parse("#hdr\n1 0 x 3 8\n"),
            Err(WorkloadError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_feed_validation() {
        assert!(matches!(ArrivalFeed::parse("#hdr\n"), Err(WorkloadError::Empty)));
        assert!(matches!(
            ArrivalFeed::parse("#hdr\n1 0 1 0 8\n1 1 1 0 8\n"),
            Err(WorkloadError::DuplicateId(ProcessId(1)))
        ));
        assert!(matches!(
            ArrivalFeed::parse("#hdr\n1 0 0 0 8\n"),
            Err(WorkloadError::ZeroService(ProcessId(1)))
        ));
        assert!(matches!(
            ArrivalFeed::parse("#hdr\n1 3 1 0 8\n2 1 1 0 8\n"),
            Err(WorkloadError::ArrivalOutOfOrder { arrival: 1, previous: 3, .. })
        ));

        let feed = ArrivalFeed::parse(SAMPLE).unwrap();
        assert!(feed.ensure_fits(1024).is_ok());
        assert!(matches!(
            feed.ensure_fits(512),
            Err(WorkloadError::DemandExceedsPool { demand: 1024, pool: 512, .. })
        ));
    }

    #[test]
    fn test_drain_due_delivers_each_spec_once() {
        let mut feed = ArrivalFeed::parse(SAMPLE).unwrap();
        assert_eq!(feed.drain_due(0).len(), 1);
        assert!(feed.drain_due(1).is_empty());
        assert_eq!(feed.next_arrival(), Some(2));

        let batch: Vec<_> = feed.drain_due(5).iter().map(|spec| spec.id.0).collect();
        assert_eq!(batch, vec![2, 3]);
        assert_eq!(feed.pending(), 0);
        assert!(feed.drain_due(9).is_empty());
        assert_eq!(feed.len(), 3);
    }
}
