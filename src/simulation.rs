/*
 * Simulation Driver
 *
 * Wires the pieces of a run together:
 *
 *   ArrivalFeed ──admit──> SchedulingEngine ──events──> SimCtx
 *        ^                       ^                (logs, runner)
 *        └──── Clock (tick) ─────┘
 *
 * Per tick, every process arriving at that tick is admitted before the
 * engine decides the tick, then the clock advances. The run ends at the
 * tick on which the last process finishes.
 */

use std::io;
use std::path::Path;

use crate::config::{ConfigError, SimConfig};
use crate::loaders::{ArrivalFeed, WorkloadError, load_workload};
use crate::memory::BuddyAllocator;
use crate::report::{PerfSummary, RunStats};
use crate::runner::ProcessTable;
use crate::scheduler::{SchedError, SchedulingEngine, SimCtx, Tee, TickOutcome, policies};
use crate::utils::{Clock, EventLog, SimClock};

#[derive(Debug)]
pub enum SimError {
    Config(ConfigError),
    Workload(WorkloadError),
    Sched(SchedError),
    Io(io::Error),
}

impl core::fmt::Display for SimError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SimError::Config(err) => write!(f, "Invalid configuration: {}", err),
            SimError::Workload(err) => write!(f, "Invalid workload: {}", err),
            SimError::Sched(err) => write!(f, "Scheduler failure: {}", err),
            SimError::Io(err) => write!(f, "Output error: {}", err),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Config(err) => Some(err),
            SimError::Workload(err) => Some(err),
            SimError::Sched(err) => Some(err),
            SimError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        SimError::Config(err)
    }
}

impl From<WorkloadError> for SimError {
    fn from(err: WorkloadError) -> Self {
        SimError::Workload(err)
    }
}

impl From<SchedError> for SimError {
    fn from(err: SchedError) -> Self {
        SimError::Sched(err)
    }
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        SimError::Io(err)
    }
}

/// One configured run over a workload
pub struct Simulation<C: Clock = SimClock> {
    config: SimConfig,
    feed: ArrivalFeed,
    engine: SchedulingEngine,
    clock: C,
}

impl Simulation<SimClock> {
    /// Build a run clocked as the configuration asks
    pub fn new(config: SimConfig, feed: ArrivalFeed) -> Result<Self, SimError> {
        let clock = match config.tick_duration {
            Some(pace) => SimClock::paced(pace),
            None => SimClock::new(),
        };
        Self::with_clock(config, feed, clock)
    }
}

impl<C: Clock> Simulation<C> {
    /// Build a run on an explicit clock
    ///
    /// Validates the configuration and checks that every process fits the
    /// pool before anything is scheduled.
    pub fn with_clock(config: SimConfig, feed: ArrivalFeed, clock: C) -> Result<Self, SimError> {
        config.validate()?;
        feed.ensure_fits(config.pool_size)?;

        let memory = BuddyAllocator::new(config.pool_size, config.min_unit)
            .map_err(SchedError::Memory)?;
        let policy = policies::build(config.policy, config.quantum);
        let engine = SchedulingEngine::new(policy, memory, feed.len());

        Ok(Self {
            config,
            feed,
            engine,
            clock,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn engine(&self) -> &SchedulingEngine {
        &self.engine
    }

    /// Run to completion, reporting every event to `ctx`
    pub fn run(&mut self, ctx: &mut dyn SimCtx) -> Result<RunStats, SimError> {
        log::info!(
            "Starting {} run: {} processes, pool {} bytes",
            self.engine.policy_name(),
            self.feed.len(),
            self.config.pool_size
        );

        loop {
            let now = self.clock.current_tick();
            for spec in self.feed.drain_due(now) {
                self.engine.admit(*spec);
            }

            if self.engine.tick(now, ctx)? == TickOutcome::Complete {
                break;
            }
            self.clock.await_next_tick();
        }

        let stats = self.engine.stats();
        log::info!(
            "Run complete at tick {} ({} idle ticks)",
            stats.total_ticks,
            stats.wasted_ticks
        );
        Ok(stats)
    }
}

/// Load `workload`, run it, and write scheduler.log, memory.log and
/// scheduler.perf into the configured output directory
pub fn run_workload_file(config: SimConfig, workload: &Path) -> Result<PerfSummary, SimError> {
    let feed = load_workload(workload)?;
    let output_dir = config.output_dir.clone();
    let trace = config.trace;

    let mut simulation = Simulation::new(config, feed)?;
    let mut ctx = Tee(EventLog::create(&output_dir, trace)?, ProcessTable::new());
    let stats = simulation.run(&mut ctx)?;

    let Tee(log, runner) = ctx;
    log.finish()?;
    debug_assert_eq!(runner.live(), 0, "workloads left running");

    let summary = PerfSummary::from_run(&stats);
    summary.write_to(&output_dir)?;
    Ok(summary)
}
