/*
 * buddy-sched Command Line Entry Point
 *
 * Parses the command line into a SimConfig, installs the logger and runs
 * the workload file, writing scheduler.log, memory.log and scheduler.perf
 * into the output directory. The performance summary is also printed to
 * stdout.
 */

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use buddy_sched::scheduler::{EventClass, TimeSliceTicks};
use buddy_sched::{PolicyKind, SimConfig, run_workload_file, utils};

#[derive(Parser, Debug)]
#[command(name = "buddy-sched", about = "Simulate CPU scheduling over a buddy memory pool")]
struct Args {
    /// Workload file: header line, then `id arrival runtime priority memsize` per line
    #[arg(value_name = "WORKLOAD")]
    workload: PathBuf,

    /// Scheduling policy: hpf, srtn, rr (or 0, 1, 2)
    #[arg(short, long, value_name = "POLICY")]
    policy: PolicyKind,

    /// Round-robin quantum in ticks
    #[arg(short, long, value_name = "TICKS")]
    quantum: Option<u32>,

    /// Memory pool size in bytes (power of two)
    #[arg(long, value_name = "BYTES", default_value_t = buddy_sched::memory::DEFAULT_POOL_SIZE)]
    pool_size: usize,

    /// Smallest block handed out, in bytes (power of two)
    #[arg(long, value_name = "BYTES", default_value_t = buddy_sched::memory::DEFAULT_MIN_UNIT)]
    min_unit: usize,

    /// Wall-clock milliseconds per tick (0 runs unpaced)
    #[arg(long, value_name = "MS", default_value_t = 0)]
    tick_ms: u64,

    /// Directory for scheduler.log, memory.log and scheduler.perf
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Events to echo to stderr, e.g. `started,stopped`, `sched`, `memory`, `all`
    #[arg(long, value_name = "CLASSES", value_parser = EventClass::parse_list)]
    trace: Option<EventClass>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> (SimConfig, PathBuf) {
        let config = SimConfig {
            policy: self.policy,
            quantum: self.quantum.map(TimeSliceTicks),
            pool_size: self.pool_size,
            min_unit: self.min_unit,
            tick_duration: (self.tick_ms > 0).then(|| Duration::from_millis(self.tick_ms)),
            output_dir: self.output_dir,
            trace: self.trace.unwrap_or(EventClass::empty()),
        };
        (config, self.workload)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut level = utils::level_for_verbosity(args.verbose);
    if args.trace.is_some_and(|mask| !mask.is_empty()) {
        level = level.max(log::LevelFilter::Info);
    }
    utils::init(level).map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;

    let (config, workload) = args.into_config();
    let summary = run_workload_file(config, &workload)
        .with_context(|| format!("Simulation of {} failed", workload.display()))?;

    print!("{}", summary);
    Ok(())
}
