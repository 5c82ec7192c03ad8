/*
 * buddy-sched: CPU Scheduler and Buddy Memory Simulator
 *
 * Discrete-time simulation of a short-term CPU scheduler cooperating with a
 * buddy-system memory allocator. Processes arrive from a workload file, are
 * placed in a power-of-two block on first dispatch, and are scheduled with
 * one of three policies:
 * - HPF: Highest Priority First, non-preemptive
 * - SRTN: Shortest Remaining Time Next, preempts on arrival
 * - RR: Round robin with a fixed quantum
 *
 * Module map:
 * - scheduler: the engine (mechanism), policies, ready queue, events
 * - memory: the buddy allocator
 * - loaders: workload file parsing and the arrival feed
 * - runner: simulated workload processes
 * - simulation: clocked driver tying feed, engine and outputs together
 * - report: performance summary
 * - utils: logger, clock, event log writers
 */

pub mod config;
pub mod loaders;
pub mod memory;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod simulation;
pub mod utils;

pub use config::{ConfigError, PolicyKind, SimConfig};
pub use loaders::{ArrivalFeed, WorkloadError, load_workload};
pub use memory::{AllocError, BuddyAllocator};
pub use report::{PerfSummary, RunStats};
pub use runner::ProcessTable;
pub use scheduler::{SchedError, SchedulingEngine, SimCtx};
pub use simulation::{SimError, Simulation, run_workload_file};
