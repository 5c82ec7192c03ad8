/*
 * Workload Loaders
 *
 * This module provides support for loading process workloads into an
 * arrival feed for the simulator.
 */

pub mod workload;

pub use workload::{load_workload, ArrivalFeed, WorkloadError};
