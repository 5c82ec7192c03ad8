/*
 * Performance Report
 *
 * End-of-run summary written to scheduler.perf:
 *
 *   CPU utilization = 100.00%
 *   Avg WTA = 1.42
 *   Avg Waiting = 2.00
 *   Std WTA = 0.37
 *
 * Utilization is the share of ticks, up to the final completion, during
 * which a process held the CPU. The WTA standard deviation is taken over all
 * processes (population, not sample).
 */

use core::fmt;
use std::io;
use std::path::Path;

use crate::scheduler::{Completion, Tick};

pub const PERF_FILE: &str = "scheduler.perf";

/// Raw counters of a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Tick of the final completion
    pub total_ticks: Tick,
    /// Ticks with no process running before the run completed
    pub wasted_ticks: u64,
    /// Per-process metrics, ordered by process id
    pub completions: Vec<Completion>,
}

/// Aggregated metrics of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSummary {
    /// Percentage, 0..=100
    pub utilization: f64,
    pub avg_wta: f64,
    pub avg_waiting: f64,
    pub std_wta: f64,
}

impl PerfSummary {
    pub fn from_run(stats: &RunStats) -> Self {
        let utilization = if stats.total_ticks == 0 {
            0.0
        } else {
            let busy = stats.total_ticks.saturating_sub(stats.wasted_ticks);
            busy as f64 / stats.total_ticks as f64 * 100.0
        };

        let count = stats.completions.len();
        if count == 0 {
            return Self {
                utilization,
                avg_wta: 0.0,
                avg_waiting: 0.0,
                std_wta: 0.0,
            };
        }
        let n = count as f64;

        let avg_wta = stats
            .completions
            .iter()
            .map(|completion| completion.weighted_turnaround)
            .sum::<f64>()
            / n;
        let avg_waiting = stats
            .completions
            .iter()
            .map(|completion| completion.waiting as f64)
            .sum::<f64>()
            / n;
        let variance = stats
            .completions
            .iter()
            .map(|completion| (completion.weighted_turnaround - avg_wta).powi(2))
            .sum::<f64>()
            / n;

        Self {
            utilization,
            avg_wta,
            avg_waiting,
            std_wta: variance.sqrt(),
        }
    }

    /// Write the summary to `dir`/scheduler.perf
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        std::fs::write(dir.join(PERF_FILE), self.to_string())
    }
}

impl fmt::Display for PerfSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU utilization = {:.2}%", self.utilization)?;
        writeln!(f, "Avg WTA = {:.2}", self.avg_wta)?;
        writeln!(f, "Avg Waiting = {:.2}", self.avg_waiting)?;
        writeln!(f, "Std WTA = {:.2}", self.std_wta)
    }
}
