/*
 * Scheduling Policies Module
 *
 * This module contains the scheduling policy implementations.
 * Each policy implements the SchedulingPolicy trait and is plugged into
 * the SchedulingEngine when the simulation is built.
 *
 * Available policies:
 * - Hpf: Highest Priority First, non-preemptive
 * - Srtn: Shortest Remaining Time Next, preempts on arrival
 * - RoundRobin: FIFO rotation, preempts on quantum expiry
 */

pub mod hpf;
pub mod round_robin;
pub mod srtn;

pub use hpf::HpfPolicy;
pub use round_robin::RoundRobinPolicy;
pub use srtn::SrtnPolicy;

use crate::config::PolicyKind;

use super::{traits::SchedulingPolicy, types::TimeSliceTicks};

/// Build the policy selected by `kind`
///
/// `quantum` is only consulted for round robin; configuration validation
/// guarantees it is present and non-zero there.
pub fn build(kind: PolicyKind, quantum: Option<TimeSliceTicks>) -> Box<dyn SchedulingPolicy> {
    match kind {
        PolicyKind::Hpf => Box::new(HpfPolicy::new()),
        PolicyKind::Srtn => Box::new(SrtnPolicy::new()),
        PolicyKind::RoundRobin => {
            Box::new(RoundRobinPolicy::new(quantum.unwrap_or(TimeSliceTicks(1))))
        }
    }
}
