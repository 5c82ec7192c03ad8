/*
 * Highest Priority First Policy
 *
 * Non-preemptive: the ready queue is ordered by priority (lower value
 * first, arrival order on ties) and the running process keeps the CPU
 * until it finishes. The next process is chosen only on completion.
 */

use super::super::{
    process::ProcessRecord,
    traits::SchedulingPolicy,
    types::{OrderingKey, TickDecision, TickView},
};

/// Highest Priority First scheduling policy
#[derive(Debug, Default)]
pub struct HpfPolicy;

impl HpfPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl SchedulingPolicy for HpfPolicy {
    fn ordering_key(&self, record: &ProcessRecord) -> OrderingKey {
        OrderingKey::Ranked(i64::from(record.priority.0))
    }

    fn is_preemptive(&self) -> bool {
        false
    }

    fn on_tick(&mut self, _view: &TickView<'_>) -> TickDecision {
        TickDecision::Continue
    }

    fn name(&self) -> &'static str {
        "HPF"
    }
}
