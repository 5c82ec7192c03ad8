/*
 * Shortest Remaining Time Next Policy
 *
 * The ready queue is ordered by remaining time (ascending, arrival order on
 * ties). On a tick where a new process arrived, the running process is
 * preempted if its remaining time is now strictly greater than that of the
 * best ready contender. Without an arrival nothing can overtake the running
 * process, so no comparison is made.
 */

use super::super::{
    process::ProcessRecord,
    traits::SchedulingPolicy,
    types::{OrderingKey, TickDecision, TickView},
};

/// Shortest Remaining Time Next scheduling policy
#[derive(Debug, Default)]
pub struct SrtnPolicy;

impl SrtnPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl SchedulingPolicy for SrtnPolicy {
    fn ordering_key(&self, record: &ProcessRecord) -> OrderingKey {
        OrderingKey::Ranked(record.remaining() as i64)
    }

    fn is_preemptive(&self) -> bool {
        true
    }

    fn on_tick(&mut self, view: &TickView<'_>) -> TickDecision {
        if !view.new_arrival {
            return TickDecision::Continue;
        }

        match view.contender {
            Some(contender) if view.running.remaining() > contender.remaining() => {
                log::debug!(
                    "[SRTN] process {} (remaining {}) overtaken by process {} (remaining {})",
                    view.running.id,
                    view.running.remaining(),
                    contender.id,
                    contender.remaining()
                );
                TickDecision::Preempt
            }
            _ => TickDecision::Continue,
        }
    }

    fn name(&self) -> &'static str {
        "SRTN"
    }
}
