/*
 * Simulation Clock
 *
 * This module provides the discrete global clock the simulation runs on.
 * Time is a plain tick counter starting at 0 and advancing by exactly one;
 * every state change of a run happens "at" some tick.
 *
 * SimClock can optionally pace itself against the wall clock (a fixed
 * sleep per tick) so a run can be watched live with tracing enabled.
 * Without pacing, ticks are as fast as the scheduler can decide them.
 */

use std::time::Duration;

use crate::scheduler::Tick;

/// Source of simulated time
pub trait Clock {
    /// Current tick
    fn current_tick(&self) -> Tick;

    /// Advance to the next tick and return it
    fn await_next_tick(&mut self) -> Tick;
}

/// Tick counter with optional wall-clock pacing
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    tick: Tick,
    pace: Option<Duration>,
}

impl SimClock {
    /// A clock at tick 0 that advances without sleeping
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock at tick 0 that sleeps `pace` before every advance
    pub fn paced(pace: Duration) -> Self {
        Self {
            tick: 0,
            pace: Some(pace),
        }
    }

    pub fn pace(&self) -> Option<Duration> {
        self.pace
    }
}

impl Clock for SimClock {
    fn current_tick(&self) -> Tick {
        self.tick
    }

    fn await_next_tick(&mut self) -> Tick {
        if let Some(pace) = self.pace {
            std::thread::sleep(pace);
        }
        self.tick += 1;

        // Log every 100 ticks so long paced runs show progress
        if self.tick % 100 == 0 {
            log::debug!("Clock tick: {}", self.tick);
        }
        self.tick
    }
}
