/*
 * Simulation Configuration
 *
 * Run parameters shared by the command line driver and the simulation:
 * policy selection, round-robin quantum, memory pool geometry, tick pacing,
 * output location and the event echo mask.
 *
 * Everything here is validated once, before the first tick; a run never
 * starts with a configuration the engine cannot honour.
 */

use core::fmt;
use core::str::FromStr;
use std::path::PathBuf;
use std::time::Duration;

use crate::memory::{DEFAULT_MIN_UNIT, DEFAULT_POOL_SIZE};
use crate::scheduler::{EventClass, TimeSliceTicks};

/// Scheduling algorithm selected for a run
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PolicyKind {
    /// Highest Priority First (non-preemptive)
    Hpf,
    /// Shortest Remaining Time Next
    Srtn,
    /// Round robin with a fixed quantum
    RoundRobin,
}

impl PolicyKind {
    pub fn needs_quantum(self) -> bool {
        self == PolicyKind::RoundRobin
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    /// Accepts `hpf`, `srtn`, `rr` in any case and the numeric ids 0, 1, 2
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hpf" | "0" => Ok(PolicyKind::Hpf),
            "srtn" | "1" => Ok(PolicyKind::Srtn),
            "rr" | "round-robin" | "2" => Ok(PolicyKind::RoundRobin),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Hpf => write!(f, "hpf"),
            PolicyKind::Srtn => write!(f, "srtn"),
            PolicyKind::RoundRobin => write!(f, "rr"),
        }
    }
}

/// Configuration errors, all fatal at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPolicy(String),
    PoolNotPowerOfTwo(usize),
    MinUnitNotPowerOfTwo(usize),
    MinUnitExceedsPool,
    ZeroQuantum,
    MissingQuantum,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPolicy(name) => {
                write!(f, "Unknown scheduling policy '{}' (expected hpf, srtn or rr)", name)
            }
            ConfigError::PoolNotPowerOfTwo(size) => {
                write!(f, "Pool size {} is not a power of two", size)
            }
            ConfigError::MinUnitNotPowerOfTwo(size) => {
                write!(f, "Minimum unit {} is not a power of two", size)
            }
            ConfigError::MinUnitExceedsPool => write!(f, "Minimum unit is larger than the pool"),
            ConfigError::ZeroQuantum => write!(f, "Round-robin quantum must be at least 1"),
            ConfigError::MissingQuantum => write!(f, "Round-robin requires a quantum"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parameters of one simulation run
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub policy: PolicyKind,
    /// Round-robin quantum; ignored by the other policies
    pub quantum: Option<TimeSliceTicks>,
    /// Memory pool size in bytes
    pub pool_size: usize,
    /// Smallest block the allocator hands out
    pub min_unit: usize,
    /// Wall-clock pause per tick; `None` runs as fast as possible
    pub tick_duration: Option<Duration>,
    /// Directory receiving scheduler.log, memory.log and scheduler.perf
    pub output_dir: PathBuf,
    /// Events echoed through the logger
    pub trace: EventClass,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Hpf,
            quantum: None,
            pool_size: DEFAULT_POOL_SIZE,
            min_unit: DEFAULT_MIN_UNIT,
            tick_duration: None,
            output_dir: PathBuf::from("."),
            trace: EventClass::empty(),
        }
    }
}

impl SimConfig {
    /// Default configuration for `policy`
    pub fn new(policy: PolicyKind) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Set the round-robin quantum
    pub fn with_quantum(mut self, quantum: u32) -> Self {
        self.quantum = Some(TimeSliceTicks(quantum));
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pool_size.is_power_of_two() {
            return Err(ConfigError::PoolNotPowerOfTwo(self.pool_size));
        }
        if !self.min_unit.is_power_of_two() {
            return Err(ConfigError::MinUnitNotPowerOfTwo(self.min_unit));
        }
        if self.min_unit > self.pool_size {
            return Err(ConfigError::MinUnitExceedsPool);
        }
        if self.policy.needs_quantum() {
            match self.quantum {
                None => return Err(ConfigError::MissingQuantum),
                Some(TimeSliceTicks(0)) => return Err(ConfigError::ZeroQuantum),
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names_and_ids() {
        assert_eq!("HPF".parse::<PolicyKind>(), Ok(PolicyKind::Hpf));
        assert_eq!("srtn".parse::<PolicyKind>(), Ok(PolicyKind::Srtn));
        assert_eq!("rr".parse::<PolicyKind>(), Ok(PolicyKind::RoundRobin));
        assert_eq!("0".parse::<PolicyKind>(), Ok(PolicyKind::Hpf));
        assert_eq!("2".parse::<PolicyKind>(), Ok(PolicyKind::RoundRobin));
        assert_eq!(
            "3".parse::<PolicyKind>(),
            Err(ConfigError::InvalidPolicy("3".to_string()))
        );
        assert_eq!(PolicyKind::RoundRobin.to_string(), "rr");
    }

    #[test]
    fn test_default_is_valid() {
        let config = SimConfig::default();
        assert_eq!(config.pool_size, 1024);
        assert_eq!(config.min_unit, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut config = SimConfig::default();
        config.pool_size = 1000;
        assert_eq!(config.validate(), Err(ConfigError::PoolNotPowerOfTwo(1000)));

        config.pool_size = 64;
        config.min_unit = 12;
        assert_eq!(config.validate(), Err(ConfigError::MinUnitNotPowerOfTwo(12)));

        config.min_unit = 128;
        assert_eq!(config.validate(), Err(ConfigError::MinUnitExceedsPool));
    }

    #[test]
    fn test_round_robin_needs_positive_quantum() {
        let config = SimConfig::new(PolicyKind::RoundRobin);
        assert_eq!(config.validate(), Err(ConfigError::MissingQuantum));
        assert_eq!(config.clone().with_quantum(0).validate(), Err(ConfigError::ZeroQuantum));
        assert!(config.with_quantum(2).validate().is_ok());

        // Quantum is irrelevant to the other policies
        assert!(SimConfig::new(PolicyKind::Srtn).validate().is_ok());
    }
}
