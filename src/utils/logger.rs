/*
 * Simulator Logging System
 *
 * This module implements the diagnostic logger of the simulator.
 * It plugs into the `log` facade and prints `[LEVEL] message` lines to
 * stderr, leaving stdout free for the report.
 *
 * Event logs (scheduler.log, memory.log) are not written through here; they
 * have their own writers in utils::writer. Events selected by the trace mask
 * are additionally echoed through this logger at info level.
 */

use log::{LevelFilter, Metadata, Record, SetLoggerError};

/// Custom logger implementation for the simulator.
struct SimLogger;

impl log::Log for SimLogger {
    /// Checks if the given log level is enabled.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    /// Logs the record by printing it to stderr.
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    /// Flushes the logger (no-op, stderr is unbuffered).
    fn flush(&self) {}
}

/// The SimLogger instance used for logging.
static LOGGER: SimLogger = SimLogger;

/// Map the number of `-v` flags to a level filter
///
/// Warnings are always shown; each flag adds one level.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the logger and sets the maximum level.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger was already installed in this
/// process.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}
