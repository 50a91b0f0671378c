use std::env;

use log::{LevelFilter, Metadata, Record};

/// Writes records to stderr so that stdout stays free for game output.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} [{}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Level named by `BATTLESHIP_LOG`, or `fallback` when unset or invalid.
pub fn level_from_env(fallback: LevelFilter) -> LevelFilter {
    env::var("BATTLESHIP_LOG")
        .ok()
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(fallback)
}

/// Install the logger at the level from `BATTLESHIP_LOG` (default `info`).
/// Later calls keep the first logger.
pub fn init_logging() {
    let level = level_from_env(LevelFilter::Info);
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));
}
