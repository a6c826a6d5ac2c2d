// Structured logger setup: DEBUG/INFO/ERROR lines on stderr with a unix timestamp.
// Everything else logs through the `log` macros.

use log::LevelFilter;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

// Install the global logger. `--debug` lowers the threshold to DEBUG;
// RUST_LOG, when set, refines the filter further.
pub fn init(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // A second init (tests, embedding) keeps the first logger.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(buf, "[{}] {} {}", record.level(), unix_secs(), record.args())
        })
        .try_init();
}

// Returns true if debug logging is enabled.
pub fn is_debug() -> bool {
    log::log_enabled!(log::Level::Debug)
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
