/// Log setup.
///
/// The terminal is in raw mode on the alternate screen while the game runs,
/// so log lines go to a file instead of stderr:
///   - path: `$WALLHOP_LOG`, else `wallhop.log` in the working directory
///   - filter: `$RUST_LOG`, else `wallhop=info`

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_PATH_ENV: &str = "WALLHOP_LOG";
const DEFAULT_LOG_FILE: &str = "wallhop.log";
const DEFAULT_FILTER: &str = "wallhop=info";

pub fn log_path() -> PathBuf {
    std::env::var_os(LOG_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Install the global subscriber. Returns the log file path, or `None` if
/// the file could not be opened (logging is then disabled).
pub fn init() -> Option<PathBuf> {
    let path = log_path();
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            return None;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .ok()?;

    Some(path)
}
