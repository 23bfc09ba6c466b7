use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "radial-snap.log";

/// Default log directory under the user's local data folder
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("radial-snap"))
}

/// Initialise logging. Without `debug` the level is fixed at `info`; with it,
/// `RUST_LOG` may override the default `debug` level.
///
/// Output goes to stderr and, when `log_dir` can be created, is appended to
/// a file there as well. Returns the log file path in use.
pub fn init(debug: bool, log_dir: Option<&Path>) -> Option<PathBuf> {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let file = log_dir.and_then(|dir| open_log_file(dir).map(|file| (dir.join(LOG_FILE), file)));
    let (path, file_layer) = match file {
        Some((path, file)) => (
            Some(path),
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_thread_names(true)
                    .with_writer(Mutex::new(file)),
            ),
        ),
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(file_layer)
        .try_init();

    path
}

fn open_log_file(dir: &Path) -> Option<File> {
    fs::create_dir_all(dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
        .ok()
}
