use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{CardError, Result};
use crate::settings::Settings;

/// Route tracing output to a log file. The terminal belongs to the card, so
/// nothing is ever written to stdout/stderr while it runs.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(settings: &Settings) -> Result<PathBuf> {
    let path = settings.log_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .map_err(|e| {
            CardError::Settings(format!("invalid log level {:?}: {e}", settings.log_level))
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| CardError::Other(e.to_string()))?;

    Ok(path)
}
