use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Route tracing output to `path`; the terminal belongs to the UI.
///
/// `TASKDECK_LOG` takes an `EnvFilter` directive. The returned guard flushes
/// the writer on drop and must live until exit.
pub fn init(path: &Path) -> Result<WorkerGuard> {
  let dir = path
    .parent()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;

  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(dir, file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("TASKDECK_LOG")
    .unwrap_or_else(|_| EnvFilter::new("taskdeck=info"));

  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialise logging: {}", e))?;

  tracing::info!(path = %path.display(), "logging initialised");
  Ok(guard)
}
