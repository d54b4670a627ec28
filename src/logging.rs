use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `rollcall=debug`
pub const LOG_ENV: &str = "ROLLCALL_LOG";

const LOG_FILE: &str = "rollcall.log";

/// `$XDG_DATA_HOME/rollcall`, falling back to the working directory
pub fn log_dir() -> PathBuf {
  dirs::data_dir()
    .map(|dir| dir.join("rollcall"))
    .unwrap_or_else(|| PathBuf::from("."))
}

/// Install a global subscriber writing to the log file.
///
/// The terminal belongs to the UI, so nothing is logged to stdout/stderr.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir();
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, LOG_FILE));

  let env_filter = EnvFilter::builder()
    .with_default_directive(tracing::Level::INFO.into())
    .with_env_var(LOG_ENV)
    .from_env_lossy();

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
    .try_init()
    .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

  Ok(guard)
}
