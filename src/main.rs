mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod logging;
mod mutation;
mod query;
mod router;
#[cfg(test)]
mod testing;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(about = "A terminal UI for managing student records over a JSON API")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./rollcall.yaml, then $XDG_CONFIG_HOME/rollcall/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overrides the config file and ROLLCALL_API_URL
  #[arg(short = 'u', long)]
  base_url: Option<String>,

  /// Initial route, e.g. /students?page=2 or /students/7
  #[arg(short, long, default_value = "/students")]
  route: String,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Held until exit so buffered log lines get flushed
  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }
  config.validate()?;

  // Initialize and run the app
  let route = router::Route::parse(&args.route);
  let mut app = app::App::new(&config, route)?;
  app.run().await?;

  Ok(())
}
