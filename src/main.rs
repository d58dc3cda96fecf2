mod api;
mod app;
mod commands;
mod config;
mod context;
mod event;
mod logging;
mod query;
mod router;
mod ui;

use api::{HttpClient, TaskApi};
use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(about = "A terminal UI for managing users and background tasks")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./taskdeck.yaml, then $XDG_CONFIG_HOME/taskdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base url, overrides config and TASKDECK_API_URL
  #[arg(long)]
  api_url: Option<String>,

  /// Screen to open first, e.g. /tasks or /users/3
  #[arg(short, long, default_value = "/")]
  route: String,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.url = url;
  }

  let log_path = match &config.log_file {
    Some(path) => path.clone(),
    None => config::Config::default_log_path()?,
  };
  let _log_guard = logging::init(&log_path)?;
  tracing::info!(api = %config.api.url, "starting taskdeck");

  let api: Arc<dyn TaskApi> = Arc::new(HttpClient::new(&config.api)?);
  let ctx = context::Context::new(api, &config);

  // Initialize and run the app
  let start = router::Route::parse(&args.route);
  let mut app = app::App::new(ctx, &config, start);
  app.run().await?;

  Ok(())
}
