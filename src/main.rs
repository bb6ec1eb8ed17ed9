mod commands;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::time::Duration;

use fogwatch::config::Config;
use fogwatch::game::{GameDataClient, Language};
use fogwatch::logging;

#[derive(Parser, Debug)]
#[command(name = "fogwatch")]
#[command(about = "Inspect and warm the game data cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/fogwatch/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Discord locale to request data in (e.g. en-US, de, pt-BR)
  #[arg(short, long)]
  locale: Option<String>,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.logging)?;

  // Command-line locale wins over the configured default
  let language = args
    .locale
    .as_deref()
    .map(Language::from_discord_locale)
    .unwrap_or_else(|| config.default_language());

  let client = GameDataClient::new(&config)?;
  let purge = (config.cache.purge_interval_secs > 0).then(|| {
    client
      .cache()
      .spawn_purge_task(Duration::from_secs(config.cache.purge_interval_secs))
  });

  let result = commands::run(args.command, &client, language, &config).await;

  if let Some(task) = purge {
    task.abort();
  }
  result
}
