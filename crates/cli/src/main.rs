use clap::Parser;
use ledgerprep_config::ConfigLoader;
use std::path::PathBuf;

mod commands;
mod context;

use commands::Commands;

#[derive(Parser)]
#[command(name = "ledgerprep")]
#[command(about = "Stage verified artifacts for ledger train/test tasks", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (overrides LEDGERPREP_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    ledgerprep_utils::logging::init().map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config {
        loader = loader.file(path);
    }
    let (config, sources) = loader.load()?;
    tracing::debug!(?sources, "Configuration sources");

    cli.command.execute(config).await
}
