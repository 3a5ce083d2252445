use anyhow::{Context, Result};
use clap::Parser;

use htcondor_apid::{build_translator, load_service_config, logger, server};

#[derive(Parser)]
#[command(name = "htcondor-apid")]
#[command(about = "Read-only REST API for HTCondor jobs, history, status and configuration", long_about = None)]
#[command(version)]
struct Cli {
    /// Service configuration file (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on, overrides `bindAddress`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_service_config(cli.config.as_deref()).context("Failed to load service configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    logger::init(&config.logging);
    match &cli.config {
        Some(path) => log::info!("Configuration loaded from '{}'.", path),
        None => log::info!("No configuration file given, using defaults."),
    }

    let translator = build_translator(&config).context("Failed to set up the scheduler backend")?;

    server::serve(&config.bind_address, translator).await.context("Server failed")?;

    Ok(())
}
