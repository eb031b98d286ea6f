//! casedesk - administration console entry point

use anyhow::Context;
use casedesk::{cli::Cli, commands::Console, config::Config, logging};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    config.apply_overrides(cli.base_url.as_deref());

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let logging_guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "Starting casedesk"
    );

    let mut console = Console::new(config, &cli);
    let result = console.run(cli.command).await;

    if let Err(e) = result {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("Error: {}", e.display_message());
        drop(logging_guard);
        std::process::exit(1);
    }

    Ok(())
}
