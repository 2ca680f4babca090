use anyhow::Context;
use clap::Parser;
use history_ingestor::{
    HistoryClient,
    cli::{commands::Cli, run},
    config::load_config_path,
    source::bridge::BridgeSource,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let source = BridgeSource::from_config(config.bridge.as_ref())?;
    let client = HistoryClient::from_config(source, config).await?;
    if let Some(mode) = cli.mode.as_deref() {
        client.set_mode(mode).await?;
    }

    let result = run(&client, cli.command).await;
    client.shutdown().await;
    result
}
