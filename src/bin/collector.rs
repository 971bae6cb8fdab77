use anyhow::Context;
use clap::Parser;
use prodcons_monitor::app::{CollectorConfig, cancel_on_signal, setup_logging_safe};
use prodcons_monitor::telemetry::{CollectorServer, TelemetrySink};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CollectorConfig::parse();
    config.validate().context("invalid collector configuration")?;
    setup_logging_safe(config.log_level)?;

    let server = CollectorServer::bind(
        &config.listen_addr,
        TelemetrySink::new(config.max_consumers),
    )
    .await?;
    info!(
        address = %server.local_addr()?,
        max_consumers = config.max_consumers,
        "Starting prodcons-collector v{}",
        prodcons_monitor::VERSION
    );

    let sessions = server.serve(cancel_on_signal()).await?;
    info!(sessions, "Server shutdown complete");
    Ok(())
}
