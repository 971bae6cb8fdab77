pub mod config;
pub mod initialization;
pub mod logging_system;
pub mod shutdown;

pub use config::{CollectorConfig, Config, ConfigError, LogLevel};
pub use initialization::InitializationError;
pub use logging_system::{LogFormat, LoggingSystem, setup_logging_safe};
pub use shutdown::{cancel_on_signal, shutdown_signal};

use crate::domain::PipelineError;
use crate::pipeline::{PipelineRunner, RunSummary};
use crate::telemetry::MonitorReporter;
use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

/// One pipeline run with a telemetry reporter attached.
pub struct App {
    config: Config,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args(args)?;
        Self::from_config(config)
    }

    /// A config file, when named, replaces the CLI/env values wholesale.
    pub fn from_config(config: Config) -> Result<Self, PipelineError> {
        let mut config = match &config.config_file {
            Some(path) => Config::from_file(path)?,
            None => config,
        };
        config.post_process()?;
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Allocates the buffer, connects to the collector, then runs producer,
    /// consumers and reporter to the terminal state.
    ///
    /// Nothing is spawned if allocation or the connection fails.
    pub async fn run(self) -> Result<RunSummary, PipelineError> {
        let runner = PipelineRunner::new(self.config.pipeline_settings())?;

        let reporter = MonitorReporter::connect(
            Arc::clone(runner.buffer()),
            &self.config.collector_addr,
            self.config.report_interval,
            self.config.connect_timeout,
        )
        .await?;

        runner.run_with_reporter(reporter).await
    }
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Entry point of the `prodcons-monitor` binary. Exits with status 1 on any
/// failure.
pub async fn main() {
    // clap handles --help/--version and usage errors itself.
    let config = Config::parse();

    let app = match App::from_config(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = setup_logging_safe(app.config().log_level) {
        eprintln!("{e}");
        process::exit(1);
    }

    info!("Starting prodcons-monitor v{}", get_version());
    info!(
        consumers = app.config().consumers,
        collector = %app.config().collector_addr,
        capacity = app.config().buffer_capacity,
        items = app.config().items,
        "Configuration loaded"
    );

    match app.run().await {
        Ok(summary) => {
            info!(
                items = summary.items_produced,
                records = summary.telemetry.as_ref().map_or(0, |t| t.records_sent),
                "All items consumed"
            );
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            // Workers may still be blocked on the buffer; do not wait for them.
            process::exit(1);
        }
    }
}
