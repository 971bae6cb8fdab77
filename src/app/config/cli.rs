use super::env_helpers::{load_env_path_opt, load_env_string, load_env_var};
use super::{ConfigError, LogLevel};
use crate::pipeline::PipelineSettings;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_COLLECTOR_ADDR: &str = "127.0.0.1:9700";

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about = "Bounded-buffer producer/consumer pipeline with telemetry", long_about = None)]
#[serde(default)]
pub struct Config {
    /// Number of consumer threads
    #[arg(long, env = "CONSUMERS", default_value = "3")]
    pub consumers: u32,

    /// Telemetry collector address (host:port)
    #[arg(long, env = "COLLECTOR_ADDR", default_value = DEFAULT_COLLECTOR_ADDR)]
    pub collector_addr: String,

    /// Seconds between telemetry records
    #[arg(long, env = "REPORT_INTERVAL_SECS", default_value = "1")]
    pub report_interval_secs: u64,

    /// Ring buffer slots (one is always kept free)
    #[arg(long, env = "BUFFER_CAPACITY", default_value = "10")]
    pub buffer_capacity: usize,

    /// Number of items the producer generates
    #[arg(long, env = "ITEMS", default_value = "1024")]
    pub items: u32,

    /// Upper bound of the random pause before each produced item, in microseconds
    #[arg(long, env = "PRODUCER_MAX_DELAY_US", default_value = "50")]
    pub producer_max_delay_us: u64,

    /// Upper bound of the random pause after each consumed item, in microseconds
    #[arg(long, env = "CONSUMER_MAX_DELAY_US", default_value = "1000000")]
    pub consumer_max_delay_us: u64,

    /// Collector connection timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "5")]
    pub connect_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub report_interval: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub producer_max_delay: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub consumer_max_delay: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumers: 3,
            collector_addr: DEFAULT_COLLECTOR_ADDR.to_string(),
            report_interval_secs: 1,
            buffer_capacity: 10,
            items: 1024,
            producer_max_delay_us: 50,
            consumer_max_delay_us: 1_000_000,
            connect_timeout_secs: 5,
            log_level: LogLevel::Info,
            config_file: None,
            report_interval: Duration::from_secs(1),
            producer_max_delay: Duration::from_micros(50),
            consumer_max_delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Parses CLI arguments; clap falls back to the environment for unset flags.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        load_env_var("CONSUMERS", &mut config.consumers)?;
        load_env_string("COLLECTOR_ADDR", &mut config.collector_addr);
        load_env_var("REPORT_INTERVAL_SECS", &mut config.report_interval_secs)?;
        load_env_var("BUFFER_CAPACITY", &mut config.buffer_capacity)?;
        load_env_var("ITEMS", &mut config.items)?;
        load_env_var("PRODUCER_MAX_DELAY_US", &mut config.producer_max_delay_us)?;
        load_env_var("CONSUMER_MAX_DELAY_US", &mut config.consumer_max_delay_us)?;
        load_env_var("CONNECT_TIMEOUT_SECS", &mut config.connect_timeout_secs)?;
        load_env_var("LOG_LEVEL", &mut config.log_level)?;
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file; keys that are absent keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.report_interval = Duration::from_secs(self.report_interval_secs);
        self.producer_max_delay = Duration::from_micros(self.producer_max_delay_us);
        self.consumer_max_delay = Duration::from_micros(self.consumer_max_delay_us);
        self.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            buffer_capacity: self.buffer_capacity,
            items: self.items,
            consumers: self.consumers,
            producer_max_delay: self.producer_max_delay,
            consumer_max_delay: self.consumer_max_delay,
        }
    }
}
