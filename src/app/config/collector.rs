use super::{ConfigError, LogLevel};
use crate::telemetry::DEFAULT_MAX_CONSUMERS;
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9700";

/// Settings for the telemetry collector binary.
#[derive(Parser, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(author, version, about = "Receives and logs pipeline telemetry", long_about = None)]
#[serde(default)]
pub struct CollectorConfig {
    /// Address to listen on (host:port)
    #[arg(long, env = "LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Largest consumer count accepted in a handshake
    #[arg(long, env = "MAX_CONSUMERS", default_value_t = DEFAULT_MAX_CONSUMERS)]
    pub max_consumers: u32,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_consumers: DEFAULT_MAX_CONSUMERS,
            log_level: LogLevel::Info,
        }
    }
}

impl CollectorConfig {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = CollectorConfig::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
