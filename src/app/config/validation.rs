use super::{CollectorConfig, Config, ConfigError};
use crate::buffer::MIN_CAPACITY;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_address(&self.collector_addr)?;

        if self.buffer_capacity < MIN_CAPACITY {
            return Err(ConfigError::InvalidConfig(format!(
                "Buffer capacity ({}) must be at least {MIN_CAPACITY}; one slot is always kept free",
                self.buffer_capacity
            )));
        }
        if u32::try_from(self.buffer_capacity).is_err() {
            return Err(ConfigError::InvalidConfig(format!(
                "Buffer capacity ({}) does not fit the 32-bit queue length field",
                self.buffer_capacity
            )));
        }

        if self.consumers == 0 {
            return Err(ConfigError::InvalidConfig(
                "Consumer count must be greater than 0".to_string(),
            ));
        }

        if self.items == 0 {
            return Err(ConfigError::InvalidConfig(
                "Item count must be greater than 0".to_string(),
            ));
        }

        if self.report_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Report interval must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl CollectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_address(&self.listen_addr)?;
        if self.max_consumers == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max consumers must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Checks that `address` has the `host:port` shape with a non-zero port.
/// Host names are not resolved here.
pub fn validate_address(address: &str) -> Result<(), ConfigError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ConfigError::InvalidAddress(format!("'{address}' is missing a port")))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ConfigError::InvalidAddress(format!(
            "'{address}' is missing a host"
        )));
    }

    match port.parse::<u16>() {
        Ok(0) => Err(ConfigError::InvalidAddress(format!(
            "'{address}' uses port 0"
        ))),
        Ok(_) => Ok(()),
        Err(e) => Err(ConfigError::InvalidAddress(format!(
            "'{address}' has an invalid port: {e}"
        ))),
    }
}
