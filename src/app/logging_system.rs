use super::config::LogLevel;
use super::initialization::{InitializationError, LogDirective};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output layout of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    /// `RUST_LOG_FORMAT=json` selects JSON; anything else is compact text.
    pub fn from_env() -> Self {
        match std::env::var("RUST_LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

pub struct LoggingSystem {
    directives: Arc<RwLock<Vec<LogDirective>>>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Adds a `target=level` directive. Malformed directives are skipped
    /// with a warning on stderr, since tracing is not up yet.
    pub fn add_directive(&self, directive_str: &str) -> Result<(), InitializationError> {
        match LogDirective::parse(directive_str) {
            Ok(directive) => {
                self.directives.write().push(directive);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                eprintln!("Warning: {e}, skipping directive");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Quietens the runtime crates.
    pub fn add_default_directives(&self) {
        let mut directives = self.directives.write();
        for target in ["tokio", "mio", "runtime"] {
            directives.push(LogDirective::new(target, LogLevel::Warn));
        }
    }

    pub fn initialize_tracing(
        &self,
        default_level: LogLevel,
        format: LogFormat,
    ) -> Result<(), InitializationError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter = EnvFilter::try_new(&filter_string).map_err(|e| {
            InitializationError::LoggingInitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Box::new(e),
            }
        })?;

        let result = match format {
            LogFormat::Json => tracing::subscriber::set_global_default(
                tracing_subscriber::registry().with(env_filter).with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(true)
                        .with_thread_names(true),
                ),
            ),
            LogFormat::Compact => tracing::subscriber::set_global_default(
                tracing_subscriber::registry().with(env_filter).with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .compact(),
                ),
            ),
        };

        result.map_err(|e| InitializationError::LoggingInitFailed {
            details: "Failed to set global tracing subscriber".to_string(),
            source: Box::new(e),
        })
    }

    /// The default level first, then each directive in insertion order.
    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default_level.as_str().to_string());
        filter_parts.extend(directives.iter().map(LogDirective::to_filter_string));
        filter_parts.join(",")
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the global subscriber once per process. Later calls return the
/// outcome of the first one.
pub fn setup_logging_safe(level: LogLevel) -> Result<(), InitializationError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    let outcome = INIT.get_or_init(|| {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives();
        if let Ok(extra) = std::env::var("RUST_LOG") {
            for directive in extra.split(',').filter(|d| d.contains('=')) {
                logging_system
                    .add_directive(directive)
                    .map_err(|e| e.to_string())?;
            }
        }
        logging_system
            .initialize_tracing(level, LogFormat::from_env())
            .map_err(|e| e.to_string())
    });

    outcome
        .clone()
        .map_err(|details| InitializationError::LoggingInitFailed {
            details,
            source: Box::new(std::io::Error::other("logging initialization error")),
        })
}
