use crate::app::{ConfigError, InitializationError};
use crate::buffer::BufferError;
use crate::telemetry::ReporterError;
use thiserror::Error;

/// Top-level error type for a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] InitializationError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] ReporterError),

    #[error("{role} worker panicked: {details}")]
    WorkerPanicked { role: String, details: String },
}
