pub mod codec;
pub mod reporter;
pub mod server;
pub mod sink;

pub use codec::{CodecError, RecordCodec, TelemetryRecord};
pub use reporter::{MonitorReporter, ReporterError, ReporterState, ReporterStats};
pub use server::CollectorServer;
pub use sink::{
    DEFAULT_MAX_CONSUMERS, ReadOutcome, SessionReport, SinkError, TelemetrySink, receive_exact,
};
