use super::codec::{CodecError, RecordCodec, encode_handshake};
use crate::buffer::BoundedBuffer;
use crate::domain::Snapshot;
use bytes::BytesMut;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum ReporterError {
    #[error("Failed to connect to collector at {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Connecting to collector at {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },
    #[error("Failed to send handshake: {0}")]
    Handshake(#[source] std::io::Error),
    #[error("Failed to send record {record}: {source}")]
    Send {
        record: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to close telemetry connection: {0}")]
    Close(#[source] std::io::Error),
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterState {
    Connecting,
    Streaming,
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct ReporterStats {
    pub records_sent: u64,
    pub bytes_sent: u64,
    pub last_record: Option<Snapshot>,
    pub streaming_time: Duration,
}

/// Periodically samples the buffer and streams fixed-layout records to a
/// collector.
///
/// Lifecycle: `connect`/`handshake` (Connecting) → `stream` (Streaming) →
/// Closed. `stream` consumes the reporter, so the transport is released on
/// every exit path.
pub struct MonitorReporter<W> {
    buffer: Arc<BoundedBuffer>,
    transport: W,
    codec: RecordCodec,
    interval: Duration,
    state: ReporterState,
    stats: ReporterStats,
}

impl MonitorReporter<TcpStream> {
    /// Opens a TCP connection to the collector and sends the handshake.
    pub async fn connect(
        buffer: Arc<BoundedBuffer>,
        address: &str,
        report_interval: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ReporterError> {
        debug!(address, "Connecting to telemetry collector");
        let stream = timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ReporterError::ConnectTimeout {
                address: address.to_string(),
                timeout: connect_timeout,
            })?
            .map_err(|source| ReporterError::Connect {
                address: address.to_string(),
                source,
            })?;
        // Records are small and periodic; send each one right away.
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }
        info!(address, "Connected to telemetry collector");

        Self::handshake(buffer, stream, report_interval).await
    }
}

impl<W> MonitorReporter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Sends the consumer count over an already established transport.
    pub async fn handshake(
        buffer: Arc<BoundedBuffer>,
        mut transport: W,
        report_interval: Duration,
    ) -> Result<Self, ReporterError> {
        let consumers = buffer.consumers();
        let mut frame = BytesMut::new();
        encode_handshake(consumers, &mut frame);
        transport
            .write_all(&frame)
            .await
            .map_err(ReporterError::Handshake)?;
        transport.flush().await.map_err(ReporterError::Handshake)?;

        let mut reporter = Self {
            buffer,
            transport,
            codec: RecordCodec::new(consumers),
            interval: report_interval,
            state: ReporterState::Connecting,
            stats: ReporterStats::default(),
        };
        reporter.stats.bytes_sent += frame.len() as u64;
        reporter.transition(ReporterState::Streaming);
        Ok(reporter)
    }

    pub fn state(&self) -> ReporterState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reports until the pipeline reaches its terminal state, then closes.
    ///
    /// A snapshot is taken immediately and then once per interval. The
    /// terminal snapshot itself is not sent; the collector sees the stream
    /// end instead.
    pub async fn stream(mut self) -> Result<ReporterStats, ReporterError> {
        let started = Instant::now();
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut frame = BytesMut::with_capacity(self.codec.record_len());

        loop {
            ticker.tick().await;

            let snapshot = self.buffer.snapshot();
            if snapshot.is_terminal() {
                debug!(
                    items_produced = snapshot.items_produced,
                    "Pipeline reached terminal state"
                );
                break;
            }

            frame.clear();
            self.codec.encode(&snapshot, &mut frame)?;
            if let Err(source) = self.send(&frame).await {
                error!(record = self.stats.records_sent + 1, "Telemetry send failed: {}", source);
                self.transition(ReporterState::Closed);
                return Err(ReporterError::Send {
                    record: self.stats.records_sent + 1,
                    source,
                });
            }

            debug!(
                queue_length = snapshot.queue_length,
                items_produced = snapshot.items_produced,
                consumed = ?snapshot.consumed,
                "Telemetry record sent"
            );
            self.stats.records_sent += 1;
            self.stats.bytes_sent += frame.len() as u64;
            self.stats.last_record = Some(snapshot);
        }

        self.transition(ReporterState::Closed);
        self.transport
            .shutdown()
            .await
            .map_err(ReporterError::Close)?;
        self.stats.streaming_time = started.elapsed();

        info!(
            records = self.stats.records_sent,
            bytes = self.stats.bytes_sent,
            "Telemetry stream closed"
        );
        Ok(self.stats)
    }

    async fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.transport.write_all(frame).await?;
        self.transport.flush().await
    }

    fn transition(&mut self, next: ReporterState) {
        debug!(from = ?self.state, to = ?next, "Reporter state change");
        self.state = next;
    }
}
