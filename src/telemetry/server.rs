use super::codec::TelemetryRecord;
use super::sink::{SessionReport, SinkError, TelemetrySink};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// TCP front end for [`TelemetrySink`].
///
/// Reporter connections are served one at a time, in accept order.
pub struct CollectorServer {
    listener: TcpListener,
    sink: TelemetrySink,
}

impl CollectorServer {
    pub async fn bind(address: &str, sink: TelemetrySink) -> Result<Self, SinkError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| SinkError::Bind {
                address: address.to_string(),
                source,
            })?;
        Ok(Self { listener, sink })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SinkError> {
        self.listener.local_addr().map_err(SinkError::Accept)
    }

    /// Accepts one reporter and serves it until its stream ends.
    pub async fn accept_one<F>(&self, on_record: F) -> Result<SessionReport, SinkError>
    where
        F: FnMut(SocketAddr, &TelemetryRecord),
    {
        let mut on_record = on_record;
        let (stream, peer) = self.listener.accept().await.map_err(SinkError::Accept)?;
        info!(%peer, "Connection established");

        let report = self.sink.run(stream, |record| on_record(peer, record)).await;
        info!(%peer, "Connection terminated");
        report
    }

    /// Serves reporters until `shutdown` is cancelled. Returns the number of
    /// sessions that completed normally.
    ///
    /// A reporter that breaks the handshake only ends its own session.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<u64, SinkError> {
        info!(address = ?self.listener.local_addr().ok(), "Waiting for connections");
        let mut sessions = 0u64;

        loop {
            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.accept_one(log_record) => result,
            };

            match result {
                Ok(_) => sessions += 1,
                Err(SinkError::Accept(e)) => return Err(SinkError::Accept(e)),
                Err(e) => error!("Telemetry session failed: {}", e),
            }
        }

        info!(sessions, "Collector shutdown complete");
        Ok(sessions)
    }
}

fn log_record(peer: SocketAddr, record: &TelemetryRecord) {
    info!(
        %peer,
        queue_length = record.queue_length,
        items_produced = record.items_produced,
        consumed = ?record.consumed,
        "Telemetry record"
    );
}
