use super::codec::{CodecError, HANDSHAKE_LEN, RecordCodec, TelemetryRecord, decode_handshake};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

/// Largest handshake accepted unless configured otherwise.
pub const DEFAULT_MAX_CONSUMERS: u32 = 4096;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Connection closed before the handshake ({received} of 4 bytes)")]
    HandshakeMissing { received: usize },
    #[error("Failed to read handshake: {0}")]
    HandshakeIo(#[source] std::io::Error),
    #[error("Handshake announced {count} consumers, accepted range is 1..={max}")]
    InvalidConsumerCount { count: u32, max: u32 },
    #[error("Decoding error: {0}")]
    Codec(#[from] CodecError),
    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
}

/// Result of one read-until-full attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Filled,
    /// The peer closed the stream; `received` bytes of a partial frame were
    /// read and discarded.
    Closed { received: usize },
}

/// Fills `buf` completely, accumulating across short reads.
///
/// A zero-length read before `buf` is full means the peer closed the stream,
/// whether or not part of a frame had already arrived.
pub async fn receive_exact<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<ReadOutcome>
where
    R: AsyncRead + Unpin,
{
    let mut received = 0;
    while received < buf.len() {
        let n = reader.read(&mut buf[received..]).await?;
        if n == 0 {
            return Ok(ReadOutcome::Closed { received });
        }
        received += n;
    }
    Ok(ReadOutcome::Filled)
}

/// Summary of one reporter connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub consumers: u32,
    pub records: u64,
    pub last_record: Option<TelemetryRecord>,
}

/// Receiving side of the telemetry protocol.
#[derive(Debug, Clone, Copy)]
pub struct TelemetrySink {
    max_consumers: u32,
}

impl TelemetrySink {
    pub fn new(max_consumers: u32) -> Self {
        Self { max_consumers }
    }

    pub fn max_consumers(&self) -> u32 {
        self.max_consumers
    }

    /// Reads the handshake, then records until the stream ends.
    ///
    /// End of stream (a zero read, a partial record, or a read error once
    /// records are flowing) terminates the session normally. Only a missing or
    /// invalid handshake is an error.
    pub async fn run<R, F>(&self, mut reader: R, mut on_record: F) -> Result<SessionReport, SinkError>
    where
        R: AsyncRead + Unpin,
        F: FnMut(&TelemetryRecord),
    {
        let mut handshake = [0u8; HANDSHAKE_LEN];
        match receive_exact(&mut reader, &mut handshake)
            .await
            .map_err(SinkError::HandshakeIo)?
        {
            ReadOutcome::Filled => {}
            ReadOutcome::Closed { received } => {
                return Err(SinkError::HandshakeMissing { received });
            }
        }

        let consumers = decode_handshake(&handshake)?;
        if consumers == 0 || consumers > self.max_consumers {
            return Err(SinkError::InvalidConsumerCount {
                count: consumers,
                max: self.max_consumers,
            });
        }
        info!(consumers, "Received consumer count");

        let codec = RecordCodec::new(consumers);
        let mut frame = vec![0u8; codec.record_len()];
        let mut report = SessionReport {
            consumers,
            ..SessionReport::default()
        };

        loop {
            match receive_exact(&mut reader, &mut frame).await {
                Ok(ReadOutcome::Filled) => {}
                Ok(ReadOutcome::Closed { received }) => {
                    if received > 0 {
                        debug!(received, "Discarding partial record at end of stream");
                    }
                    break;
                }
                Err(e) => {
                    warn!("Telemetry stream ended with read error: {}", e);
                    break;
                }
            }

            let record = codec.decode(&frame)?;
            on_record(&record);
            report.records += 1;
            report.last_record = Some(record);
        }

        info!(records = report.records, "No more records, telemetry session ended");
        Ok(report)
    }
}

impl Default for TelemetrySink {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONSUMERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn frame(fields: &[u32]) -> Vec<u8> {
        fields.iter().flat_map(|f| f.to_be_bytes()).collect()
    }

    #[tokio::test]
    async fn test_receive_exact_accumulates_short_reads() {
        let mut reader = tokio_test::io::Builder::new()
            .read(&[0, 0])
            .wait(Duration::from_millis(5))
            .read(&[0, 7, 1])
            .read(&[2, 3])
            .build();
        let mut buf = [0u8; 7];
        let outcome = receive_exact(&mut reader, &mut buf).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Filled);
        assert_eq!(buf, [0, 0, 0, 7, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_receive_exact_reports_close_with_pending_bytes() {
        let mut reader: &[u8] = &[1, 2, 3];
        let mut buf = [0u8; 4];
        let outcome = receive_exact(&mut reader, &mut buf).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Closed { received: 3 });

        let mut empty: &[u8] = &[];
        let outcome = receive_exact(&mut empty, &mut buf).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Closed { received: 0 });
    }

    #[tokio::test]
    async fn test_session_reads_records_until_close() {
        let mut bytes = frame(&[2]);
        bytes.extend(frame(&[3, 5, 1, 1]));
        bytes.extend(frame(&[1, 9, 4, 4]));
        // Trailing partial record is dropped.
        bytes.extend(&[0, 0]);

        let mut seen = Vec::new();
        let report = TelemetrySink::default()
            .run(bytes.as_slice(), |record| seen.push(record.items_produced))
            .await
            .unwrap();

        assert_eq!(report.consumers, 2);
        assert_eq!(report.records, 2);
        assert_eq!(seen, vec![5, 9]);
        assert_eq!(report.last_record.unwrap().consumed, vec![4, 4]);
    }

    #[tokio::test]
    async fn test_missing_handshake_is_an_error() {
        let err = TelemetrySink::default()
            .run(&[0u8, 0][..], |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::HandshakeMissing { received: 2 }));
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_consumer_count() {
        let sink = TelemetrySink::new(8);
        let zero = frame(&[0]);
        assert!(matches!(
            sink.run(zero.as_slice(), |_| {}).await,
            Err(SinkError::InvalidConsumerCount { count: 0, max: 8 })
        ));
        let huge = frame(&[9]);
        assert!(matches!(
            sink.run(huge.as_slice(), |_| {}).await,
            Err(SinkError::InvalidConsumerCount { count: 9, max: 8 })
        ));
    }

    #[tokio::test]
    async fn test_records_split_across_writes() {
        let (mut writer, reader) = tokio::io::duplex(4);
        let sink = tokio::spawn(async move {
            TelemetrySink::default().run(reader, |_| {}).await
        });

        let mut bytes = frame(&[1]);
        bytes.extend(frame(&[0, 1, 1]));
        for chunk in bytes.chunks(3) {
            writer.write_all(chunk).await.unwrap();
        }
        drop(writer);

        let report = sink.await.unwrap().unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.last_record.unwrap().items_produced, 1);
    }
}
