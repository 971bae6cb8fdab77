// Wire layout of the telemetry stream.
//
// Every field is a 32-bit unsigned integer in network byte order:
//   handshake: [consumers]
//   record:    [queue_length, items_produced, consumed_1 .. consumed_K]

use crate::domain::Snapshot;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FIELD_SIZE: usize = 4;
pub const HANDSHAKE_LEN: usize = FIELD_SIZE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Record length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Snapshot has {actual} consumer counters, stream was negotiated for {expected}")]
    ConsumerCountMismatch { expected: u32, actual: usize },
}

/// A decoded telemetry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub queue_length: u32,
    pub items_produced: u32,
    pub consumed: Vec<u32>,
}

impl TelemetryRecord {
    pub fn consumed_total(&self) -> u64 {
        self.consumed.iter().map(|&c| u64::from(c)).sum()
    }
}

impl From<&Snapshot> for TelemetryRecord {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            queue_length: snapshot.queue_length,
            items_produced: snapshot.items_produced,
            consumed: snapshot.consumed.clone(),
        }
    }
}

pub fn encode_handshake(consumers: u32, dst: &mut BytesMut) {
    dst.reserve(HANDSHAKE_LEN);
    dst.put_u32(consumers);
}

pub fn decode_handshake(mut src: &[u8]) -> Result<u32, CodecError> {
    if src.len() != HANDSHAKE_LEN {
        return Err(CodecError::LengthMismatch {
            expected: HANDSHAKE_LEN,
            actual: src.len(),
        });
    }
    Ok(src.get_u32())
}

/// Fixed-size record codec for one negotiated consumer count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCodec {
    consumers: u32,
}

impl RecordCodec {
    pub fn new(consumers: u32) -> Self {
        Self { consumers }
    }

    pub fn consumers(&self) -> u32 {
        self.consumers
    }

    /// `4 * (K + 2)` bytes.
    pub fn record_len(&self) -> usize {
        FIELD_SIZE * (self.consumers as usize + 2)
    }

    pub fn encode(&self, snapshot: &Snapshot, dst: &mut BytesMut) -> Result<(), CodecError> {
        if snapshot.consumed.len() != self.consumers as usize {
            return Err(CodecError::ConsumerCountMismatch {
                expected: self.consumers,
                actual: snapshot.consumed.len(),
            });
        }

        dst.reserve(self.record_len());
        dst.put_u32(snapshot.queue_length);
        dst.put_u32(snapshot.items_produced);
        for &count in &snapshot.consumed {
            dst.put_u32(count);
        }
        Ok(())
    }

    pub fn decode(&self, mut src: &[u8]) -> Result<TelemetryRecord, CodecError> {
        let expected = self.record_len();
        if src.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: src.len(),
            });
        }

        let queue_length = src.get_u32();
        let items_produced = src.get_u32();
        let consumed = (0..self.consumers).map(|_| src.get_u32()).collect();
        Ok(TelemetryRecord {
            queue_length,
            items_produced,
            consumed,
        })
    }
}
