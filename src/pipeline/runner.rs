use super::consumer::{ConsumerPool, ConsumerReport};
use super::pacing::Pacing;
use super::producer::Producer;
use crate::buffer::{BoundedBuffer, BufferStats};
use crate::domain::{PipelineError, Snapshot};
use crate::telemetry::{MonitorReporter, ReporterStats};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;
use tokio::task::JoinError;
use tracing::{info, warn};

/// Values one run needs; the CLI/config layer fills these in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub buffer_capacity: usize,
    pub items: u32,
    pub consumers: u32,
    pub producer_max_delay: Duration,
    pub consumer_max_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 10,
            items: 1024,
            consumers: 3,
            producer_max_delay: Duration::from_micros(50),
            consumer_max_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub items_produced: u32,
    pub consumers: Vec<ConsumerReport>,
    pub final_snapshot: Snapshot,
    pub buffer_stats: BufferStats,
    pub telemetry: Option<ReporterStats>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn consumed_total(&self) -> u64 {
        self.consumers.iter().map(|r| u64::from(r.consumed)).sum()
    }
}

/// Wires one producer, the consumer pool and an optional reporter around a
/// single buffer and waits for all of them.
pub struct PipelineRunner {
    buffer: Arc<BoundedBuffer>,
    settings: PipelineSettings,
    record_items: bool,
}

impl PipelineRunner {
    /// Allocates the buffer. Fails before any worker exists.
    pub fn new(settings: PipelineSettings) -> Result<Self, PipelineError> {
        let buffer = BoundedBuffer::new(settings.buffer_capacity, settings.consumers)?;
        Ok(Self {
            buffer: Arc::new(buffer),
            settings,
            record_items: false,
        })
    }

    /// Keep every dequeued item in the consumer reports.
    pub fn record_items(mut self, record: bool) -> Self {
        self.record_items = record;
        self
    }

    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs to the terminal state without telemetry.
    pub async fn run(self) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        let buffer = Arc::clone(&self.buffer);
        let (items_produced, consumers) = self.spawn_workers().await?;
        Ok(Self::summarize(&buffer, items_produced, consumers, None, started))
    }

    /// Runs to the terminal state while `reporter` streams snapshots.
    ///
    /// A reporter failure is returned as soon as it happens; workers still
    /// running at that point are left to the caller, which is expected to
    /// terminate the process.
    pub async fn run_with_reporter<W>(
        self,
        reporter: MonitorReporter<W>,
    ) -> Result<RunSummary, PipelineError>
    where
        W: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let buffer = Arc::clone(&self.buffer);
        let workers = self.spawn_workers();
        let telemetry = async move { reporter.stream().await.map_err(PipelineError::from) };

        let ((items_produced, consumers), telemetry) = tokio::try_join!(workers, telemetry)?;
        Ok(Self::summarize(
            &buffer,
            items_produced,
            consumers,
            Some(telemetry),
            started,
        ))
    }

    async fn spawn_workers(self) -> Result<(u32, Vec<ConsumerReport>), PipelineError> {
        info!(
            capacity = self.settings.buffer_capacity,
            items = self.settings.items,
            consumers = self.settings.consumers,
            "Starting pipeline"
        );

        let producer = Producer::new(
            Arc::clone(&self.buffer),
            self.settings.items,
            Pacing::new(self.settings.producer_max_delay),
        );
        let producer = tokio::task::spawn_blocking(move || producer.run());

        let consumers = ConsumerPool::new(&self.buffer, Pacing::new(self.settings.consumer_max_delay))
            .recording_items(self.record_items)
            .spawn();

        let items_produced = producer.await.map_err(|e| worker_failed("producer", &e))?;

        let mut reports = Vec::with_capacity(consumers.len());
        for handle in consumers {
            reports.push(handle.await.map_err(|e| worker_failed("consumer", &e))?);
        }
        Ok((items_produced, reports))
    }

    fn summarize(
        buffer: &BoundedBuffer,
        items_produced: u32,
        consumers: Vec<ConsumerReport>,
        telemetry: Option<ReporterStats>,
        started: Instant,
    ) -> RunSummary {
        let final_snapshot = buffer.snapshot();
        let summary = RunSummary {
            items_produced,
            consumers,
            final_snapshot,
            buffer_stats: buffer.stats(),
            telemetry,
            elapsed: started.elapsed(),
        };

        if summary.consumed_total() != u64::from(items_produced) {
            warn!(
                produced = items_produced,
                consumed = summary.consumed_total(),
                "Consumed total does not match production"
            );
        }
        info!(
            items = items_produced,
            consumed = ?summary.final_snapshot.consumed,
            peak_queue_length = summary.buffer_stats.peak_queue_length,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Pipeline finished"
        );
        summary
    }
}

fn worker_failed(role: &str, error: &JoinError) -> PipelineError {
    let details = if error.is_panic() {
        "panicked".to_string()
    } else {
        error.to_string()
    };
    PipelineError::WorkerPanicked {
        role: role.to_string(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(capacity: usize, items: u32, consumers: u32) -> PipelineSettings {
        PipelineSettings {
            buffer_capacity: capacity,
            items,
            consumers,
            producer_max_delay: Duration::ZERO,
            consumer_max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_invalid_settings_fail_before_spawning() {
        assert!(matches!(
            PipelineRunner::new(settings(1, 10, 1)),
            Err(PipelineError::Buffer(_))
        ));
        assert!(matches!(
            PipelineRunner::new(settings(4, 10, 0)),
            Err(PipelineError::Buffer(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_reaches_terminal_state() {
        let summary = PipelineRunner::new(settings(4, 50, 3))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(summary.items_produced, 50);
        assert_eq!(summary.consumed_total(), 50);
        assert!(summary.final_snapshot.is_terminal());
        assert_eq!(summary.final_snapshot.consumed_total(), 50);
        assert!(summary.buffer_stats.peak_queue_length <= 3);
        assert!(summary.telemetry.is_none());
    }
}
