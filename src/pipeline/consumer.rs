use super::pacing::Pacing;
use crate::buffer::BoundedBuffer;
use crate::domain::{ConsumerId, Item};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// What one consumer did before it retired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub id: ConsumerId,
    pub consumed: u32,
    /// Dequeued items in dequeue order; only filled when recording is enabled.
    pub items: Vec<Item>,
}

/// One reader with a fixed identity.
pub struct Consumer {
    id: ConsumerId,
    buffer: Arc<BoundedBuffer>,
    pacing: Pacing,
    record_items: bool,
}

impl Consumer {
    pub fn new(id: ConsumerId, buffer: Arc<BoundedBuffer>, pacing: Pacing) -> Self {
        Self {
            id,
            buffer,
            pacing,
            record_items: false,
        }
    }

    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Drains the buffer until the stream ends.
    ///
    /// The shared per-consumer counter is bumped by the buffer itself; the
    /// tally returned here is this consumer's own count for cross-checking.
    pub fn run(self) -> ConsumerReport {
        debug!(consumer = %self.id, "Consumer started");

        let mut consumed = 0u32;
        let mut items = Vec::new();
        while let Some(item) = self.buffer.dequeue(self.id) {
            consumed += 1;
            if self.record_items {
                items.push(item);
            }
            trace!(consumer = %self.id, %item, "Consumed");
            self.pacing.pause();
        }

        debug!(consumer = %self.id, consumed, "Consumer retired");
        ConsumerReport {
            id: self.id,
            consumed,
            items,
        }
    }
}

/// The `K` consumers of one run, identities `1..=K` assigned up front.
pub struct ConsumerPool {
    consumers: Vec<Consumer>,
}

impl ConsumerPool {
    /// One consumer per identity registered with `buffer`.
    pub fn new(buffer: &Arc<BoundedBuffer>, pacing: Pacing) -> Self {
        let consumers = ConsumerId::range(buffer.consumers())
            .map(|id| Consumer::new(id, Arc::clone(buffer), pacing))
            .collect();
        Self { consumers }
    }

    /// Keep every dequeued item in the reports.
    pub fn recording_items(mut self, record: bool) -> Self {
        for consumer in &mut self.consumers {
            consumer.record_items = record;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub fn into_consumers(self) -> Vec<Consumer> {
        self.consumers
    }

    /// Runs each consumer on its own blocking thread.
    pub fn spawn(self) -> Vec<JoinHandle<ConsumerReport>> {
        self.consumers
            .into_iter()
            .map(|consumer| tokio::task::spawn_blocking(move || consumer.run()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_pool_assigns_identities_in_order() {
        let buffer = Arc::new(BoundedBuffer::new(4, 3).unwrap());
        let pool = ConsumerPool::new(&buffer, Pacing::disabled());
        let ids: Vec<u32> = pool
            .into_consumers()
            .iter()
            .map(|c| c.id().get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_consumers_retire_after_draining() {
        let buffer = Arc::new(BoundedBuffer::new(16, 2).unwrap());
        for i in 0..10 {
            buffer.enqueue(Item::new(i));
        }
        buffer.mark_complete();

        let handles: Vec<_> = ConsumerPool::new(&buffer, Pacing::disabled())
            .recording_items(true)
            .into_consumers()
            .into_iter()
            .map(|consumer| thread::spawn(move || consumer.run()))
            .collect();
        let reports: Vec<ConsumerReport> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let total: u32 = reports.iter().map(|r| r.consumed).sum();
        assert_eq!(total, 10);
        for report in &reports {
            assert_eq!(report.items.len(), report.consumed as usize);
            // Each consumer sees items in increasing order.
            assert!(report.items.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(
            buffer.snapshot().consumed,
            reports.iter().map(|r| r.consumed).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_spawned_pool_joins() {
        let buffer = Arc::new(BoundedBuffer::new(4, 2).unwrap());
        let handles = ConsumerPool::new(&buffer, Pacing::disabled()).spawn();
        buffer.enqueue(Item::new(0));
        buffer.mark_complete();

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().consumed;
        }
        assert_eq!(total, 1);
    }
}
