// Bounded ring buffer shared by the producer, the consumer pool and the monitor.
//
// One mutex guards every piece of mutable pipeline state. Two condition
// variables keep producer wake-ups and consumer wake-ups apart.

use super::error::BufferError;
use super::metrics::BufferStats;
use crate::domain::{ConsumerId, Item, Snapshot};
use parking_lot::{Condvar, Mutex};
use tracing::debug;

/// Smallest usable capacity: one slot is always kept free.
pub const MIN_CAPACITY: usize = 2;

struct RingState {
    slots: Vec<Item>,
    write_index: usize,
    read_index: usize,
    items_produced: u32,
    consumed: Vec<u32>,
    producing_complete: bool,
    stats: BufferStats,
}

impl RingState {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn occupied(&self) -> usize {
        let capacity = self.capacity();
        (self.write_index + capacity - self.read_index) % capacity
    }

    fn is_full(&self) -> bool {
        (self.write_index + 1) % self.capacity() == self.read_index
    }

    fn is_empty(&self) -> bool {
        self.read_index == self.write_index
    }
}

/// Fixed-capacity FIFO ring with blocking `enqueue`/`dequeue`.
///
/// A ring of capacity `C` holds at most `C - 1` items: with a full ring the
/// write index would otherwise catch up with the read index and look empty.
///
/// The buffer also owns the telemetry counters (items produced, items consumed
/// per consumer) so that [`BoundedBuffer::snapshot`] can read all of them in a
/// single critical section.
pub struct BoundedBuffer {
    state: Mutex<RingState>,
    space_available: Condvar,
    item_available: Condvar,
    capacity: usize,
    consumers: u32,
}

impl BoundedBuffer {
    /// Builds a ring with `capacity` slots shared by `consumers` consumers.
    ///
    /// Counter and slot storage is reserved fallibly so that an allocation
    /// failure surfaces here, before any worker starts.
    pub fn new(capacity: usize, consumers: u32) -> Result<Self, BufferError> {
        if capacity < MIN_CAPACITY {
            return Err(BufferError::InvalidCapacity {
                capacity,
                reason: "one slot is reserved, so at least 2 are required",
            });
        }
        if u32::try_from(capacity).is_err() {
            return Err(BufferError::InvalidCapacity {
                capacity,
                reason: "queue length must fit a 32-bit telemetry field",
            });
        }
        if consumers == 0 {
            return Err(BufferError::NoConsumers);
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|source| BufferError::Allocation {
                what: "ring slots",
                requested: capacity,
                source,
            })?;
        slots.resize(capacity, Item::new(0));

        let counter_count = consumers as usize;
        let mut consumed = Vec::new();
        consumed
            .try_reserve_exact(counter_count)
            .map_err(|source| BufferError::Allocation {
                what: "consumer counters",
                requested: counter_count,
                source,
            })?;
        consumed.resize(counter_count, 0);

        debug!(capacity, consumers, "Bounded buffer created");

        Ok(Self {
            state: Mutex::new(RingState {
                slots,
                write_index: 0,
                read_index: 0,
                items_produced: 0,
                consumed,
                producing_complete: false,
                stats: BufferStats::default(),
            }),
            space_available: Condvar::new(),
            item_available: Condvar::new(),
            capacity,
            consumers,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn consumers(&self) -> u32 {
        self.consumers
    }

    /// Blocks while the ring is full, then appends `item` and wakes one consumer.
    ///
    /// # Panics
    ///
    /// If production has already been marked complete, or if more than
    /// `u32::MAX` items are pushed through one buffer.
    pub fn enqueue(&self, item: Item) {
        let mut state = self.state.lock();
        assert!(
            !state.producing_complete,
            "enqueue of item {item} after production was marked complete"
        );

        while state.is_full() {
            state.stats.record_producer_wait();
            self.space_available.wait(&mut state);
        }
        assert!(
            !state.producing_complete,
            "production was marked complete while item {item} waited for space"
        );
        assert!(
            state.items_produced < u32::MAX,
            "item count exceeds the 32-bit telemetry range"
        );

        let slot = state.write_index;
        state.slots[slot] = item;
        state.write_index = (slot + 1) % self.capacity;
        state.items_produced += 1;
        let occupied = state.occupied();
        state.stats.record_enqueue(occupied);
        drop(state);

        self.item_available.notify_one();
    }

    /// Blocks until an item is available or the stream has ended.
    ///
    /// Returns `None` once production is complete and the ring is empty. On
    /// success the consumer's counter is bumped in the same critical section
    /// that removes the item, so snapshots never see an item that is neither
    /// queued nor counted.
    ///
    /// # Panics
    ///
    /// If `consumer` is not one of the identities `1..=consumers()`.
    pub fn dequeue(&self, consumer: ConsumerId) -> Option<Item> {
        assert!(
            consumer.get() <= self.consumers,
            "{consumer} is not registered with this buffer ({} consumers)",
            self.consumers
        );

        let mut state = self.state.lock();
        while !state.producing_complete && state.is_empty() {
            state.stats.record_consumer_wait();
            self.item_available.wait(&mut state);
        }
        if state.is_empty() {
            // Production complete and nothing left: the stream has ended.
            return None;
        }

        let slot = state.read_index;
        let item = state.slots[slot];
        state.read_index = (slot + 1) % self.capacity;
        state.consumed[consumer.index()] += 1;
        drop(state);

        self.space_available.notify_one();
        Some(item)
    }

    /// Marks production complete and wakes every waiting consumer.
    ///
    /// # Panics
    ///
    /// If called more than once.
    pub fn mark_complete(&self) {
        let mut state = self.state.lock();
        assert!(
            !state.producing_complete,
            "production was already marked complete"
        );
        state.producing_complete = true;
        drop(state);

        self.item_available.notify_all();
    }

    /// Lock-consistent copy of the queue length and all counters.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            queue_length: state.occupied() as u32,
            items_produced: state.items_produced,
            consumed: state.consumed.clone(),
            producing_complete: state.producing_complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state.lock().producing_complete
    }

    /// Production complete and ring empty; no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        let state = self.state.lock();
        state.producing_complete && state.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().occupied()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    pub fn stats(&self) -> BufferStats {
        self.state.lock().stats
    }
}

impl std::fmt::Debug for BoundedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity)
            .field("consumers", &self.consumers)
            .field("queue_length", &snapshot.queue_length)
            .field("items_produced", &snapshot.items_produced)
            .field("producing_complete", &snapshot.producing_complete)
            .finish()
    }
}
