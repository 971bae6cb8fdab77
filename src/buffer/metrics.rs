/// Wait and occupancy statistics for a `BoundedBuffer`.
///
/// Updated inside the buffer's critical sections, so a copy is always
/// consistent with the ring state it was taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Highest occupancy observed after an enqueue.
    pub peak_queue_length: usize,
    /// Times the producer found the ring full and had to wait.
    pub producer_waits: u64,
    /// Times a consumer found the ring empty and had to wait.
    pub consumer_waits: u64,
}

impl BufferStats {
    pub(crate) fn record_enqueue(&mut self, occupied: usize) {
        if occupied > self.peak_queue_length {
            self.peak_queue_length = occupied;
        }
    }

    pub(crate) fn record_producer_wait(&mut self) {
        self.producer_waits += 1;
    }

    pub(crate) fn record_consumer_wait(&mut self) {
        self.consumer_waits += 1;
    }

    /// Share of the usable slots (capacity - 1) reached at peak.
    pub fn peak_fill_ratio(&self, capacity: usize) -> f64 {
        let usable = capacity.saturating_sub(1);
        if usable == 0 {
            return 0.0;
        }
        self.peak_queue_length as f64 / usable as f64
    }
}
