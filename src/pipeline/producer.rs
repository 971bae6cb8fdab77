use super::pacing::Pacing;
use crate::buffer::BoundedBuffer;
use crate::domain::Item;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Single writer feeding items `0..items` into the buffer, in order.
pub struct Producer {
    buffer: Arc<BoundedBuffer>,
    items: u32,
    pacing: Pacing,
}

impl Producer {
    pub fn new(buffer: Arc<BoundedBuffer>, items: u32, pacing: Pacing) -> Self {
        Self {
            buffer,
            items,
            pacing,
        }
    }

    pub fn items(&self) -> u32 {
        self.items
    }

    /// Produces every item, then marks production complete exactly once.
    ///
    /// Blocks while the buffer is full. Returns the number of items produced.
    pub fn run(self) -> u32 {
        debug!(items = self.items, "Producer started");

        for id in 0..self.items {
            self.pacing.pause();
            let item = Item::new(id);
            self.buffer.enqueue(item);
            trace!(%item, "Produced");
        }

        self.buffer.mark_complete();
        info!(items = self.items, "Production completed");
        self.items
    }
}
