use serde::{Deserialize, Serialize};

/// Point-in-time copy of the buffer counters, taken under the buffer lock.
///
/// `consumed[i]` belongs to consumer `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub queue_length: u32,
    pub items_produced: u32,
    pub consumed: Vec<u32>,
    pub producing_complete: bool,
}

impl Snapshot {
    pub fn consumer_count(&self) -> usize {
        self.consumed.len()
    }

    pub fn consumed_total(&self) -> u64 {
        self.consumed.iter().map(|&c| u64::from(c)).sum()
    }

    /// Production finished and nothing is left in the ring.
    pub fn is_terminal(&self) -> bool {
        self.producing_complete && self.queue_length == 0
    }

    /// `queue_length == items_produced - consumed_total`.
    pub fn is_consistent(&self) -> bool {
        let consumed = self.consumed_total();
        let produced = u64::from(self.items_produced);
        consumed <= produced && produced - consumed == u64::from(self.queue_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(queue_length: u32, items_produced: u32, consumed: &[u32]) -> Snapshot {
        Snapshot {
            queue_length,
            items_produced,
            consumed: consumed.to_vec(),
            producing_complete: false,
        }
    }

    #[test]
    fn consistency_checks_queue_against_counters() {
        assert!(snapshot(2, 10, &[5, 3]).is_consistent());
        assert!(!snapshot(1, 10, &[5, 3]).is_consistent());
        assert!(!snapshot(0, 3, &[5]).is_consistent());
    }

    #[test]
    fn terminal_requires_completion_and_empty_queue() {
        let mut snap = snapshot(0, 10, &[10]);
        assert!(!snap.is_terminal());
        snap.producing_complete = true;
        assert!(snap.is_terminal());
        snap.queue_length = 1;
        assert!(!snap.is_terminal());
    }
}
