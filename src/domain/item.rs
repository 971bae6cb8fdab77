use serde::{Deserialize, Serialize};
use std::fmt;

/// A sequential item identifier in `[0, N)`.
///
/// Items carry no payload; the identifier is what travels through the ring and
/// what tests use to check that every item is consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Item(u32);

impl Item {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }
}

impl From<u32> for Item {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Permanent identity of a consumer, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsumerId(u32);

impl ConsumerId {
    /// Returns `None` for 0, which is not a valid identity.
    pub const fn new(id: u32) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Zero-based slot of this consumer in a counter array.
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// All identities `1..=count`, in order.
    pub fn range(count: u32) -> impl Iterator<Item = ConsumerId> {
        (1..=count).map(ConsumerId)
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consumer-{}", self.0)
    }
}
