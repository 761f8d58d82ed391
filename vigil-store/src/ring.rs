use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::trace;
use vigil_core::record::RequestRecord;

/// Larger capacities grow on demand instead of allocating up front.
const PREALLOCATE_LIMIT: usize = 1024;

/// Fixed-capacity history of the most recent requests.
///
/// Index 0 is always the newest record. When a push would exceed the
/// capacity, the oldest record is dropped from the tail. The single lock
/// makes every `record` atomic with respect to its eviction and every
/// `snapshot` a consistent copy.
pub struct RingLogStore {
    entries: Mutex<VecDeque<RequestRecord>>,
    capacity: usize,
}

impl RingLogStore {
    pub const DEFAULT_CAPACITY: usize = 500;

    pub fn new(capacity: usize) -> Self {
        Self {
            // +1: a push briefly holds capacity + 1 before the tail is evicted.
            entries: Mutex::new(VecDeque::with_capacity(
                capacity.saturating_add(1).min(PREALLOCATE_LIMIT),
            )),
            capacity,
        }
    }

    /// Prepend a record, evicting the oldest one on overflow.
    pub fn record(&self, entry: RequestRecord) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        if entries.len() > self.capacity {
            if let Some(evicted) = entries.pop_back() {
                trace!(path = %evicted.path, "Evicted oldest record");
            }
        }
    }

    /// Independent copy of the current contents, newest first.
    pub fn snapshot(&self) -> Vec<RequestRecord> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RingLogStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for RingLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingLogStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
