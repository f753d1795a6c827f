//! Bounded id memory with FIFO eviction.
//!
//! [`IdWindow`] remembers the most recent N ids it has admitted. It backs
//! both the ingest dedup cache and the already-broadcast tracking set, which
//! only differ in capacity.

use std::collections::{HashSet, VecDeque};

/// Insertion-ordered set of ids capped at a fixed capacity.
///
/// `admit` answers "is this id new?" exactly once per id, until the id is
/// evicted by overflow or an explicit resync. Membership checks are O(1);
/// eviction drops the oldest id first.
#[derive(Debug)]
pub struct IdWindow {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl IdWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: HashSet::with_capacity(capacity.min(4096)),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Record `id` if unseen. Returns `true` for a new id, `false` for a
    /// duplicate. Admitting past capacity evicts the oldest ids.
    pub fn admit(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string());
        self.order.push_back(id.to_string());
        while self.ids.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.ids.remove(&oldest);
                }
                None => break,
            }
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every id not present in `keep`, preserving insertion order of the
    /// survivors. Used to resync against the surviving snapshot after eviction.
    pub fn retain_known(&mut self, keep: &HashSet<String>) {
        self.ids.retain(|id| keep.contains(id));
        self.order.retain(|id| keep.contains(id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.order.clear();
    }
}
