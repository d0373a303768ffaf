//! Bounded FIFO cache for loaded image handles.
//!
//! Entries are keyed by image URL and evicted strictly in insertion order,
//! regardless of how recently they were read. Two mechanisms bound memory:
//! - insertion at capacity evicts the single oldest entry;
//! - [`ImageCache::sweep`], run periodically, trims the cache from above
//!   `SWEEP_HIGH_WATER_PCT` occupancy down to `SWEEP_LOW_WATER_PCT`.
//!
//! The cache is not synchronized. It lives on the UI event loop and is shared
//! through `Rc<RefCell<_>>`.

use crate::config::{IMAGE_CACHE_CAPACITY, SWEEP_HIGH_WATER_PCT, SWEEP_LOW_WATER_PCT};
use log::debug;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
pub struct ImageCache<H> {
    capacity: usize,
    entries: HashMap<String, H>,
    /// Keys in insertion order, oldest at the front.
    order: VecDeque<String>,
}

impl<H> Default for ImageCache<H> {
    fn default() -> Self {
        Self::new(IMAGE_CACHE_CAPACITY)
    }
}

impl<H> ImageCache<H> {
    /// Create a cache holding at most `capacity` entries. A zero capacity is
    /// raised to one so an insert always has somewhere to land.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, src: &str) -> bool {
        self.entries.contains_key(src)
    }

    /// Look up a handle. Reads do not refresh an entry's position.
    pub fn get(&self, src: &str) -> Option<&H> {
        self.entries.get(src)
    }

    /// Insert a handle, returning the entry evicted to make room.
    ///
    /// Re-inserting a key already present swaps the handle in place and keeps
    /// its original position in the eviction order.
    pub fn insert(&mut self, src: impl Into<String>, handle: H) -> Option<(String, H)> {
        let src = src.into();
        if let Some(slot) = self.entries.get_mut(&src) {
            *slot = handle;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.pop_oldest()
        } else {
            None
        };
        if let Some((key, _)) = &evicted {
            debug!("Image cache full ({}), evicted {}", self.capacity, key);
        }

        self.order.push_back(src.clone());
        self.entries.insert(src, handle);
        evicted
    }

    /// Remove the oldest-inserted entry.
    pub fn pop_oldest(&mut self) -> Option<(String, H)> {
        while let Some(key) = self.order.pop_front() {
            if let Some(handle) = self.entries.remove(&key) {
                return Some((key, handle));
            }
        }
        None
    }

    /// Trim to the low-water mark once occupancy is above the high-water mark.
    /// Returns how many entries were dropped.
    pub fn sweep(&mut self) -> usize {
        let len = self.len();
        if len * 100 <= self.capacity * SWEEP_HIGH_WATER_PCT {
            return 0;
        }
        let target = self.capacity * SWEEP_LOW_WATER_PCT / 100;
        let mut removed = 0;
        while self.len() > target && self.pop_oldest().is_some() {
            removed += 1;
        }
        debug!("Image cache sweep dropped {} of {} entries", removed, len);
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
