//! Eviction Queue Module
//!
//! Bounded FIFO of live storage keys used to pick eviction victims.

use std::collections::VecDeque;

// == Eviction Queue ==
/// Insertion-ordered keys with a capacity.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion (next eviction victim)
/// - Back = Newest insertion
///
/// Reads never reorder the queue. Re-inserting a key moves it to the back so
/// a key is never tracked twice.
#[derive(Debug)]
pub struct EvictionQueue {
    order: VecDeque<String>,
    capacity: usize,
}

impl EvictionQueue {
    // == Constructor ==
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            capacity,
        }
    }

    // == Push ==
    /// Records `key` as the newest insertion.
    pub fn push(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Stops tracking `key`. Returns whether it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.order.iter().position(|k| k == key) {
            Some(index) => {
                self.order.remove(index);
                true
            }
            None => false,
        }
    }

    // == Overflow Victim ==
    /// Oldest key while the queue is over capacity.
    ///
    /// The key stays tracked until the caller has deleted it and calls
    /// [`remove`](Self::remove).
    pub fn overflow_victim(&self) -> Option<&str> {
        if self.is_over_capacity() {
            self.order.front().map(String::as_str)
        } else {
            None
        }
    }

    // == Peek Oldest ==
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    pub fn is_over_capacity(&self) -> bool {
        self.order.len() > self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
