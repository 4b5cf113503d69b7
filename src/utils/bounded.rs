//! Fixed-capacity FIFO buffer
//!
//! A `VecDeque` that evicts its oldest entry instead of growing past its
//! capacity. Used for the recent-alert history.

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct BoundedDeque<T> {
    buf: VecDeque<T>,
    cap: usize,
}

impl<T> BoundedDeque<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append an item, evicting the oldest when full. A zero-capacity
    /// buffer drops everything.
    pub fn push(&mut self, item: T) {
        if self.cap == 0 {
            return;
        }
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Newest entry, if any
    pub fn last(&self) -> Option<&T> {
        self.buf.back()
    }

    /// Oldest-first iterator
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }
}

impl<T: Clone> BoundedDeque<T> {
    /// Oldest-first snapshot
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_capacity() {
        let mut dq = BoundedDeque::new(3);
        dq.push(1);
        dq.push(2);
        assert_eq!(dq.len(), 2);
        assert_eq!(dq.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut dq = BoundedDeque::new(3);
        for i in 1..=5 {
            dq.push(i);
        }
        assert_eq!(dq.len(), 3);
        assert_eq!(dq.to_vec(), vec![3, 4, 5]);
        assert_eq!(dq.last(), Some(&5));
    }

    #[test]
    fn test_zero_capacity_drops_everything() {
        let mut dq = BoundedDeque::new(0);
        dq.push(1);
        assert!(dq.is_empty());
        assert_eq!(dq.capacity(), 0);
    }
}
