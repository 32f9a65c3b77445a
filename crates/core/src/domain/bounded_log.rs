// Bounded FIFO log (ring buffer) shared between concurrent writers

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Fixed-capacity append-only log that evicts the oldest entry once full.
///
/// Append and trim happen under a single lock, so the capacity bound holds
/// for any number of concurrent writers. Every read returns an owned copy;
/// callers never see the live buffer.
pub struct BoundedLog<T> {
    entries: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Clone> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an entry, evicting from the front until within capacity
    pub fn push(&self, entry: T) {
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All retained entries, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }

    /// Up to `limit` entries, most recent first
    pub fn recent(&self, limit: usize) -> Vec<T> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Remove every entry, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    // A panicking writer cannot leave the deque half-updated, so a poisoned
    // lock is still safe to reuse.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_evicts_oldest_first() {
        let log = BoundedLog::new(100);
        for i in 0..250 {
            log.push(i);
        }

        let retained = log.snapshot();
        assert_eq!(retained.len(), 100);
        assert_eq!(retained, (150..250).collect::<Vec<_>>());
    }

    #[test]
    fn test_recent_is_newest_first() {
        let log = BoundedLog::new(10);
        for i in 0..5 {
            log.push(i);
        }

        assert_eq!(log.recent(3), vec![4, 3, 2]);
        assert_eq!(log.recent(50), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_clear_reports_dropped_count() {
        let log = BoundedLog::new(10);
        log.push("a");
        log.push("b");

        assert_eq!(log.clear(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_concurrent_writers_respect_capacity() {
        let log = Arc::new(BoundedLog::new(100));

        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        log.push((writer, i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 100);

        // Each writer's surviving entries keep their relative order
        let retained = log.snapshot();
        for writer in 0..8 {
            let seq: Vec<_> = retained
                .iter()
                .filter(|(w, _)| *w == writer)
                .map(|(_, i)| *i)
                .collect();
            assert!(seq.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let log = BoundedLog::new(4);
        log.push(1);
        let mut copy = log.snapshot();
        copy.push(99);

        assert_eq!(log.snapshot(), vec![1]);
    }
}
