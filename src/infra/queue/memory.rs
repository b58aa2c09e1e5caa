//! In-memory min-heap keyed by `(sort_index, id)`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Entry stored in a [`PriorityQueue`].
#[derive(Debug)]
pub struct QueueEntry<T> {
    /// Primary ordering key, compared numerically.
    pub sort_index: f64,
    /// Insertion id; breaks ties first-come first-served.
    pub id: u64,
    /// The stored item.
    pub item: T,
}

impl<T> PartialEq for QueueEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for QueueEntry<T> {}

impl<T> PartialOrd for QueueEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueueEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so both keys are reversed to surface the
        // smallest (sort_index, id) first.
        other
            .sort_index
            .total_cmp(&self.sort_index)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Binary min-heap with O(log n) push/pop and O(1) peek.
///
/// There is no removal by identity; callers that need to drop an arbitrary
/// entry mark it dead and discard it when it surfaces at the head.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    entries: BinaryHeap<QueueEntry<T>>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BinaryHeap::new(),
        }
    }

    /// Create an empty queue with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Insert an item under the given key.
    pub fn push(&mut self, sort_index: f64, id: u64, item: T) {
        self.entries.push(QueueEntry {
            sort_index,
            id,
            item,
        });
    }

    /// The minimum entry, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&QueueEntry<T>> {
        self.entries.peek()
    }

    /// Remove and return the minimum entry.
    pub fn pop(&mut self) -> Option<QueueEntry<T>> {
        self.entries.pop()
    }

    /// Number of stored entries, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_ids<T>(q: &mut PriorityQueue<T>) -> Vec<u64> {
        std::iter::from_fn(|| q.pop().map(|e| e.id)).collect()
    }

    #[test]
    fn test_min_ordering() {
        let mut q = PriorityQueue::new();
        q.push(30.0, 1, "c");
        q.push(10.0, 2, "a");
        q.push(20.0, 3, "b");
        q.push(-1.0, 4, "z");

        assert_eq!(drain_ids(&mut q), vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_ties_break_by_id() {
        let mut q = PriorityQueue::new();
        q.push(5.0, 7, ());
        q.push(5.0, 3, ());
        q.push(5.0, 5, ());
        q.push(1.0, 9, ());

        assert_eq!(drain_ids(&mut q), vec![9, 3, 5, 7]);
    }

    #[test]
    fn test_peek_is_non_destructive() {
        let mut q = PriorityQueue::with_capacity(4);
        q.push(2.0, 1, "later");
        q.push(1.0, 2, "sooner");

        assert_eq!(q.peek().map(|e| e.item), Some("sooner"));
        assert_eq!(q.peek().map(|e| e.item), Some("sooner"));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().map(|e| e.item), Some("sooner"));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_empty_queue() {
        let mut q = PriorityQueue::<String>::new();
        assert!(q.is_empty());
        assert!(q.peek().is_none());
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_interleaved_push_pop_stays_ordered() {
        let mut q = PriorityQueue::new();
        q.push(50.0, 1, ());
        q.push(10.0, 2, ());
        assert_eq!(q.pop().map(|e| e.id), Some(2));
        q.push(5.0, 3, ());
        q.push(50.0, 4, ());
        assert_eq!(drain_ids(&mut q), vec![3, 1, 4]);
    }
}
