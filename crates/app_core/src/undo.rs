//! Bounded undo history of image snapshots

use std::collections::VecDeque;

/// Most-recent-last stack that drops its oldest entry when full
#[derive(Debug, Clone)]
pub struct UndoStack<T> {
    entries: VecDeque<T>,
    limit: usize,
    evicted: usize,
}

impl<T> UndoStack<T> {
    /// A limit of 0 is treated as 1
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit,
            evicted: 0,
        }
    }

    pub fn push(&mut self, snapshot: T) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
            self.evicted += 1;
            tracing::debug!("Undo history full, dropped oldest snapshot ({} dropped)", self.evicted);
        }
        self.entries.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Number of snapshots lost to the size limit
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// The document differs from what was loaded. Stays true once history
    /// has been evicted, since the original can no longer be restored.
    pub fn is_modified(&self) -> bool {
        !self.entries.is_empty() || self.evicted > 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.evicted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = UndoStack::new(4);
        assert!(!stack.is_modified());
        stack.push(1);
        stack.push(2);
        assert!(stack.is_modified());
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
        assert!(!stack.is_modified());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            stack.push(i);
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.evicted(), 2);
        assert_eq!(stack.pop(), Some(4));
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert!(!stack.can_undo());
        assert!(stack.is_modified());

        stack.clear();
        assert!(!stack.is_modified());
    }
}
