//! Telegram update deduplication

use std::collections::{HashSet, VecDeque};

/// Updates remembered before the oldest is forgotten
const DEDUP_CAPACITY: usize = 2000;

/// Remembers recently seen `update_id`s
///
/// The polling offset already acknowledges updates; this guards against
/// redelivery after a failed acknowledgement or a restarted offset.
#[derive(Debug)]
pub struct UpdateDedup {
    seen: HashSet<i64>,
    order: VecDeque<i64>,
    capacity: usize,
}

impl Default for UpdateDedup {
    fn default() -> Self {
        Self::with_capacity(DEDUP_CAPACITY)
    }
}

impl UpdateDedup {
    /// Create a cache holding at most `capacity` ids
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `true` if `update_id` was already seen; records it otherwise
    pub fn is_duplicate(&mut self, update_id: i64) -> bool {
        if !self.seen.insert(update_id) {
            return true;
        }

        self.order.push_back(update_id);
        if self.order.len() > self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.seen.remove(&oldest);
        }
        false
    }

    /// Number of remembered ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sight_is_not_duplicate() {
        let mut dedup = UpdateDedup::default();
        assert!(!dedup.is_duplicate(1));
        assert!(dedup.is_duplicate(1));
        assert!(!dedup.is_duplicate(2));
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut dedup = UpdateDedup::with_capacity(2);
        assert!(!dedup.is_duplicate(1));
        assert!(!dedup.is_duplicate(2));
        assert!(!dedup.is_duplicate(3));

        assert_eq!(dedup.len(), 2);
        // 1 was evicted, so it reads as new again
        assert!(!dedup.is_duplicate(1));
        assert!(dedup.is_duplicate(3));
    }
}
