#![forbid(unsafe_code)]

//! Bounded-deque eviction policy.
//!
//! The ledger's capacity rules live here, decoupled from ledger mutation so
//! they can be tested on their own: a FIFO deque that enforces a byte budget
//! and an item-count cap by evicting from the front (oldest first).
//!
//! # Invariants
//!
//! 1. `total_bytes` always equals the sum of `byte_cost()` over all items.
//! 2. After any operation, `len() <= max_items` (when a cap is set).
//! 3. After any operation, `total_bytes <= max_bytes` (when a budget is
//!    set) — unless a single item alone exceeds the budget, in which case
//!    the deque holds exactly that item.
//! 4. Eviction order is strictly oldest-first; the newest item goes only
//!    after every older one is gone.

use std::collections::VecDeque;

/// Memory accounting hook for budgeted items.
pub trait ByteCost {
    /// Size of this item in bytes, counted against the budget.
    fn byte_cost(&self) -> usize;
}

/// FIFO deque bounded by a byte budget and an item cap.
///
/// A limit of `0` disables that limit.
#[derive(Debug)]
pub struct BudgetedDeque<T> {
    items: VecDeque<T>,
    total_bytes: usize,
    max_bytes: usize,
    max_items: usize,
}

impl<T: ByteCost> BudgetedDeque<T> {
    /// Create an empty deque with the given limits (`0` = unlimited).
    #[must_use]
    pub fn new(max_bytes: usize, max_items: usize) -> Self {
        Self {
            items: VecDeque::new(),
            total_bytes: 0,
            max_bytes,
            max_items,
        }
    }

    /// Append an item, evicting from the front until it fits.
    ///
    /// Returns the number of items evicted. An item larger than the whole
    /// budget still goes in — alone.
    pub fn push_back(&mut self, item: T) -> usize {
        let cost = item.byte_cost();
        let mut evicted = 0;
        while !self.items.is_empty() && self.would_exceed(cost) {
            self.drop_front();
            evicted += 1;
        }
        self.total_bytes += cost;
        self.items.push_back(item);
        evicted
    }

    /// Remove and return the newest item.
    pub fn pop_back(&mut self) -> Option<T> {
        let item = self.items.pop_back()?;
        self.total_bytes = self.total_bytes.saturating_sub(item.byte_cost());
        Some(item)
    }

    /// Remove and return the oldest item.
    pub fn pop_front(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.total_bytes = self.total_bytes.saturating_sub(item.byte_cost());
        Some(item)
    }

    /// Replace the limits and evict until they hold.
    ///
    /// Returns the number of items evicted.
    pub fn set_limits(&mut self, max_bytes: usize, max_items: usize) -> usize {
        self.max_bytes = max_bytes;
        self.max_items = max_items;
        let mut evicted = 0;
        while self.items.len() > 1 && self.over_limit() {
            self.drop_front();
            evicted += 1;
        }
        evicted
    }

    /// Peek at the newest item.
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the deque is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `byte_cost()` over all items.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Current byte budget (`0` = unlimited).
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Current item cap (`0` = unlimited).
    #[must_use]
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Drop everything and reset accounting.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total_bytes = 0;
    }

    fn would_exceed(&self, incoming_cost: usize) -> bool {
        (self.max_items != 0 && self.items.len() + 1 > self.max_items)
            || (self.max_bytes != 0 && self.total_bytes + incoming_cost > self.max_bytes)
    }

    fn over_limit(&self) -> bool {
        (self.max_items != 0 && self.items.len() > self.max_items)
            || (self.max_bytes != 0 && self.total_bytes > self.max_bytes)
    }

    fn drop_front(&mut self) {
        if let Some(item) = self.items.pop_front() {
            self.total_bytes = self.total_bytes.saturating_sub(item.byte_cost());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Blob(usize, &'static str);

    impl ByteCost for Blob {
        fn byte_cost(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn unlimited_deque_never_evicts() {
        let mut dq = BudgetedDeque::new(0, 0);
        for i in 0..100 {
            assert_eq!(dq.push_back(Blob(i, "x")), 0);
        }
        assert_eq!(dq.len(), 100);
    }

    #[test]
    fn count_cap_keeps_newest() {
        let mut dq = BudgetedDeque::new(0, 3);
        dq.push_back(Blob(1, "a"));
        dq.push_back(Blob(1, "b"));
        dq.push_back(Blob(1, "c"));
        let evicted = dq.push_back(Blob(1, "d"));

        assert_eq!(evicted, 1);
        assert_eq!(dq.len(), 3);
        let names: Vec<_> = dq.iter().map(|b| b.1).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn byte_budget_evicts_oldest_first() {
        let mut dq = BudgetedDeque::new(100, 0);
        dq.push_back(Blob(40, "a"));
        dq.push_back(Blob(40, "b"));
        // 40 + 40 + 40 > 100: "a" must go.
        let evicted = dq.push_back(Blob(40, "c"));

        assert_eq!(evicted, 1);
        assert_eq!(dq.total_bytes(), 80);
        let names: Vec<_> = dq.iter().map(|b| b.1).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn oversize_item_is_kept_alone() {
        let mut dq = BudgetedDeque::new(100, 0);
        dq.push_back(Blob(60, "a"));
        let evicted = dq.push_back(Blob(500, "huge"));

        assert_eq!(evicted, 1);
        assert_eq!(dq.len(), 1);
        assert_eq!(dq.back().map(|b| b.1), Some("huge"));
        assert_eq!(dq.total_bytes(), 500);
    }

    #[test]
    fn accounting_tracks_pops() {
        let mut dq = BudgetedDeque::new(0, 0);
        dq.push_back(Blob(10, "a"));
        dq.push_back(Blob(20, "b"));
        assert_eq!(dq.total_bytes(), 30);

        assert_eq!(dq.pop_back().map(|b| b.1), Some("b"));
        assert_eq!(dq.total_bytes(), 10);
        assert_eq!(dq.pop_front().map(|b| b.1), Some("a"));
        assert_eq!(dq.total_bytes(), 0);
        assert!(dq.pop_back().is_none());
    }

    #[test]
    fn set_limits_re_evicts() {
        let mut dq = BudgetedDeque::new(0, 0);
        for i in 0..5 {
            dq.push_back(Blob(10, ["a", "b", "c", "d", "e"][i]));
        }

        let evicted = dq.set_limits(0, 2);
        assert_eq!(evicted, 3);
        let names: Vec<_> = dq.iter().map(|b| b.1).collect();
        assert_eq!(names, vec!["d", "e"]);

        let evicted = dq.set_limits(5, 0);
        assert_eq!(evicted, 1);
        assert_eq!(dq.back().map(|b| b.1), Some("e"));
    }

    #[test]
    fn set_limits_keeps_single_oversize_item() {
        let mut dq = BudgetedDeque::new(0, 0);
        dq.push_back(Blob(500, "huge"));
        let evicted = dq.set_limits(100, 0);
        assert_eq!(evicted, 0);
        assert_eq!(dq.len(), 1);
    }

    #[test]
    fn clear_resets_accounting() {
        let mut dq = BudgetedDeque::new(0, 0);
        dq.push_back(Blob(10, "a"));
        dq.clear();
        assert!(dq.is_empty());
        assert_eq!(dq.total_bytes(), 0);
    }
}
