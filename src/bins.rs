//! Capacity-bounded bins.
//! 
//! A bin keeps its items sorted by ascending size (smallest first) and tracks
//! its remaining capacity. The neighborhood scans rely on that ordering.

use crate::instance::Item;
use serde::{Deserialize, Serialize};

/// A bin holding a subset of the items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    capacity: i64,
    items: Vec<Item>,
    remaining: i64,
}

impl Bin {
    /// Create an empty bin
    pub fn new(capacity: i64) -> Self {
        Bin {
            capacity,
            items: Vec::new(),
            remaining: capacity,
        }
    }

    /// Add an item, keeping ascending order. Fails if the item does not fit.
    pub fn add(&mut self, item: Item) -> bool {
        if item.size > self.remaining {
            return false;
        }
        // New item goes before the first item of equal or larger size
        let pos = self.items.partition_point(|it| it.size < item.size);
        self.items.insert(pos, item);
        self.remaining -= item.size;
        true
    }

    /// Remove the item with the given id
    pub fn remove_by_id(&mut self, id: usize) -> bool {
        match self.position(id) {
            Some(pos) => self.remove_at(pos),
            None => false,
        }
    }

    /// Remove the item stored at `index`
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        let item = self.items.remove(index);
        self.remaining += item.size;
        true
    }

    pub fn has(&self, id: usize) -> bool {
        self.position(id).is_some()
    }

    /// Size of the item with the given id, 0 if absent
    pub fn size_of(&self, id: usize) -> i64 {
        self.item(id).map(|it| it.size).unwrap_or(0)
    }

    pub fn item(&self, id: usize) -> Option<Item> {
        self.items.iter().find(|it| it.id == id).copied()
    }

    pub fn position(&self, id: usize) -> Option<usize> {
        self.items.iter().position(|it| it.id == id)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.remaining == 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Empty the bin and restore its full capacity
    pub fn reset(&mut self) {
        self.items.clear();
        self.remaining = self.capacity;
    }

    #[inline]
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    #[inline]
    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// Sum of the contained item sizes
    pub fn load(&self) -> i64 {
        self.capacity - self.remaining
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_ids(&self) -> Vec<usize> {
        self.items.iter().map(|it| it.id).collect()
    }
}

impl std::fmt::Display for Bin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}]", self.load(), self.capacity)?;
        for item in &self.items {
            write!(f, " {}:{}", item.id, item.size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_ascending_order() {
        let mut bin = Bin::new(20);
        assert!(bin.add(Item::new(0, 7)));
        assert!(bin.add(Item::new(1, 3)));
        assert!(bin.add(Item::new(2, 5)));
        assert!(bin.add(Item::new(3, 5)));

        let sizes: Vec<i64> = bin.items().iter().map(|it| it.size).collect();
        assert_eq!(sizes, vec![3, 5, 5, 7]);
        // Equal sizes: the newcomer is placed first
        assert_eq!(bin.items()[1].id, 3);
        assert_eq!(bin.remaining(), 0);
        assert!(bin.is_full());
    }

    #[test]
    fn test_add_rejects_oversized_item() {
        let mut bin = Bin::new(10);
        assert!(bin.add(Item::new(0, 8)));
        assert!(!bin.add(Item::new(1, 3)));
        assert_eq!(bin.remaining(), 2);
        assert_eq!(bin.count(), 1);
    }

    #[test]
    fn test_remove() {
        let mut bin = Bin::new(10);
        bin.add(Item::new(0, 4));
        bin.add(Item::new(1, 2));

        assert!(bin.has(0));
        assert_eq!(bin.size_of(0), 4);
        assert_eq!(bin.size_of(9), 0);
        assert_eq!(bin.item(9), None);

        assert!(bin.remove_by_id(0));
        assert!(!bin.remove_by_id(0));
        assert_eq!(bin.remaining(), 8);

        assert!(!bin.remove_at(3));
        assert!(bin.remove_at(0));
        assert!(bin.is_empty());
        assert_eq!(bin.remaining(), 10);
    }

    #[test]
    fn test_reset() {
        let mut bin = Bin::new(10);
        bin.add(Item::new(0, 10));
        bin.reset();
        assert!(bin.is_empty());
        assert_eq!(bin.remaining(), 10);
        assert_eq!(bin.load(), 0);
    }
}
