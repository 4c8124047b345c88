//! Module for parsing and representing Bin Packing instances.
//! 
//! A problem file bundles several instances. It is read as a stream of
//! whitespace-separated tokens: the number of instances, then for each instance
//! its identifier, the bin capacity, the number of items, the best known number
//! of bins, and finally one size per item. Item ids are 0-based positions.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// An item to be packed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier (position in the instance)
    pub id: usize,
    /// Item size, strictly positive
    pub size: i64,
}

impl Item {
    pub fn new(id: usize, size: i64) -> Self {
        Item { id, size }
    }
}

/// Represents a complete Bin Packing instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BppInstance {
    /// Name of the instance (e.g. `u120_00`)
    pub name: String,
    /// Capacity shared by every bin
    pub capacity: i64,
    /// Best known number of bins, used as an early stop target
    pub best_known_bins: usize,
    /// Items to pack, indexed by id
    pub items: Vec<Item>,
}

impl BppInstance {
    pub fn new(name: &str, capacity: i64, best_known_bins: usize, sizes: &[i64]) -> Self {
        let items = sizes
            .iter()
            .enumerate()
            .map(|(id, &size)| Item::new(id, size))
            .collect();

        BppInstance {
            name: name.to_string(),
            capacity,
            best_known_bins,
            items,
        }
    }

    /// Instance over items that already carry their ids
    pub fn from_items(name: &str, capacity: i64, best_known_bins: usize, items: Vec<Item>) -> Self {
        BppInstance {
            name: name.to_string(),
            capacity,
            best_known_bins,
            items,
        }
    }

    /// Parse every instance of a problem file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, String> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Cannot open file: {}", e))?;
        Self::parse_all(&content)
    }

    /// Parse every instance from the textual problem format
    pub fn parse_all(content: &str) -> Result<Vec<Self>, String> {
        let mut tokens = content.split_whitespace();

        let count: usize = next_token(&mut tokens, "instance count")?
            .parse()
            .map_err(|_| "Invalid instance count")?;

        let mut instances = Vec::new();

        for _ in 0..count {
            let name = next_token(&mut tokens, "instance id")?.to_string();
            let capacity: i64 = next_token(&mut tokens, "capacity")?
                .parse()
                .map_err(|_| format!("Invalid capacity in instance {}", name))?;
            let num_items: usize = next_token(&mut tokens, "item count")?
                .parse()
                .map_err(|_| format!("Invalid item count in instance {}", name))?;
            let best_known_bins: usize = next_token(&mut tokens, "best known bins")?
                .parse()
                .map_err(|_| format!("Invalid best known bins in instance {}", name))?;

            let mut sizes = Vec::new();
            for _ in 0..num_items {
                let size: i64 = next_token(&mut tokens, "item size")?
                    .parse()
                    .map_err(|_| format!("Invalid item size in instance {}", name))?;
                sizes.push(size);
            }

            instances.push(BppInstance::new(&name, capacity, best_known_bins, &sizes));
        }

        Ok(instances)
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Sum of all item sizes
    pub fn total_size(&self) -> i64 {
        self.items.iter().map(|item| item.size).sum()
    }

    /// Trivial L1 lower bound: ceil(total size / capacity)
    pub fn lower_bound(&self) -> usize {
        if self.capacity <= 0 {
            return 0;
        }
        let total = self.total_size();
        ((total + self.capacity - 1) / self.capacity) as usize
    }

    /// Check the preconditions the solver relies on but never enforces itself
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity <= 0 {
            return Err(format!("Instance {}: capacity must be positive", self.name));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.size <= 0 {
                return Err(format!("Instance {}: item {} has non-positive size {}", self.name, item.id, item.size));
            }
            if item.size > self.capacity {
                return Err(format!(
                    "Instance {}: item {} of size {} exceeds capacity {}",
                    self.name, item.id, item.size, self.capacity
                ));
            }
            if !seen.insert(item.id) {
                return Err(format!("Instance {}: duplicate item id {}", self.name, item.id));
            }
        }

        Ok(())
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let min_size = self.items.iter().map(|item| item.size).min().unwrap_or(0);
        let max_size = self.items.iter().map(|item| item.size).max().unwrap_or(0);
        let total_size = self.total_size();
        let avg_size = if self.items.is_empty() {
            0.0
        } else {
            total_size as f64 / self.items.len() as f64
        };

        InstanceStatistics {
            name: self.name.clone(),
            num_items: self.items.len(),
            capacity: self.capacity,
            best_known_bins: self.best_known_bins,
            lower_bound: self.lower_bound(),
            total_size,
            min_size,
            max_size,
            avg_size,
        }
    }
}

fn next_token<'a>(tokens: &mut std::str::SplitWhitespace<'a>, what: &str) -> Result<&'a str, String> {
    tokens
        .next()
        .ok_or_else(|| format!("Unexpected end of file while reading {}", what))
}

/// Statistics about a Bin Packing instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_items: usize,
    pub capacity: i64,
    pub best_known_bins: usize,
    pub lower_bound: usize,
    pub total_size: i64,
    pub min_size: i64,
    pub max_size: i64,
    pub avg_size: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Items: {}", self.num_items)?;
        writeln!(f, "  Capacity: {}", self.capacity)?;
        writeln!(f, "  Best known bins: {}", self.best_known_bins)?;
        writeln!(f, "  L1 lower bound: {}", self.lower_bound)?;
        writeln!(f, "  Total size: {}", self.total_size)?;
        writeln!(f, "  Item size range: [{}, {}]", self.min_size, self.max_size)?;
        writeln!(f, "  Avg item size: {:.2} ({:.2}% of capacity)",
            self.avg_size,
            if self.capacity > 0 { self.avg_size / self.capacity as f64 * 100.0 } else { 0.0 })
    }
}
