//! Solution representation and manipulation for the Bin Packing Problem.
//! 
//! A solution is an ordered sequence of bins. Search operators never mutate
//! a solution they borrow: they build a new bin vector and wrap it with
//! [`Solution::with_bins`], so candidates never alias each other.

use crate::bins::Bin;
use crate::instance::Item;
use serde::{Deserialize, Serialize};

/// Represents a solution to the Bin Packing Problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The bins, in their current order
    pub bins: Vec<Bin>,
    /// Capacity of every bin
    pub capacity: i64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new(capacity: i64) -> Self {
        Solution {
            bins: Vec::new(),
            capacity,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from a list of bins
    pub fn from_bins(capacity: i64, bins: Vec<Bin>, algorithm: &str) -> Self {
        Solution {
            bins,
            capacity,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Same metadata, different bins
    pub fn with_bins(&self, bins: Vec<Bin>) -> Self {
        Solution {
            bins,
            capacity: self.capacity,
            algorithm: self.algorithm.clone(),
            computation_time: self.computation_time,
            iterations: self.iterations,
        }
    }

    #[inline]
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn item_count(&self) -> usize {
        self.bins.iter().map(|b| b.count()).sum()
    }

    /// All items, bin by bin
    pub fn items(&self) -> Vec<Item> {
        self.bins.iter().flat_map(|b| b.items().iter().copied()).collect()
    }

    /// Sum of squared remaining capacities, widened so large capacities cannot overflow
    pub fn slack_square_sum(&self) -> i128 {
        self.bins
            .iter()
            .map(|b| {
                let remaining = b.remaining() as i128;
                remaining * remaining
            })
            .sum()
    }

    pub fn total_slack(&self) -> i64 {
        self.bins.iter().map(|b| b.remaining()).sum()
    }

    pub fn full_bins(&self) -> usize {
        self.bins.iter().filter(|b| b.is_full()).count()
    }

    /// Index of the bin holding the item with the given id
    pub fn bin_of(&self, id: usize) -> Option<usize> {
        self.bins.iter().position(|b| b.has(id))
    }

    /// Sort bins by remaining capacity, most empty first (stable)
    pub fn sort_by_remaining(&mut self) {
        self.bins.sort_by(|a, b| b.remaining().cmp(&a.remaining()));
    }

    /// Sorted copy, most empty first
    pub fn sorted_by_remaining(&self) -> Self {
        let mut sorted = self.clone();
        sorted.sort_by_remaining();
        sorted
    }

    /// Item ids of each bin, as handed back to callers
    pub fn assignment(&self) -> Vec<Vec<usize>> {
        self.bins.iter().map(|b| b.item_ids()).collect()
    }

    /// Fill ratio of the whole solution in [0, 1]
    pub fn utilization(&self) -> f64 {
        if self.bins.is_empty() || self.capacity <= 0 {
            return 0.0;
        }
        let used: i64 = self.bins.iter().map(|b| b.load()).sum();
        used as f64 / (self.bins.len() as i64 * self.capacity) as f64
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Bins: {}", self.bin_count())?;
        writeln!(f, "  Full bins: {}", self.full_bins())?;
        writeln!(f, "  Utilization: {:.2}%", self.utilization() * 100.0)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        for (i, bin) in self.bins.iter().enumerate() {
            writeln!(f, "  Bin {}: {}", i, bin)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin_with(capacity: i64, items: &[(usize, i64)]) -> Bin {
        let mut bin = Bin::new(capacity);
        for &(id, size) in items {
            assert!(bin.add(Item::new(id, size)));
        }
        bin
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new(10);
        assert!(sol.bins.is_empty());
        assert_eq!(sol.bin_count(), 0);
        assert_eq!(sol.utilization(), 0.0);
    }

    #[test]
    fn test_sort_by_remaining_is_stable() {
        let bins = vec![
            bin_with(10, &[(0, 9)]),
            bin_with(10, &[(1, 5)]),
            bin_with(10, &[(2, 8)]),
            bin_with(10, &[(3, 5)]),
        ];
        let mut sol = Solution::from_bins(10, bins, "test");
        sol.sort_by_remaining();

        let first_ids: Vec<usize> = sol.bins.iter().map(|b| b.items()[0].id).collect();
        assert_eq!(first_ids, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_slack_measures() {
        let bins = vec![bin_with(10, &[(0, 7)]), bin_with(10, &[(1, 4), (2, 6)])];
        let sol = Solution::from_bins(10, bins, "test");

        assert_eq!(sol.slack_square_sum(), 9);
        assert_eq!(sol.total_slack(), 3);
        assert_eq!(sol.full_bins(), 1);
        assert_eq!(sol.bin_of(2), Some(1));
        assert_eq!(sol.bin_of(5), None);
        assert_eq!(sol.assignment(), vec![vec![0], vec![1, 2]]);
        assert_eq!(sol.item_count(), 3);
    }
}
