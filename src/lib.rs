//! Bin Packing Solver Library
//! 
//! A solver for the one-dimensional Bin Packing Problem: pack items of
//! positive size into the fewest bins of a fixed capacity.
//! 
//! # Features
//! 
//! - Construction heuristics (Best Fit Decreasing, Minimum Bin Slack)
//! - Variable Neighborhood Search with six neighborhoods and random shaking
//! - Integrity checks with a fallback chain (search, construction, Best Fit)
//! - Batch runs, solution reports and SVG visualization
//! 
//! # Example
//! 
//! ```no_run
//! use bpp_vns_solver::instance::BppInstance;
//! use bpp_vns_solver::heuristics::vns::{VariableNeighborhoodSearch, VnsConfig};
//! use std::time::Duration;
//! 
//! // Load instances
//! let instances = BppInstance::from_file("binpack1.txt").unwrap();
//! 
//! // Solve the first one
//! let config = VnsConfig::default().with_time_limit(Duration::from_secs(10));
//! let vns = VariableNeighborhoodSearch::new(config);
//! let report = vns.run(&instances[0]);
//! 
//! println!("Bins: {} (best known {})", report.solution.bin_count(), instances[0].best_known_bins);
//! ```

pub mod instance;
pub mod bins;
pub mod solution;
pub mod evaluation;
pub mod integrity;
pub mod heuristics;
pub mod benchmark;
pub mod report;
pub mod visualization;

pub use bins::Bin;
pub use instance::{BppInstance, Item};
pub use solution::Solution;

use heuristics::vns::{VariableNeighborhoodSearch, VnsConfig};
use std::time::Duration;

/// Pack `items` into bins of `capacity` within `time_budget`.
///
/// The search stops early once `best_known_bins` is reached. Items keep
/// their ids; the returned bins always hold exactly the given items unless
/// some item is larger than `capacity`.
pub fn solve(items: &[Item], capacity: i64, best_known_bins: usize, time_budget: Duration) -> Vec<Bin> {
    let instance = BppInstance::from_items("instance", capacity, best_known_bins, items.to_vec());
    let config = VnsConfig::default().with_time_limit(time_budget);

    VariableNeighborhoodSearch::new(config).run(&instance).solution.bins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_keeps_ids() {
        let items = vec![Item::new(10, 6), Item::new(20, 4), Item::new(30, 5), Item::new(40, 5)];
        let bins = solve(&items, 10, 2, Duration::from_secs(3));

        assert_eq!(bins.len(), 2);
        let mut ids: Vec<usize> = bins.iter().flat_map(|b| b.item_ids()).collect();
        ids.sort();
        assert_eq!(ids, vec![10, 20, 30, 40]);
    }
}
