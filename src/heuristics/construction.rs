use crate::bins::Bin;
use crate::evaluation::Evaluator;
use crate::instance::{BppInstance, Item};
use crate::solution::Solution;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &BppInstance) -> Solution;
    fn name(&self) -> &str;
}

/// Sort items by descending size. Stable, so equal sizes keep their order.
pub fn sort_items_descending(items: &[Item]) -> Vec<Item> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| b.size.cmp(&a.size));
    sorted
}

/// Index of the open bin with the least remaining capacity that still fits `size`.
/// The first such bin in scan order wins ties.
pub fn find_best_bin(bins: &[Bin], size: i64) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (index, bin) in bins.iter().enumerate() {
        if bin.remaining() < size {
            continue;
        }
        match best {
            Some(b) if bins[b].remaining() <= bin.remaining() => {}
            _ => best = Some(index),
        }
    }

    best
}

/// Best Fit Decreasing over a list of items
pub fn best_fit(items: &[Item], capacity: i64) -> Vec<Bin> {
    let mut bins: Vec<Bin> = Vec::new();

    for item in sort_items_descending(items) {
        match find_best_bin(&bins, item.size) {
            Some(index) => {
                bins[index].add(item);
            }
            None => {
                let mut bin = Bin::new(capacity);
                if bin.add(item) {
                    bins.push(bin);
                } else {
                    log::error!("Item {} of size {} does not fit an empty bin of capacity {}",
                        item.id, item.size, capacity);
                }
            }
        }
    }

    bins
}

/// Keep full bins untouched and repack the items of all other bins with Best Fit
pub fn best_fit_on_bins(bins: &[Bin], capacity: i64) -> Vec<Bin> {
    let (full, open): (Vec<&Bin>, Vec<&Bin>) = bins.iter().partition(|b| b.is_full());

    let pooled: Vec<Item> = open
        .iter()
        .flat_map(|b| b.items().iter().copied())
        .collect();

    let mut result: Vec<Bin> = full.into_iter().cloned().collect();
    result.extend(best_fit(&pooled, capacity));
    result
}

/// Minimum Bin Slack: fill one bin at a time, as full as a bounded backtracking
/// search over the pending items can make it.
pub fn minimum_bin_slack(items: &[Item], capacity: i64) -> Vec<Bin> {
    let mut bins: Vec<Bin> = Vec::new();
    let mut pending = sort_items_descending(items);

    while !pending.is_empty() {
        let mut working = Bin::new(capacity);
        let mut best = Bin::new(capacity);
        // Items pulled out of the working bin while backtracking
        let mut tried: Vec<Item> = Vec::new();

        while !pending.is_empty() {
            let mut i = 0;
            while i < pending.len() {
                if working.add(pending[i]) {
                    pending.remove(i);
                } else {
                    i += 1;
                }
            }

            if working.is_empty() {
                break;
            }

            if best.is_empty() || working.remaining() < best.remaining() {
                best = working.clone();
            }
            if best.is_full() {
                break;
            }

            // Backtrack on the largest item of the working bin
            let last = working.count() - 1;
            tried.push(working.items()[last]);
            working.remove_at(last);
        }

        if best.is_empty() {
            log::error!("{} item(s) cannot be placed in a bin of capacity {}",
                pending.len() + tried.len() + working.count(), capacity);
            break;
        }

        tried.extend_from_slice(working.items());
        tried.append(&mut pending);
        pending = sort_items_descending(&tried);

        for item in best.items() {
            if let Some(pos) = pending.iter().position(|p| p.id == item.id) {
                pending.remove(pos);
            }
        }

        bins.push(best);
    }

    bins
}

/// Best Fit Decreasing heuristic
pub struct BestFitHeuristic;

impl BestFitHeuristic {
    pub fn new() -> Self {
        BestFitHeuristic
    }
}

impl Default for BestFitHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for BestFitHeuristic {
    fn construct(&self, instance: &BppInstance) -> Solution {
        let start = std::time::Instant::now();
        let bins = best_fit(&instance.items, instance.capacity);

        let mut solution = Solution::from_bins(instance.capacity, bins, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "BestFit"
    }
}

/// Minimum Bin Slack heuristic
/// 
/// Slower than Best Fit but usually within a bin or two of the best known
/// count, which makes it the starting point of the VNS.
pub struct MinimumBinSlackHeuristic {
    /// Decides between the raw MBS bins and their Best Fit repacking
    pub evaluator: Evaluator,
}

impl MinimumBinSlackHeuristic {
    pub fn new() -> Self {
        MinimumBinSlackHeuristic {
            evaluator: Evaluator::default(),
        }
    }

    pub fn with_evaluator(evaluator: Evaluator) -> Self {
        MinimumBinSlackHeuristic { evaluator }
    }
}

impl Default for MinimumBinSlackHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for MinimumBinSlackHeuristic {
    fn construct(&self, instance: &BppInstance) -> Solution {
        let start = std::time::Instant::now();

        let bins = minimum_bin_slack(&instance.items, instance.capacity);
        let polished = best_fit_on_bins(&bins, instance.capacity);

        let raw = Solution::from_bins(instance.capacity, bins, self.name());
        let polished = Solution::from_bins(instance.capacity, polished, self.name());

        let mut solution = if self.evaluator.is_better(&raw, &polished) {
            log::debug!("Best Fit repacking improved MBS: {} -> {} bins",
                raw.bin_count(), polished.bin_count());
            polished
        } else {
            raw
        };

        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "MinimumBinSlack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity;

    fn sizes_of(bins: &[Bin]) -> Vec<Vec<i64>> {
        bins.iter()
            .map(|b| b.items().iter().map(|it| it.size).collect())
            .collect()
    }

    fn create_test_instance() -> BppInstance {
        BppInstance::new("test", 10, 3, &[4, 8, 5, 3])
    }

    #[test]
    fn test_best_fit_example() {
        let instance = create_test_instance();
        let solution = BestFitHeuristic::new().construct(&instance);

        assert_eq!(solution.bin_count(), 3);
        assert_eq!(sizes_of(&solution.bins), vec![vec![8], vec![4, 5], vec![3]]);
        assert_eq!(solution.bins[1].item_ids(), vec![0, 2]);
        assert!(integrity::check(&solution, &instance.items).is_ok());
    }

    #[test]
    fn test_best_fit_prefers_tightest_bin() {
        // After 6 and 5 open two bins (slack 4 and 5), item 4 goes to the tighter one
        let bins = best_fit(&[Item::new(0, 6), Item::new(1, 5), Item::new(2, 4)], 10);
        assert_eq!(sizes_of(&bins), vec![vec![4, 6], vec![5]]);
    }

    #[test]
    fn test_find_best_bin_tie_breaks_on_scan_order() {
        let mut a = Bin::new(10);
        a.add(Item::new(0, 6));
        let mut b = Bin::new(10);
        b.add(Item::new(1, 6));
        let bins = vec![a, b];

        assert_eq!(find_best_bin(&bins, 4), Some(0));
        assert_eq!(find_best_bin(&bins, 5), None);
    }

    #[test]
    fn test_best_fit_is_deterministic() {
        let instance = BppInstance::new("det", 100, 0, &[42, 17, 63, 8, 55, 29, 71, 33, 12, 50]);
        let first = BestFitHeuristic::new().construct(&instance);
        let second = BestFitHeuristic::new().construct(&instance);

        assert_eq!(first.bins, second.bins);
    }

    #[test]
    fn test_best_fit_on_bins_keeps_full_bins() {
        let mut full = Bin::new(10);
        full.add(Item::new(0, 3));
        full.add(Item::new(1, 7));
        let mut open_a = Bin::new(10);
        open_a.add(Item::new(2, 4));
        let mut open_b = Bin::new(10);
        open_b.add(Item::new(3, 6));

        let result = best_fit_on_bins(&[open_a, full.clone(), open_b], 10);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0], full);
        assert_eq!(sizes_of(&result[1..]), vec![vec![4, 6]]);
    }

    #[test]
    fn test_best_fit_on_bins_idempotent() {
        let instance = create_test_instance();
        let once = best_fit(&instance.items, instance.capacity);
        let twice = best_fit_on_bins(&once, instance.capacity);
        let thrice = best_fit_on_bins(&twice, instance.capacity);

        assert_eq!(once, twice);
        assert_eq!(twice, thrice);
    }

    #[test]
    fn test_minimum_bin_slack_finds_full_bins() {
        let instance = BppInstance::new("mbs", 10, 2, &[7, 5, 5, 3]);
        let solution = MinimumBinSlackHeuristic::new().construct(&instance);

        assert_eq!(solution.bin_count(), 2);
        assert!(solution.bins.iter().all(|b| b.is_full()));
        assert!(integrity::check(&solution, &instance.items).is_ok());
    }

    #[test]
    fn test_minimum_bin_slack_backtracks() {
        // Descending scan packs 6+3 (slack 1); dropping 6 allows 5+3+2 (slack 0)
        let bins = minimum_bin_slack(
            &[Item::new(0, 6), Item::new(1, 5), Item::new(2, 3), Item::new(3, 2)],
            10,
        );

        assert_eq!(sizes_of(&bins)[0], vec![2, 3, 5]);
        assert!(bins[0].is_full());
        assert_eq!(sizes_of(&bins)[1], vec![6]);
    }

    #[test]
    fn test_items_equal_to_capacity() {
        let instance = BppInstance::new("eq", 10, 5, &[10, 10, 10, 10, 10]);

        let bf = BestFitHeuristic::new().construct(&instance);
        let mbs = MinimumBinSlackHeuristic::new().construct(&instance);

        assert_eq!(bf.bin_count(), 5);
        assert_eq!(mbs.bin_count(), 5);
        assert!(integrity::check(&mbs, &instance.items).is_ok());
    }

    #[test]
    fn test_unplaceable_item_is_left_out() {
        let instance = BppInstance::new("big", 10, 1, &[4, 12]);

        let bf = BestFitHeuristic::new().construct(&instance);
        let mbs = MinimumBinSlackHeuristic::new().construct(&instance);

        assert_eq!(bf.item_count(), 1);
        assert_eq!(mbs.item_count(), 1);
        assert!(integrity::check(&mbs, &instance.items).is_err());
    }

    #[test]
    fn test_empty_instance() {
        let instance = BppInstance::new("empty", 10, 0, &[]);
        assert_eq!(BestFitHeuristic::new().construct(&instance).bin_count(), 0);
        assert_eq!(MinimumBinSlackHeuristic::new().construct(&instance).bin_count(), 0);
    }
}
