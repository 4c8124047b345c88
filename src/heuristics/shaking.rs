//! Random perturbation applied when every neighborhood stalls.

use crate::heuristics::budget::SearchClock;
use crate::heuristics::moves;
use crate::heuristics::vns::VnsConfig;
use crate::solution::Solution;
use log::debug;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Duration;

/// Random 1-1 swaps between bins.
///
/// Picks two random item ids and swaps them if they sit in different bins
/// and both bins stay within capacity. Pairs already attempted are skipped
/// without consuming a try.
#[derive(Debug, Clone)]
pub struct Shaker {
    /// Successful swaps to perform
    pub strength: usize,
    /// Attempts allowed in one shake
    pub max_tries: usize,
    /// Wall-clock limit of one shake
    pub session_limit: Duration,
}

impl Shaker {
    pub fn new(strength: usize, max_tries: usize, session_limit: Duration) -> Self {
        Shaker {
            strength,
            max_tries,
            session_limit,
        }
    }

    /// Perturb `solution`. Returns the shaken copy and the number of swaps
    /// actually performed.
    pub fn shake(
        &self,
        solution: &Solution,
        item_ids: &[usize],
        rng: &mut ChaCha8Rng,
        clock: &SearchClock,
        margin: Duration,
    ) -> (Solution, usize) {
        let mut current = solution.clone();
        let n = item_ids.len();
        if n < 2 {
            return (current, 0);
        }

        let session = clock.session(margin, self.session_limit);
        let pair_count = n * (n - 1) / 2;
        let mut tried: HashSet<(usize, usize)> = HashSet::new();
        let mut swaps = 0;
        let mut tries = 0;

        while swaps < self.strength && tries < self.max_tries && tried.len() < pair_count {
            if session.expired() {
                break;
            }

            let first = rng.gen_range(0..n);
            let second = rng.gen_range(0..n);
            if first == second {
                continue;
            }
            if !tried.insert((first.min(second), first.max(second))) {
                continue;
            }
            tries += 1;

            if let Some(bins) =
                moves::swap_items_by_id(&current.bins, &[item_ids[first]], &[item_ids[second]])
            {
                current.bins = bins;
                swaps += 1;
            }
        }

        debug!("Shaking: {} swaps in {} tries", swaps, tries);
        (current, swaps)
    }
}

impl Default for Shaker {
    fn default() -> Self {
        let config = VnsConfig::default();
        Shaker::new(config.shaking_strength, config.shaking_max_tries, config.shaking_session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::construction::best_fit;
    use crate::instance::Item;
    use crate::integrity;

    fn items(sizes: &[i64]) -> Vec<Item> {
        sizes
            .iter()
            .enumerate()
            .map(|(id, &size)| Item::new(id, size))
            .collect()
    }

    fn ids(items: &[Item]) -> Vec<usize> {
        items.iter().map(|it| it.id).collect()
    }

    #[test]
    fn test_shake_keeps_partition() {
        let items = items(&[5, 4, 3, 3, 2, 2, 1, 6, 7, 2]);
        let solution = Solution::from_bins(10, best_fit(&items, 10), "BestFit");
        let clock = SearchClock::start(Duration::from_secs(60));
        let mut rng = ChaCha8Rng::seed_from_u64(39);

        let (shaken, swaps) =
            Shaker::default().shake(&solution, &ids(&items), &mut rng, &clock, Duration::ZERO);

        assert!(swaps <= 4);
        assert_eq!(shaken.bin_count(), solution.bin_count());
        assert!(integrity::check(&shaken, &items).is_ok());
    }

    #[test]
    fn test_shake_is_reproducible() {
        let items = items(&[5, 4, 3, 3, 2, 2, 1, 6, 7, 2]);
        let solution = Solution::from_bins(10, best_fit(&items, 10), "BestFit");
        let clock = SearchClock::start(Duration::from_secs(60));
        let shaker = Shaker::default();

        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);
        let (a, _) = shaker.shake(&solution, &ids(&items), &mut rng_a, &clock, Duration::ZERO);
        let (b, _) = shaker.shake(&solution, &ids(&items), &mut rng_b, &clock, Duration::ZERO);

        assert_eq!(a.bins, b.bins);
    }

    #[test]
    fn test_single_bin_cannot_be_shaken() {
        // Every pair sits in the same bin: all pairs get tried, none swapped
        let items = items(&[1, 2, 3]);
        let solution = Solution::from_bins(10, best_fit(&items, 10), "BestFit");
        let clock = SearchClock::start(Duration::from_secs(60));
        let mut rng = ChaCha8Rng::seed_from_u64(39);

        let (shaken, swaps) =
            Shaker::default().shake(&solution, &ids(&items), &mut rng, &clock, Duration::ZERO);

        assert_eq!(swaps, 0);
        assert_eq!(shaken.bins, solution.bins);
    }

    #[test]
    fn test_too_few_items() {
        let items = items(&[4]);
        let solution = Solution::from_bins(10, best_fit(&items, 10), "BestFit");
        let clock = SearchClock::start(Duration::from_secs(60));
        let mut rng = ChaCha8Rng::seed_from_u64(39);

        let (_, swaps) =
            Shaker::default().shake(&solution, &ids(&items), &mut rng, &clock, Duration::ZERO);
        assert_eq!(swaps, 0);
    }

    #[test]
    fn test_expired_clock_skips_shaking() {
        let items = items(&[6, 6, 6, 6]);
        let solution = Solution::from_bins(10, best_fit(&items, 10), "BestFit");
        let clock = SearchClock::start(Duration::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(39);

        let (shaken, swaps) =
            Shaker::default().shake(&solution, &ids(&items), &mut rng, &clock, Duration::ZERO);
        assert_eq!(swaps, 0);
        assert_eq!(shaken.bins, solution.bins);
    }

    #[test]
    fn test_default_follows_search_config() {
        let config = VnsConfig::default().with_shaking(6, 100);
        let shaker = Shaker::new(config.shaking_strength, config.shaking_max_tries, config.shaking_session);
        assert_eq!(shaker.strength, 6);
        assert_eq!(shaker.max_tries, 100);

        let default = Shaker::default();
        let config = VnsConfig::default();
        assert_eq!(default.session_limit, config.shaking_session);
        assert_eq!(default.strength, config.shaking_strength);
    }

    #[test]
    fn test_zero_session_limit_skips_shaking() {
        let items = items(&[6, 6, 6, 6]);
        let solution = Solution::from_bins(10, best_fit(&items, 10), "BestFit");
        let clock = SearchClock::start(Duration::from_secs(60));
        let mut rng = ChaCha8Rng::seed_from_u64(39);

        let shaker = Shaker::new(4, 2000, Duration::ZERO);
        let (shaken, swaps) = shaker.shake(&solution, &ids(&items), &mut rng, &clock, Duration::ZERO);
        assert_eq!(swaps, 0);
        assert_eq!(shaken.bins, solution.bins);
    }
}
