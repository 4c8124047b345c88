//! Preference order between two solutions.
//! 
//! Fewer bins always wins. With equal bin counts the candidate wins only if
//! its sum of squared slacks exceeds the current one by more than the
//! acceptance ratio, i.e. slack concentrated in fewer bins is preferred since
//! those bins are the ones likely to be emptied by a later move.

use crate::solution::Solution;

/// Default acceptance ratio on the sum of squared slacks
pub const DEFAULT_ACCEPTANCE_RATIO: f64 = 1.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluator {
    /// Required ratio `candidate / current` of squared slack sums
    pub acceptance_ratio: f64,
}

impl Evaluator {
    pub fn new(acceptance_ratio: f64) -> Self {
        Evaluator { acceptance_ratio }
    }

    /// Whether `candidate` is strictly preferred over `current`
    pub fn is_better(&self, current: &Solution, candidate: &Solution) -> bool {
        if candidate.bin_count() != current.bin_count() {
            return candidate.bin_count() < current.bin_count();
        }

        let current_sum = current.slack_square_sum();
        let candidate_sum = candidate.slack_square_sum();

        if current_sum == 0 {
            // Ratio is +inf for any positive candidate sum, undefined for 0/0
            return candidate_sum > 0;
        }

        candidate_sum as f64 / current_sum as f64 > self.acceptance_ratio
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(DEFAULT_ACCEPTANCE_RATIO)
    }
}
