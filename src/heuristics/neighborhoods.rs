//! Neighborhood operators of the variable neighborhood search.
//! 
//! This module implements the six move families, from cheapest to most
//! aggressive:
//! - 1-1-1 reshuffle across three bins
//! - bin evacuation
//! - 1-1 swap
//! - 1-2 swap
//! - 2-2 swap
//! - 1-n consolidation
//!
//! All of them are first improvement: the first candidate the evaluator
//! prefers over the input replaces it. An expired session leaves the input
//! untouched.

use crate::bins::Bin;
use crate::evaluation::Evaluator;
use crate::heuristics::budget::{SearchClock, Session};
use crate::heuristics::moves;
use crate::solution::Solution;
use std::time::Duration;

/// What an operator needs from the running search
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub evaluator: &'a Evaluator,
    pub clock: &'a SearchClock,
    /// Safety margin before the global time limit
    pub operator_margin: Duration,
}

impl<'a> SearchContext<'a> {
    pub fn new(evaluator: &'a Evaluator, clock: &'a SearchClock, operator_margin: Duration) -> Self {
        SearchContext {
            evaluator,
            clock,
            operator_margin,
        }
    }

    fn session(&self, limit: Duration) -> Session<'a> {
        self.clock.session(self.operator_margin, limit)
    }

    /// Replace `solution` with the candidate bins if they are strictly better
    fn accept(&self, solution: &mut Solution, bins: Vec<Bin>) -> bool {
        let candidate = solution.with_bins(bins);
        if self.evaluator.is_better(solution, &candidate) {
            *solution = candidate;
            true
        } else {
            false
        }
    }
}

/// Trait for neighborhood improvement operators
pub trait Neighborhood {
    fn improve(&self, solution: &mut Solution, ctx: &SearchContext<'_>) -> bool;
    fn name(&self) -> &str;
}

pub const LONG_SESSION: Duration = Duration::from_secs(5);
pub const SHORT_SESSION: Duration = Duration::from_secs(3);

/// 1-1-1 reshuffle
///
/// Bins are sorted most empty first; for every triple `i < j < k` of non-full
/// bins the first feasible three-bin rotation is evaluated.
pub struct TripleCycleSearch {
    pub session_limit: Duration,
}

impl TripleCycleSearch {
    pub fn new() -> Self {
        TripleCycleSearch {
            session_limit: LONG_SESSION,
        }
    }
}

impl Default for TripleCycleSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighborhood for TripleCycleSearch {
    fn improve(&self, solution: &mut Solution, ctx: &SearchContext<'_>) -> bool {
        let session = ctx.session(self.session_limit);
        let sorted = solution.sorted_by_remaining();
        let n = sorted.bin_count();

        for i in 0..n {
            for j in i + 1..n {
                for k in j + 1..n {
                    if session.expired() {
                        return false;
                    }

                    let bins = &sorted.bins;
                    if bins[i].is_full() || bins[j].is_full() || bins[k].is_full() {
                        continue;
                    }

                    if let Some(next) = moves::cycle_three(bins, [i, j, k]) {
                        if ctx.accept(solution, next) {
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    fn name(&self) -> &str {
        "TripleCycle"
    }
}

/// Empty one bin into the others
pub struct EvacuateBinSearch {
    pub session_limit: Duration,
}

impl EvacuateBinSearch {
    pub fn new() -> Self {
        EvacuateBinSearch {
            session_limit: LONG_SESSION,
        }
    }
}

impl Default for EvacuateBinSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighborhood for EvacuateBinSearch {
    fn improve(&self, solution: &mut Solution, ctx: &SearchContext<'_>) -> bool {
        let session = ctx.session(self.session_limit);

        for from in 0..solution.bin_count() {
            if session.expired() {
                return false;
            }

            let next = moves::evacuate(&solution.bins, from);
            if ctx.accept(solution, next) {
                return true;
            }
        }

        false
    }

    fn name(&self) -> &str {
        "EvacuateBin"
    }
}

/// 1-1 swap between bins `a < b`
pub struct SwapOneOneSearch {
    pub session_limit: Duration,
}

impl SwapOneOneSearch {
    pub fn new() -> Self {
        SwapOneOneSearch {
            session_limit: SHORT_SESSION,
        }
    }
}

impl Default for SwapOneOneSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighborhood for SwapOneOneSearch {
    fn improve(&self, solution: &mut Solution, ctx: &SearchContext<'_>) -> bool {
        let session = ctx.session(self.session_limit);
        let n = solution.bin_count();

        for a in 0..n {
            for b in a + 1..n {
                for pa in 0..solution.bins[a].count() {
                    for pb in 0..solution.bins[b].count() {
                        if session.expired() {
                            return false;
                        }

                        if let Some(next) = moves::swap_groups(&solution.bins, a, &[pa], b, &[pb]) {
                            if ctx.accept(solution, next) {
                                return true;
                            }
                        }
                    }
                }
            }
        }

        false
    }

    fn name(&self) -> &str {
        "SwapOneOne"
    }
}

/// One item of bin A against two items of bin B
pub struct SwapOneTwoSearch {
    pub session_limit: Duration,
}

impl SwapOneTwoSearch {
    pub fn new() -> Self {
        SwapOneTwoSearch {
            session_limit: SHORT_SESSION,
        }
    }
}

impl Default for SwapOneTwoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighborhood for SwapOneTwoSearch {
    fn improve(&self, solution: &mut Solution, ctx: &SearchContext<'_>) -> bool {
        let session = ctx.session(self.session_limit);
        let n = solution.bin_count();

        for a in 0..n {
            for b in 0..n {
                if session.expired() {
                    return false;
                }
                if a == b {
                    continue;
                }

                let (count_a, count_b) = (solution.bins[a].count(), solution.bins[b].count());
                for pa in 0..count_a {
                    for pb1 in 0..count_b {
                        for pb2 in pb1 + 1..count_b {
                            let Some(next) =
                                moves::swap_groups(&solution.bins, a, &[pa], b, &[pb1, pb2])
                            else {
                                continue;
                            };
                            if ctx.accept(solution, next) {
                                return true;
                            }
                        }
                    }
                }
            }
        }

        false
    }

    fn name(&self) -> &str {
        "SwapOneTwo"
    }
}

/// Two items of bin A against two items of bin B
pub struct SwapTwoTwoSearch {
    pub session_limit: Duration,
}

impl SwapTwoTwoSearch {
    pub fn new() -> Self {
        SwapTwoTwoSearch {
            session_limit: SHORT_SESSION,
        }
    }
}

impl Default for SwapTwoTwoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighborhood for SwapTwoTwoSearch {
    fn improve(&self, solution: &mut Solution, ctx: &SearchContext<'_>) -> bool {
        let session = ctx.session(self.session_limit);
        let n = solution.bin_count();

        for a in 0..n {
            for b in 0..n {
                if session.expired() {
                    return false;
                }
                if a == b {
                    continue;
                }

                let (count_a, count_b) = (solution.bins[a].count(), solution.bins[b].count());
                for pa1 in 0..count_a {
                    for pa2 in pa1 + 1..count_a {
                        for pb1 in 0..count_b {
                            for pb2 in pb1 + 1..count_b {
                                let Some(next) = moves::swap_groups(
                                    &solution.bins,
                                    a,
                                    &[pa1, pa2],
                                    b,
                                    &[pb1, pb2],
                                ) else {
                                    continue;
                                };
                                if ctx.accept(solution, next) {
                                    return true;
                                }
                            }
                        }
                    }
                }
            }
        }

        false
    }

    fn name(&self) -> &str {
        "SwapTwoTwo"
    }
}

/// 1-n consolidation
///
/// Bins are sorted most empty first. Each non-full donor trades one item for
/// a group of smaller items taken from a fuller receiver, scanning receivers
/// from the fullest end down to the bin right after the donor.
pub struct ConsolidationSearch {
    pub session_limit: Duration,
}

impl ConsolidationSearch {
    pub fn new() -> Self {
        ConsolidationSearch {
            session_limit: SHORT_SESSION,
        }
    }
}

impl Default for ConsolidationSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Neighborhood for ConsolidationSearch {
    fn improve(&self, solution: &mut Solution, ctx: &SearchContext<'_>) -> bool {
        let session = ctx.session(self.session_limit);
        let sorted = solution.sorted_by_remaining();
        let n = sorted.bin_count();
        let full_start = sorted.bins.iter().position(|b| b.is_full()).unwrap_or(n);

        for donor in 0..full_start {
            for receiver in (donor + 1..n).rev() {
                if session.expired() {
                    return false;
                }

                if let Some(next) = moves::exchange_one_for_group(&sorted.bins, donor, receiver) {
                    if ctx.accept(solution, next) {
                        return true;
                    }
                }
            }
        }

        false
    }

    fn name(&self) -> &str {
        "Consolidation"
    }
}

/// The six operators in search order
pub fn standard_neighborhoods() -> Vec<Box<dyn Neighborhood + Send + Sync>> {
    neighborhoods_with_sessions(LONG_SESSION, SHORT_SESSION)
}

/// The six operators, the first two bounded by `long`, the others by `short`
pub fn neighborhoods_with_sessions(
    long: Duration,
    short: Duration,
) -> Vec<Box<dyn Neighborhood + Send + Sync>> {
    vec![
        Box::new(TripleCycleSearch { session_limit: long }),
        Box::new(EvacuateBinSearch { session_limit: long }),
        Box::new(SwapOneOneSearch { session_limit: short }),
        Box::new(SwapOneTwoSearch { session_limit: short }),
        Box::new(SwapTwoTwoSearch { session_limit: short }),
        Box::new(ConsolidationSearch { session_limit: short }),
    ]
}
