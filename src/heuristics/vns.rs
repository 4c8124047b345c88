//! Variable Neighborhood Search for the Bin Packing Problem.
//! 
//! The search starts from the Minimum Bin Slack solution and cycles through
//! the six neighborhoods, restarting from the first one on every
//! improvement. When all of them stall, the best solution is shaken and the
//! cycle starts again. The run stops on the time limit or as soon as the best
//! known number of bins is reached.
//!
//! Every intermediate solution is checked against the original items. A
//! corrupted working solution is replaced by the initial one; a corrupted
//! final answer falls back to the initial solution, then to Best Fit.

use crate::evaluation::{Evaluator, DEFAULT_ACCEPTANCE_RATIO};
use crate::heuristics::budget::SearchClock;
use crate::heuristics::construction::{
    BestFitHeuristic, ConstructionHeuristic, MinimumBinSlackHeuristic,
};
use crate::heuristics::neighborhoods::{neighborhoods_with_sessions, Neighborhood, SearchContext};
use crate::heuristics::shaking::Shaker;
use crate::instance::BppInstance;
use crate::integrity::{self, IntegrityError};
use crate::solution::Solution;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// VNS configuration
#[derive(Debug, Clone)]
pub struct VnsConfig {
    /// Wall-clock budget of one run
    pub time_limit: Duration,
    /// The run stops once `time_limit - termination_margin` has elapsed
    pub termination_margin: Duration,
    /// Operators and shaking stop at `time_limit - operator_margin`
    pub operator_margin: Duration,
    /// Session limit of the reshuffle and evacuation neighborhoods
    pub long_session: Duration,
    /// Session limit of the swap and consolidation neighborhoods
    pub short_session: Duration,
    /// Session limit of one shake
    pub shaking_session: Duration,
    /// Successful swaps per shake
    pub shaking_strength: usize,
    /// Attempts per shake
    pub shaking_max_tries: usize,
    /// Squared slack ratio required to accept an equal bin count
    pub acceptance_ratio: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for VnsConfig {
    fn default() -> Self {
        VnsConfig {
            time_limit: Duration::from_secs(10),
            termination_margin: Duration::from_secs(2),
            operator_margin: Duration::from_secs(1),
            long_session: Duration::from_secs(5),
            short_session: Duration::from_secs(3),
            shaking_session: Duration::from_secs(5),
            shaking_strength: 4,
            shaking_max_tries: 2000,
            acceptance_ratio: DEFAULT_ACCEPTANCE_RATIO,
            seed: 39,
        }
    }
}

impl VnsConfig {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets both safety margins
    pub fn with_margins(mut self, termination: Duration, operator: Duration) -> Self {
        self.termination_margin = termination;
        self.operator_margin = operator;
        self
    }

    pub fn with_shaking(mut self, strength: usize, max_tries: usize) -> Self {
        self.shaking_strength = strength;
        self.shaking_max_tries = max_tries;
        self
    }

    pub fn with_acceptance_ratio(mut self, ratio: f64) -> Self {
        self.acceptance_ratio = ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Why the search result could not be returned as is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The construction heuristic did not produce a valid partition
    InvalidInitial(IntegrityError),
    /// The best solution found by the search is corrupted
    CorruptedBest(IntegrityError),
}

impl std::fmt::Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveError::InvalidInitial(e) => write!(f, "Initial solution is invalid: {}", e),
            SolveError::CorruptedBest(e) => write!(f, "Best solution is corrupted: {}", e),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::InvalidInitial(e) | SolveError::CorruptedBest(e) => Some(e),
        }
    }
}

/// Which step of the fallback chain produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionOrigin {
    Search,
    Construction,
    BestFit,
}

impl std::fmt::Display for SolutionOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SolutionOrigin::Search => "VNS",
            SolutionOrigin::Construction => "MBS",
            SolutionOrigin::BestFit => "BestFit",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub solution: Solution,
    pub origin: SolutionOrigin,
    /// Bins of the Minimum Bin Slack starting point
    pub initial_bins: usize,
    /// Improving neighborhood moves
    pub moves: usize,
    /// Shakes performed
    pub shakes: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct SearchStats {
    moves: usize,
    shakes: usize,
}

/// Variable Neighborhood Search
pub struct VariableNeighborhoodSearch {
    config: VnsConfig,
    evaluator: Evaluator,
    neighborhoods: Vec<Box<dyn Neighborhood + Send + Sync>>,
    shaker: Shaker,
}

impl VariableNeighborhoodSearch {
    pub fn new(config: VnsConfig) -> Self {
        let neighborhoods = neighborhoods_with_sessions(config.long_session, config.short_session);
        Self::with_neighborhoods(config, neighborhoods)
    }

    /// Search over a custom neighborhood list, tried in the given order
    pub fn with_neighborhoods(
        config: VnsConfig,
        neighborhoods: Vec<Box<dyn Neighborhood + Send + Sync>>,
    ) -> Self {
        let evaluator = Evaluator::new(config.acceptance_ratio);
        let shaker = Shaker::new(
            config.shaking_strength,
            config.shaking_max_tries,
            config.shaking_session,
        );

        VariableNeighborhoodSearch {
            config,
            evaluator,
            neighborhoods,
            shaker,
        }
    }

    pub fn config(&self) -> &VnsConfig {
        &self.config
    }

    /// Solve one instance
    pub fn run(&self, instance: &BppInstance) -> SearchReport {
        let clock = SearchClock::start(self.config.time_limit);
        let initial = MinimumBinSlackHeuristic::with_evaluator(self.evaluator).construct(instance);
        info!(
            "{}: initial solution with {} bins (best known {})",
            instance.name,
            initial.bin_count(),
            instance.best_known_bins
        );

        let mut stats = SearchStats::default();
        let outcome = self.search(instance, &initial, &clock, &mut stats);
        let (mut solution, origin) = Self::recover(instance, &initial, outcome);

        let elapsed = clock.elapsed();
        solution.algorithm = "VNS".to_string();
        solution.computation_time = elapsed.as_secs_f64();
        solution.iterations = Some(stats.moves);

        info!(
            "{}: {} bins in {:.2}s ({} moves, {} shakes, from {})",
            instance.name,
            solution.bin_count(),
            elapsed.as_secs_f64(),
            stats.moves,
            stats.shakes,
            origin
        );

        SearchReport {
            solution,
            origin,
            initial_bins: initial.bin_count(),
            moves: stats.moves,
            shakes: stats.shakes,
            elapsed,
        }
    }

    /// Resolve the search outcome: its answer, else the initial solution if
    /// intact, else a fresh Best Fit packing
    fn recover(
        instance: &BppInstance,
        initial: &Solution,
        outcome: Result<Solution, SolveError>,
    ) -> (Solution, SolutionOrigin) {
        match outcome {
            Ok(best) => (best, SolutionOrigin::Search),
            Err(e) => {
                warn!("{}: {}", instance.name, e);
                if integrity::check(initial, &instance.items).is_ok() {
                    (initial.clone(), SolutionOrigin::Construction)
                } else {
                    warn!("{}: falling back to Best Fit", instance.name);
                    (BestFitHeuristic::new().construct(instance), SolutionOrigin::BestFit)
                }
            }
        }
    }

    fn search(
        &self,
        instance: &BppInstance,
        initial: &Solution,
        clock: &SearchClock,
        stats: &mut SearchStats,
    ) -> Result<Solution, SolveError> {
        integrity::check(initial, &instance.items).map_err(SolveError::InvalidInitial)?;

        let ctx = SearchContext::new(&self.evaluator, clock, self.config.operator_margin);
        let item_ids: Vec<usize> = instance.items.iter().map(|it| it.id).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut best = initial.clone();
        let mut current = initial.clone();
        let mut k = 0;

        loop {
            current.sort_by_remaining();

            while k < self.neighborhoods.len() {
                if clock.reached(self.config.termination_margin)
                    || best.bin_count() <= instance.best_known_bins
                {
                    integrity::check(&best, &instance.items).map_err(SolveError::CorruptedBest)?;
                    return Ok(best);
                }

                let neighborhood = &self.neighborhoods[k];
                let improved = neighborhood.improve(&mut current, &ctx);

                if let Err(e) = integrity::check(&current, &instance.items) {
                    warn!("{} corrupted the solution: {}", neighborhood.name(), e);
                    current = initial.clone();
                    k += 1;
                    continue;
                }

                if improved {
                    stats.moves += 1;
                    debug!(
                        "{} improved: {} bins, slack^2 {}",
                        neighborhood.name(),
                        current.bin_count(),
                        current.slack_square_sum()
                    );
                    best = current.clone();
                    k = 0;
                } else {
                    k += 1;
                }
            }

            let (shaken, _) =
                self.shaker
                    .shake(&best, &item_ids, &mut rng, clock, self.config.operator_margin);
            stats.shakes += 1;
            current = shaken;
            k = 0;
        }
    }
}

impl Default for VariableNeighborhoodSearch {
    fn default() -> Self {
        Self::new(VnsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::Bin;
    use std::sync::{Arc, Mutex};

    fn quick_config(time_limit_ms: u64) -> VnsConfig {
        VnsConfig::default()
            .with_time_limit(Duration::from_millis(time_limit_ms))
            .with_margins(Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn test_items_equal_to_capacity() {
        let instance = BppInstance::new("full", 10, 5, &[10, 10, 10, 10, 10]);
        let report = VariableNeighborhoodSearch::new(quick_config(5_000)).run(&instance);

        assert_eq!(report.origin, SolutionOrigin::Search);
        assert_eq!(report.solution.bin_count(), 5);
        assert_eq!(report.moves, 0);
        assert_eq!(report.shakes, 0);
    }

    #[test]
    fn test_stops_at_best_known() {
        let instance = BppInstance::new("easy", 10, 3, &[7, 5, 5, 3, 3, 7]);
        let report = VariableNeighborhoodSearch::new(quick_config(5_000)).run(&instance);

        assert_eq!(report.solution.bin_count(), 3);
        assert!(integrity::check(&report.solution, &instance.items).is_ok());
        assert!(report.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_unreachable_target_runs_until_time_limit() {
        let sizes = [42, 69, 67, 57, 93, 90, 38, 36, 45, 42, 33, 79, 27, 57, 44, 84, 86, 92, 46, 38];
        let instance = BppInstance::new("hard", 150, 0, &sizes);
        let report = VariableNeighborhoodSearch::new(quick_config(300)).run(&instance);

        assert_eq!(report.origin, SolutionOrigin::Search);
        assert!(report.solution.bin_count() <= report.initial_bins);
        assert!(report.solution.bin_count() >= instance.lower_bound());
        assert!(integrity::check(&report.solution, &instance.items).is_ok());
        assert!(report.elapsed >= Duration::from_millis(300));
    }

    #[test]
    fn test_empty_instance() {
        let instance = BppInstance::new("empty", 10, 0, &[]);
        let report = VariableNeighborhoodSearch::new(quick_config(1_000)).run(&instance);

        assert_eq!(report.solution.bin_count(), 0);
        assert_eq!(report.origin, SolutionOrigin::Search);
    }

    #[test]
    fn test_oversized_item_falls_back_to_best_fit() {
        let instance = BppInstance::new("broken", 10, 1, &[12, 3]);
        let report = VariableNeighborhoodSearch::new(quick_config(1_000)).run(&instance);

        assert_eq!(report.origin, SolutionOrigin::BestFit);
        assert_eq!(report.solution.bin_count(), 1);
    }

    #[test]
    fn test_time_budget_below_margin() {
        let instance = BppInstance::new("short", 10, 0, &[6, 6, 4, 4]);
        let config = VnsConfig::default().with_time_limit(Duration::from_secs(1));
        let report = VariableNeighborhoodSearch::new(config).run(&instance);

        assert_eq!(report.moves, 0);
        assert_eq!(report.solution.bin_count(), report.initial_bins);
    }

    /// Appends a bin holding a copy of the first item it finds
    struct DuplicatingSearch;

    impl Neighborhood for DuplicatingSearch {
        fn improve(&self, solution: &mut Solution, _ctx: &SearchContext<'_>) -> bool {
            let Some(item) = solution.bins.iter().flat_map(|b| b.items()).next().copied() else {
                return false;
            };
            let mut bin = Bin::new(solution.capacity);
            bin.add(item);
            solution.bins.push(bin);
            true
        }

        fn name(&self) -> &str {
            "Duplicating"
        }
    }

    /// Records the item count of every solution it is handed
    struct RecordingSearch {
        seen: Arc<Mutex<Vec<usize>>>,
    }

    impl Neighborhood for RecordingSearch {
        fn improve(&self, solution: &mut Solution, _ctx: &SearchContext<'_>) -> bool {
            self.seen.lock().unwrap().push(solution.item_count());
            false
        }

        fn name(&self) -> &str {
            "Recording"
        }
    }

    #[test]
    fn test_corrupted_working_solution_is_reset() {
        let sizes = [42, 69, 67, 57, 93, 90, 38, 36, 45, 42];
        let instance = BppInstance::new("faulty", 150, 0, &sizes);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let neighborhoods: Vec<Box<dyn Neighborhood + Send + Sync>> = vec![
            Box::new(DuplicatingSearch),
            Box::new(RecordingSearch { seen: Arc::clone(&seen) }),
        ];

        let report = VariableNeighborhoodSearch::with_neighborhoods(quick_config(200), neighborhoods)
            .run(&instance);

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&count| count == sizes.len()));
        assert_eq!(report.moves, 0);
        assert_eq!(report.origin, SolutionOrigin::Search);
        assert_eq!(report.solution.bin_count(), report.initial_bins);
        assert!(integrity::check(&report.solution, &instance.items).is_ok());
    }

    #[test]
    fn test_corrupted_best_falls_back_to_initial() {
        let instance = BppInstance::new("fallback", 10, 1, &[6, 4, 5]);
        let initial = MinimumBinSlackHeuristic::new().construct(&instance);
        let corrupted = SolveError::CorruptedBest(IntegrityError::DuplicateItem { id: 0 });

        let (solution, origin) =
            VariableNeighborhoodSearch::recover(&instance, &initial, Err(corrupted));

        assert_eq!(origin, SolutionOrigin::Construction);
        assert_eq!(solution.bin_count(), initial.bin_count());
        assert!(integrity::check(&solution, &instance.items).is_ok());
    }

    #[test]
    fn test_corrupted_initial_falls_back_to_best_fit() {
        let instance = BppInstance::new("fallback", 10, 1, &[6, 4, 5]);
        let mut initial = MinimumBinSlackHeuristic::new().construct(&instance);
        initial.bins.pop();
        let corrupted = SolveError::CorruptedBest(IntegrityError::DuplicateItem { id: 0 });

        let (solution, origin) =
            VariableNeighborhoodSearch::recover(&instance, &initial, Err(corrupted));

        assert_eq!(origin, SolutionOrigin::BestFit);
        assert_eq!(solution.bin_count(), 2);
        assert!(integrity::check(&solution, &instance.items).is_ok());
    }

    #[test]
    fn test_solve_error_display() {
        let err = SolveError::CorruptedBest(IntegrityError::DuplicateItem { id: 3 });
        assert!(err.to_string().contains("corrupted"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
