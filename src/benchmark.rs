//! Batch runs and comparisons over a problem file.
//! 
//! Provides tools for solving every instance of a file, collecting
//! statistics, and comparing the construction heuristics with the search.

use crate::heuristics::construction::{
    BestFitHeuristic, ConstructionHeuristic, MinimumBinSlackHeuristic,
};
use crate::heuristics::vns::{SearchReport, VariableNeighborhoodSearch, VnsConfig};
use crate::instance::BppInstance;
use crate::integrity;
use crate::solution::Solution;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of solving a single instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceResult {
    /// Instance name
    pub instance: String,
    /// Number of items
    pub items: usize,
    /// Bin capacity
    pub capacity: i64,
    /// Best known number of bins
    pub best_known: usize,
    /// L1 lower bound
    pub lower_bound: usize,
    /// Bins of the starting solution
    pub initial_bins: usize,
    /// Bins of the returned solution
    pub bins: usize,
    /// `bins - best_known`
    pub gap: i64,
    /// Step of the fallback chain that produced the answer
    pub origin: String,
    /// Whether the returned solution passed the integrity check
    pub valid: bool,
    /// Computation time in seconds
    pub time: f64,
    /// Improving moves
    pub moves: usize,
    /// Shakes performed
    pub shakes: usize,
}

/// Aggregated statistics of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub num_instances: usize,
    /// Instances solved with at most the best known number of bins
    pub num_optimal: usize,
    pub num_valid: usize,
    pub avg_gap: f64,
    pub std_gap: f64,
    pub max_gap: i64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Batch configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Search parameters, shared by every instance
    pub vns: VnsConfig,
    /// Skip instances that fail validation instead of solving them
    pub skip_invalid: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            vns: VnsConfig::default(),
            skip_invalid: true,
        }
    }
}

/// Batch engine
pub struct Batch {
    config: BatchConfig,
    search: VariableNeighborhoodSearch,
    results: Vec<InstanceResult>,
}

impl Batch {
    pub fn new(config: BatchConfig) -> Self {
        let search = VariableNeighborhoodSearch::new(config.vns.clone());
        Batch {
            config,
            search,
            results: Vec::new(),
        }
    }

    /// Whether `run_instance` will solve this instance rather than skip it
    pub fn accepts(&self, instance: &BppInstance) -> bool {
        !self.config.skip_invalid || instance.validate().is_ok()
    }

    /// Solve one instance and record its result. `None` if the instance was skipped.
    pub fn run_instance(&mut self, instance: &BppInstance) -> Option<SearchReport> {
        if let Err(e) = instance.validate() {
            if self.config.skip_invalid {
                log::error!("Skipping instance {}: {}", instance.name, e);
                return None;
            }
            log::warn!("Instance {} is invalid: {}", instance.name, e);
        }

        let report = self.search.run(instance);
        let solution = &report.solution;

        self.results.push(InstanceResult {
            instance: instance.name.clone(),
            items: instance.num_items(),
            capacity: instance.capacity,
            best_known: instance.best_known_bins,
            lower_bound: instance.lower_bound(),
            initial_bins: report.initial_bins,
            bins: solution.bin_count(),
            gap: solution.bin_count() as i64 - instance.best_known_bins as i64,
            origin: report.origin.to_string(),
            valid: integrity::is_valid(solution, &instance.items),
            time: report.elapsed.as_secs_f64(),
            moves: report.moves,
            shakes: report.shakes,
        });

        Some(report)
    }

    /// Solve every instance in order
    pub fn run_on_instances(&mut self, instances: &[BppInstance]) -> Vec<SearchReport> {
        instances
            .iter()
            .filter_map(|instance| self.run_instance(instance))
            .collect()
    }

    /// Compute statistics over the recorded results
    pub fn compute_statistics(&self) -> Option<BatchStatistics> {
        if self.results.is_empty() {
            return None;
        }

        let gaps: Vec<f64> = self.results.iter().map(|r| r.gap as f64).collect();
        let times: Vec<f64> = self.results.iter().map(|r| r.time).collect();

        let std_gap = if gaps.len() > 1 {
            gaps.iter().std_dev()
        } else {
            0.0
        };

        Some(BatchStatistics {
            num_instances: self.results.len(),
            num_optimal: self.results.iter().filter(|r| r.gap <= 0).count(),
            num_valid: self.results.iter().filter(|r| r.valid).count(),
            avg_gap: gaps.iter().mean(),
            std_gap,
            max_gap: Iterator::max(self.results.iter().map(|r| r.gap)).unwrap_or(0),
            avg_time: times.iter().mean(),
            total_time: times.iter().sum(),
        })
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export results to JSON
    pub fn export_to_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.results)?;
        std::fs::write(path, json)
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("        Bin Packing VNS Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Utc::now().to_rfc3339()));

        report.push_str(&format!(
            "{:<16} {:>7} {:>8} {:>6} {:>6} {:>6} {:>5} {:>8} {:>9}\n",
            "Instance", "Items", "BestKn", "LB", "MBS", "VNS", "Gap", "Origin", "Time"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for r in &self.results {
            report.push_str(&format!(
                "{:<16} {:>7} {:>8} {:>6} {:>6} {:>6} {:>5} {:>8} {:>8.2}s\n",
                r.instance, r.items, r.best_known, r.lower_bound, r.initial_bins, r.bins,
                r.gap, r.origin, r.time
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        if let Some(stats) = self.compute_statistics() {
            report.push_str(&format!(
                "Best known reached: {}/{}\n",
                stats.num_optimal, stats.num_instances
            ));
            report.push_str(&format!(
                "Valid solutions:    {}/{}\n",
                stats.num_valid, stats.num_instances
            ));
            report.push_str(&format!(
                "Gap:                avg {:.3}, std {:.3}, max {}\n",
                stats.avg_gap, stats.std_gap, stats.max_gap
            ));
            report.push_str(&format!(
                "Time:               avg {:.2}s, total {:.2}s\n",
                stats.avg_time, stats.total_time
            ));
        }

        let mut slowest: Vec<&InstanceResult> = self.results.iter().collect();
        slowest.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.time)));
        if !slowest.is_empty() {
            report.push_str("\nSlowest instances:\n");
            for r in slowest.iter().take(5) {
                report.push_str(&format!("  {}: {:.2}s ({} bins)\n", r.instance, r.time, r.bins));
            }
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[InstanceResult] {
        &self.results
    }
}

/// Bin counts of one instance under each method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub instance: String,
    pub best_known: usize,
    pub lower_bound: usize,
    /// Bin count per method name
    pub bins: HashMap<String, usize>,
}

/// Run Best Fit, Minimum Bin Slack and the search on every instance
pub fn compare_methods(instances: &[BppInstance], config: &VnsConfig) -> Vec<ComparisonRow> {
    let heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>> = vec![
        Box::new(BestFitHeuristic::new()),
        Box::new(MinimumBinSlackHeuristic::new()),
    ];
    let search = VariableNeighborhoodSearch::new(config.clone());

    instances
        .iter()
        .map(|instance| {
            let mut bins = HashMap::new();
            for heuristic in &heuristics {
                let solution: Solution = heuristic.construct(instance);
                bins.insert(heuristic.name().to_string(), solution.bin_count());
            }
            bins.insert("VNS".to_string(), search.run(instance).solution.bin_count());

            ComparisonRow {
                instance: instance.name.clone(),
                best_known: instance.best_known_bins,
                lower_bound: instance.lower_bound(),
                bins,
            }
        })
        .collect()
}

/// Render comparison rows as a table
pub fn format_comparison(rows: &[ComparisonRow]) -> String {
    const METHODS: [&str; 3] = ["BestFit", "MinimumBinSlack", "VNS"];
    let mut table = String::new();

    table.push_str(&format!(
        "{:<16} {:>8} {:>6} {:>8} {:>16} {:>6}\n",
        "Instance", "BestKn", "LB", METHODS[0], METHODS[1], METHODS[2]
    ));
    table.push_str("-".repeat(65).as_str());
    table.push('\n');

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let count = |method: &str| row.bins.get(method).copied().unwrap_or(0);
        for method in METHODS {
            *totals.entry(method).or_insert(0) += count(method);
        }
        table.push_str(&format!(
            "{:<16} {:>8} {:>6} {:>8} {:>16} {:>6}\n",
            row.instance,
            row.best_known,
            row.lower_bound,
            count(METHODS[0]),
            count(METHODS[1]),
            count(METHODS[2])
        ));
    }

    table.push_str("-".repeat(65).as_str());
    table.push('\n');
    let best_known: usize = rows.iter().map(|r| r.best_known).sum();
    let lower_bound: usize = rows.iter().map(|r| r.lower_bound).sum();
    table.push_str(&format!(
        "{:<16} {:>8} {:>6} {:>8} {:>16} {:>6}\n",
        "Total",
        best_known,
        lower_bound,
        totals.get(METHODS[0]).copied().unwrap_or(0),
        totals.get(METHODS[1]).copied().unwrap_or(0),
        totals.get(METHODS[2]).copied().unwrap_or(0)
    ));

    table
}

/// Helper function to load every instance of a problem file
pub fn load_instances<P: AsRef<Path>>(path: P) -> Result<Vec<BppInstance>, String> {
    let instances = BppInstance::from_file(path)?;
    log::info!("Loaded {} instances", instances.len());
    Ok(instances)
}
