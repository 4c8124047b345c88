//! Bin Packing Solver - Command Line Interface
//! 
//! Solves every instance of a problem file with Minimum Bin Slack followed by
//! Variable Neighborhood Search.

use bpp_vns_solver::benchmark::{compare_methods, format_comparison, load_instances, Batch, BatchConfig};
use bpp_vns_solver::heuristics::construction::{
    BestFitHeuristic, ConstructionHeuristic, MinimumBinSlackHeuristic,
};
use bpp_vns_solver::heuristics::vns::VnsConfig;
use bpp_vns_solver::instance::BppInstance;
use bpp_vns_solver::report;
use bpp_vns_solver::visualization::Visualizer;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "bpp-vns-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Bin Packing solver using Minimum Bin Slack and Variable Neighborhood Search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve every instance of a problem file
    Solve {
        /// Problem file
        #[arg(short, long)]
        source: PathBuf,

        /// Solution report
        #[arg(short, long, default_value = "my_solutions.txt")]
        output: PathBuf,

        /// Time limit per instance in seconds
        #[arg(short, long, default_value = "10")]
        time_limit: u64,

        /// Random seed, reused for every instance
        #[arg(long, default_value = "39")]
        seed: u64,

        /// Export per-instance results as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Export per-instance results as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write one SVG chart per instance into this directory
        #[arg(long)]
        svg_dir: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze the instances of a problem file
    Analyze {
        /// Problem file
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Compare Best Fit, Minimum Bin Slack and VNS
    Compare {
        /// Problem file
        #[arg(short, long)]
        source: PathBuf,

        /// Time limit per instance in seconds
        #[arg(short, long, default_value = "10")]
        time_limit: u64,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { source, output, time_limit, seed, json, csv, svg_dir, verbose } => {
            solve_file(&source, &output, time_limit, seed, json, csv, svg_dir, verbose);
        }

        Commands::Analyze { source } => {
            analyze_file(&source);
        }

        Commands::Compare { source, time_limit, output } => {
            compare_file(&source, time_limit, output);
        }
    }
}

fn load_or_exit(path: &PathBuf) -> Vec<BppInstance> {
    match load_instances(path) {
        Ok(instances) => instances,
        Err(e) => {
            eprintln!("Error loading problem file: {}", e);
            std::process::exit(1);
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[allow(clippy::too_many_arguments)]
fn solve_file(
    source: &PathBuf,
    output: &PathBuf,
    time_limit: u64,
    seed: u64,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
    svg_dir: Option<PathBuf>,
    verbose: bool,
) {
    println!("Problem file: {:?}", source);
    println!("Solution file: {:?}", output);
    println!("Time limit per instance: {}s\n", time_limit);

    let instances = load_or_exit(source);
    println!("Loaded {} instances\n", instances.len());

    if let Some(dir) = &svg_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::error!("Cannot create {:?}: {}", dir, e);
        }
    }

    let config = BatchConfig {
        vns: VnsConfig::default()
            .with_time_limit(Duration::from_secs(time_limit))
            .with_seed(seed),
        ..Default::default()
    };
    let mut batch = Batch::new(config);
    let visualizer = Visualizer::new();

    let solvable = instances.iter().filter(|instance| batch.accepts(instance)).count();
    if let Err(e) = report::write_header(output, solvable) {
        log::error!("Cannot create {:?}: {}", output, e);
    }

    let start = Instant::now();
    let pb = progress_bar(instances.len());

    for instance in &instances {
        pb.set_message(instance.name.clone());

        if verbose {
            pb.println(instance.statistics().to_string());
        }

        let Some(result) = batch.run_instance(instance) else {
            pb.inc(1);
            continue;
        };
        let solution = &result.solution;

        pb.println(format!(
            "{}: {} bins (best known {}, gap {}) in {:.2}s [{}]",
            instance.name,
            solution.bin_count(),
            instance.best_known_bins,
            solution.bin_count() as i64 - instance.best_known_bins as i64,
            result.elapsed.as_secs_f64(),
            result.origin
        ));

        if verbose {
            pb.println(solution.to_string());
        }

        if let Err(e) = report::append_solution(output, &instance.name, instance.best_known_bins, solution) {
            log::error!("Failed to write solution to {:?}: {}", output, e);
            pb.println(report::format_solution(&instance.name, instance.best_known_bins, solution));
        }

        if let Some(dir) = &svg_dir {
            let svg = visualizer.generate_svg(instance, solution);
            let path = dir.join(format!("{}.svg", instance.name));
            if let Err(e) = visualizer.save_svg(&svg, &path) {
                log::error!("Failed to save {:?}: {}", path, e);
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!("\n{}", batch.generate_report());
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());

    if let Some(path) = csv {
        match batch.export_to_csv(&path) {
            Ok(()) => println!("Results exported to {:?}", path),
            Err(e) => log::error!("Failed to export CSV: {}", e),
        }
    }

    if let Some(path) = json {
        match batch.export_to_json(&path) {
            Ok(()) => println!("Results exported to {:?}", path),
            Err(e) => log::error!("Failed to export JSON: {}", e),
        }
    }
}

fn analyze_file(source: &PathBuf) {
    let instances = load_or_exit(source);

    println!("========== Problem Analysis ==========\n");
    println!("Instances: {}\n", instances.len());

    for instance in &instances {
        println!("{}", instance.statistics());

        if let Err(e) = instance.validate() {
            println!("  Invalid: {}\n", e);
            continue;
        }

        let bf = BestFitHeuristic::new().construct(instance);
        let mbs = MinimumBinSlackHeuristic::new().construct(instance);

        println!("  Quick Solution Estimates:");
        println!("    Best Fit: {} bins ({:.4}s)", bf.bin_count(), bf.computation_time);
        println!("    Minimum Bin Slack: {} bins ({:.4}s)", mbs.bin_count(), mbs.computation_time);
        println!(
            "    L1 lower bound: {}, best known: {}\n",
            instance.lower_bound(),
            instance.best_known_bins
        );
    }
}

fn compare_file(source: &PathBuf, time_limit: u64, output: Option<PathBuf>) {
    let instances = load_or_exit(source);
    let config = VnsConfig::default().with_time_limit(Duration::from_secs(time_limit));

    println!("Comparing methods on {} instances ({}s per VNS run)...\n", instances.len(), time_limit);

    let rows = compare_methods(&instances, &config);
    println!("{}", format_comparison(&rows));

    if let Some(path) = output {
        let written = std::fs::File::create(&path).map_err(csv::Error::from).and_then(|file| {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(["instance", "best_known", "lower_bound", "BestFit", "MinimumBinSlack", "VNS"])?;
            for row in &rows {
                let count = |m: &str| row.bins.get(m).copied().unwrap_or(0).to_string();
                writer.write_record([
                    row.instance.clone(),
                    row.best_known.to_string(),
                    row.lower_bound.to_string(),
                    count("BestFit"),
                    count("MinimumBinSlack"),
                    count("VNS"),
                ])?;
            }
            writer.flush()?;
            Ok(())
        });

        match written {
            Ok(()) => println!("Comparison exported to {:?}", path),
            Err(e) => log::error!("Failed to export comparison: {}", e),
        }
    }
}
