//! Batch Experiment Runner
//!
//! Executes Monte Carlo batches of marketplace runs described by a TOML file.
//! Runs are independent and execute in parallel; run `i` uses seed
//! `base_seed + i`, so results do not depend on thread count.
//!
//! Usage:
//!   cargo run --release --bin run_experiment -- experiments/baseline.toml

use rayon::prelude::*;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use widget_market::analysis::{AggregateResults, RunSummary};
use widget_market::config::RawMarketConfig;
use widget_market::output::SimulationOutput;
use widget_market::{MarketConfig, MarketError, Marketplace};

/// Top-level experiment configuration
#[derive(Debug, Clone, Deserialize)]
struct ExperimentConfig {
    experiment: ExperimentMetadata,
    market: RawMarketConfig,
    output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
struct ExperimentMetadata {
    name: String,
    description: String,
    num_runs: usize,
    num_generations: usize,
    base_seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputSettings {
    save_run_outputs: bool,
    save_aggregate: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("widget_market=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <experiment_config.toml>", args[0]);
        eprintln!("Example: {} experiments/baseline.toml", args[0]);
        std::process::exit(1);
    }

    let config_path = &args[1];
    println!("=== Widget Market Experiment Runner ===\n");
    println!("Loading experiment config: {}\n", config_path);

    if let Err(e) = run(Path::new(config_path)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<(), MarketError> {
    let config_str = fs::read_to_string(config_path)?;
    let exp_config: ExperimentConfig = toml::from_str(&config_str)?;
    let market_config = exp_config.market.clone().into_config()?;

    let experiment = &exp_config.experiment;
    println!("Experiment: {}", experiment.name);
    println!("Description: {}", experiment.description);
    println!(
        "Configuration: {} runs × {} generations\n",
        experiment.num_runs, experiment.num_generations
    );

    let output_dir = PathBuf::from("results").join(&experiment.name);
    fs::create_dir_all(&output_dir)?;

    let start_time = Instant::now();

    let outputs: Vec<SimulationOutput> = (0..experiment.num_runs)
        .into_par_iter()
        .map(|run_idx| {
            let seed = experiment.base_seed + run_idx as u64;
            run_simulation(&market_config, experiment.num_generations, seed)
        })
        .collect::<Result<_, _>>()?;

    if exp_config.output.save_run_outputs {
        for output in &outputs {
            let run_dir = output_dir.join(format!("run_{}", output.metadata.config.seed));
            output.write_all(&run_dir)?;
        }
    }

    let runs: Vec<RunSummary> = outputs.into_iter().map(|o| o.summary).collect();
    let aggregate = AggregateResults::from_runs(&runs);

    if exp_config.output.save_aggregate {
        let aggregate_json = serde_json::to_string_pretty(&aggregate)?;
        fs::write(output_dir.join("aggregate_summary.json"), aggregate_json)?;
    }

    aggregate.print_summary(&experiment.name);

    let total_elapsed = start_time.elapsed();
    println!(
        "\n✓ Experiment complete in {:.1}s ({:.3}s per run)",
        total_elapsed.as_secs_f64(),
        total_elapsed.as_secs_f64() / experiment.num_runs.max(1) as f64
    );
    println!("Results saved to: {}", output_dir.display());

    Ok(())
}

/// Build, step and summarize one marketplace
fn run_simulation(
    config: &MarketConfig,
    num_generations: usize,
    seed: u64,
) -> Result<SimulationOutput, MarketError> {
    let mut market = Marketplace::new(config.clone().with_seed(seed))?;
    market.run(num_generations);
    Ok(SimulationOutput::from_marketplace(&market))
}
