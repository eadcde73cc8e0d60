//! Widget Market - Main Simulation
//!
//! Seeds the default marketplace and steps it for a fixed number of
//! generations, printing one line per generation.

use tracing_subscriber::EnvFilter;
use widget_market::analysis::{GenerationSummary, RunSummary};
use widget_market::{MarketConfig, Marketplace};

const NUM_GENERATIONS: usize = 50;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("widget_market=info")),
        )
        .init();

    println!("=== Widget Market ===");
    println!("Random-order matching with sell-through pricing\n");

    let config = MarketConfig::default();

    println!("Configuration:");
    println!("  Consumers: {}", config.n_consumers);
    println!("  Producers: {}", config.n_producers);
    println!("  Widgets per producer: {}", config.widgets_per_producer);
    println!(
        "  Price draws: [{}, {})",
        config.consumer_price_range.min, config.consumer_price_range.max
    );
    println!("  Seed: {}", config.seed);
    println!("  Generations to simulate: {}\n", NUM_GENERATIONS);

    let mut market = match Marketplace::new(config) {
        Ok(market) => market,
        Err(e) => {
            eprintln!("Error building marketplace: {}", e);
            std::process::exit(1);
        }
    };

    market.run(NUM_GENERATIONS);

    println!(
        "{:>4} {:>8} {:>6} {:>7} {:>10} {:>10} {:>9}",
        "gen", "widgets", "sales", "active", "avg price", "surplus", "eff %"
    );
    for iteration in market.market_iterations() {
        let summary = GenerationSummary::from_iteration(iteration);
        println!(
            "{:>4} {:>8} {:>6} {:>7} {:>10} {:>10.3} {:>9.2}",
            summary.generation,
            summary.num_widgets,
            summary.num_sales,
            summary.active_producers,
            summary
                .mean_offer_price
                .map(|p| format!("{:.3}", p))
                .unwrap_or_else(|| "N/A".to_string()),
            summary.total_surplus,
            summary.efficiency()
        );
    }

    let run = RunSummary::from_marketplace(&market);
    println!("\n=== Results ===\n");
    println!("  Total sales: {}", run.total_sales);
    println!("  Mean efficiency: {:.2}%", run.mean_efficiency);
    println!(
        "  Surviving producers: {}/{}",
        run.final_active_producers,
        market.producers().len()
    );
    println!("  Entities minted: {}", market.entity_count());
}
