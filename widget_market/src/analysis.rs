use crate::iteration::MarketIteration;
use crate::marketplace::Marketplace;
use crate::{Consumer, Widget};
use serde::{Deserialize, Serialize};

/// Maximum surplus this inventory could generate (competitive equilibrium)
///
/// Consumer values are sorted descending and widget costs ascending; pairs are
/// matched until the marginal value drops below the marginal cost. Total
/// surplus of a sale does not depend on its price, so this bounds any matching.
pub fn max_possible_surplus(consumers: &[Consumer], widgets: &[Widget]) -> f64 {
    let mut values: Vec<f64> = consumers.iter().map(|c| c.max_price).collect();
    values.sort_by(|a, b| b.total_cmp(a)); // Descending

    let mut costs: Vec<f64> = widgets.iter().map(|w| w.producer.min_price).collect();
    costs.sort_by(f64::total_cmp); // Ascending

    let mut surplus = 0.0;
    for (value, cost) in values.iter().zip(costs.iter()) {
        if value >= cost {
            surplus += value - cost;
        } else {
            break;
        }
    }

    surplus
}

/// Per-generation market metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub num_widgets: usize,
    pub num_sales: usize,
    pub num_unsold: usize,
    pub active_producers: usize,
    pub mean_offer_price: Option<f64>,
    pub mean_sale_price: Option<f64>,
    pub consumer_surplus: f64,
    pub producer_surplus: f64,
    pub total_surplus: f64,
    pub max_surplus: f64,
}

impl GenerationSummary {
    pub fn from_iteration(iteration: &MarketIteration) -> Self {
        let widgets = iteration.widgets();
        let mean_offer_price = if widgets.is_empty() {
            None
        } else {
            Some(widgets.iter().map(|w| w.price).sum::<f64>() / widgets.len() as f64)
        };

        GenerationSummary {
            generation: iteration.generation(),
            num_widgets: widgets.len(),
            num_sales: iteration.num_sales(),
            num_unsold: widgets.len().saturating_sub(iteration.num_sales()),
            active_producers: iteration.active_producers().len(),
            mean_offer_price,
            mean_sale_price: iteration.mean_sale_price(),
            consumer_surplus: iteration.consumer_surplus(),
            producer_surplus: iteration.producer_surplus(),
            total_surplus: iteration.total_surplus(),
            max_surplus: max_possible_surplus(iteration.consumers(), widgets),
        }
    }

    /// Allocative efficiency as percentage
    pub fn efficiency(&self) -> f64 {
        if self.max_surplus == 0.0 {
            return 0.0;
        }
        (self.total_surplus / self.max_surplus) * 100.0
    }
}

/// Results from a complete marketplace run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub generations: Vec<GenerationSummary>,
    pub total_sales: usize,
    pub mean_efficiency: f64,
    pub final_active_producers: usize,
    pub final_mean_offer_price: Option<f64>,
}

impl RunSummary {
    pub fn from_marketplace(market: &Marketplace) -> Self {
        let generations: Vec<GenerationSummary> = market
            .market_iterations()
            .iter()
            .map(GenerationSummary::from_iteration)
            .collect();

        let efficiencies: Vec<f64> = generations.iter().map(|g| g.efficiency()).collect();
        let total_sales = generations.iter().map(|g| g.num_sales).sum();
        let last = generations.last();

        RunSummary {
            seed: market.config().seed,
            total_sales,
            mean_efficiency: mean(&efficiencies),
            final_active_producers: last.map(|g| g.active_producers).unwrap_or(0),
            final_mean_offer_price: last.and_then(|g| g.mean_offer_price),
            generations,
        }
    }
}

/// Summary statistics of one metric across runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl MeanStd {
    pub fn from_values(values: &[f64]) -> Self {
        let mean = mean(values);
        MeanStd {
            mean,
            std: std_dev(values, mean),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Aggregate results across multiple runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResults {
    pub num_runs: usize,
    pub efficiency: MeanStd,
    pub total_sales: MeanStd,
    pub final_active_producers: MeanStd,
}

impl AggregateResults {
    pub fn from_runs(runs: &[RunSummary]) -> Self {
        let efficiencies: Vec<f64> = runs.iter().map(|r| r.mean_efficiency).collect();
        let sales: Vec<f64> = runs.iter().map(|r| r.total_sales as f64).collect();
        let producers: Vec<f64> = runs
            .iter()
            .map(|r| r.final_active_producers as f64)
            .collect();

        AggregateResults {
            num_runs: runs.len(),
            efficiency: MeanStd::from_values(&efficiencies),
            total_sales: MeanStd::from_values(&sales),
            final_active_producers: MeanStd::from_values(&producers),
        }
    }

    pub fn print_summary(&self, name: &str) {
        println!("\n{}", name);
        println!("  Runs: {}", self.num_runs);
        println!(
            "  Efficiency: {:.2}% (±{:.2}%) [{:.2}%, {:.2}%]",
            self.efficiency.mean, self.efficiency.std, self.efficiency.min, self.efficiency.max
        );
        println!(
            "  Total sales: {:.1} (±{:.1})",
            self.total_sales.mean, self.total_sales.std
        );
        println!(
            "  Surviving producers: {:.1} (±{:.1})",
            self.final_active_producers.mean, self.final_active_producers.std
        );
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
