//! Export of simulation results to CSV and JSON for offline analysis

use crate::analysis::{GenerationSummary, RunSummary};
use crate::config::MarketConfig;
use crate::error::Result;
use crate::marketplace::Marketplace;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Metadata needed to reproduce a run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationMetadata {
    pub config: MarketConfig,
    pub num_generations: usize,
}

/// Top-level container for one run's output
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub metadata: SimulationMetadata,
    pub summary: RunSummary,
}

impl SimulationOutput {
    pub fn from_marketplace(market: &Marketplace) -> Self {
        SimulationOutput {
            metadata: SimulationMetadata {
                config: market.config().clone(),
                num_generations: market.market_iterations().len(),
            },
            summary: RunSummary::from_marketplace(market),
        }
    }

    pub fn timeseries(&self) -> &[GenerationSummary] {
        &self.summary.generations
    }

    /// Write the per-generation time series to CSV
    pub fn write_timeseries_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record([
            "generation",
            "num_widgets",
            "num_sales",
            "num_unsold",
            "active_producers",
            "mean_offer_price",
            "mean_sale_price",
            "consumer_surplus",
            "producer_surplus",
            "total_surplus",
            "max_surplus",
            "efficiency",
        ])?;

        for point in self.timeseries() {
            wtr.write_record(&[
                point.generation.to_string(),
                point.num_widgets.to_string(),
                point.num_sales.to_string(),
                point.num_unsold.to_string(),
                point.active_producers.to_string(),
                optional(point.mean_offer_price),
                optional(point.mean_sale_price),
                point.consumer_surplus.to_string(),
                point.producer_surplus.to_string(),
                point.total_surplus.to_string(),
                point.max_surplus.to_string(),
                point.efficiency().to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write the full summary with metadata as pretty JSON
    pub fn write_summary_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Write all outputs to a directory
    ///
    /// Creates:
    /// - timeseries.csv
    /// - summary.json
    pub fn write_all<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        self.write_timeseries_csv(dir.join("timeseries.csv"))?;
        self.write_summary_json(dir.join("summary.json"))?;

        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
