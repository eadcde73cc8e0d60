//! Marketplace configuration
//!
//! Configs can be built in code (`MarketConfig::new`, struct update syntax) or
//! loaded from a TOML table. Counts in TOML are read as signed integers so a
//! negative count is reported as an invalid configuration instead of a parse
//! failure.

use crate::error::{MarketError, Result};
use crate::random::{DEFAULT_PRICE_MAX, DEFAULT_PRICE_MIN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Half-open price interval `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        PriceRange { min, max }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(MarketError::InvalidConfiguration(format!(
                "{} must be finite, got [{}, {})",
                name, self.min, self.max
            )));
        }
        if self.min >= self.max {
            return Err(MarketError::InvalidConfiguration(format!(
                "{} is empty: min {} >= max {}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        PriceRange::new(DEFAULT_PRICE_MIN, DEFAULT_PRICE_MAX)
    }
}

/// Parameters of a marketplace run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketConfig {
    // Population
    pub n_consumers: usize,
    pub n_producers: usize,
    pub widgets_per_producer: usize,

    // Randomness
    pub seed: u64,
    pub consumer_price_range: PriceRange,
    pub producer_price_range: PriceRange,

    // Initial value-based pricing: min_price × markup × (1 ± jitter), capped at 1.0
    pub initial_markup: f64,
    pub markup_jitter: f64,
}

impl MarketConfig {
    pub fn new(n_consumers: usize, n_producers: usize, widgets_per_producer: usize) -> Self {
        MarketConfig {
            n_consumers,
            n_producers,
            widgets_per_producer,
            ..Default::default()
        }
    }

    /// Same population, different seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.consumer_price_range.validate("consumer_price_range")?;
        self.producer_price_range.validate("producer_price_range")?;

        if !self.initial_markup.is_finite() || self.initial_markup <= 0.0 {
            return Err(MarketError::InvalidConfiguration(format!(
                "initial_markup must be positive, got {}",
                self.initial_markup
            )));
        }
        if !(0.0..1.0).contains(&self.markup_jitter) {
            return Err(MarketError::InvalidConfiguration(format!(
                "markup_jitter must be in [0, 1), got {}",
                self.markup_jitter
            )));
        }
        Ok(())
    }

    /// Total widgets minted at construction
    pub fn initial_inventory(&self) -> usize {
        self.n_producers * self.widgets_per_producer
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawMarketConfig = toml::from_str(s)?;
        raw.into_config()
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        MarketConfig {
            n_consumers: 100,
            n_producers: 10,
            widgets_per_producer: 10,
            seed: 42,
            consumer_price_range: PriceRange::default(),
            producer_price_range: PriceRange::default(),
            initial_markup: 1.25,
            markup_jitter: 0.1,
        }
    }
}

/// TOML form of `MarketConfig`; optional fields fall back to the defaults
#[derive(Debug, Clone, Deserialize)]
pub struct RawMarketConfig {
    pub n_consumers: i64,
    pub n_producers: i64,
    pub widgets_per_producer: i64,
    pub seed: Option<u64>,
    pub consumer_price_range: Option<PriceRange>,
    pub producer_price_range: Option<PriceRange>,
    pub initial_markup: Option<f64>,
    pub markup_jitter: Option<f64>,
}

impl RawMarketConfig {
    pub fn into_config(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();
        let config = MarketConfig {
            n_consumers: non_negative("n_consumers", self.n_consumers)?,
            n_producers: non_negative("n_producers", self.n_producers)?,
            widgets_per_producer: non_negative("widgets_per_producer", self.widgets_per_producer)?,
            seed: self.seed.unwrap_or(defaults.seed),
            consumer_price_range: self
                .consumer_price_range
                .unwrap_or(defaults.consumer_price_range),
            producer_price_range: self
                .producer_price_range
                .unwrap_or(defaults.producer_price_range),
            initial_markup: self.initial_markup.unwrap_or(defaults.initial_markup),
            markup_jitter: self.markup_jitter.unwrap_or(defaults.markup_jitter),
        };
        config.validate()?;
        Ok(config)
    }
}

fn non_negative(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        MarketError::InvalidConfiguration(format!("{} must be non-negative, got {}", name, value))
    })
}
