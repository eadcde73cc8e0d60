//! Widget Market: a generational commodity market simulation
//!
//! A fixed population of consumers and producers trades standardized widgets.
//! Each generation the matching engine clears the current inventory against
//! consumer demand, and the pricing engine derives the next generation's
//! inventory from what sold.
//!
//! Key pieces:
//! - `sales`: random-order, cheapest-first matching (`naive_sales`)
//! - `pricing`: sell-through price adjustment and replenishment (`naive_pricing`)
//! - `iteration`: immutable snapshot of one generation
//! - `marketplace`: owns the population and the generation history
//!
//! Expected outcomes:
//! - Producers that sell out drift up towards the 1.0 price ceiling
//! - Producers that cannot sell fall to their cost floor and exit
//! - Realized surplus per consumer is bounded by 1.0

use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod config;
pub mod error;
pub mod iteration;
pub mod marketplace;
pub mod output;
pub mod pricing;
pub mod random;
pub mod sales;

pub use config::MarketConfig;
pub use error::{MarketError, Result};
pub use iteration::MarketIteration;
pub use marketplace::{Marketplace, MarketplaceBuilder};
pub use pricing::{naive_pricing, NaivePricing, PricingStrategy};
pub use sales::{naive_sales, NaiveSales, SalesStrategy};

/// Identifier shared by every entity in a marketplace
pub type EntityId = usize;

/// A buyer willing to pay at most `max_price` for one widget per generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consumer {
    pub id: EntityId,
    pub max_price: f64,
}

impl Consumer {
    pub fn new(id: EntityId, max_price: f64) -> Self {
        Consumer { id, max_price }
    }
}

/// A seller whose per-unit cost floor is `min_price`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub id: EntityId,
    pub min_price: f64,
}

impl Producer {
    pub fn new(id: EntityId, min_price: f64) -> Self {
        Producer { id, min_price }
    }
}

/// One unit of inventory, owned by exactly one producer for its lifetime
///
/// Widgets are never repriced in place: a new price means new widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: EntityId,
    pub producer: Producer,
    pub price: f64,
}

impl Widget {
    pub fn new(id: EntityId, producer: Producer, price: f64) -> Self {
        Widget {
            id,
            producer,
            price,
        }
    }
}

/// A cleared transaction between one consumer and one widget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub consumer: Consumer,
    pub widget: Widget,
}

impl Sale {
    pub fn new(consumer: Consumer, widget: Widget) -> Self {
        Sale { consumer, widget }
    }

    /// Willingness to pay minus price paid
    pub fn consumer_surplus(&self) -> f64 {
        self.consumer.max_price - self.widget.price
    }

    /// Price received minus the producer's cost floor
    pub fn producer_surplus(&self) -> f64 {
        self.widget.price - self.widget.producer.min_price
    }

    pub fn total_surplus(&self) -> f64 {
        self.consumer_surplus() + self.producer_surplus()
    }

    pub fn producer_id(&self) -> EntityId {
        self.widget.producer.id
    }
}

/// Anything stored in the marketplace's global id index
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entity {
    Consumer(Consumer),
    Producer(Producer),
    Widget(Widget),
}

impl Entity {
    pub fn id(&self) -> EntityId {
        match self {
            Entity::Consumer(c) => c.id,
            Entity::Producer(p) => p.id,
            Entity::Widget(w) => w.id,
        }
    }
}
