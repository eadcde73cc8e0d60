//! Pricing engine
//!
//! Derives the next generation's inventory from this generation's sell-through,
//! one producer at a time:
//! - sold everything (including nothing offered, nothing sold): raise by 0.01, capped at 1.0
//! - sold nothing: lower by 0.01, floored at the producer's `min_price`
//! - partial sell-through: hold
//!
//! A producer whose new price lands exactly on its floor only replenishes what
//! it sold. Selling nothing at the floor therefore means zero new widgets, and
//! with no inventory the producer never trades again.

use crate::{EntityId, Producer, Sale, Widget};
use std::collections::BTreeMap;

/// Price change applied after a generation
pub const PRICE_STEP: f64 = 0.01;
/// No widget is ever repriced above this
pub const PRICE_CEILING: f64 = 1.0;

/// A rule that turns one generation's widgets and sales into the next inventory
///
/// New widgets must take sequential ids starting at `next_id`.
pub trait PricingStrategy {
    fn reprice(&self, widgets: &[Widget], sales: &[Sale], next_id: EntityId) -> Vec<Widget>;
}

impl<F> PricingStrategy for F
where
    F: Fn(&[Widget], &[Sale], EntityId) -> Vec<Widget>,
{
    fn reprice(&self, widgets: &[Widget], sales: &[Sale], next_id: EntityId) -> Vec<Widget> {
        self(widgets, sales, next_id)
    }
}

/// Default pricing rule, see [`naive_pricing`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NaivePricing;

impl PricingStrategy for NaivePricing {
    fn reprice(&self, widgets: &[Widget], sales: &[Sale], next_id: EntityId) -> Vec<Widget> {
        naive_pricing(widgets, sales, next_id)
    }
}

/// Direction of a producer's price move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceAdjustment {
    Raise,
    Lower,
    Hold,
}

/// One producer's widgets and sales within a single generation
#[derive(Debug, Clone)]
pub struct ProducerLedger {
    pub producer: Producer,
    pub widgets: Vec<Widget>,
    pub sales: Vec<Sale>,
}

impl ProducerLedger {
    pub fn new(producer: Producer) -> Self {
        ProducerLedger {
            producer,
            widgets: Vec::new(),
            sales: Vec::new(),
        }
    }

    /// The shared price of this producer's widgets this generation
    pub fn current_price(&self) -> f64 {
        self.widgets
            .iter()
            .chain(self.sales.iter().map(|s| &s.widget))
            .map(|w| w.price)
            .next()
            .unwrap_or(self.producer.min_price)
    }

    pub fn adjustment(&self) -> PriceAdjustment {
        if self.widgets.len() == self.sales.len() {
            PriceAdjustment::Raise
        } else if self.sales.is_empty() {
            PriceAdjustment::Lower
        } else {
            PriceAdjustment::Hold
        }
    }

    pub fn next_price(&self) -> f64 {
        let old_price = self.current_price();
        match self.adjustment() {
            PriceAdjustment::Raise => PRICE_CEILING.min(old_price + PRICE_STEP),
            PriceAdjustment::Lower => self.producer.min_price.max(old_price - PRICE_STEP),
            PriceAdjustment::Hold => old_price,
        }
    }

    /// Widgets to mint at `new_price`
    pub fn next_quantity(&self, new_price: f64) -> usize {
        if new_price == self.producer.min_price {
            self.sales.len()
        } else {
            self.widgets.len()
        }
    }
}

/// Group widgets and sales by producer id
///
/// Ledgers are created on first sight of a producer, from either a widget or a
/// sale, so a sale whose widget is missing from `widgets` still gets a ledger.
pub fn group_by_producer(widgets: &[Widget], sales: &[Sale]) -> BTreeMap<EntityId, ProducerLedger> {
    let mut ledgers: BTreeMap<EntityId, ProducerLedger> = BTreeMap::new();

    for widget in widgets {
        ledgers
            .entry(widget.producer.id)
            .or_insert_with(|| ProducerLedger::new(widget.producer))
            .widgets
            .push(*widget);
    }

    for sale in sales {
        ledgers
            .entry(sale.producer_id())
            .or_insert_with(|| ProducerLedger::new(sale.widget.producer))
            .sales
            .push(*sale);
    }

    ledgers
}

/// Sell-through pricing and replenishment
///
/// Output is ordered by producer id; ids run sequentially from `next_id`.
pub fn naive_pricing(widgets: &[Widget], sales: &[Sale], next_id: EntityId) -> Vec<Widget> {
    let mut new_widgets = Vec::with_capacity(widgets.len());
    let mut id = next_id;

    for ledger in group_by_producer(widgets, sales).values() {
        let new_price = ledger.next_price();
        let quantity = ledger.next_quantity(new_price);

        if quantity == 0 && !ledger.widgets.is_empty() {
            tracing::warn!(
                producer = ledger.producer.id,
                min_price = ledger.producer.min_price,
                "producer exits the market at its price floor"
            );
        }

        for _ in 0..quantity {
            new_widgets.push(Widget::new(id, ledger.producer, new_price));
            id += 1;
        }
    }

    new_widgets
}
