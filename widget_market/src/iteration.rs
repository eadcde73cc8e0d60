use crate::sales::SalesStrategy;
use crate::{Consumer, EntityId, Producer, Sale, Widget};
use rand::rngs::StdRng;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::rc::Rc;

/// Snapshot of one generation: who was in the market, what was on offer, and
/// what sold
///
/// Sales are computed once, when the snapshot is built.
#[derive(Debug, Clone)]
pub struct MarketIteration {
    generation: usize,
    producers: Rc<[Producer]>,
    consumers: Rc<[Consumer]>,
    widgets: Vec<Widget>,
    sales: Vec<Sale>,
}

impl MarketIteration {
    pub fn new(
        generation: usize,
        producers: Rc<[Producer]>,
        consumers: Rc<[Consumer]>,
        widgets: Vec<Widget>,
        sales_strategy: &dyn SalesStrategy,
        rng: &mut StdRng,
    ) -> Self {
        let sales = sales_strategy.match_sales(&consumers, &widgets, rng);
        MarketIteration {
            generation,
            producers,
            consumers,
            widgets,
            sales,
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn num_sales(&self) -> usize {
        self.sales.len()
    }

    /// Sum of total surplus over all sales, 0 when nothing sold
    pub fn total_surplus(&self) -> f64 {
        self.sales.iter().map(Sale::total_surplus).sum()
    }

    pub fn consumer_surplus(&self) -> f64 {
        self.sales.iter().map(Sale::consumer_surplus).sum()
    }

    pub fn producer_surplus(&self) -> f64 {
        self.sales.iter().map(Sale::producer_surplus).sum()
    }

    /// Sales grouped by the selling producer's id
    pub fn sales_by_producer_id(&self) -> BTreeMap<EntityId, Vec<Sale>> {
        let mut by_producer: BTreeMap<EntityId, Vec<Sale>> = BTreeMap::new();
        for sale in &self.sales {
            by_producer.entry(sale.producer_id()).or_default().push(*sale);
        }
        by_producer
    }

    /// Inventory that found no buyer this generation
    pub fn unsold_widgets(&self) -> Vec<Widget> {
        let sold: HashSet<EntityId> = self.sales.iter().map(|s| s.widget.id).collect();
        self.widgets
            .iter()
            .filter(|w| !sold.contains(&w.id))
            .copied()
            .collect()
    }

    /// Ids of producers with any inventory on offer this generation
    pub fn active_producers(&self) -> BTreeSet<EntityId> {
        self.widgets.iter().map(|w| w.producer.id).collect()
    }

    pub fn mean_sale_price(&self) -> Option<f64> {
        if self.sales.is_empty() {
            return None;
        }
        let total: f64 = self.sales.iter().map(|s| s.widget.price).sum();
        Some(total / self.sales.len() as f64)
    }
}
