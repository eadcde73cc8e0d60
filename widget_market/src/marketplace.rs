//! Marketplace lifecycle
//!
//! A `Marketplace` seeds its population once, matches generation 0 at
//! construction, and appends one `MarketIteration` per call to
//! `iterate_market`. Consumers and producers never change after construction;
//! every generation's inventory is freshly minted by the pricing strategy.

use crate::config::MarketConfig;
use crate::error::Result;
use crate::iteration::MarketIteration;
use crate::pricing::{NaivePricing, PricingStrategy};
use crate::random::{rand_range, uniform_price_draw};
use crate::sales::{NaiveSales, SalesStrategy};
use crate::{Consumer, Entity, EntityId, Producer, Sale, Widget};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::rc::Rc;

/// Initial prices are never set above this
const INITIAL_PRICE_CAP: f64 = 1.0;

/// Draws a consumer's `max_price` or a producer's `min_price`
pub type PriceFn = Box<dyn FnMut(&mut StdRng) -> f64>;

/// Configures strategy overrides before building a [`Marketplace`]
///
/// # Example
///
/// ```
/// use widget_market::{MarketConfig, Marketplace};
///
/// let mut market = Marketplace::builder(MarketConfig::new(20, 4, 5))
///     .consumer_price_fn(|_| 0.6)
///     .build()
///     .unwrap();
/// market.run(3);
/// assert_eq!(market.market_iterations().len(), 4);
/// ```
pub struct MarketplaceBuilder {
    config: MarketConfig,
    consumer_price_fn: Option<PriceFn>,
    producer_price_fn: Option<PriceFn>,
    sales_strategy: Box<dyn SalesStrategy>,
    pricing_strategy: Box<dyn PricingStrategy>,
    rng: Option<StdRng>,
}

impl MarketplaceBuilder {
    pub fn new(config: MarketConfig) -> Self {
        MarketplaceBuilder {
            config,
            consumer_price_fn: None,
            producer_price_fn: None,
            sales_strategy: Box::new(NaiveSales),
            pricing_strategy: Box::new(NaivePricing),
            rng: None,
        }
    }

    pub fn consumer_price_fn<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut StdRng) -> f64 + 'static,
    {
        self.consumer_price_fn = Some(Box::new(f));
        self
    }

    pub fn producer_price_fn<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut StdRng) -> f64 + 'static,
    {
        self.producer_price_fn = Some(Box::new(f));
        self
    }

    pub fn sales_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Consumer], &[Widget], &mut StdRng) -> Vec<Sale> + 'static,
    {
        self.sales_strategy = Box::new(f);
        self
    }

    pub fn sales_strategy<S: SalesStrategy + 'static>(mut self, strategy: S) -> Self {
        self.sales_strategy = Box::new(strategy);
        self
    }

    pub fn pricing_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Widget], &[Sale], EntityId) -> Vec<Widget> + 'static,
    {
        self.pricing_strategy = Box::new(f);
        self
    }

    pub fn pricing_strategy<P: PricingStrategy + 'static>(mut self, strategy: P) -> Self {
        self.pricing_strategy = Box::new(strategy);
        self
    }

    /// Use this RNG instead of one seeded from `config.seed`
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Seed the population and inventory, then match generation 0
    pub fn build(self) -> Result<Marketplace> {
        let MarketplaceBuilder {
            config,
            consumer_price_fn,
            producer_price_fn,
            sales_strategy,
            pricing_strategy,
            rng,
        } = self;

        config.validate()?;

        let mut rng = rng.unwrap_or_else(|| StdRng::seed_from_u64(config.seed));
        let mut consumer_price_fn: PriceFn = match consumer_price_fn {
            Some(f) => f,
            None => Box::new(uniform_price_draw::<StdRng>(config.consumer_price_range)?),
        };
        let mut producer_price_fn: PriceFn = match producer_price_fn {
            Some(f) => f,
            None => Box::new(uniform_price_draw::<StdRng>(config.producer_price_range)?),
        };

        let mut next_id: EntityId = 0;
        let mut index = HashMap::new();

        let mut consumers = Vec::with_capacity(config.n_consumers);
        for _ in 0..config.n_consumers {
            let consumer = Consumer::new(next_id, consumer_price_fn(&mut rng));
            index.insert(next_id, Entity::Consumer(consumer));
            consumers.push(consumer);
            next_id += 1;
        }

        let mut producers = Vec::with_capacity(config.n_producers);
        for _ in 0..config.n_producers {
            let producer = Producer::new(next_id, producer_price_fn(&mut rng));
            index.insert(next_id, Entity::Producer(producer));
            producers.push(producer);
            next_id += 1;
        }

        // Value-based pricing: markup over cost with multiplicative noise
        let mut widgets = Vec::with_capacity(config.initial_inventory());
        for producer in &producers {
            let jitter = rand_range(
                &mut rng,
                Some(1.0 - config.markup_jitter),
                Some(1.0 + config.markup_jitter),
            );
            let price = (producer.min_price * config.initial_markup * jitter).min(INITIAL_PRICE_CAP);
            for _ in 0..config.widgets_per_producer {
                let widget = Widget::new(next_id, *producer, price);
                index.insert(next_id, Entity::Widget(widget));
                widgets.push(widget);
                next_id += 1;
            }
        }

        let consumers: Rc<[Consumer]> = consumers.into();
        let producers: Rc<[Producer]> = producers.into();

        let first = MarketIteration::new(
            0,
            Rc::clone(&producers),
            Rc::clone(&consumers),
            widgets,
            sales_strategy.as_ref(),
            &mut rng,
        );

        tracing::info!(
            consumers = consumers.len(),
            producers = producers.len(),
            widgets = first.widgets().len(),
            sales = first.num_sales(),
            "marketplace seeded"
        );

        Ok(Marketplace {
            config,
            next_id,
            index,
            consumers,
            producers,
            market_iterations: vec![first],
            sales_strategy,
            pricing_strategy,
            rng,
        })
    }
}

/// A population of consumers and producers trading over discrete generations
///
/// Always holds at least one `MarketIteration` (generation 0). Stepping is
/// `&mut self`, so a marketplace cannot be stepped from two places at once.
pub struct Marketplace {
    config: MarketConfig,
    next_id: EntityId,
    index: HashMap<EntityId, Entity>,
    consumers: Rc<[Consumer]>,
    producers: Rc<[Producer]>,
    market_iterations: Vec<MarketIteration>,
    sales_strategy: Box<dyn SalesStrategy>,
    pricing_strategy: Box<dyn PricingStrategy>,
    rng: StdRng,
}

impl Marketplace {
    /// Build with the default price draws and naive strategies
    pub fn new(config: MarketConfig) -> Result<Self> {
        MarketplaceBuilder::new(config).build()
    }

    pub fn builder(config: MarketConfig) -> MarketplaceBuilder {
        MarketplaceBuilder::new(config)
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// The most recent generation
    pub fn last_market_iteration(&self) -> &MarketIteration {
        self.market_iterations
            .last()
            .expect("marketplace always holds generation 0")
    }

    /// Every generation so far, oldest first
    pub fn market_iterations(&self) -> &[MarketIteration] {
        &self.market_iterations
    }

    pub fn generation(&self) -> usize {
        self.last_market_iteration().generation()
    }

    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    /// Live inventory: the latest generation's widgets only
    pub fn widgets(&self) -> &[Widget] {
        self.last_market_iteration().widgets()
    }

    /// Look up any consumer, producer or widget ever minted here
    pub fn lookup(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id)
    }

    /// Number of entities in the global index
    pub fn entity_count(&self) -> usize {
        self.index.len()
    }

    /// Id the next minted entity will receive
    pub fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Advance one generation
    ///
    /// Reprices the latest generation's widgets and sales into new inventory,
    /// records it in the index, and matches it against the same consumers.
    pub fn iterate_market(&mut self) {
        let last = self.last_market_iteration();
        let generation = last.generation() + 1;
        let new_widgets = self
            .pricing_strategy
            .reprice(last.widgets(), last.sales(), self.next_id);

        for widget in &new_widgets {
            self.index.insert(widget.id, Entity::Widget(*widget));
        }
        self.next_id += new_widgets.len();

        let iteration = MarketIteration::new(
            generation,
            Rc::clone(&self.producers),
            Rc::clone(&self.consumers),
            new_widgets,
            self.sales_strategy.as_ref(),
            &mut self.rng,
        );

        tracing::debug!(
            generation,
            widgets = iteration.widgets().len(),
            sales = iteration.num_sales(),
            active_producers = iteration.active_producers().len(),
            total_surplus = iteration.total_surplus(),
            "generation matched"
        );

        self.market_iterations.push(iteration);
    }

    /// Advance `generations` times
    pub fn run(&mut self, generations: usize) {
        for _ in 0..generations {
            self.iterate_market();
        }
    }
}
