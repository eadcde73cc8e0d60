//! Matching engine
//!
//! Consumers arrive in a random order and each tries the single cheapest
//! widget still on offer. A widget priced above the consumer's maximum stays
//! on offer for whoever comes next.

use crate::random::shuffle_in_place;
use crate::{Consumer, Sale, Widget};
use rand::rngs::StdRng;
use rand::Rng;

/// A rule that clears one generation's inventory against consumer demand
///
/// Implementations must sell each widget at most once, let each consumer buy
/// at most once, and never sell above a consumer's `max_price`.
pub trait SalesStrategy {
    fn match_sales(&self, consumers: &[Consumer], widgets: &[Widget], rng: &mut StdRng)
        -> Vec<Sale>;
}

impl<F> SalesStrategy for F
where
    F: Fn(&[Consumer], &[Widget], &mut StdRng) -> Vec<Sale>,
{
    fn match_sales(
        &self,
        consumers: &[Consumer],
        widgets: &[Widget],
        rng: &mut StdRng,
    ) -> Vec<Sale> {
        self(consumers, widgets, rng)
    }
}

/// Default matching rule, see [`naive_sales`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveSales;

impl SalesStrategy for NaiveSales {
    fn match_sales(
        &self,
        consumers: &[Consumer],
        widgets: &[Widget],
        rng: &mut StdRng,
    ) -> Vec<Sale> {
        naive_sales(consumers, widgets, rng)
    }
}

/// Random-order, cheapest-first matching
///
/// Widgets are sorted by price (stable, so equal prices keep their input
/// order) and consumers are shuffled. Each consumer in turn considers only the
/// cheapest remaining widget and buys it if `price <= max_price`.
pub fn naive_sales<R: Rng + ?Sized>(
    consumers: &[Consumer],
    widgets: &[Widget],
    rng: &mut R,
) -> Vec<Sale> {
    if consumers.is_empty() || widgets.is_empty() {
        return Vec::new();
    }

    let mut sorted_widgets = widgets.to_vec();
    sorted_widgets.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut shuffled_consumers = consumers.to_vec();
    shuffle_in_place(rng, &mut shuffled_consumers);

    let mut sales = Vec::new();
    let mut available = sorted_widgets.iter().peekable();

    for consumer in shuffled_consumers {
        let Some(cheapest) = available.peek() else {
            break;
        };
        if cheapest.price <= consumer.max_price {
            sales.push(Sale::new(consumer, **cheapest));
            available.next();
        }
    }

    tracing::trace!(
        consumers = consumers.len(),
        widgets = widgets.len(),
        sales = sales.len(),
        "naive_sales cleared"
    );

    sales
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Producer;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn three_tier_widgets() -> Vec<Widget> {
        let producers = [
            Producer::new(0, 0.1),
            Producer::new(1, 0.2),
            Producer::new(2, 0.3),
        ];
        let prices = [0.1, 0.3, 0.6];
        let mut widgets = Vec::new();
        let mut id = 4;
        for (producer, price) in producers.iter().zip(prices) {
            for _ in 0..3 {
                widgets.push(Widget::new(id, *producer, price));
                id += 1;
            }
        }
        widgets
    }

    fn consumers(start_id: usize, max_prices: &[f64]) -> Vec<Consumer> {
        max_prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Consumer::new(start_id + i, p))
            .collect()
    }

    #[test]
    fn test_five_consumers_at_040_buy_five() {
        let widgets = three_tier_widgets();
        let buyers = consumers(13, &[0.4; 5]);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sales = naive_sales(&buyers, &widgets, &mut rng);
            assert_eq!(sales.len(), 5);
        }
    }

    #[test]
    fn test_low_budget_consumers_only_buy_cheapest_tier() {
        let widgets = three_tier_widgets();
        let buyers = consumers(18, &[0.25, 0.26, 0.27, 0.28, 0.29]);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sales = naive_sales(&buyers, &widgets, &mut rng);
            assert_eq!(sales.len(), 3);
            assert!(sales.iter().all(|s| s.widget.price == 0.1));
        }
    }

    #[test]
    fn test_price_equal_to_max_is_accepted() {
        let producer = Producer::new(0, 0.1);
        let widgets = vec![Widget::new(1, producer, 0.5)];
        let buyers = consumers(2, &[0.5]);
        let mut rng = StdRng::seed_from_u64(42);

        assert_eq!(naive_sales(&buyers, &widgets, &mut rng).len(), 1);
    }

    #[test]
    fn test_rejected_widget_stays_available() {
        // Whatever the order, the 0.9 consumer ends up with the 0.8 widget
        let producer = Producer::new(0, 0.1);
        let widgets = vec![Widget::new(1, producer, 0.8)];
        let buyers = consumers(2, &[0.2, 0.3, 0.9, 0.1]);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sales = naive_sales(&buyers, &widgets, &mut rng);
            assert_eq!(sales.len(), 1);
            assert_eq!(sales[0].consumer.max_price, 0.9);
        }
    }

    #[test]
    fn test_empty_inputs() {
        let mut rng = StdRng::seed_from_u64(42);
        let widgets = three_tier_widgets();
        let buyers = consumers(13, &[0.4; 5]);

        assert!(naive_sales(&[], &widgets, &mut rng).is_empty());
        assert!(naive_sales(&buyers, &[], &mut rng).is_empty());
    }

    #[test]
    fn test_sales_respect_budget_and_uniqueness() {
        let producer = Producer::new(0, 0.0);
        let widgets: Vec<Widget> = (0..40)
            .map(|i| Widget::new(100 + i, producer, i as f64 / 40.0))
            .collect();
        let buyers: Vec<Consumer> = (0..60)
            .map(|i| Consumer::new(200 + i, (i % 17) as f64 / 16.0))
            .collect();

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sales = naive_sales(&buyers, &widgets, &mut rng);

            let mut widget_ids = HashSet::new();
            let mut consumer_ids = HashSet::new();
            for sale in &sales {
                assert!(sale.widget.price <= sale.consumer.max_price);
                assert!(widget_ids.insert(sale.widget.id), "widget sold twice");
                assert!(consumer_ids.insert(sale.consumer.id), "consumer bought twice");
            }
        }
    }

    #[test]
    fn test_cheapest_widgets_sell_first() {
        let widgets = three_tier_widgets();
        let buyers = consumers(13, &[1.0; 4]);
        let mut rng = StdRng::seed_from_u64(9);

        let sales = naive_sales(&buyers, &widgets, &mut rng);
        let mut prices: Vec<f64> = sales.iter().map(|s| s.widget.price).collect();
        prices.sort_by(f64::total_cmp);
        assert_eq!(prices, vec![0.1, 0.1, 0.1, 0.3]);
    }

    #[test]
    fn test_closure_strategy() {
        let nobody_buys = |_: &[Consumer], _: &[Widget], _: &mut StdRng| Vec::<Sale>::new();
        let mut rng = StdRng::seed_from_u64(42);
        let sales = nobody_buys.match_sales(&consumers(0, &[1.0]), &three_tier_widgets(), &mut rng);
        assert!(sales.is_empty());

        let sales = NaiveSales.match_sales(&consumers(0, &[1.0]), &three_tier_widgets(), &mut rng);
        assert_eq!(sales.len(), 1);
    }
}
