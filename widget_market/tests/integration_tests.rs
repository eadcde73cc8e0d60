use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use widget_market::analysis::{GenerationSummary, RunSummary};
use widget_market::pricing::PRICE_CEILING;
use widget_market::{
    naive_pricing, naive_sales, Consumer, EntityId, MarketConfig, Marketplace, Producer, Sale,
    Widget,
};

/// Three producers with costs 0.1/0.2/0.3 offering 3 widgets each at 0.1/0.3/0.6
fn widgets_1_to_9() -> Vec<Widget> {
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

fn consumers_04_x_5() -> Vec<Consumer> {
    (13..18).map(|id| Consumer::new(id, 0.4)).collect()
}

fn consumers_025_to_029() -> Vec<Consumer> {
    [0.25, 0.26, 0.27, 0.28, 0.29]
        .iter()
        .enumerate()
        .map(|(i, &p)| Consumer::new(18 + i, p))
        .collect()
}

fn sum_of_prices(widgets: &[Widget]) -> f64 {
    widgets.iter().map(|w| w.price).sum()
}

fn assert_valid_matching(sales: &[Sale]) {
    let mut widget_ids = HashSet::new();
    let mut consumer_ids = HashSet::new();
    for sale in sales {
        assert!(
            sale.widget.price <= sale.consumer.max_price,
            "Sale at {} above budget {}",
            sale.widget.price,
            sale.consumer.max_price
        );
        assert!(widget_ids.insert(sale.widget.id), "Widget sold twice");
        assert!(consumer_ids.insert(sale.consumer.id), "Consumer bought twice");
    }
}

#[test]
fn test_naive_sales_fixtures() {
    let widgets = widgets_1_to_9();
    let mut rng = StdRng::seed_from_u64(42);

    // 6 widgets are <= 0.4, but only 5 consumers exist
    let sales = naive_sales(&consumers_04_x_5(), &widgets, &mut rng);
    assert_eq!(sales.len(), 5);

    // Only the three 0.1 widgets are within 0.25..0.29 budgets
    let sales = naive_sales(&consumers_025_to_029(), &widgets, &mut rng);
    assert_eq!(sales.len(), 3);
}

#[test]
fn test_naive_pricing_no_sales() {
    let widgets = widgets_1_to_9();
    let new_inventory = naive_pricing(&widgets, &[], 22);

    // First producer (3 widgets) is at min price and exits market
    assert_eq!(new_inventory.len(), widgets.len() - 3);

    // The rest reduce their prices by 0.01
    let delta = sum_of_prices(&widgets[3..]) - sum_of_prices(&new_inventory);
    assert_abs_diff_eq!(delta, 0.01 * 6.0, epsilon = 1e-9);
}

#[test]
fn test_naive_pricing_after_matching() {
    let widgets = widgets_1_to_9();
    let mut rng = StdRng::seed_from_u64(42);

    // 5 consumers at 0.4: the 0.1 tier sells out, 2 of 3 in the 0.3 tier sell
    let sales = naive_sales(&consumers_04_x_5(), &widgets, &mut rng);
    let new_inventory = naive_pricing(&widgets, &sales, 22);

    assert_eq!(new_inventory.len(), widgets.len());
    // One producer raises, one holds, one lowers
    let delta = sum_of_prices(&widgets) - sum_of_prices(&new_inventory);
    assert_abs_diff_eq!(delta, 0.0, epsilon = 1e-9);
}

#[test]
fn test_naive_pricing_full_sell_through() {
    let widgets = widgets_1_to_9();
    let sales: Vec<Sale> = widgets
        .iter()
        .enumerate()
        .map(|(i, w)| Sale::new(Consumer::new(30 + i, 1.0), *w))
        .collect();

    let new_inventory = naive_pricing(&widgets, &sales, 22);
    assert_eq!(new_inventory.len(), widgets.len());
    let delta = sum_of_prices(&new_inventory) - sum_of_prices(&widgets);
    assert_abs_diff_eq!(delta, 0.01 * 9.0, epsilon = 1e-9);
    assert!(new_inventory.iter().all(|w| w.price <= PRICE_CEILING));
}

#[test]
fn test_matching_invariants_across_many_markets() {
    for seed in 0..25 {
        let mut market = Marketplace::new(MarketConfig::new(50, 8, 6).with_seed(seed)).unwrap();
        market.run(20);

        for iteration in market.market_iterations() {
            assert_valid_matching(iteration.sales());
            let live: HashSet<EntityId> = iteration.widgets().iter().map(|w| w.id).collect();
            assert!(iteration.sales().iter().all(|s| live.contains(&s.widget.id)));
        }
    }
}

#[test]
fn test_generation_history_round_trip() {
    let mut market = Marketplace::new(MarketConfig::new(25, 5, 4)).unwrap();
    assert_eq!(market.market_iterations().len(), 1);
    assert_eq!(market.last_market_iteration().generation(), 0);

    for n in 1..=10 {
        market.iterate_market();
        assert_eq!(market.market_iterations().len(), n + 1);
        assert_eq!(market.last_market_iteration().generation(), n);
    }

    let generations: Vec<usize> = market
        .market_iterations()
        .iter()
        .map(|i| i.generation())
        .collect();
    assert_eq!(generations, (0..=10).collect::<Vec<_>>());
}

#[test]
fn test_population_is_fixed_across_generations() {
    let mut market = Marketplace::new(MarketConfig::new(25, 5, 4)).unwrap();
    let consumers = market.consumers().to_vec();
    let producers = market.producers().to_vec();
    market.run(10);

    for iteration in market.market_iterations() {
        assert_eq!(iteration.consumers(), consumers.as_slice());
        assert_eq!(iteration.producers(), producers.as_slice());
    }
}

#[test]
fn test_ids_never_reused() {
    let mut market = Marketplace::new(MarketConfig::new(25, 5, 4)).unwrap();
    market.run(15);

    let mut seen: HashSet<EntityId> = HashSet::new();
    for c in market.consumers() {
        assert!(seen.insert(c.id));
    }
    for p in market.producers() {
        assert!(seen.insert(p.id));
    }
    for iteration in market.market_iterations() {
        for w in iteration.widgets() {
            assert!(seen.insert(w.id), "Widget id {} reused", w.id);
        }
    }
    assert_eq!(seen.len(), market.entity_count());
    assert_eq!(market.next_id(), market.entity_count());
}

#[test]
fn test_freshly_built_market_surplus_is_bounded() {
    let market = Marketplace::new(MarketConfig::new(1000, 100, 10)).unwrap();
    let surplus = market.last_market_iteration().total_surplus();

    assert!(surplus > 0.0, "Some trade should occur, surplus {}", surplus);
    assert!(surplus < 1000.0, "Surplus of more than 1 per consumer is impossible");
}

#[test]
fn test_deterministic_replay() {
    let run = || {
        let mut market = Marketplace::new(MarketConfig::new(60, 8, 5).with_seed(100)).unwrap();
        market.run(25);
        RunSummary::from_marketplace(&market)
    };

    let first = run();
    let second = run();

    assert_eq!(first.total_sales, second.total_sales);
    assert_eq!(first.generations, second.generations);
}

#[test]
fn test_prices_stay_within_floor_and_ceiling() {
    let mut market = Marketplace::new(MarketConfig::new(80, 10, 8).with_seed(5)).unwrap();
    market.run(100);

    for iteration in market.market_iterations() {
        for widget in iteration.widgets() {
            assert!(widget.price >= widget.producer.min_price);
            assert!(widget.price <= PRICE_CEILING);
        }
    }
}

#[test]
fn test_scarce_demand_drives_exits() {
    // 5 buyers cannot absorb 100 widgets; unsold producers fall to their floor
    let mut market = Marketplace::new(MarketConfig::new(5, 10, 10).with_seed(3)).unwrap();
    let initial = GenerationSummary::from_iteration(market.last_market_iteration());
    market.run(150);
    let last = GenerationSummary::from_iteration(market.last_market_iteration());

    assert!(last.active_producers < initial.active_producers);
    assert!(last.num_widgets < initial.num_widgets);
}
