//! Random draws used throughout the simulation
//!
//! Every helper takes the caller's RNG so a seeded `StdRng` makes whole runs
//! reproducible.

use crate::config::PriceRange;
use crate::error::{MarketError, Result};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Lower bound of the default consumer and producer price draw
pub const DEFAULT_PRICE_MIN: f64 = 0.25;
/// Upper bound (exclusive) of the default consumer and producer price draw
pub const DEFAULT_PRICE_MAX: f64 = 0.75;

/// Uniform draw in `[min, max)`, with `min` defaulting to 0 and `max` to 1
///
/// An empty or inverted range yields `min`.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use widget_market::random::rand_range;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let x = rand_range(&mut rng, Some(0.25), Some(0.75));
/// assert!((0.25..0.75).contains(&x));
///
/// let unit = rand_range(&mut rng, None, None);
/// assert!((0.0..1.0).contains(&unit));
/// ```
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: Option<f64>, max: Option<f64>) -> f64 {
    let min = min.unwrap_or(0.0);
    let max = max.unwrap_or(1.0);
    if max <= min {
        return min;
    }
    rng.random_range(min..max)
}

/// Fisher-Yates shuffle, walking from the last index down to 1
pub fn shuffle_in_place<T, R: Rng + ?Sized>(rng: &mut R, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Build a sampler for a uniform price range
pub fn uniform_price_draw<R: Rng + ?Sized>(range: PriceRange) -> Result<impl FnMut(&mut R) -> f64> {
    let dist = Uniform::new(range.min, range.max).map_err(|e| {
        MarketError::InvalidConfiguration(format!(
            "price range [{}, {}) is not sampleable: {}",
            range.min, range.max, e
        ))
    })?;
    Ok(move |rng: &mut R| dist.sample(rng))
}

/// The default price draw: uniform over `[0.25, 0.75)`
pub fn default_price_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rand_range(rng, Some(DEFAULT_PRICE_MIN), Some(DEFAULT_PRICE_MAX))
}
