use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, RngCore};

/// True with probability `chance`. Zero or negative never fires; 1.0 always does.
pub fn roll(rng: &mut dyn RngCore, chance: f64) -> bool {
    chance > 0.0 && rng.random::<f64>() < chance
}

/// Uniform draw from `[low, high)`, or `low` when the range is empty.
pub fn uniform(rng: &mut dyn RngCore, low: f64, high: f64) -> f64 {
    if high > low {
        rng.random_range(low..high)
    } else {
        low
    }
}

pub fn pick<'a, T>(rng: &mut dyn RngCore, items: &'a [T]) -> Option<&'a T> {
    items.choose(rng)
}

/// Up to `n` distinct items in random order.
pub fn pick_many<T: Clone>(rng: &mut dyn RngCore, items: &[T], n: usize) -> Vec<T> {
    items.choose_multiple(rng, n).cloned().collect()
}

pub fn shuffle<T>(rng: &mut dyn RngCore, items: &mut [T]) {
    items.shuffle(rng);
}
