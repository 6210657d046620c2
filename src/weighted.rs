//! Weighted random selection
//!
//! Items are drawn with probability proportional to their weight. Items with
//! a zero (or otherwise unusable) weight are never drawn.

use rand::Rng;

use crate::source::Item;

/// Anything that carries a selection weight
pub trait Weighted {
    fn weight(&self) -> f64;
}

impl Weighted for Item {
    fn weight(&self) -> f64 {
        self.weight
    }
}

impl<T: Weighted + ?Sized> Weighted for &T {
    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

fn effective_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Draw one item, returning it along with its index in `items`
///
/// Returns `None` for an empty slice or when no item has a positive weight.
/// When every weight is a whole number the draw is an integer in
/// `[1, total]`; otherwise a float in `[0, total)` is used.
pub fn pick_weighted<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<(usize, &'a T)>
where
    T: Weighted,
    R: Rng + ?Sized,
{
    let weights: Vec<f64> = items
        .iter()
        .map(|item| effective_weight(item.weight()))
        .collect();
    let total: f64 = weights.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        return None;
    }

    if weights.iter().all(|w| w.fract() == 0.0) && total <= u64::MAX as f64 {
        let mut target = rng.gen_range(1..=total as u64);
        for (i, weight) in weights.iter().enumerate() {
            let weight = *weight as u64;
            if weight == 0 {
                continue;
            }
            if target <= weight {
                return Some((i, &items[i]));
            }
            target -= weight;
        }
    } else {
        let target = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (i, weight) in weights.iter().enumerate() {
            if *weight == 0.0 {
                continue;
            }
            cumulative += weight;
            if target < cumulative {
                return Some((i, &items[i]));
            }
        }
    }

    // Floating point slack: fall back to the last drawable item
    weights
        .iter()
        .rposition(|w| *w > 0.0)
        .map(|i| (i, &items[i]))
}
