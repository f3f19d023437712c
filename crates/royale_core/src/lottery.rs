//! Weighted draws shared by the macro resolver and credit attribution.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::team::Team;

/// Index drawn in proportion to `weights`, or `None` when no weight is
/// positive.
pub fn weighted_index<R: Rng + ?Sized>(weights: &[u32], rng: &mut R) -> Option<usize> {
    WeightedIndex::new(weights).ok().map(|dist| dist.sample(rng))
}

/// Value drawn from a `(value, weight)` table.
pub fn draw_table<R: Rng + ?Sized, T: Copy>(table: &[(T, u32)], rng: &mut R) -> Option<T> {
    let weights: Vec<u32> = table.iter().map(|&(_, w)| w).collect();
    weighted_index(&weights, rng).map(|i| table[i].0)
}

/// Roster index of the member credited with one point, weighted by role.
pub fn credit_recipient<R: Rng + ?Sized>(team: &Team, rng: &mut R) -> Option<usize> {
    let weights: Vec<u32> = team.fighters.iter().map(|f| f.role.credit_weight()).collect();
    weighted_index(&weights, rng)
}
