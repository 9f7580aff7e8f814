use gymnasium::Transition;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

pub trait Weighted {
    fn p(&self) -> f64;
}

impl Weighted for Transition {
    fn p(&self) -> f64 {
        self.probability
    }
}

/// Samples one item proportionally to its weight. `None` when there is nothing to pick
/// from or the weights do not form a distribution.
pub fn pick_next<'a, T: Weighted>(rng: &mut StdRng, ts: &'a [T]) -> Option<&'a T> {
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p())).ok()?;
    ts.get(dist.sample(rng))
}
