use rand::seq::SliceRandom;
use rand::Rng;

/// Pick `count` distinct items uniformly at random (at least one, at most the pool size).
pub fn sample<T: Clone>(pool: &[T], count: usize) -> Vec<T> {
    sample_with(pool, count, &mut rand::thread_rng())
}

/// Same as [`sample`] with a caller-supplied random source.
pub fn sample_with<T: Clone, R: Rng + ?Sized>(pool: &[T], count: usize, rng: &mut R) -> Vec<T> {
    let amount = count.max(1).min(pool.len());
    let mut picked: Vec<T> = pool.choose_multiple(rng, amount).cloned().collect();
    picked.shuffle(rng);
    picked
}
