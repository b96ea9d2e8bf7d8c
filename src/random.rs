//! Seedable random number generation.
//!
//! Every engine run owns exactly one generator created by [`create_rng`] and
//! hands it down to the operators explicitly, so that two engines in the
//! same process never share hidden state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator type used throughout the crate.
pub type EvolveRng = StdRng;

/// Creates a deterministic generator from a seed.
pub fn create_rng(seed: u64) -> EvolveRng {
    StdRng::seed_from_u64(seed)
}

/// Fisher-Yates shuffle.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Returns `k` distinct indices from `0..n`, in sampling order.
///
/// `k` is clamped to `n`.
pub fn sample_indices<R: Rng>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    rand::seq::index::sample(rng, n, k.min(n)).into_vec()
}

/// Picks a random segment `[start, end]` within `0..n` where `start <= end`.
pub fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = create_rng(7);
        let mut b = create_rng(7);
        for _ in 0..32 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = create_rng(42);
        let mut items: Vec<usize> = (0..50).collect();
        shuffle(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_indices_distinct() {
        let mut rng = create_rng(1);
        for _ in 0..100 {
            let mut picked = sample_indices(10, 4, &mut rng);
            assert_eq!(picked.len(), 4);
            picked.sort_unstable();
            picked.dedup();
            assert_eq!(picked.len(), 4);
        }
        assert_eq!(sample_indices(3, 10, &mut rng).len(), 3);
    }

    #[test]
    fn test_random_segment_bounds() {
        let mut rng = create_rng(42);
        for _ in 0..1000 {
            let (start, end) = random_segment(10, &mut rng);
            assert!(start <= end);
            assert!(end < 10);
        }
    }
}
