//! Novelty search.
//!
//! Replaces the objective with a behavioural novelty score: the mean
//! distance from an individual's behaviour descriptor to its `k` nearest
//! neighbours among the rest of the current population and the archive.
//! The engine hands the whole population to [`Problem::evaluate_batch`]
//! whenever it scores anything, so every member is ranked against the same
//! neighbourhood.
//! Sufficiently novel descriptors are archived so the search keeps moving
//! away from regions it has already explored.
//!
//! Novelty is to be **maximized**; pair it with [`Objective::maximize`].
//!
//! # Examples
//!
//! ```
//! use u_evolve::novelty::NoveltySearch;
//! use u_evolve::problem::Problem;
//!
//! let search = NoveltySearch::new(|x: &Vec<f64>| x.clone()).with_k(1);
//! let scores = search
//!     .evaluate_batch(&[vec![0.0], vec![1.0], vec![5.0]])
//!     .unwrap();
//! assert_eq!(scores[2].as_f64(), 4.0);
//! assert_eq!(search.archive_len(), 3);
//! ```
//!
//! # References
//!
//! - Lehman & Stanley (2011), "Abandoning Objectives: Evolution Through the
//!   Search for Novelty Alone"
//!
//! [`Objective::maximize`]: crate::objective::Objective::maximize

mod archive;

pub use archive::{EvictionPolicy, NoveltyArchive};

use crate::error::{EvolveError, FitnessError, Result};
use crate::genome::Score;
use crate::problem::Problem;
use std::sync::{Mutex, MutexGuard};

/// Distance between behaviour descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BehaviorDistance {
    #[default]
    Euclidean,
    /// `1 - cos(a, b)`; 0 for two zero vectors, 1 if only one is zero.
    Cosine,
    /// Number of differing positions; a length difference counts as
    /// differing positions.
    Hamming,
}

impl BehaviorDistance {
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            BehaviorDistance::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt(),
            BehaviorDistance::Cosine => {
                let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
                let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
                match (na == 0.0, nb == 0.0) {
                    (true, true) => 0.0,
                    (true, false) | (false, true) => 1.0,
                    _ => (1.0 - dot / (na * nb)).clamp(0.0, 2.0),
                }
            }
            BehaviorDistance::Hamming => {
                let differing = a.iter().zip(b).filter(|(x, y)| x != y).count();
                (differing + a.len().abs_diff(b.len())) as f64
            }
        }
    }
}

/// A [`Problem`] scoring values by behavioural novelty.
pub struct NoveltySearch<F> {
    descriptor: F,
    distance: BehaviorDistance,
    k: usize,
    threshold: f64,
    archive: Mutex<NoveltyArchive>,
}

impl<F> NoveltySearch<F> {
    /// Novelty search over `descriptor` with k = 15, threshold 0, an archive
    /// of 1000 and least-novel eviction.
    pub fn new(descriptor: F) -> Self {
        Self {
            descriptor,
            distance: BehaviorDistance::default(),
            k: 15,
            threshold: 0.0,
            archive: Mutex::new(NoveltyArchive::new(1000, EvictionPolicy::default())),
        }
    }

    pub fn with_distance(mut self, distance: BehaviorDistance) -> Self {
        self.distance = distance;
        self
    }

    /// Number of nearest neighbours averaged (at least 1).
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    /// Minimum novelty (exclusive) for a descriptor to be archived.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Archive capacity and eviction policy. Drops current archive content.
    pub fn with_archive(self, capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            archive: Mutex::new(NoveltyArchive::new(capacity, policy)),
            ..self
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(EvolveError::config(format!(
                "novelty threshold must be finite, got {}",
                self.threshold
            )));
        }
        if self.lock_archive().map_or(0, |a| a.capacity()) == 0 {
            return Err(EvolveError::config("novelty archive capacity must be positive"));
        }
        Ok(())
    }

    pub fn archive_len(&self) -> usize {
        self.lock_archive().map_or(0, |a| a.len())
    }

    /// Copy of the current archive.
    pub fn archive(&self) -> Option<NoveltyArchive> {
        self.lock_archive().ok().map(|a| a.clone())
    }

    fn lock_archive(&self) -> std::result::Result<MutexGuard<'_, NoveltyArchive>, FitnessError> {
        self.archive
            .lock()
            .map_err(|_| FitnessError::new("novelty archive lock poisoned"))
    }

    /// Mean distance to the `k` nearest of `others`; `f64::MAX` without
    /// neighbours.
    fn novelty<'a>(&self, descriptor: &[f64], others: impl Iterator<Item = &'a [f64]>) -> f64 {
        let mut distances: Vec<f64> = others
            .map(|o| self.distance.distance(descriptor, o))
            .collect();
        if distances.is_empty() {
            return f64::MAX;
        }
        distances.sort_by(f64::total_cmp);
        let k = self.k.min(distances.len());
        distances[..k].iter().sum::<f64>() / k as f64
    }
}

impl<T, F> Problem<T> for NoveltySearch<F>
where
    F: Fn(&T) -> Vec<f64> + Send + Sync,
{
    fn evaluate(&self, value: &T) -> std::result::Result<Score, FitnessError> {
        self.evaluate_batch(std::slice::from_ref(value))?
            .pop()
            .ok_or_else(|| FitnessError::new("empty novelty batch"))
    }

    /// Scores the batch against itself and the archive as it was before the
    /// call, then archives every descriptor above the threshold in batch
    /// order. Descriptors already archived are not stored twice.
    fn evaluate_batch(&self, values: &[T]) -> std::result::Result<Vec<Score>, FitnessError> {
        let descriptors: Vec<Vec<f64>> = values.iter().map(&self.descriptor).collect();
        let mut archive = self.lock_archive()?;

        let novelty: Vec<f64> = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let batch = descriptors
                    .iter()
                    .enumerate()
                    .filter(move |(j, _)| *j != i)
                    .map(|(_, o)| o.as_slice());
                self.novelty(d, batch.chain(archive.descriptors()))
            })
            .collect();

        for (descriptor, &n) in descriptors.into_iter().zip(&novelty) {
            if n > self.threshold && !archive.contains(&descriptor) {
                archive.insert(descriptor, n);
            }
        }
        Ok(novelty.into_iter().map(Score::from).collect())
    }

    fn prefers_batch(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> NoveltySearch<impl Fn(&Vec<f64>) -> Vec<f64> + Send + Sync> {
        NoveltySearch::new(|x: &Vec<f64>| x.clone())
    }

    #[test]
    fn test_lone_individual_is_maximally_novel() {
        let search = identity();
        let score = search.evaluate(&vec![1.0, 2.0]).unwrap();
        assert_eq!(score.as_f64(), f64::MAX);
        assert_eq!(search.archive_len(), 1);
    }

    #[test]
    fn test_knn_mean_against_batch_and_archive() {
        let search = identity().with_k(2);
        search.evaluate(&vec![10.0]).unwrap();

        let scores = search.evaluate_batch(&[vec![0.0], vec![1.0]]).unwrap();
        // 0.0: neighbours 1.0 (batch) and 10.0 (archive)
        assert!((scores[0].as_f64() - 5.5).abs() < 1e-12);
        // 1.0: neighbours 0.0 and 10.0
        assert!((scores[1].as_f64() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_gates_archive_and_capacity_bounds_it() {
        let search = identity()
            .with_k(1)
            .with_threshold(2.0)
            .with_archive(2, EvictionPolicy::LeastNovel);
        let scores = search
            .evaluate_batch(&[vec![0.0], vec![1.0], vec![5.0], vec![20.0]])
            .unwrap();
        // novelties: 1, 1, 4, 15 -> only the last two pass the threshold
        let values: Vec<f64> = scores.iter().map(Score::as_f64).collect();
        assert_eq!(values, vec![1.0, 1.0, 4.0, 15.0]);

        let archive = search.archive().unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.novelties().all(|n| n > 2.0));

        search
            .evaluate_batch(&[vec![100.0], vec![200.0], vec![300.0]])
            .unwrap();
        assert!(search.archive_len() <= 2);
    }

    #[test]
    fn test_rescoring_does_not_duplicate_archive_entries() {
        // a negative threshold archives everything, even zero novelty
        let search = identity().with_k(1).with_threshold(-1.0);
        let batch = [vec![0.0], vec![3.0]];
        search.evaluate_batch(&batch).unwrap();
        assert_eq!(search.archive_len(), 2);

        // the same population scored again: each sees its own archived copy
        let scores = search.evaluate_batch(&batch).unwrap();
        assert_eq!(scores[0].as_f64(), 0.0);
        assert_eq!(search.archive_len(), 2);
    }

    #[test]
    fn test_behavior_distances() {
        let a = [1.0, 0.0, 2.0];
        let b = [1.0, 1.0];
        assert_eq!(BehaviorDistance::Hamming.distance(&a, &b), 2.0);
        assert_eq!(BehaviorDistance::Euclidean.distance(&[0.0, 3.0], &[4.0, 0.0]), 5.0);
        assert!((BehaviorDistance::Cosine.distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
        assert_eq!(BehaviorDistance::Cosine.distance(&[0.0], &[0.0]), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(identity().validate().is_ok());
        assert!(identity().with_threshold(f64::NAN).validate().is_err());
        assert!(identity()
            .with_archive(0, EvictionPolicy::Oldest)
            .validate()
            .is_err());
        assert!(Problem::<Vec<f64>>::prefers_batch(&identity()));
    }
}
