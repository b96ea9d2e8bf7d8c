//! Optimization directions and score comparison.
//!
//! An [`Objective`] is one [`Optimize`] direction per score dimension.
//! With a single dimension scores are totally ordered (NaN sorts worst);
//! with several, comparison is Pareto dominance and population ordering
//! follows NSGA-II (front rank, then crowding distance).

pub mod front;

pub use front::{
    crowding_distance, non_dominated_sort, rank_and_crowding, Front, NondominatedSortResult,
};

use crate::error::{EvolveError, Result};
use crate::genome::{Population, Score};
use front::{dominance_cmp, Dominance};
use std::cmp::Ordering;

/// Direction of one objective dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Optimize {
    #[default]
    Minimize,
    Maximize,
}

impl Optimize {
    /// Orders two values so that `Less` means `a` is better. NaN is worst.
    pub fn cmp_values(self, a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match self {
                Optimize::Minimize => a.total_cmp(&b),
                Optimize::Maximize => b.total_cmp(&a),
            },
        }
    }

    /// Value mapped so that smaller is better. NaN maps to `+inf`.
    pub fn to_minimization(self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::INFINITY;
        }
        match self {
            Optimize::Minimize => value,
            Optimize::Maximize => -value,
        }
    }
}

/// Optimization goal over all score dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    directions: Vec<Optimize>,
}

impl Default for Objective {
    fn default() -> Self {
        Self::minimize()
    }
}

impl Objective {
    pub fn single(direction: Optimize) -> Self {
        Self {
            directions: vec![direction],
        }
    }

    pub fn minimize() -> Self {
        Self::single(Optimize::Minimize)
    }

    pub fn maximize() -> Self {
        Self::single(Optimize::Maximize)
    }

    /// Multi-objective goal. Fails on an empty direction list.
    pub fn multi(directions: Vec<Optimize>) -> Result<Self> {
        if directions.is_empty() {
            return Err(EvolveError::config("objective needs at least one direction"));
        }
        Ok(Self { directions })
    }

    pub fn directions(&self) -> &[Optimize] {
        &self.directions
    }

    pub fn dimensions(&self) -> usize {
        self.directions.len()
    }

    pub fn is_multi(&self) -> bool {
        self.directions.len() > 1
    }

    /// Score converted to a minimization vector.
    pub fn to_minimization(&self, score: &Score) -> Vec<f64> {
        self.directions
            .iter()
            .zip(score.values())
            .map(|(d, &v)| d.to_minimization(v))
            .collect()
    }

    /// Whether `a` dominates `b`: no worse in any dimension and better in at
    /// least one.
    pub fn dominates(&self, a: &Score, b: &Score) -> bool {
        dominance_cmp(&self.to_minimization(a), &self.to_minimization(b)) == Dominance::Left
    }

    /// `Less` when `a` is better. Single-objective scores are totally
    /// ordered; multi-objective scores that do not dominate each other
    /// compare `Equal`.
    pub fn cmp_scores(&self, a: &Score, b: &Score) -> Ordering {
        if self.is_multi() {
            return match dominance_cmp(&self.to_minimization(a), &self.to_minimization(b)) {
                Dominance::Left => Ordering::Less,
                Dominance::Right => Ordering::Greater,
                Dominance::Neither => Ordering::Equal,
            };
        }
        self.directions[0].cmp_values(a.as_f64(), b.as_f64())
    }

    /// Like [`cmp_scores`](Self::cmp_scores); missing scores are worst.
    pub fn cmp_optional(&self, a: Option<&Score>, b: Option<&Score>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => self.cmp_scores(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    pub fn is_better(&self, a: &Score, b: &Score) -> bool {
        self.cmp_scores(a, b) == Ordering::Less
    }

    /// Score has one value per dimension.
    pub fn accepts(&self, score: &Score) -> bool {
        score.len() == self.dimensions()
    }

    /// Population indices ordered best first.
    ///
    /// Stable: equal members keep population order. Multi-objective
    /// populations are ordered by Pareto rank, then crowding distance
    /// descending. Unevaluated members come last.
    pub fn order(&self, population: &Population) -> Vec<usize> {
        let mut order: Vec<usize> = (0..population.len()).collect();
        if self.is_multi() {
            let (ranks, crowding) = self.pareto_ranking(population);
            order.sort_by(|&a, &b| {
                ranks[a]
                    .cmp(&ranks[b])
                    .then_with(|| crowding[b].total_cmp(&crowding[a]))
            });
        } else {
            order.sort_by(|&a, &b| {
                self.cmp_optional(population[a].score(), population[b].score())
            });
        }
        order
    }

    /// Pareto rank and crowding distance of every member. Unevaluated
    /// members get rank `usize::MAX` and crowding 0.
    pub fn pareto_ranking(&self, population: &Population) -> (Vec<usize>, Vec<f64>) {
        let evaluated: Vec<usize> = (0..population.len())
            .filter(|&i| population[i].is_evaluated())
            .collect();
        let objectives: Vec<Vec<f64>> = evaluated
            .iter()
            .filter_map(|&i| population[i].score().map(|s| self.to_minimization(s)))
            .collect();
        let (sub_ranks, sub_crowding) = rank_and_crowding(&objectives);

        let mut ranks = vec![usize::MAX; population.len()];
        let mut crowding = vec![0.0; population.len()];
        for (k, &i) in evaluated.iter().enumerate() {
            ranks[i] = sub_ranks[k];
            crowding[i] = sub_crowding[k];
        }
        (ranks, crowding)
    }

    /// Index of the best evaluated member.
    pub fn best_index(&self, population: &Population) -> Option<usize> {
        self.order(population)
            .into_iter()
            .next()
            .filter(|&i| population[i].is_evaluated())
    }
}
