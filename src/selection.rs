//! Selection strategies.
//!
//! A [`Selector`] picks `count` members of a population, either as parents
//! for the offspring or as survivors. Every selector works from the
//! objective's stable best-first order (see
//! [`Objective::order`](crate::objective::Objective::order)), so ties are
//! broken by population order and multi-objective populations are handled
//! through Pareto rank and crowding distance.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"
//! - Baker (1987), "Reducing Bias and Inefficiency in the Selection Algorithm"
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"

use crate::error::{EvolveError, Result};
use crate::genome::{Phenotype, Population};
use crate::objective::{Objective, Optimize};
use crate::random::sample_indices;
use rand::Rng;

const EPSILON: f64 = 1e-10;

/// Selection strategy.
///
/// All strategies sample with replacement unless stated otherwise.
///
/// # Examples
///
/// ```
/// use u_evolve::selection::Selector;
///
/// // Tournament with size 3 (moderate selection pressure)
/// let sel = Selector::Tournament(3);
/// assert_eq!(sel.name(), "tournament");
/// assert!(Selector::Boltzmann(0.0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selector {
    /// Pick `k` distinct members at random, keep the best.
    ///
    /// Higher `k` = stronger selection pressure. `k` is clamped to the
    /// population size.
    Tournament(usize),

    /// Fitness-proportionate selection.
    ///
    /// Weights are scores shifted to be positive: `f - min + ε` when
    /// maximizing, `max - f + ε` when minimizing. Multi-objective
    /// populations use linear rank weights instead.
    Roulette,

    /// Linear ranking with full pressure; same as `LinearRank(1.0)`.
    Rank,

    /// Linear ranking. The member at position `p` (0 = best) of `n` gets
    /// weight `(1 - pressure) + pressure * (n - p) / n`; pressure 0 is
    /// uniform selection.
    LinearRank(f64),

    /// Softmax over normalized fitness (best = 1, worst = 0) divided by the
    /// temperature. Low temperatures approach elitism.
    Boltzmann(f64),

    /// The best `count` members, deterministically. Cycles when more are
    /// requested than exist.
    Elite,

    /// Everyone except the `n` worst, in population order. Cycles when more
    /// are requested.
    SteadyState(usize),

    /// NSGA-II survival: whole fronts by rank, the last partial front by
    /// crowding distance descending.
    Nsga2,

    /// Tournament of size `k` comparing (front rank, crowding distance).
    TournamentNsga2(usize),

    /// Stochastic universal sampling over the roulette weights: one spin
    /// with `count` evenly spaced pointers.
    StochasticUniversal,

    /// Uniform random selection.
    Random,
}

impl Default for Selector {
    fn default() -> Self {
        Selector::Tournament(3)
    }
}

impl Selector {
    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Selector::Tournament(_) => "tournament",
            Selector::Roulette => "roulette",
            Selector::Rank => "rank",
            Selector::LinearRank(_) => "linear_rank",
            Selector::Boltzmann(_) => "boltzmann",
            Selector::Elite => "elite",
            Selector::SteadyState(_) => "steady_state",
            Selector::Nsga2 => "nsga2",
            Selector::TournamentNsga2(_) => "tournament_nsga2",
            Selector::StochasticUniversal => "stochastic_universal",
            Selector::Random => "random",
        }
    }

    /// Checks the selector parameters.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Selector::Tournament(0) | Selector::TournamentNsga2(0) => Err(EvolveError::config(
                format!("{} size must be at least 1", self.name()),
            )),
            Selector::LinearRank(p) if !(0.0..=1.0).contains(&p) => Err(EvolveError::config(
                format!("linear_rank pressure must be in [0, 1], got {p}"),
            )),
            Selector::Boltzmann(t) if !(t > 0.0 && t.is_finite()) => Err(EvolveError::config(
                format!("boltzmann temperature must be positive, got {t}"),
            )),
            _ => Ok(()),
        }
    }

    /// Selects `count` members and returns their indices.
    ///
    /// Returns an empty vector for an empty population.
    pub fn select_indices<R: Rng>(
        &self,
        population: &Population,
        objective: &Objective,
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        let n = population.len();
        if n == 0 || count == 0 {
            return Vec::new();
        }

        let order = objective.order(population);
        let mut position = vec![0usize; n];
        for (p, &i) in order.iter().enumerate() {
            position[i] = p;
        }

        match *self {
            Selector::Tournament(k) => (0..count)
                .map(|_| tournament(n, k, rng, |i| position[i]))
                .collect(),
            Selector::TournamentNsga2(k) => {
                let (ranks, crowding) = objective.pareto_ranking(population);
                (0..count)
                    .map(|_| {
                        tournament_by(n, k, rng, |a, b| {
                            ranks[a]
                                .cmp(&ranks[b])
                                .then_with(|| crowding[b].total_cmp(&crowding[a]))
                        })
                    })
                    .collect()
            }
            Selector::Roulette => {
                let weights = fitness_weights(population, objective, &position);
                (0..count).map(|_| spin(&weights, rng)).collect()
            }
            Selector::StochasticUniversal => {
                let weights = fitness_weights(population, objective, &position);
                stochastic_universal(&weights, count, rng)
            }
            Selector::Rank => linear_rank(&order, 1.0, count, rng),
            Selector::LinearRank(pressure) => linear_rank(&order, pressure, count, rng),
            Selector::Boltzmann(temperature) => {
                let weights: Vec<f64> = normalized_fitness(population, objective, &position)
                    .into_iter()
                    .map(|f| ((f - 1.0) / temperature).exp())
                    .collect();
                (0..count).map(|_| spin(&weights, rng)).collect()
            }
            Selector::Elite | Selector::Nsga2 => cycle(&order, count),
            Selector::SteadyState(replace) => {
                let worst = &order[n - replace.min(n - 1)..];
                let kept: Vec<usize> = (0..n).filter(|i| !worst.contains(i)).collect();
                cycle(&kept, count)
            }
            Selector::Random => (0..count).map(|_| rng.random_range(0..n)).collect(),
        }
    }

    /// Selects `count` members and returns clones of them.
    pub fn select<R: Rng>(
        &self,
        population: &Population,
        objective: &Objective,
        count: usize,
        rng: &mut R,
    ) -> Vec<Phenotype> {
        self.select_indices(population, objective, count, rng)
            .into_iter()
            .map(|i| population[i].clone())
            .collect()
    }
}

fn cycle(indices: &[usize], count: usize) -> Vec<usize> {
    indices.iter().copied().cycle().take(count).collect()
}

/// Tournament where a lower key wins.
fn tournament<R: Rng>(n: usize, k: usize, rng: &mut R, key: impl Fn(usize) -> usize) -> usize {
    tournament_by(n, k, rng, |a, b| key(a).cmp(&key(b)))
}

/// Tournament over `k` distinct contestants; ties keep the first sampled.
fn tournament_by<R: Rng>(
    n: usize,
    k: usize,
    rng: &mut R,
    cmp: impl Fn(usize, usize) -> std::cmp::Ordering,
) -> usize {
    let contestants = sample_indices(n, k.clamp(1, n), rng);
    let mut best = contestants[0];
    for &i in &contestants[1..] {
        if cmp(i, best) == std::cmp::Ordering::Less {
            best = i;
        }
    }
    best
}

/// Roulette wheel spin over non-negative weights.
fn spin<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.random_range(0..weights.len());
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    weights.len() - 1 // floating-point fallback
}

fn stochastic_universal<R: Rng>(weights: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return (0..count).map(|_| rng.random_range(0..weights.len())).collect();
    }

    let step = total / count as f64;
    let start = rng.random_range(0.0..step);
    let mut selected = Vec::with_capacity(count);
    let mut cumulative = weights[0];
    let mut i = 0;
    for pointer in (0..count).map(|c| start + c as f64 * step) {
        while cumulative <= pointer && i + 1 < weights.len() {
            i += 1;
            cumulative += weights[i];
        }
        selected.push(i);
    }
    selected
}

fn linear_rank<R: Rng>(order: &[usize], pressure: f64, count: usize, rng: &mut R) -> Vec<usize> {
    let n = order.len() as f64;
    let weights: Vec<f64> = (0..order.len())
        .map(|p| (1.0 - pressure) + pressure * (n - p as f64) / n)
        .collect();
    (0..count).map(|_| order[spin(&weights, rng)]).collect()
}

/// Single-objective score values usable for fitness-proportionate weights.
fn finite_values(population: &Population) -> Vec<Option<f64>> {
    population
        .iter()
        .map(|p| p.score().map(|s| s.as_f64()).filter(|v| v.is_finite()))
        .collect()
}

/// Roulette weights per population index.
fn fitness_weights(population: &Population, objective: &Objective, position: &[usize]) -> Vec<f64> {
    let n = population.len();
    if objective.is_multi() {
        return position.iter().map(|&p| (n - p) as f64).collect();
    }

    let values = finite_values(population);
    let finite = values.iter().flatten();
    let min = finite.clone().copied().fold(f64::INFINITY, f64::min);
    let max = finite.copied().fold(f64::NEG_INFINITY, f64::max);
    if min > max {
        return vec![1.0; n];
    }

    values
        .iter()
        .map(|v| match v {
            Some(f) => match objective.directions()[0] {
                Optimize::Minimize => max - f + EPSILON,
                Optimize::Maximize => f - min + EPSILON,
            },
            None => EPSILON,
        })
        .collect()
}

/// Fitness scaled to `[0, 1]` with the best member at 1.
fn normalized_fitness(population: &Population, objective: &Objective, position: &[usize]) -> Vec<f64> {
    let n = population.len();
    if objective.is_multi() || n == 1 {
        let last = (n - 1).max(1) as f64;
        return position.iter().map(|&p| 1.0 - p as f64 / last).collect();
    }

    let values = finite_values(population);
    let finite = values.iter().flatten();
    let min = finite.clone().copied().fold(f64::INFINITY, f64::min);
    let max = finite.copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|v| match v {
            Some(_) if range <= 0.0 => 1.0,
            Some(f) => match objective.directions()[0] {
                Optimize::Minimize => (max - f) / range,
                Optimize::Maximize => (f - min) / range,
            },
            None => 0.0,
        })
        .collect()
}
