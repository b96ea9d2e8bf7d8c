//! Pareto ranking and front maintenance.
//!
//! # Algorithms
//!
//! - [`non_dominated_sort`]: Fast non-dominated sorting (Deb et al., 2002)
//! - [`crowding_distance`]: Crowding distance assignment for diversity preservation
//! - [`Front`]: the non-dominated members of a population, bounded in size
//!
//! Every function here works on **minimization** vectors; use
//! [`Objective::to_minimization`](super::Objective::to_minimization) to
//! convert scores first.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - IEEE Transactions on Evolutionary Computation, 6(2), 182-197

use super::Objective;
use crate::genome::{Phenotype, Population, Score};

/// Result of non-dominated sorting.
///
/// Each element of `ranks` corresponds to the Pareto rank of the solution
/// at the same index. Rank 0 is the Pareto front (non-dominated solutions).
#[derive(Debug, Clone)]
pub struct NondominatedSortResult {
    /// Pareto rank for each solution (0 = front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` contains rank-0 indices, etc.
    /// Within a front, indices are ascending.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting.
///
/// All objectives are **minimized**. Returns empty ranks and fronts for an
/// empty input.
///
/// # Complexity
///
/// O(m * n²) where m = number of objectives, n = number of solutions
///
/// # Example
///
/// ```
/// use u_evolve::objective::non_dominated_sort;
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
///     vec![4.0, 4.0], // dominated by (3, 3)
/// ];
///
/// let result = non_dominated_sort(&objectives);
/// assert_eq!(result.ranks, vec![0, 0, 0, 1]);
/// assert_eq!(result.fronts, vec![vec![0, 1, 2], vec![3]]);
/// ```
pub fn non_dominated_sort(objectives: &[Vec<f64>]) -> NondominatedSortResult {
    let n = objectives.len();
    if n == 0 {
        return NondominatedSortResult {
            ranks: Vec::new(),
            fronts: Vec::new(),
        };
    }

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            match dominance_cmp(&objectives[i], &objectives[j]) {
                Dominance::Left => {
                    dominated_by[i].push(j);
                    domination_count[j] += 1;
                }
                Dominance::Right => {
                    dominated_by[j].push(i);
                    domination_count[i] += 1;
                }
                Dominance::Neither => {}
            }
        }
    }

    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    let mut fronts = Vec::new();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len() + 1;
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }

    NondominatedSortResult { ranks, fronts }
}

/// Dominance comparison result.
#[derive(Debug, PartialEq)]
pub(crate) enum Dominance {
    /// Left dominates right.
    Left,
    /// Right dominates left.
    Right,
    /// Neither dominates the other.
    Neither,
}

/// Compare two minimization vectors for Pareto dominance.
pub(crate) fn dominance_cmp(a: &[f64], b: &[f64]) -> Dominance {
    let mut a_better_in_some = false;
    let mut b_better_in_some = false;

    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va < vb {
            a_better_in_some = true;
        } else if vb < va {
            b_better_in_some = true;
        }
    }

    match (a_better_in_some, b_better_in_some) {
        (true, false) => Dominance::Left,
        (false, true) => Dominance::Right,
        _ => Dominance::Neither,
    }
}

/// Crowding distance of each solution within one front.
///
/// Boundary solutions of every dimension with a non-zero range receive
/// `f64::INFINITY`. Dimensions where all solutions share the same value are
/// skipped entirely, so a front of identical points has distance 0 everywhere
/// (and sets of one or two points are all boundary).
///
/// # Example
///
/// ```
/// use u_evolve::objective::crowding_distance;
///
/// let distances = crowding_distance(&[vec![1.0, 5.0], vec![3.0, 3.0], vec![5.0, 1.0]]);
/// assert!(distances[0].is_infinite());
/// assert!(distances[2].is_infinite());
/// assert!((distances[1] - 2.0).abs() < 1e-12);
/// ```
pub fn crowding_distance(objectives: &[Vec<f64>]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = objectives[0].len();
    let mut distances = vec![0.0f64; n];

    #[allow(clippy::needless_range_loop)] // dim is a column index into 2D data
    for dim in 0..m {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&a, &b| objectives[a][dim].total_cmp(&objectives[b][dim]));

        let min_val = objectives[indices[0]][dim];
        let max_val = objectives[indices[n - 1]][dim];
        let range = max_val - min_val;
        if !(range > 0.0 && range.is_finite()) {
            continue;
        }

        distances[indices[0]] = f64::INFINITY;
        distances[indices[n - 1]] = f64::INFINITY;
        for i in 1..(n - 1) {
            let prev = objectives[indices[i - 1]][dim];
            let next = objectives[indices[i + 1]][dim];
            distances[indices[i]] += (next - prev) / range;
        }
    }

    distances
}

/// Rank and crowding distance for every solution, crowding computed within
/// each front.
pub fn rank_and_crowding(objectives: &[Vec<f64>]) -> (Vec<usize>, Vec<f64>) {
    let sorted = non_dominated_sort(objectives);
    let mut crowding = vec![0.0; objectives.len()];
    for front in &sorted.fronts {
        let front_objs: Vec<Vec<f64>> = front.iter().map(|&i| objectives[i].clone()).collect();
        for (&i, d) in front.iter().zip(crowding_distance(&front_objs)) {
            crowding[i] = d;
        }
    }
    (sorted.ranks, crowding)
}

/// Non-dominated members of a population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Front {
    members: Vec<Phenotype>,
}

impl Front {
    /// Builds the first Pareto front of the evaluated members of
    /// `population`.
    ///
    /// If the front is larger than `range.1` it is truncated by repeatedly
    /// dropping the member with the smallest crowding distance, recomputed
    /// after each removal (ties drop the later member). A front smaller than
    /// `range.0` is returned as is.
    pub fn from_population(
        population: &Population,
        objective: &Objective,
        range: (usize, usize),
    ) -> Self {
        let evaluated: Vec<(&Phenotype, &Score)> = population
            .iter()
            .filter_map(|p| p.score().map(|s| (p, s)))
            .collect();
        let objectives: Vec<Vec<f64>> = evaluated
            .iter()
            .map(|(_, s)| objective.to_minimization(s))
            .collect();

        let sorted = non_dominated_sort(&objectives);
        let mut kept: Vec<usize> = sorted.fronts.first().cloned().unwrap_or_default();

        let max = range.1.max(1);
        while kept.len() > max {
            let kept_objs: Vec<Vec<f64>> = kept.iter().map(|&i| objectives[i].clone()).collect();
            let distances = crowding_distance(&kept_objs);
            let mut victim = 0;
            for (pos, &d) in distances.iter().enumerate() {
                if d <= distances[victim] {
                    victim = pos;
                }
            }
            kept.remove(victim);
        }

        Self {
            members: kept.into_iter().map(|i| evaluated[i].0.clone()).collect(),
        }
    }

    pub fn members(&self) -> &[Phenotype] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Scores of the front members, in front order.
    pub fn scores(&self) -> Vec<&Score> {
        self.members.iter().filter_map(Phenotype::score).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Genotype;
    use crate::objective::Optimize;

    // ---- Non-dominated sort ----

    #[test]
    fn test_single_solution() {
        let result = non_dominated_sort(&[vec![1.0, 2.0]]);
        assert_eq!(result.ranks, vec![0]);
        assert_eq!(result.fronts, vec![vec![0]]);
    }

    #[test]
    fn test_empty_input() {
        let result = non_dominated_sort(&[]);
        assert!(result.ranks.is_empty());
        assert!(result.fronts.is_empty());
    }

    #[test]
    fn test_clear_dominance() {
        let objs = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![0, 1, 2]);
        assert_eq!(result.fronts.len(), 3);
    }

    #[test]
    fn test_mixed_fronts() {
        let objs = vec![
            vec![1.0, 5.0],
            vec![3.0, 3.0],
            vec![5.0, 1.0],
            vec![4.0, 4.0], // dominated by (3,3)
            vec![6.0, 6.0], // dominated by (4,4) as well
        ];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_all_equal() {
        let objs = vec![vec![2.0, 2.0]; 3];
        let result = non_dominated_sort(&objs);
        assert!(result.ranks.iter().all(|&r| r == 0));
    }

    #[test]
    fn test_front_members_mutually_non_dominated() {
        let objs: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                let x = i as f64;
                vec![(x * 7.0) % 11.0, (x * 5.0) % 13.0]
            })
            .collect();
        let result = non_dominated_sort(&objs);
        for &a in &result.fronts[0] {
            for &b in &result.fronts[0] {
                assert_ne!(dominance_cmp(&objs[a], &objs[b]), Dominance::Left);
            }
        }
    }

    // ---- Crowding distance ----

    #[test]
    fn test_crowding_small_sets_are_boundary() {
        assert!(crowding_distance(&[vec![1.0, 2.0]])[0].is_infinite());
        let dist = crowding_distance(&[vec![1.0, 3.0], vec![3.0, 1.0]]);
        assert!(dist.iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_crowding_evenly_spaced() {
        let objs = vec![
            vec![0.0, 4.0],
            vec![1.0, 3.0],
            vec![2.0, 2.0],
            vec![3.0, 1.0],
            vec![4.0, 0.0],
        ];
        let dist = crowding_distance(&objs);
        assert!(dist[0].is_infinite());
        assert!(dist[4].is_infinite());
        assert!((dist[1] - dist[2]).abs() < 1e-10, "expected equal: {dist:?}");
        assert!((dist[2] - dist[3]).abs() < 1e-10, "expected equal: {dist:?}");
    }

    #[test]
    fn test_crowding_zero_range_dimension_skipped() {
        let objs = vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]];
        let dist = crowding_distance(&objs);
        assert!(dist[0].is_infinite());
        assert!(dist[2].is_infinite());
        assert!((dist[1] - 1.0).abs() < 1e-12);

        let identical = vec![vec![1.0, 1.0]; 4];
        assert!(crowding_distance(&identical).iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_rank_and_crowding() {
        let objs = vec![vec![1.0, 5.0], vec![3.0, 3.0], vec![5.0, 1.0], vec![4.0, 4.0]];
        let (ranks, crowding) = rank_and_crowding(&objs);
        assert_eq!(ranks, vec![0, 0, 0, 1]);
        assert!(crowding[3].is_infinite(), "single-member front is boundary");
        assert!(crowding[1].is_finite());
    }

    // ---- Front ----

    fn population(points: &[[f64; 2]]) -> Population {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut ph = Phenotype::new(i as u64, Genotype::new(Vec::new()), 0);
                ph.set_score(Score::from(*p));
                ph
            })
            .collect()
    }

    #[test]
    fn test_front_from_population() {
        let pop = population(&[[1.0, 5.0], [3.0, 3.0], [5.0, 1.0], [4.0, 4.0]]);
        let objective = Objective::multi(vec![Optimize::Minimize; 2]).unwrap();
        let front = Front::from_population(&pop, &objective, (1, 10));
        let ids: Vec<u64> = front.members().iter().map(Phenotype::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_front_respects_directions() {
        // maximize both: (4,4) dominates everything except (5,1) and (1,5)
        let pop = population(&[[1.0, 5.0], [3.0, 3.0], [5.0, 1.0], [4.0, 4.0]]);
        let objective = Objective::multi(vec![Optimize::Maximize; 2]).unwrap();
        let front = Front::from_population(&pop, &objective, (1, 10));
        let ids: Vec<u64> = front.members().iter().map(Phenotype::id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
    }

    #[test]
    fn test_front_truncation_keeps_extremes() {
        let points: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 9.0 - i as f64]).collect();
        let pop = population(&points);
        let objective = Objective::multi(vec![Optimize::Minimize; 2]).unwrap();
        let front = Front::from_population(&pop, &objective, (1, 4));
        assert_eq!(front.len(), 4);
        let ids: Vec<u64> = front.members().iter().map(Phenotype::id).collect();
        assert!(ids.contains(&0) && ids.contains(&9), "extremes kept: {ids:?}");
    }
}
