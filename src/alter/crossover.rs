//! Crossover operators on chromosome pairs.

use super::permutation::{edge_recombination, order_crossover, pmx_crossover};
use super::program::{graph_chromosome, graph_crossover, graph_nodes, tree_crossover};
use super::{permutation_indices, with_permutation_indices};
use crate::codec::GenomeSpec;
use crate::error::{EvolveError, Result};
use crate::genome::{Chromosome, Gene, GeneType};
use crate::program::GraphMode;
use crate::random::{sample_indices, shuffle};
use rand::Rng;

/// Recombination method.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrossoverKind {
    /// Per-gene coin flip chooses the source parent.
    Uniform,
    /// `k` sorted cut points; alternate segments are exchanged.
    MultiPoint(usize),
    /// Positions are permuted identically in both parents, a single-point
    /// crossover is applied, and the permutation is undone.
    Shuffle,
    /// BLX-α: children are drawn uniformly from the parents' interval
    /// widened by `alpha` times its width on each side.
    Blend { alpha: f64 },
    /// `c1 = a + t(b - a)`, `c2 = b + t(a - b)` with `t ~ U(0, alpha)`.
    Intermediate { alpha: f64 },
    /// Both children get the per-gene mean.
    Mean,
    /// Simulated binary crossover with distribution index `contiguity`.
    SimulatedBinary { contiguity: f64 },
    /// PMX.
    PartiallyMapped,
    /// OX.
    Order,
    /// ERX.
    EdgeRecombination,
    /// Subtree swap. Children deeper than `max_depth` are discarded and the
    /// parents kept.
    Tree { max_depth: usize },
    /// Node-wise exchange of operations and incoming edges between nodes
    /// with the same index and kind.
    Graph,
}

impl CrossoverKind {
    pub fn name(&self) -> &'static str {
        match self {
            CrossoverKind::Uniform => "uniform_crossover",
            CrossoverKind::MultiPoint(_) => "multi_point_crossover",
            CrossoverKind::Shuffle => "shuffle_crossover",
            CrossoverKind::Blend { .. } => "blend_crossover",
            CrossoverKind::Intermediate { .. } => "intermediate_crossover",
            CrossoverKind::Mean => "mean_crossover",
            CrossoverKind::SimulatedBinary { .. } => "simulated_binary_crossover",
            CrossoverKind::PartiallyMapped => "pmx_crossover",
            CrossoverKind::Order => "order_crossover",
            CrossoverKind::EdgeRecombination => "edge_recombination_crossover",
            CrossoverKind::Tree { .. } => "tree_crossover",
            CrossoverKind::Graph => "graph_crossover",
        }
    }

    pub fn supports(&self, gene_type: GeneType) -> bool {
        match self {
            CrossoverKind::Uniform | CrossoverKind::MultiPoint(_) | CrossoverKind::Shuffle => {
                !matches!(gene_type, GeneType::Permutation | GeneType::Graph)
            }
            CrossoverKind::Blend { .. }
            | CrossoverKind::Intermediate { .. }
            | CrossoverKind::Mean
            | CrossoverKind::SimulatedBinary { .. } => gene_type.is_numeric(),
            CrossoverKind::PartiallyMapped
            | CrossoverKind::Order
            | CrossoverKind::EdgeRecombination => gene_type == GeneType::Permutation,
            CrossoverKind::Tree { .. } => gene_type == GeneType::Tree,
            CrossoverKind::Graph => gene_type == GeneType::Graph,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |what: String| -> Result<()> {
            Err(EvolveError::config(format!("{}: {what}", self.name())))
        };
        match *self {
            CrossoverKind::MultiPoint(0) => bad("needs at least one cut point".into()),
            CrossoverKind::Blend { alpha } | CrossoverKind::Intermediate { alpha }
                if !(alpha >= 0.0 && alpha.is_finite()) =>
            {
                bad(format!("alpha must be non-negative, got {alpha}"))
            }
            CrossoverKind::SimulatedBinary { contiguity } if !(contiguity >= 0.0) => {
                bad(format!("contiguity must be non-negative, got {contiguity}"))
            }
            CrossoverKind::Tree { max_depth: 0 } => bad("max_depth must be positive".into()),
            _ => Ok(()),
        }
    }

    /// Recombines one chromosome pair into two children.
    pub(crate) fn cross<R: Rng>(
        &self,
        a: &Chromosome,
        b: &Chromosome,
        spec: &GenomeSpec,
        rng: &mut R,
    ) -> Result<(Chromosome, Chromosome)> {
        if *self == CrossoverKind::Graph {
            let mode = spec.graph_mode.unwrap_or(GraphMode::Directed);
            let (c1, c2) = graph_crossover(&graph_nodes(a)?, &graph_nodes(b)?, mode, rng);
            return Ok((graph_chromosome(c1), graph_chromosome(c2)));
        }

        if a.len() != b.len() {
            return Err(EvolveError::invariant(format!(
                "{} needs equal-length parents, got {} and {}",
                self.name(),
                a.len(),
                b.len()
            )));
        }

        let mut left = a.genes().to_vec();
        let mut right = b.genes().to_vec();
        let n = left.len();

        match *self {
            CrossoverKind::Uniform => {
                for i in 0..n {
                    if rng.random_bool(0.5) {
                        std::mem::swap(&mut left[i], &mut right[i]);
                    }
                }
            }
            CrossoverKind::MultiPoint(k) => {
                if n >= 2 {
                    let mut cuts: Vec<usize> = sample_indices(n - 1, k, rng)
                        .into_iter()
                        .map(|c| c + 1)
                        .collect();
                    cuts.sort_unstable();
                    cuts.push(n);
                    let mut swapping = false;
                    let mut from = 0;
                    for cut in cuts {
                        if swapping {
                            left[from..cut].swap_with_slice(&mut right[from..cut]);
                        }
                        swapping = !swapping;
                        from = cut;
                    }
                }
            }
            CrossoverKind::Shuffle => {
                if n >= 2 {
                    let mut positions: Vec<usize> = (0..n).collect();
                    shuffle(&mut positions, rng);
                    let cut = rng.random_range(1..n);
                    for &p in &positions[cut..] {
                        std::mem::swap(&mut left[p], &mut right[p]);
                    }
                }
            }
            CrossoverKind::Blend { alpha } => {
                numeric_pairs(&mut left, &mut right, |x, y| {
                    let (lo, hi) = (x.min(y), x.max(y));
                    let d = alpha * (hi - lo);
                    let (lo, hi) = (lo - d, hi + d);
                    if hi > lo {
                        (rng.random_range(lo..hi), rng.random_range(lo..hi))
                    } else {
                        (x, y)
                    }
                })?;
            }
            CrossoverKind::Intermediate { alpha } => {
                numeric_pairs(&mut left, &mut right, |x, y| {
                    let t = if alpha > 0.0 {
                        rng.random_range(0.0..alpha)
                    } else {
                        0.0
                    };
                    (x + t * (y - x), y + t * (x - y))
                })?;
            }
            CrossoverKind::Mean => {
                numeric_pairs(&mut left, &mut right, |x, y| {
                    let mean = (x + y) / 2.0;
                    (mean, mean)
                })?;
            }
            CrossoverKind::SimulatedBinary { contiguity } => {
                numeric_pairs(&mut left, &mut right, |x, y| {
                    let u: f64 = rng.random();
                    let exponent = 1.0 / (contiguity + 1.0);
                    let beta = if u <= 0.5 {
                        (2.0 * u).powf(exponent)
                    } else {
                        (1.0 / (2.0 * (1.0 - u))).powf(exponent)
                    };
                    (
                        0.5 * ((1.0 + beta) * x + (1.0 - beta) * y),
                        0.5 * ((1.0 - beta) * x + (1.0 + beta) * y),
                    )
                })?;
            }
            CrossoverKind::PartiallyMapped
            | CrossoverKind::Order
            | CrossoverKind::EdgeRecombination => {
                let (p1, p2) = (permutation_indices(a)?, permutation_indices(b)?);
                let (c1, c2) = match self {
                    CrossoverKind::PartiallyMapped => pmx_crossover(&p1, &p2, rng),
                    CrossoverKind::Order => order_crossover(&p1, &p2, rng),
                    _ => edge_recombination(&p1, &p2, rng),
                };
                return Ok((
                    with_permutation_indices(a, &c1),
                    with_permutation_indices(b, &c2),
                ));
            }
            CrossoverKind::Tree { max_depth } => {
                for i in 0..n {
                    if let (Gene::Tree(x), Gene::Tree(y)) = (&left[i], &right[i]) {
                        let (c1, c2) = tree_crossover(x, y, max_depth, rng);
                        left[i] = Gene::Tree(c1);
                        right[i] = Gene::Tree(c2);
                    } else {
                        return Err(EvolveError::invariant("tree crossover on non-tree genes"));
                    }
                }
            }
            CrossoverKind::Graph => unreachable!("handled above"),
        }

        Ok((Chromosome::from_genes(left), Chromosome::from_genes(right)))
    }
}

/// Applies `f` to every numeric gene pair; results are clamped into bounds.
fn numeric_pairs(
    left: &mut [Gene],
    right: &mut [Gene],
    mut f: impl FnMut(f64, f64) -> (f64, f64),
) -> Result<()> {
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let (x, y) = match (l.as_f64(), r.as_f64()) {
            (Some(x), Some(y)) if l.gene_type().is_numeric() => (x, y),
            _ => {
                return Err(EvolveError::invariant(format!(
                    "arithmetic crossover on {} genes",
                    l.gene_type()
                )))
            }
        };
        let (cx, cy) = f(x, y);
        if let (Some(nl), Some(nr)) = (l.with_f64(cx), r.with_f64(cy)) {
            *l = nl;
            *r = nr;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, PermutationCodec, VectorCodec};
    use crate::genome::Genotype;
    use crate::random::create_rng;

    fn float_chromosome(values: &[f64]) -> Chromosome {
        let codec = VectorCodec::float(values.len(), 0.0..10.0).unwrap();
        let genotype = codec.encode(&mut create_rng(0));
        let genes = genotype.chromosomes()[0]
            .iter()
            .zip(values)
            .map(|(g, &v)| g.with_f64(v).unwrap())
            .collect();
        Chromosome::from_genes(genes)
    }

    fn values(c: &Chromosome) -> Vec<f64> {
        c.iter().filter_map(Gene::as_f64).collect()
    }

    fn spec(gene_type: GeneType) -> GenomeSpec {
        GenomeSpec::new(gene_type)
    }

    #[test]
    fn test_uniform_keeps_gene_multiset_per_position() {
        let a = float_chromosome(&[1.0, 1.0, 1.0, 1.0]);
        let b = float_chromosome(&[2.0, 2.0, 2.0, 2.0]);
        let mut rng = create_rng(42);
        let (c1, c2) = CrossoverKind::Uniform
            .cross(&a, &b, &spec(GeneType::Float), &mut rng)
            .unwrap();
        for (x, y) in values(&c1).into_iter().zip(values(&c2)) {
            assert_eq!(x + y, 3.0);
        }
    }

    #[test]
    fn test_multi_point_single_cut_swaps_tail() {
        let a = float_chromosome(&[1.0; 6]);
        let b = float_chromosome(&[2.0; 6]);
        let mut rng = create_rng(7);
        let (c1, _) = CrossoverKind::MultiPoint(1)
            .cross(&a, &b, &spec(GeneType::Float), &mut rng)
            .unwrap();
        let v = values(&c1);
        let cut = v.iter().position(|&x| x == 2.0).unwrap();
        assert!(cut >= 1);
        assert!(v[cut..].iter().all(|&x| x == 2.0), "tail swapped: {v:?}");
    }

    #[test]
    fn test_mean_and_intermediate_stay_between_parents() {
        let a = float_chromosome(&[1.0, 4.0]);
        let b = float_chromosome(&[3.0, 8.0]);
        let mut rng = create_rng(1);
        let (c1, c2) = CrossoverKind::Mean
            .cross(&a, &b, &spec(GeneType::Float), &mut rng)
            .unwrap();
        assert_eq!(values(&c1), vec![2.0, 6.0]);
        assert_eq!(values(&c2), vec![2.0, 6.0]);

        let (c1, _) = CrossoverKind::Intermediate { alpha: 1.0 }
            .cross(&a, &b, &spec(GeneType::Float), &mut rng)
            .unwrap();
        let v = values(&c1);
        assert!((1.0..=3.0).contains(&v[0]) && (4.0..=8.0).contains(&v[1]), "{v:?}");
    }

    #[test]
    fn test_blend_and_sbx_clamp_to_bounds() {
        let a = float_chromosome(&[0.0, 10.0]);
        let b = float_chromosome(&[10.0, 0.0]);
        let mut rng = create_rng(3);
        for kind in [
            CrossoverKind::Blend { alpha: 2.0 },
            CrossoverKind::SimulatedBinary { contiguity: 0.5 },
        ] {
            for _ in 0..50 {
                let (c1, c2) = kind.cross(&a, &b, &spec(GeneType::Float), &mut rng).unwrap();
                for v in values(&c1).into_iter().chain(values(&c2)) {
                    assert!((0.0..=10.0).contains(&v), "{} out of bounds: {v}", kind.name());
                }
            }
        }
    }

    #[test]
    fn test_permutation_crossovers_yield_permutations() {
        let codec = PermutationCodec::indices(12).unwrap();
        let mut rng = create_rng(42);
        for kind in [
            CrossoverKind::PartiallyMapped,
            CrossoverKind::Order,
            CrossoverKind::EdgeRecombination,
        ] {
            for _ in 0..20 {
                let a = codec.encode(&mut rng);
                let b = codec.encode(&mut rng);
                let (c1, c2) = kind
                    .cross(
                        &a.chromosomes()[0],
                        &b.chromosomes()[0],
                        &codec.spec(),
                        &mut rng,
                    )
                    .unwrap();
                assert!(codec.validate(&Genotype::new(vec![c1])).is_ok());
                assert!(codec.validate(&Genotype::new(vec![c2])).is_ok());
            }
        }
    }

    #[test]
    fn test_length_mismatch_is_invariant_error() {
        let a = float_chromosome(&[1.0, 2.0]);
        let b = float_chromosome(&[1.0]);
        let mut rng = create_rng(0);
        let err = CrossoverKind::Uniform
            .cross(&a, &b, &spec(GeneType::Float), &mut rng)
            .unwrap_err();
        assert!(matches!(err, EvolveError::Invariant(_)), "{err}");
    }

    #[test]
    fn test_supports_and_validate() {
        assert!(CrossoverKind::Uniform.supports(GeneType::Char));
        assert!(!CrossoverKind::Uniform.supports(GeneType::Permutation));
        assert!(!CrossoverKind::Blend { alpha: 0.5 }.supports(GeneType::Bit));
        assert!(CrossoverKind::Order.supports(GeneType::Permutation));
        assert!(CrossoverKind::Graph.supports(GeneType::Graph));
        assert!(CrossoverKind::MultiPoint(0).validate().is_err());
        assert!(CrossoverKind::Blend { alpha: -1.0 }.validate().is_err());
        assert!(CrossoverKind::SimulatedBinary { contiguity: 2.0 }.validate().is_ok());
    }
}
