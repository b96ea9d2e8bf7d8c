//! Mutation operators.
//!
//! Gene-wise mutators visit every gene and change it with probability
//! `rate`. Chromosome-wise mutators (scramble, inversion, insert, hoist,
//! graph structure) fire once per chromosome with probability `rate`.
//! Numeric results are always clamped into the gene's bounds.
//!
//! # References
//!
//! - Deb & Goyal (1996), "A Combined Genetic Adaptive Search (GeneAS) for
//!   Engineering Design" (polynomial mutation)

use super::permutation::{insert_mutation, invert_mutation, scramble_mutation};
use super::program::{
    graph_chromosome, graph_nodes, graph_operation, graph_structure, hoist, tree_operation,
};
use crate::codec::GenomeSpec;
use crate::error::{EvolveError, Result};
use crate::genome::{Chromosome, Gene, GeneType};
use crate::program::GraphMode;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Mutation method.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MutatorKind {
    /// Resample the allele from the gene's range.
    Uniform,
    /// `allele + N(0, std_dev * span)`.
    Gaussian { std_dev: f64 },
    /// Combine with a random in-range value by `+`, `-`, `*` or `/`.
    Arithmetic,
    /// Deb's polynomial mutation with distribution index `eta`.
    Polynomial { eta: f64 },
    /// `allele + U(-magnitude, magnitude) * span`.
    Jitter { magnitude: f64 },
    BitFlip,
    /// Exchange the gene with another random position.
    Swap,
    /// Shuffle a random segment.
    Scramble,
    /// Reverse a random segment.
    Inversion,
    /// Move one gene to a random position.
    Insert,
    /// Replace a tree by one of its subtrees.
    Hoist,
    /// Swap a tree node's op for one of the same arity, or perturb a weight.
    TreeOperation { weight_std: f64 },
    /// Split an edge into a new vertex (`vertex_rate`) or add an edge
    /// (`edge_rate`).
    GraphStructure { vertex_rate: f64, edge_rate: f64 },
    /// Replace a vertex op or perturb an incoming edge weight.
    GraphOperation { weight_std: f64 },
}

impl MutatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            MutatorKind::Uniform => "uniform_mutator",
            MutatorKind::Gaussian { .. } => "gaussian_mutator",
            MutatorKind::Arithmetic => "arithmetic_mutator",
            MutatorKind::Polynomial { .. } => "polynomial_mutator",
            MutatorKind::Jitter { .. } => "jitter_mutator",
            MutatorKind::BitFlip => "bit_flip_mutator",
            MutatorKind::Swap => "swap_mutator",
            MutatorKind::Scramble => "scramble_mutator",
            MutatorKind::Inversion => "inversion_mutator",
            MutatorKind::Insert => "insert_mutator",
            MutatorKind::Hoist => "hoist_mutator",
            MutatorKind::TreeOperation { .. } => "tree_operation_mutator",
            MutatorKind::GraphStructure { .. } => "graph_structure_mutator",
            MutatorKind::GraphOperation { .. } => "graph_operation_mutator",
        }
    }

    pub fn supports(&self, gene_type: GeneType) -> bool {
        match self {
            MutatorKind::Uniform => matches!(
                gene_type,
                GeneType::Float | GeneType::Int | GeneType::Bit | GeneType::Char
            ),
            MutatorKind::Gaussian { .. }
            | MutatorKind::Arithmetic
            | MutatorKind::Polynomial { .. }
            | MutatorKind::Jitter { .. } => gene_type.is_numeric(),
            MutatorKind::BitFlip => gene_type == GeneType::Bit,
            MutatorKind::Swap | MutatorKind::Scramble | MutatorKind::Inversion => {
                gene_type != GeneType::Graph
            }
            MutatorKind::Insert => gene_type == GeneType::Permutation,
            MutatorKind::Hoist | MutatorKind::TreeOperation { .. } => gene_type == GeneType::Tree,
            MutatorKind::GraphStructure { .. } | MutatorKind::GraphOperation { .. } => {
                gene_type == GeneType::Graph
            }
        }
    }

    /// Whether the mutator fires once per chromosome rather than per gene.
    pub fn is_chromosome_wise(&self) -> bool {
        matches!(
            self,
            MutatorKind::Scramble
                | MutatorKind::Inversion
                | MutatorKind::Insert
                | MutatorKind::Hoist
                | MutatorKind::GraphStructure { .. }
        )
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = |what: &str, v: f64| -> Result<()> {
            if v >= 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(EvolveError::config(format!(
                    "{}: {what} must be non-negative, got {v}",
                    self.name()
                )))
            }
        };
        match *self {
            MutatorKind::Gaussian { std_dev } => non_negative("std_dev", std_dev),
            MutatorKind::Polynomial { eta } => non_negative("eta", eta),
            MutatorKind::Jitter { magnitude } => non_negative("magnitude", magnitude),
            MutatorKind::TreeOperation { weight_std }
            | MutatorKind::GraphOperation { weight_std } => non_negative("weight_std", weight_std),
            MutatorKind::GraphStructure {
                vertex_rate,
                edge_rate,
            } => {
                for (what, v) in [("vertex_rate", vertex_rate), ("edge_rate", edge_rate)] {
                    if !(0.0..=1.0).contains(&v) {
                        return Err(EvolveError::config(format!(
                            "{}: {what} must be in [0, 1], got {v}",
                            self.name()
                        )));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Mutates one chromosome. `None` when nothing changed.
    pub(crate) fn mutate<R: Rng>(
        &self,
        chromosome: &Chromosome,
        rate: f64,
        spec: &GenomeSpec,
        rng: &mut R,
    ) -> Result<Option<Chromosome>> {
        if chromosome.is_empty() || rate <= 0.0 {
            return Ok(None);
        }
        if self.is_chromosome_wise() {
            if !rng.random_bool(rate.min(1.0)) {
                return Ok(None);
            }
            return self.mutate_chromosome(chromosome, spec, rng);
        }

        if *self == MutatorKind::Swap {
            return Ok(swap_genes(chromosome, rate, rng));
        }
        if let MutatorKind::GraphOperation { weight_std } = *self {
            let mut nodes = graph_nodes(chromosome)?;
            let mut changed = false;
            for node in nodes.iter_mut() {
                if rng.random_bool(rate.min(1.0)) {
                    if let Some(mutated) = graph_operation(node, spec.ops.as_ref(), weight_std, rng)
                    {
                        *node = mutated;
                        changed = true;
                    }
                }
            }
            return Ok(changed.then(|| graph_chromosome(nodes)));
        }

        let mut genes = chromosome.genes().to_vec();
        let mut changed = false;
        for gene in genes.iter_mut() {
            if rng.random_bool(rate.min(1.0)) {
                *gene = self.mutate_gene(gene, spec, rng)?;
                changed = true;
            }
        }
        Ok(changed.then(|| Chromosome::from_genes(genes)))
    }

    fn mutate_chromosome<R: Rng>(
        &self,
        chromosome: &Chromosome,
        spec: &GenomeSpec,
        rng: &mut R,
    ) -> Result<Option<Chromosome>> {
        let mut genes = chromosome.genes().to_vec();
        match *self {
            MutatorKind::Scramble => scramble_mutation(&mut genes, rng),
            MutatorKind::Inversion => invert_mutation(&mut genes, rng),
            MutatorKind::Insert => insert_mutation(&mut genes, rng),
            MutatorKind::Hoist => {
                for gene in genes.iter_mut() {
                    *gene = match gene {
                        Gene::Tree(tree) => Gene::Tree(hoist(tree, rng)),
                        other => return Err(type_error(self, other)),
                    };
                }
            }
            MutatorKind::GraphStructure {
                vertex_rate,
                edge_rate,
            } => {
                let nodes = graph_nodes(chromosome)?;
                let mode = spec.graph_mode.unwrap_or(GraphMode::Directed);
                return Ok(
                    graph_structure(&nodes, spec.ops.as_ref(), mode, vertex_rate, edge_rate, rng)
                        .map(graph_chromosome),
                );
            }
            _ => return Ok(None),
        }
        let moved = genes.as_slice() != chromosome.genes();
        Ok(moved.then(|| Chromosome::from_genes(genes)))
    }

    fn mutate_gene<R: Rng>(&self, gene: &Gene, spec: &GenomeSpec, rng: &mut R) -> Result<Gene> {
        match (*self, gene) {
            (MutatorKind::Uniform, Gene::Float(_) | Gene::Int(_) | Gene::Bit(_) | Gene::Char(_)) => {
                Ok(gene.resample(rng))
            }
            (MutatorKind::BitFlip, Gene::Bit(b)) => Ok(Gene::Bit(!b)),
            (MutatorKind::TreeOperation { weight_std }, Gene::Tree(tree)) => Ok(Gene::Tree(
                tree_operation(tree, spec.ops.as_ref(), weight_std, rng),
            )),
            (
                MutatorKind::Gaussian { .. }
                | MutatorKind::Arithmetic
                | MutatorKind::Polynomial { .. }
                | MutatorKind::Jitter { .. },
                Gene::Float(_) | Gene::Int(_),
            ) => numeric(*self, gene, rng),
            (kind, other) => Err(type_error(&kind, other)),
        }
    }
}

fn type_error(kind: &MutatorKind, gene: &Gene) -> EvolveError {
    EvolveError::invariant(format!("{} on a {} gene", kind.name(), gene.gene_type()))
}

/// Exchanges each selected gene with another random position.
fn swap_genes<R: Rng>(chromosome: &Chromosome, rate: f64, rng: &mut R) -> Option<Chromosome> {
    let n = chromosome.len();
    if n < 2 {
        return None;
    }
    let mut genes = chromosome.genes().to_vec();
    let mut changed = false;
    for i in 0..n {
        if rng.random_bool(rate.min(1.0)) {
            let j = rng.random_range(0..n);
            genes.swap(i, j);
            changed |= i != j;
        }
    }
    changed.then(|| Chromosome::from_genes(genes))
}

fn numeric<R: Rng>(kind: MutatorKind, gene: &Gene, rng: &mut R) -> Result<Gene> {
    let (Some(x), Some((lo, hi)), Some(bounds)) =
        (gene.as_f64(), gene.numeric_range(), gene.numeric_bounds())
    else {
        return Err(type_error(&kind, gene));
    };
    let span = hi - lo;

    let value = match kind {
        MutatorKind::Gaussian { std_dev } => match Normal::new(0.0, std_dev * span) {
            Ok(normal) => x + normal.sample(rng),
            Err(_) => x,
        },
        MutatorKind::Jitter { magnitude } if magnitude > 0.0 => {
            x + rng.random_range(-magnitude..magnitude) * span
        }
        MutatorKind::Arithmetic => {
            let other = gene.resample(rng).as_f64().unwrap_or(x);
            match rng.random_range(0..4) {
                0 => x + other,
                1 => x - other,
                2 => x * other,
                _ if other != 0.0 => x / other,
                _ => x,
            }
        }
        MutatorKind::Polynomial { eta } => polynomial(x, bounds, eta, rng),
        _ => x,
    };

    gene.with_f64(value).ok_or_else(|| type_error(&kind, gene))
}

/// Deb's polynomial mutation of `x` within `[lo, hi]`.
fn polynomial<R: Rng>(x: f64, (lo, hi): (f64, f64), eta: f64, rng: &mut R) -> f64 {
    let width = hi - lo;
    if !(width > 0.0 && width.is_finite()) {
        return x;
    }
    let delta1 = (x - lo) / width;
    let delta2 = (hi - x) / width;
    let power = 1.0 / (eta + 1.0);
    let u: f64 = rng.random();

    let delta_q = if u < 0.5 {
        let v = 2.0 * u + (1.0 - 2.0 * u) * (1.0 - delta1).powf(eta + 1.0);
        v.powf(power) - 1.0
    } else {
        let v = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * (1.0 - delta2).powf(eta + 1.0);
        1.0 - v.powf(power)
    };
    x + delta_q * width
}
