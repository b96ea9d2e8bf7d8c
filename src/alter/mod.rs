//! Alterers: crossover and mutation applied to offspring genotypes.
//!
//! Alterers run in configured order and chain: the output of one is the
//! input of the next. Each reports which genotypes it touched so the engine
//! can turn them into new, unscored individuals.
//!
//! # Examples
//!
//! ```
//! use u_evolve::alter::{Alterer, CrossoverKind, MutatorKind};
//! use u_evolve::genome::GeneType;
//!
//! let alterers = vec![
//!     Alterer::crossover(CrossoverKind::SimulatedBinary { contiguity: 15.0 }, 0.9),
//!     Alterer::mutator(MutatorKind::Polynomial { eta: 20.0 }, 0.1),
//! ];
//! assert!(alterers.iter().all(|a| a.supports(GeneType::Float)));
//! assert_eq!(alterers[0].name(), "simulated_binary_crossover");
//! ```

pub mod crossover;
pub mod mutator;
pub mod permutation;
mod program;

pub use crossover::CrossoverKind;
pub use mutator::MutatorKind;

use crate::codec::GenomeSpec;
use crate::error::{EvolveError, Result};
use crate::genome::{Chromosome, Gene, GeneType, Genotype};
use rand::Rng;

/// Crossover with its application rate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Crossover {
    pub kind: CrossoverKind,
    pub rate: f64,
}

impl Crossover {
    /// Rate is clamped to `[0, 1]`.
    pub fn new(kind: CrossoverKind, rate: f64) -> Self {
        Self {
            kind,
            rate: rate.clamp(0.0, 1.0),
        }
    }
}

/// Mutator with its application rate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mutator {
    pub kind: MutatorKind,
    pub rate: f64,
}

impl Mutator {
    /// Rate is clamped to `[0, 1]`.
    pub fn new(kind: MutatorKind, rate: f64) -> Self {
        Self {
            kind,
            rate: rate.clamp(0.0, 1.0),
        }
    }
}

/// A configured alteration step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alterer {
    Crossover(Crossover),
    Mutator(Mutator),
}

impl Alterer {
    pub fn crossover(kind: CrossoverKind, rate: f64) -> Self {
        Alterer::Crossover(Crossover::new(kind, rate))
    }

    pub fn mutator(kind: MutatorKind, rate: f64) -> Self {
        Alterer::Mutator(Mutator::new(kind, rate))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Alterer::Crossover(c) => c.kind.name(),
            Alterer::Mutator(m) => m.kind.name(),
        }
    }

    pub fn rate(&self) -> f64 {
        match self {
            Alterer::Crossover(c) => c.rate,
            Alterer::Mutator(m) => m.rate,
        }
    }

    pub fn supports(&self, gene_type: GeneType) -> bool {
        match self {
            Alterer::Crossover(c) => c.kind.supports(gene_type),
            Alterer::Mutator(m) => m.kind.supports(gene_type),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let rate = self.rate();
        if !(0.0..=1.0).contains(&rate) {
            return Err(EvolveError::config(format!(
                "{}: rate must be in [0, 1], got {rate}",
                self.name()
            )));
        }
        match self {
            Alterer::Crossover(c) => c.kind.validate(),
            Alterer::Mutator(m) => m.kind.validate(),
        }
    }

    /// Alters `genotypes` in place and returns the indices that changed,
    /// ascending.
    ///
    /// A crossover picks, for each genotype with probability `rate`, a
    /// random distinct mate; every corresponding chromosome pair is
    /// recombined and both children replace their parents.
    pub fn alter<R: Rng>(
        &self,
        genotypes: &mut [Genotype],
        spec: &GenomeSpec,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        let n = genotypes.len();
        let mut altered = vec![false; n];

        match self {
            Alterer::Crossover(c) => {
                if n < 2 || c.rate <= 0.0 {
                    return Ok(Vec::new());
                }
                for i in 0..n {
                    if !rng.random_bool(c.rate) {
                        continue;
                    }
                    let mut j = rng.random_range(0..n - 1);
                    if j >= i {
                        j += 1;
                    }
                    let pairs = genotypes[i].len().min(genotypes[j].len());
                    for k in 0..pairs {
                        let (c1, c2) = c.kind.cross(
                            &genotypes[i].chromosomes()[k],
                            &genotypes[j].chromosomes()[k],
                            spec,
                            rng,
                        )?;
                        genotypes[i].chromosomes_mut()[k] = c1;
                        genotypes[j].chromosomes_mut()[k] = c2;
                    }
                    altered[i] = true;
                    altered[j] = true;
                }
            }
            Alterer::Mutator(m) => {
                for (i, genotype) in genotypes.iter_mut().enumerate() {
                    for chromosome in genotype.chromosomes_mut() {
                        if let Some(mutated) = m.kind.mutate(chromosome, m.rate, spec, rng)? {
                            *chromosome = mutated;
                            altered[i] = true;
                        }
                    }
                }
            }
        }

        Ok((0..n).filter(|&i| altered[i]).collect())
    }
}

/// Alterers used when none are configured, chosen by gene type.
pub fn defaults_for(spec: &GenomeSpec) -> Vec<Alterer> {
    use CrossoverKind as X;
    use MutatorKind as M;

    match spec.gene_type {
        GeneType::Float | GeneType::Int => vec![
            Alterer::crossover(X::Uniform, 0.5),
            Alterer::mutator(M::Gaussian { std_dev: 0.1 }, 0.1),
        ],
        GeneType::Bit => vec![
            Alterer::crossover(X::MultiPoint(2), 0.7),
            Alterer::mutator(M::BitFlip, 0.05),
        ],
        GeneType::Char => vec![
            Alterer::crossover(X::Uniform, 0.5),
            Alterer::mutator(M::Uniform, 0.05),
        ],
        GeneType::Permutation => vec![
            Alterer::crossover(X::Order, 0.9),
            Alterer::mutator(M::Swap, 0.1),
        ],
        GeneType::Tree => vec![
            Alterer::crossover(X::Tree { max_depth: 10 }, 0.5),
            Alterer::mutator(M::TreeOperation { weight_std: 0.1 }, 0.1),
            Alterer::mutator(M::Hoist, 0.05),
        ],
        GeneType::Graph => vec![
            Alterer::crossover(X::Graph, 0.5),
            Alterer::mutator(
                M::GraphStructure {
                    vertex_rate: 0.5,
                    edge_rate: 0.5,
                },
                0.1,
            ),
            Alterer::mutator(M::GraphOperation { weight_std: 0.1 }, 0.1),
        ],
        GeneType::Opaque => vec![Alterer::crossover(X::Uniform, 0.5)],
    }
}

/// Permutation positions held by a chromosome.
pub(crate) fn permutation_indices(chromosome: &Chromosome) -> Result<Vec<usize>> {
    chromosome
        .iter()
        .map(|g| match g {
            Gene::Permutation(p) => Ok(p.index()),
            other => Err(EvolveError::invariant(format!(
                "permutation operator on a {} gene",
                other.gene_type()
            ))),
        })
        .collect()
}

/// Rebuilds `template` with the given permutation positions.
pub(crate) fn with_permutation_indices(template: &Chromosome, indices: &[usize]) -> Chromosome {
    let genes = template
        .iter()
        .zip(indices)
        .map(|(g, &index)| match g {
            Gene::Permutation(p) => Gene::Permutation(p.with_index(index)),
            other => other.clone(),
        })
        .collect();
    Chromosome::from_genes(genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, GraphCodec, PermutationCodec, TreeCodec, VectorCodec};
    use crate::program::OpSet;
    use crate::random::create_rng;

    fn genotypes<C: Codec>(codec: &C, n: usize, seed: u64) -> Vec<Genotype> {
        let mut rng = create_rng(seed);
        (0..n).map(|_| codec.encode(&mut rng)).collect()
    }

    #[test]
    fn test_crossover_rate_one_touches_everyone() {
        let codec = VectorCodec::float(6, 0.0..1.0).unwrap();
        let mut pop = genotypes(&codec, 5, 1);
        let altered = Alterer::crossover(CrossoverKind::Uniform, 1.0)
            .alter(&mut pop, &codec.spec(), &mut create_rng(2))
            .unwrap();
        assert_eq!(altered, vec![0, 1, 2, 3, 4]);
        for g in &pop {
            assert!(codec.validate(g).is_ok());
        }
    }

    #[test]
    fn test_single_genotype_never_crosses() {
        let codec = VectorCodec::float(3, 0.0..1.0).unwrap();
        let mut pop = genotypes(&codec, 1, 1);
        let altered = Alterer::crossover(CrossoverKind::Mean, 1.0)
            .alter(&mut pop, &codec.spec(), &mut create_rng(2))
            .unwrap();
        assert!(altered.is_empty());
    }

    #[test]
    fn test_mutator_rate_zero_alters_nothing() {
        let codec = VectorCodec::bit(16).unwrap();
        let mut pop = genotypes(&codec, 4, 3);
        let before = pop.clone();
        let altered = Alterer::mutator(MutatorKind::BitFlip, 0.0)
            .alter(&mut pop, &codec.spec(), &mut create_rng(0))
            .unwrap();
        assert!(altered.is_empty());
        assert_eq!(pop, before);
    }

    #[test]
    fn test_defaults_support_their_gene_type() {
        let specs = [
            VectorCodec::float(2, 0.0..1.0).unwrap().spec(),
            VectorCodec::int(2, 0..=3).unwrap().spec(),
            VectorCodec::bit(2).unwrap().spec(),
            VectorCodec::char(2, "ab").unwrap().spec(),
            PermutationCodec::indices(4).unwrap().spec(),
            TreeCodec::new(OpSet::arithmetic(1), 3, 1).unwrap().spec(),
            GraphCodec::directed(2, 1).unwrap().spec(),
        ];
        for spec in specs {
            let defaults = defaults_for(&spec);
            assert!(!defaults.is_empty());
            for a in defaults {
                assert!(a.supports(spec.gene_type), "{} / {}", a.name(), spec.gene_type);
                assert!(a.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_default_chain_keeps_genotypes_valid() {
        let codecs_ok = |seed: u64| {
            let codec = GraphCodec::recurrent(3, 2).unwrap();
            let spec = codec.spec();
            let mut pop = genotypes(&codec, 8, seed);
            let mut rng = create_rng(seed);
            for _ in 0..10 {
                for alterer in defaults_for(&spec) {
                    alterer.alter(&mut pop, &spec, &mut rng).unwrap();
                }
            }
            pop.iter().all(|g| codec.validate(g).is_ok())
        };
        assert!((0..5).all(codecs_ok));
    }

    #[test]
    fn test_rate_clamped_and_validated() {
        assert_eq!(Alterer::mutator(MutatorKind::Swap, 3.0).rate(), 1.0);
        assert!(Alterer::mutator(MutatorKind::Swap, f64::NAN).validate().is_err());
        assert!(Alterer::crossover(CrossoverKind::MultiPoint(0), 0.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_permutation_index_helpers() {
        let codec = PermutationCodec::indices(5).unwrap();
        let genotype = codec.encode(&mut create_rng(0));
        let c = &genotype.chromosomes()[0];
        let idx = permutation_indices(c).unwrap();
        let reversed: Vec<usize> = idx.iter().rev().copied().collect();
        let rebuilt = with_permutation_indices(c, &reversed);
        assert_eq!(permutation_indices(&rebuilt).unwrap(), reversed);

        let floats = VectorCodec::float(2, 0.0..1.0).unwrap();
        let g = floats.encode(&mut create_rng(0));
        assert!(permutation_indices(&g.chromosomes()[0]).is_err());
    }
}
