//! Permutation codec over a user alphabet.

use super::{Codec, GenomeSpec};
use crate::error::{EvolveError, Result};
use crate::genome::{Chromosome, Gene, GeneType, Genotype, PermutationGene};
use crate::random::shuffle;
use rand::Rng;
use std::sync::Arc;

/// Orders of a fixed alphabet.
///
/// Every gene stores an index into the alphabet; a valid chromosome uses
/// every index exactly once, so decoding always yields each element once.
#[derive(Debug, Clone)]
pub struct PermutationCodec<T> {
    alphabet: Arc<[T]>,
}

impl<T: Clone + Send + Sync> PermutationCodec<T> {
    pub fn new(alphabet: Vec<T>) -> Result<Self> {
        if alphabet.is_empty() {
            return Err(EvolveError::config("permutation alphabet must not be empty"));
        }
        Ok(Self {
            alphabet: Arc::from(alphabet),
        })
    }

    pub fn alphabet(&self) -> &[T] {
        &self.alphabet
    }
}

impl PermutationCodec<usize> {
    /// Permutations of `0..n`.
    pub fn indices(n: usize) -> Result<Self> {
        Self::new((0..n).collect())
    }
}

impl<T: Clone + Send + Sync> Codec for PermutationCodec<T> {
    type Value = Vec<T>;

    fn spec(&self) -> GenomeSpec {
        GenomeSpec::new(GeneType::Permutation)
    }

    fn encode<R: Rng>(&self, rng: &mut R) -> Genotype {
        let n = self.alphabet.len();
        let mut order: Vec<usize> = (0..n).collect();
        shuffle(&mut order, rng);
        let genes = order
            .into_iter()
            .map(|i| Gene::Permutation(PermutationGene::new(i, n)))
            .collect();
        Genotype::new(vec![Chromosome::from_genes(genes)])
    }

    fn decode(&self, genotype: &Genotype) -> Vec<T> {
        genotype
            .genes()
            .filter_map(|g| match g {
                Gene::Permutation(p) => self.alphabet.get(p.index()).cloned(),
                _ => None,
            })
            .collect()
    }

    fn validate(&self, genotype: &Genotype) -> Result<()> {
        let n = self.alphabet.len();
        if genotype.len() != 1 || genotype.gene_count() != n {
            return Err(EvolveError::invariant(format!(
                "permutation genotype must be one chromosome of {n} genes"
            )));
        }
        let mut seen = vec![false; n];
        for gene in genotype.genes() {
            match gene {
                Gene::Permutation(p) if p.index() < n && !seen[p.index()] => {
                    seen[p.index()] = true;
                }
                other => {
                    return Err(EvolveError::invariant(format!(
                        "not a permutation: duplicate or foreign gene {other:?}"
                    )))
                }
            }
        }
        Ok(())
    }
}
