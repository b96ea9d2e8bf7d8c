//! Codecs: the mapping between genotypes and domain values.
//!
//! A [`Codec`] creates random genotypes and decodes them into the value the
//! [`Problem`](crate::problem::Problem) scores. It also describes the genome
//! it produces through a [`GenomeSpec`], which the engine uses to check that
//! every configured alterer supports the gene type.
//!
//! | Codec | Gene type | Value |
//! |-------|-----------|-------|
//! | [`VectorCodec`] | float / int / bit / char | `Vec<T>` |
//! | [`MatrixCodec`] | float / int / bit / char | `Vec<Vec<T>>` |
//! | [`PermutationCodec`] | permutation | `Vec<T>` |
//! | [`TreeCodec`] | tree | [`Tree`](crate::program::Tree) |
//! | [`GraphCodec`] | graph | [`Graph`](crate::program::Graph) |

mod permutation;
mod program;
mod vector;

pub use permutation::PermutationCodec;
pub use program::{GraphCodec, TreeCodec};
pub use vector::{MatrixCodec, VectorCodec};

use crate::error::{EvolveError, Result};
use crate::genome::{CharGene, FloatGene, Gene, GeneType, Genotype, IntGene};
use crate::program::{GraphMode, OpSet};
use rand::Rng;
use std::sync::Arc;

/// Static description of the genomes a codec produces.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomeSpec {
    pub gene_type: GeneType,
    /// Program operations available to tree/graph mutators.
    pub ops: Option<OpSet>,
    /// Structural mode of graph genomes.
    pub graph_mode: Option<GraphMode>,
}

impl GenomeSpec {
    pub fn new(gene_type: GeneType) -> Self {
        Self {
            gene_type,
            ops: None,
            graph_mode: None,
        }
    }

    pub fn with_ops(mut self, ops: OpSet) -> Self {
        self.ops = Some(ops);
        self
    }

    pub fn with_graph_mode(mut self, mode: GraphMode) -> Self {
        self.graph_mode = Some(mode);
        self
    }
}

/// Encodes and decodes candidate solutions.
pub trait Codec: Send + Sync {
    /// The decoded domain value handed to the problem.
    type Value: Send + Sync;

    /// Description of the produced genomes.
    fn spec(&self) -> GenomeSpec;

    fn gene_type(&self) -> GeneType {
        self.spec().gene_type
    }

    /// Creates a fresh random genotype within the configured ranges.
    fn encode<R: Rng>(&self, rng: &mut R) -> Genotype;

    /// Decodes a genotype. Total over every genotype the codec can produce.
    fn decode(&self, genotype: &Genotype) -> Self::Value;

    /// Checks the structural invariants of a genotype: chromosome count and
    /// lengths, gene types, bounds.
    fn validate(&self, genotype: &Genotype) -> Result<()>;
}

/// Scalar types a vector or matrix codec can decode to.
pub trait Allele: Clone + Send + Sync + 'static {
    fn from_gene(gene: &Gene) -> Self;
}

impl Allele for f64 {
    fn from_gene(gene: &Gene) -> Self {
        gene.as_f64().unwrap_or(0.0)
    }
}

impl Allele for i64 {
    fn from_gene(gene: &Gene) -> Self {
        match gene {
            Gene::Int(g) => g.allele(),
            other => other.as_f64().map(|v| v.round() as i64).unwrap_or(0),
        }
    }
}

impl Allele for bool {
    fn from_gene(gene: &Gene) -> Self {
        matches!(gene, Gene::Bit(true))
    }
}

impl Allele for char {
    fn from_gene(gene: &Gene) -> Self {
        match gene {
            Gene::Char(g) => g.allele(),
            _ => '\0',
        }
    }
}

/// Value space of scalar genes, shared by the vector and matrix codecs.
#[derive(Debug, Clone, PartialEq)]
enum GeneSpace {
    Float {
        range: (f64, f64),
        bounds: (f64, f64),
    },
    Int {
        range: (i64, i64),
        bounds: (i64, i64),
    },
    Bit,
    Char(Arc<[char]>),
}

impl GeneSpace {
    fn float(range: std::ops::Range<f64>) -> Result<Self> {
        if !(range.start.is_finite() && range.end.is_finite()) || range.start >= range.end {
            return Err(EvolveError::config(format!(
                "float range must be finite and non-empty, got {}..{}",
                range.start, range.end
            )));
        }
        let range = (range.start, range.end);
        Ok(GeneSpace::Float {
            range,
            bounds: range,
        })
    }

    fn int(range: std::ops::RangeInclusive<i64>) -> Result<Self> {
        let (start, end) = range.into_inner();
        if start > end {
            return Err(EvolveError::config(format!(
                "int range must be non-empty, got {start}..={end}"
            )));
        }
        Ok(GeneSpace::Int {
            range: (start, end),
            bounds: (start, end),
        })
    }

    fn chars(alphabet: &str) -> Result<Self> {
        let chars: Vec<char> = alphabet.chars().collect();
        if chars.is_empty() {
            return Err(EvolveError::config("char alphabet must not be empty"));
        }
        Ok(GeneSpace::Char(Arc::from(chars)))
    }

    fn with_float_bounds(self, lo: f64, hi: f64) -> Result<Self> {
        match self {
            GeneSpace::Float { range, .. } if lo <= hi && !lo.is_nan() && !hi.is_nan() => {
                Ok(GeneSpace::Float {
                    range,
                    bounds: (lo, hi),
                })
            }
            _ => Err(EvolveError::config(format!(
                "invalid float bounds [{lo}, {hi}]"
            ))),
        }
    }

    fn with_int_bounds(self, lo: i64, hi: i64) -> Result<Self> {
        match self {
            GeneSpace::Int { range, .. } if lo <= hi => Ok(GeneSpace::Int {
                range,
                bounds: (lo, hi),
            }),
            _ => Err(EvolveError::config(format!("invalid int bounds [{lo}, {hi}]"))),
        }
    }

    fn gene_type(&self) -> GeneType {
        match self {
            GeneSpace::Float { .. } => GeneType::Float,
            GeneSpace::Int { .. } => GeneType::Int,
            GeneSpace::Bit => GeneType::Bit,
            GeneSpace::Char(_) => GeneType::Char,
        }
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> Gene {
        match self {
            GeneSpace::Float { range, bounds } => Gene::Float(FloatGene::random(*range, *bounds, rng)),
            GeneSpace::Int { range, bounds } => Gene::Int(IntGene::random(*range, *bounds, rng)),
            GeneSpace::Bit => Gene::Bit(rng.random_bool(0.5)),
            GeneSpace::Char(alphabet) => Gene::Char(CharGene::random(Arc::clone(alphabet), rng)),
        }
    }

    fn sample_row<R: Rng>(&self, len: usize, rng: &mut R) -> Vec<Gene> {
        (0..len).map(|_| self.sample(rng)).collect()
    }

    /// Gene has this space's type and a valid allele.
    fn admits(&self, gene: &Gene) -> bool {
        gene.gene_type() == self.gene_type() && gene.is_valid()
    }
}

/// Checks that `genotype` has one chromosome per entry of `lens`, each of
/// that length, with every gene admitted by `space`.
fn validate_rows(genotype: &Genotype, lens: &[usize], space: &GeneSpace) -> Result<()> {
    if genotype.len() != lens.len() {
        return Err(EvolveError::invariant(format!(
            "expected {} chromosomes, found {}",
            lens.len(),
            genotype.len()
        )));
    }
    for (row, (chromosome, &len)) in genotype.chromosomes().iter().zip(lens).enumerate() {
        if chromosome.len() != len {
            return Err(EvolveError::invariant(format!(
                "chromosome {row} has length {}, expected {len}",
                chromosome.len()
            )));
        }
        if let Some(col) = chromosome.iter().position(|g| !space.admits(g)) {
            return Err(EvolveError::invariant(format!(
                "gene ({row}, {col}) is not a valid {} gene",
                space.gene_type()
            )));
        }
    }
    Ok(())
}
