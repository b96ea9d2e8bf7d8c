//! Genes: the atomic, immutable units of a genotype.
//!
//! [`Gene`] is a closed enum with one payload per [`GeneType`]. Operators
//! never mutate a gene in place; they build a replacement (`with_*`) and put
//! it into a new chromosome.

use crate::program::{GraphNode, TreeNode};
use rand::Rng;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type tag shared by every gene in a chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeneType {
    Float,
    Int,
    Bit,
    Char,
    Permutation,
    Graph,
    Tree,
    Opaque,
}

impl GeneType {
    /// Float or int: genes that support arithmetic operators.
    pub fn is_numeric(self) -> bool {
        matches!(self, GeneType::Float | GeneType::Int)
    }
}

impl fmt::Display for GeneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeneType::Float => "float",
            GeneType::Int => "int",
            GeneType::Bit => "bit",
            GeneType::Char => "char",
            GeneType::Permutation => "permutation",
            GeneType::Graph => "graph",
            GeneType::Tree => "tree",
            GeneType::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Real-valued allele.
///
/// `range` is the half-open sampling interval used by `encode` and
/// resampling mutators; `bounds` is the closed interval every allele is
/// clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatGene {
    allele: f64,
    range: (f64, f64),
    bounds: (f64, f64),
}

impl FloatGene {
    pub fn new(allele: f64, range: (f64, f64), bounds: (f64, f64)) -> Self {
        Self {
            allele: allele.clamp(bounds.0, bounds.1),
            range,
            bounds,
        }
    }

    /// Samples a fresh allele uniformly from `range`.
    pub fn random<R: Rng>(range: (f64, f64), bounds: (f64, f64), rng: &mut R) -> Self {
        let allele = if range.0 < range.1 {
            rng.random_range(range.0..range.1)
        } else {
            range.0
        };
        Self::new(allele, range, bounds)
    }

    pub fn allele(&self) -> f64 {
        self.allele
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn bounds(&self) -> (f64, f64) {
        self.bounds
    }

    /// Same gene with a new allele, clamped into bounds. NaN becomes the
    /// lower bound.
    pub fn with_allele(&self, allele: f64) -> Self {
        let allele = if allele.is_nan() { self.bounds.0 } else { allele };
        Self::new(allele, self.range, self.bounds)
    }

    pub fn is_valid(&self) -> bool {
        self.allele >= self.bounds.0 && self.allele <= self.bounds.1
    }
}

/// Integer allele. Both intervals are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntGene {
    allele: i64,
    range: (i64, i64),
    bounds: (i64, i64),
}

impl IntGene {
    pub fn new(allele: i64, range: (i64, i64), bounds: (i64, i64)) -> Self {
        Self {
            allele: allele.clamp(bounds.0, bounds.1),
            range,
            bounds,
        }
    }

    pub fn random<R: Rng>(range: (i64, i64), bounds: (i64, i64), rng: &mut R) -> Self {
        Self::new(rng.random_range(range.0..=range.1), range, bounds)
    }

    pub fn allele(&self) -> i64 {
        self.allele
    }

    pub fn range(&self) -> (i64, i64) {
        self.range
    }

    pub fn bounds(&self) -> (i64, i64) {
        self.bounds
    }

    pub fn with_allele(&self, allele: i64) -> Self {
        Self::new(allele, self.range, self.bounds)
    }

    pub fn is_valid(&self) -> bool {
        self.allele >= self.bounds.0 && self.allele <= self.bounds.1
    }
}

/// Character drawn from a shared alphabet.
#[derive(Debug, Clone, PartialEq)]
pub struct CharGene {
    allele: char,
    alphabet: Arc<[char]>,
}

impl CharGene {
    pub fn new(allele: char, alphabet: Arc<[char]>) -> Self {
        Self { allele, alphabet }
    }

    /// # Panics
    /// Panics if the alphabet is empty.
    pub fn random<R: Rng>(alphabet: Arc<[char]>, rng: &mut R) -> Self {
        let allele = alphabet[rng.random_range(0..alphabet.len())];
        Self::new(allele, alphabet)
    }

    pub fn allele(&self) -> char {
        self.allele
    }

    pub fn alphabet(&self) -> &Arc<[char]> {
        &self.alphabet
    }

    pub fn with_allele(&self, allele: char) -> Self {
        Self::new(allele, Arc::clone(&self.alphabet))
    }

    pub fn is_valid(&self) -> bool {
        self.alphabet.contains(&self.allele)
    }
}

/// Position in a permutation codec's alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermutationGene {
    index: usize,
    alphabet_len: usize,
}

impl PermutationGene {
    pub fn new(index: usize, alphabet_len: usize) -> Self {
        Self {
            index,
            alphabet_len,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn alphabet_len(&self) -> usize {
        self.alphabet_len
    }

    pub fn with_index(&self, index: usize) -> Self {
        Self::new(index, self.alphabet_len)
    }

    pub fn is_valid(&self) -> bool {
        self.index < self.alphabet_len
    }
}

/// User-defined allele. Compared by identity.
#[derive(Clone)]
pub struct OpaqueGene(Arc<dyn Any + Send + Sync>);

impl OpaqueGene {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueGene {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OpaqueGene(..)")
    }
}

/// One allele of any supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum Gene {
    Float(FloatGene),
    Int(IntGene),
    Bit(bool),
    Char(CharGene),
    Permutation(PermutationGene),
    Graph(GraphNode),
    Tree(TreeNode),
    Opaque(OpaqueGene),
}

impl Gene {
    pub fn gene_type(&self) -> GeneType {
        match self {
            Gene::Float(_) => GeneType::Float,
            Gene::Int(_) => GeneType::Int,
            Gene::Bit(_) => GeneType::Bit,
            Gene::Char(_) => GeneType::Char,
            Gene::Permutation(_) => GeneType::Permutation,
            Gene::Graph(_) => GeneType::Graph,
            Gene::Tree(_) => GeneType::Tree,
            Gene::Opaque(_) => GeneType::Opaque,
        }
    }

    /// Numeric view of the allele. Bits map to 0.0 / 1.0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Gene::Float(g) => Some(g.allele),
            Gene::Int(g) => Some(g.allele as f64),
            Gene::Bit(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Replaces a numeric allele. Ints are rounded; both are clamped into
    /// bounds. `None` for non-numeric genes.
    pub fn with_f64(&self, value: f64) -> Option<Gene> {
        match self {
            Gene::Float(g) => Some(Gene::Float(g.with_allele(value))),
            Gene::Int(g) => {
                let value = if value.is_nan() {
                    g.bounds.0
                } else {
                    value
                        .round()
                        .clamp(g.bounds.0 as f64, g.bounds.1 as f64) as i64
                };
                Some(Gene::Int(g.with_allele(value)))
            }
            _ => None,
        }
    }

    /// Sampling range of a numeric gene.
    pub fn numeric_range(&self) -> Option<(f64, f64)> {
        match self {
            Gene::Float(g) => Some(g.range),
            Gene::Int(g) => Some((g.range.0 as f64, g.range.1 as f64)),
            _ => None,
        }
    }

    /// Valid interval of a numeric gene.
    pub fn numeric_bounds(&self) -> Option<(f64, f64)> {
        match self {
            Gene::Float(g) => Some(g.bounds),
            Gene::Int(g) => Some((g.bounds.0 as f64, g.bounds.1 as f64)),
            _ => None,
        }
    }

    /// A new gene of the same kind with a freshly sampled allele.
    ///
    /// Permutation, program and opaque genes are returned unchanged; they
    /// cannot be resampled independently of their chromosome.
    pub fn resample<R: Rng>(&self, rng: &mut R) -> Gene {
        match self {
            Gene::Float(g) => Gene::Float(FloatGene::random(g.range, g.bounds, rng)),
            Gene::Int(g) => Gene::Int(IntGene::random(g.range, g.bounds, rng)),
            Gene::Bit(_) => Gene::Bit(rng.random_bool(0.5)),
            Gene::Char(g) => Gene::Char(CharGene::random(Arc::clone(&g.alphabet), rng)),
            other => other.clone(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Gene::Float(g) => g.is_valid(),
            Gene::Int(g) => g.is_valid(),
            Gene::Char(g) => g.is_valid(),
            Gene::Permutation(g) => g.is_valid(),
            Gene::Tree(node) => node.is_valid(),
            Gene::Bit(_) | Gene::Graph(_) | Gene::Opaque(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_float_gene_clamps_to_bounds() {
        let gene = FloatGene::new(0.5, (0.0, 1.0), (0.0, 1.0));
        assert_eq!(gene.with_allele(3.0).allele(), 1.0);
        assert_eq!(gene.with_allele(-3.0).allele(), 0.0);
        assert_eq!(gene.with_allele(f64::NAN).allele(), 0.0);
    }

    #[test]
    fn test_int_with_f64_rounds() {
        let gene = Gene::Int(IntGene::new(0, (-5, 5), (-5, 5)));
        assert_eq!(gene.with_f64(2.6).and_then(|g| g.as_f64()), Some(3.0));
        assert_eq!(gene.with_f64(99.0).and_then(|g| g.as_f64()), Some(5.0));
        assert!(Gene::Bit(true).with_f64(0.0).is_none());
    }

    #[test]
    fn test_resample_stays_in_range() {
        let mut rng = create_rng(42);
        let float = Gene::Float(FloatGene::new(0.0, (-2.0, 2.0), (-2.0, 2.0)));
        let int = Gene::Int(IntGene::new(0, (1, 3), (1, 3)));
        for _ in 0..200 {
            let f = float.resample(&mut rng).as_f64().unwrap();
            assert!((-2.0..2.0).contains(&f), "float out of range: {f}");
            let i = int.resample(&mut rng).as_f64().unwrap();
            assert!((1.0..=3.0).contains(&i), "int out of range: {i}");
        }
    }

    #[test]
    fn test_char_gene_validity() {
        let alphabet: Arc<[char]> = Arc::from(vec!['a', 'b']);
        let gene = CharGene::new('a', Arc::clone(&alphabet));
        assert!(gene.is_valid());
        assert!(!gene.with_allele('z').is_valid());
    }

    #[test]
    fn test_gene_types() {
        assert_eq!(Gene::Bit(false).gene_type(), GeneType::Bit);
        assert_eq!(
            Gene::Permutation(PermutationGene::new(0, 3)).gene_type(),
            GeneType::Permutation
        );
        assert!(GeneType::Int.is_numeric());
        assert!(!GeneType::Char.is_numeric());
        assert_eq!(GeneType::Permutation.to_string(), "permutation");
    }

    #[test]
    fn test_opaque_identity_equality() {
        let a = OpaqueGene::new(5_u32);
        let b = a.clone();
        let c = OpaqueGene::new(5_u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<u32>(), Some(&5));
    }
}
