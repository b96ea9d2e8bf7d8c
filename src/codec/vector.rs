//! Scalar vector and matrix codecs.

use super::{validate_rows, Allele, Codec, GeneSpace, GenomeSpec};
use crate::error::{EvolveError, Result};
use crate::genome::{Chromosome, Genotype};
use rand::Rng;
use std::marker::PhantomData;
use std::ops::{Range, RangeInclusive};

/// Fixed-length vector of scalars in a single chromosome.
///
/// # Examples
///
/// ```
/// use u_evolve::codec::{Codec, VectorCodec};
/// use u_evolve::random::create_rng;
///
/// let codec = VectorCodec::float(3, -1.0..1.0).unwrap();
/// let genotype = codec.encode(&mut create_rng(42));
/// let values = codec.decode(&genotype);
/// assert_eq!(values.len(), 3);
/// assert!(values.iter().all(|v| (-1.0..1.0).contains(v)));
/// ```
#[derive(Debug, Clone)]
pub struct VectorCodec<T> {
    len: usize,
    space: GeneSpace,
    _value: PhantomData<fn() -> T>,
}

impl<T> VectorCodec<T> {
    fn with_space(len: usize, space: GeneSpace) -> Result<Self> {
        if len == 0 {
            return Err(EvolveError::config("vector length must be positive"));
        }
        Ok(Self {
            len,
            space,
            _value: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl VectorCodec<f64> {
    /// Floats sampled uniformly from `range`.
    pub fn float(len: usize, range: Range<f64>) -> Result<Self> {
        Self::with_space(len, GeneSpace::float(range)?)
    }

    /// Sets the valid interval alleles are clamped into (defaults to the
    /// sampling range).
    pub fn with_bounds(mut self, lo: f64, hi: f64) -> Result<Self> {
        self.space = self.space.with_float_bounds(lo, hi)?;
        Ok(self)
    }
}

impl VectorCodec<i64> {
    /// Integers sampled uniformly from the inclusive `range`.
    pub fn int(len: usize, range: RangeInclusive<i64>) -> Result<Self> {
        Self::with_space(len, GeneSpace::int(range)?)
    }

    pub fn with_bounds(mut self, lo: i64, hi: i64) -> Result<Self> {
        self.space = self.space.with_int_bounds(lo, hi)?;
        Ok(self)
    }
}

impl VectorCodec<bool> {
    pub fn bit(len: usize) -> Result<Self> {
        Self::with_space(len, GeneSpace::Bit)
    }
}

impl VectorCodec<char> {
    /// Characters drawn from `alphabet`.
    pub fn char(len: usize, alphabet: &str) -> Result<Self> {
        Self::with_space(len, GeneSpace::chars(alphabet)?)
    }
}

impl<T: Allele> Codec for VectorCodec<T> {
    type Value = Vec<T>;

    fn spec(&self) -> GenomeSpec {
        GenomeSpec::new(self.space.gene_type())
    }

    fn encode<R: Rng>(&self, rng: &mut R) -> Genotype {
        Genotype::new(vec![Chromosome::from_genes(
            self.space.sample_row(self.len, rng),
        )])
    }

    fn decode(&self, genotype: &Genotype) -> Vec<T> {
        genotype
            .chromosomes()
            .first()
            .map(|c| c.iter().map(T::from_gene).collect())
            .unwrap_or_default()
    }

    fn validate(&self, genotype: &Genotype) -> Result<()> {
        validate_rows(genotype, &[self.len], &self.space)
    }
}

/// Matrix of scalars, one chromosome per row. Rows may differ in length.
#[derive(Debug, Clone)]
pub struct MatrixCodec<T> {
    rows: Vec<usize>,
    space: GeneSpace,
    _value: PhantomData<fn() -> T>,
}

impl<T> MatrixCodec<T> {
    fn with_space(rows: Vec<usize>, space: GeneSpace) -> Result<Self> {
        if rows.is_empty() || rows.contains(&0) {
            return Err(EvolveError::config(format!(
                "matrix needs at least one row and positive row lengths, got {rows:?}"
            )));
        }
        Ok(Self {
            rows,
            space,
            _value: PhantomData,
        })
    }

    fn rectangular(rows: usize, cols: usize) -> Vec<usize> {
        vec![cols; rows]
    }

    /// Length of every row.
    pub fn shape(&self) -> &[usize] {
        &self.rows
    }
}

impl MatrixCodec<f64> {
    pub fn float(rows: usize, cols: usize, range: Range<f64>) -> Result<Self> {
        Self::jagged_float(&Self::rectangular(rows, cols), range)
    }

    pub fn jagged_float(row_lens: &[usize], range: Range<f64>) -> Result<Self> {
        Self::with_space(row_lens.to_vec(), GeneSpace::float(range)?)
    }

    pub fn with_bounds(mut self, lo: f64, hi: f64) -> Result<Self> {
        self.space = self.space.with_float_bounds(lo, hi)?;
        Ok(self)
    }
}

impl MatrixCodec<i64> {
    pub fn int(rows: usize, cols: usize, range: RangeInclusive<i64>) -> Result<Self> {
        Self::jagged_int(&Self::rectangular(rows, cols), range)
    }

    pub fn jagged_int(row_lens: &[usize], range: RangeInclusive<i64>) -> Result<Self> {
        Self::with_space(row_lens.to_vec(), GeneSpace::int(range)?)
    }

    pub fn with_bounds(mut self, lo: i64, hi: i64) -> Result<Self> {
        self.space = self.space.with_int_bounds(lo, hi)?;
        Ok(self)
    }
}

impl MatrixCodec<bool> {
    pub fn bit(rows: usize, cols: usize) -> Result<Self> {
        Self::jagged_bit(&Self::rectangular(rows, cols))
    }

    pub fn jagged_bit(row_lens: &[usize]) -> Result<Self> {
        Self::with_space(row_lens.to_vec(), GeneSpace::Bit)
    }
}

impl MatrixCodec<char> {
    pub fn char(rows: usize, cols: usize, alphabet: &str) -> Result<Self> {
        Self::jagged_char(&Self::rectangular(rows, cols), alphabet)
    }

    pub fn jagged_char(row_lens: &[usize], alphabet: &str) -> Result<Self> {
        Self::with_space(row_lens.to_vec(), GeneSpace::chars(alphabet)?)
    }
}

impl<T: Allele> Codec for MatrixCodec<T> {
    type Value = Vec<Vec<T>>;

    fn spec(&self) -> GenomeSpec {
        GenomeSpec::new(self.space.gene_type())
    }

    fn encode<R: Rng>(&self, rng: &mut R) -> Genotype {
        Genotype::new(
            self.rows
                .iter()
                .map(|&len| Chromosome::from_genes(self.space.sample_row(len, rng)))
                .collect(),
        )
    }

    fn decode(&self, genotype: &Genotype) -> Vec<Vec<T>> {
        genotype
            .chromosomes()
            .iter()
            .map(|c| c.iter().map(T::from_gene).collect())
            .collect()
    }

    fn validate(&self, genotype: &Genotype) -> Result<()> {
        validate_rows(genotype, &self.rows, &self.space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Gene, GeneType};
    use crate::random::create_rng;

    #[test]
    fn test_float_vector_encode_decode() {
        let codec = VectorCodec::float(5, 0.0..2.0).unwrap();
        let mut rng = create_rng(42);
        let genotype = codec.encode(&mut rng);
        assert!(codec.validate(&genotype).is_ok());
        let values = codec.decode(&genotype);
        assert_eq!(values.len(), 5);
        assert!(values.iter().all(|v| (0.0..2.0).contains(v)));
        assert_eq!(codec.gene_type(), GeneType::Float);
    }

    #[test]
    fn test_int_bounds_narrower_than_range_clamp() {
        let codec = VectorCodec::int(50, -10..=10)
            .unwrap()
            .with_bounds(-2, 2)
            .unwrap();
        let values = codec.decode(&codec.encode(&mut create_rng(7)));
        assert!(values.iter().all(|v| (-2..=2).contains(v)), "{values:?}");
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        assert!(VectorCodec::float(0, 0.0..1.0).is_err());
        assert!(VectorCodec::float(3, 1.0..1.0).is_err());
        #[allow(clippy::reversed_empty_ranges)]
        let empty = 5..=1;
        assert!(VectorCodec::int(3, empty).is_err());
        assert!(VectorCodec::char(3, "").is_err());
        assert!(MatrixCodec::jagged_bit(&[2, 0]).is_err());
        assert!(MatrixCodec::float(0, 3, 0.0..1.0).is_err());
    }

    #[test]
    fn test_char_vector() {
        let codec = VectorCodec::char(8, "ab").unwrap();
        let word = codec.decode(&codec.encode(&mut create_rng(1)));
        assert!(word.iter().all(|c| *c == 'a' || *c == 'b'));
    }

    #[test]
    fn test_jagged_matrix_shape() {
        let codec = MatrixCodec::jagged_bit(&[1, 3, 2]).unwrap();
        let genotype = codec.encode(&mut create_rng(3));
        let rows = codec.decode(&genotype);
        let lens: Vec<usize> = rows.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![1, 3, 2]);
        assert!(codec.validate(&genotype).is_ok());
    }

    #[test]
    fn test_validate_detects_length_and_type_drift() {
        let codec = VectorCodec::float(3, 0.0..1.0).unwrap();
        let mut rng = create_rng(5);
        let genotype = codec.encode(&mut rng);

        let short = Genotype::new(vec![Chromosome::from_genes(
            genotype.chromosomes()[0].genes()[..2].to_vec(),
        )]);
        assert!(codec.validate(&short).is_err());

        let bits = Genotype::new(vec![Chromosome::from_genes(vec![Gene::Bit(true); 3])]);
        assert!(codec.validate(&bits).is_err());
    }
}
