//! Chromosomes and genotypes.

use super::gene::{Gene, GeneType};
use crate::error::{EvolveError, Result};

/// Ordered, homogeneous sequence of genes.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    genes: Vec<Gene>,
}

impl Chromosome {
    /// Builds a chromosome, checking that it is non-empty and that every
    /// gene has the same type.
    pub fn new(genes: Vec<Gene>) -> Result<Self> {
        let first = genes
            .first()
            .ok_or_else(|| EvolveError::config("chromosome must contain at least one gene"))?
            .gene_type();
        if let Some(bad) = genes.iter().find(|g| g.gene_type() != first) {
            return Err(EvolveError::config(format!(
                "chromosome mixes gene types {first} and {}",
                bad.gene_type()
            )));
        }
        Ok(Self { genes })
    }

    /// Unchecked constructor for operators that only rearrange or replace
    /// genes of an existing chromosome.
    pub(crate) fn from_genes(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn into_genes(self) -> Vec<Gene> {
        self.genes
    }

    pub fn get(&self, index: usize) -> Option<&Gene> {
        self.genes.get(index)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    /// Type of the first gene; `None` only for an empty chromosome.
    pub fn gene_type(&self) -> Option<GeneType> {
        self.genes.first().map(Gene::gene_type)
    }

    /// Copy with the gene at `index` replaced.
    pub fn with_gene(&self, index: usize, gene: Gene) -> Self {
        let mut genes = self.genes.clone();
        genes[index] = gene;
        Self { genes }
    }

    /// Homogeneous and every gene individually valid.
    pub fn is_valid(&self) -> bool {
        match self.gene_type() {
            Some(kind) => self
                .genes
                .iter()
                .all(|g| g.gene_type() == kind && g.is_valid()),
            None => false,
        }
    }
}

impl<'a> IntoIterator for &'a Chromosome {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}

/// Ordered list of chromosomes; the heritable part of a phenotype.
#[derive(Debug, Clone, PartialEq)]
pub struct Genotype {
    chromosomes: Vec<Chromosome>,
}

impl Genotype {
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        Self { chromosomes }
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub(crate) fn chromosomes_mut(&mut self) -> &mut [Chromosome] {
        &mut self.chromosomes
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Total number of genes over all chromosomes.
    pub fn gene_count(&self) -> usize {
        self.chromosomes.iter().map(Chromosome::len).sum()
    }

    /// All genes, chromosome by chromosome.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.chromosomes.iter().flat_map(Chromosome::iter)
    }

    pub fn gene_type(&self) -> Option<GeneType> {
        self.chromosomes.first().and_then(Chromosome::gene_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::gene::{FloatGene, IntGene};

    fn float(v: f64) -> Gene {
        Gene::Float(FloatGene::new(v, (0.0, 10.0), (0.0, 10.0)))
    }

    #[test]
    fn test_new_rejects_mixed_types() {
        let mixed = vec![float(1.0), Gene::Int(IntGene::new(1, (0, 5), (0, 5)))];
        let err = Chromosome::new(mixed).unwrap_err();
        assert!(matches!(err, EvolveError::Configuration(_)), "{err}");
        assert!(Chromosome::new(Vec::new()).is_err());
    }

    #[test]
    fn test_with_gene_leaves_original() {
        let chromosome = Chromosome::new(vec![float(1.0), float(2.0)]).unwrap();
        let replaced = chromosome.with_gene(1, float(5.0));
        assert_eq!(chromosome.get(1).and_then(Gene::as_f64), Some(2.0));
        assert_eq!(replaced.get(1).and_then(Gene::as_f64), Some(5.0));
        assert!(replaced.is_valid());
    }

    #[test]
    fn test_genotype_gene_iteration() {
        let genotype = Genotype::new(vec![
            Chromosome::new(vec![float(1.0), float(2.0)]).unwrap(),
            Chromosome::new(vec![float(3.0)]).unwrap(),
        ]);
        assert_eq!(genotype.len(), 2);
        assert_eq!(genotype.gene_count(), 3);
        let values: Vec<f64> = genotype.genes().filter_map(Gene::as_f64).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(genotype.gene_type(), Some(GeneType::Float));
    }
}
