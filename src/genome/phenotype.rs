//! Scores and phenotypes.

use super::chromosome::Genotype;

/// Objective values of an evaluated individual, one per dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    values: Vec<f64>,
}

impl Score {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First objective value; NaN for an empty score.
    pub fn as_f64(&self) -> f64 {
        self.values.first().copied().unwrap_or(f64::NAN)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl From<Vec<f64>> for Score {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl<const N: usize> From<[f64; N]> for Score {
    fn from(values: [f64; N]) -> Self {
        Self::new(values.to_vec())
    }
}

/// An individual: genotype plus evaluation state.
///
/// Ids increase monotonically within one engine run. A phenotype produced by
/// crossover or mutation gets a fresh id, age 0 and no score; survivors keep
/// their id.
#[derive(Debug, Clone, PartialEq)]
pub struct Phenotype {
    id: u64,
    genotype: Genotype,
    score: Option<Score>,
    age: usize,
    generation: usize,
}

impl Phenotype {
    pub fn new(id: u64, genotype: Genotype, generation: usize) -> Self {
        Self {
            id,
            genotype,
            score: None,
            age: 0,
            generation,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn genotype(&self) -> &Genotype {
        &self.genotype
    }

    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    pub fn is_evaluated(&self) -> bool {
        self.score.is_some()
    }

    pub fn age(&self) -> usize {
        self.age
    }

    /// Generation the individual was created in.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn set_score(&mut self, score: Score) {
        self.score = Some(score);
    }

    pub(crate) fn increment_age(&mut self) {
        self.age += 1;
    }

    pub fn into_genotype(self) -> Genotype {
        self.genotype
    }
}
