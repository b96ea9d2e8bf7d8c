//! Populations, species and the ecosystem that groups them.

use super::chromosome::Genotype;
use super::phenotype::{Phenotype, Score};
use std::ops::{Index, IndexMut};

/// Ordered collection of phenotypes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    members: Vec<Phenotype>,
}

impl Population {
    pub fn new(members: Vec<Phenotype>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Phenotype] {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut [Phenotype] {
        &mut self.members
    }

    pub fn get(&self, index: usize) -> Option<&Phenotype> {
        self.members.get(index)
    }

    pub fn push(&mut self, phenotype: Phenotype) {
        self.members.push(phenotype);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Phenotype> {
        self.members.iter()
    }

    pub fn into_vec(self) -> Vec<Phenotype> {
        self.members
    }

    /// Whether every member carries a score.
    pub fn is_evaluated(&self) -> bool {
        self.members.iter().all(Phenotype::is_evaluated)
    }
}

impl Index<usize> for Population {
    type Output = Phenotype;

    fn index(&self, index: usize) -> &Phenotype {
        &self.members[index]
    }
}

impl IndexMut<usize> for Population {
    fn index_mut(&mut self, index: usize) -> &mut Phenotype {
        &mut self.members[index]
    }
}

impl FromIterator<Phenotype> for Population {
    fn from_iter<I: IntoIterator<Item = Phenotype>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Population {
    type Item = Phenotype;
    type IntoIter = std::vec::IntoIter<Phenotype>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Phenotype;
    type IntoIter = std::slice::Iter<'a, Phenotype>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// A group of genetically similar individuals.
///
/// `members` index into the population the species was assigned against.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    id: u64,
    representative: Genotype,
    members: Vec<usize>,
    age: usize,
    best_score: Option<Score>,
    stagnation: usize,
}

impl Species {
    pub fn new(id: u64, representative: Genotype) -> Self {
        Self {
            id,
            representative,
            members: Vec::new(),
            age: 0,
            best_score: None,
            stagnation: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn representative(&self) -> &Genotype {
        &self.representative
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn age(&self) -> usize {
        self.age
    }

    pub fn best_score(&self) -> Option<&Score> {
        self.best_score.as_ref()
    }

    /// Generations since the best score last improved.
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    pub(crate) fn set_representative(&mut self, representative: Genotype) {
        self.representative = representative;
    }

    pub(crate) fn add_member(&mut self, index: usize) {
        self.members.push(index);
    }

    pub(crate) fn clear_members(&mut self) {
        self.members.clear();
    }

    /// Ages the species and updates stagnation. `improved` tells whether
    /// `best` beats the previous best.
    pub(crate) fn record_generation(&mut self, best: Option<Score>, improved: bool) {
        self.age += 1;
        if improved || self.best_score.is_none() {
            self.best_score = best;
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
    }
}

/// A population together with its species partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ecosystem {
    population: Population,
    species: Vec<Species>,
}

impl Ecosystem {
    pub fn new(population: Population, species: Vec<Species>) -> Self {
        Self {
            population,
            species,
        }
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn into_parts(self) -> (Population, Vec<Species>) {
        (self.population, self.species)
    }
}
