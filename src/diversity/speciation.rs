//! Species assignment across generations.
//!
//! Representatives persist from one generation to the next. Every
//! phenotype joins the first species whose representative lies within the
//! threshold, or founds a new one. Species that stop improving for longer
//! than `max_species_age` generations are dissolved.

use super::Diversity;
use crate::error::{EvolveError, Result};
use crate::genome::{Phenotype, Population, Species};
use crate::objective::Objective;
use log::warn;

/// What happens to the members of a dissolved species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StagnationPolicy {
    /// Members are assigned again against the surviving species.
    #[default]
    Redistribute,
    /// Members are replaced by freshly encoded individuals.
    Discard,
}

/// Speciation settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Speciation {
    pub diversity: Diversity,
    /// Maximum distance to a representative.
    pub threshold: f64,
    /// Generations without improvement a species survives.
    pub max_species_age: usize,
    pub policy: StagnationPolicy,
}

impl Speciation {
    pub fn new(diversity: Diversity, threshold: f64) -> Self {
        Self {
            diversity,
            threshold,
            max_species_age: 15,
            policy: StagnationPolicy::default(),
        }
    }

    pub fn with_max_species_age(mut self, age: usize) -> Self {
        self.max_species_age = age;
        self
    }

    pub fn with_policy(mut self, policy: StagnationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(EvolveError::config(format!(
                "species threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        self.diversity.validate()
    }
}

/// Species state carried between generations.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTracker {
    species: Vec<Species>,
    next_id: u64,
}

impl SpeciesTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Partitions `population` into species.
    ///
    /// Returns the indices that were replaced by `fresh` individuals (only
    /// under [`StagnationPolicy::Discard`]); those are unscored.
    pub fn speciate<F>(
        &mut self,
        config: &Speciation,
        population: &mut Population,
        objective: &Objective,
        mut fresh: F,
    ) -> Vec<usize>
    where
        F: FnMut() -> Phenotype,
    {
        self.assign_members(config, population);

        let mut position = positions(population, objective);

        for species in &mut self.species {
            let best = best_member(species, &position).and_then(|i| population[i].score());
            let improved = match (best, species.best_score()) {
                (Some(new), Some(old)) => objective.is_better(new, old),
                _ => false,
            };
            species.record_generation(best.cloned(), improved);
        }

        let mut dissolved = Vec::new();
        let mut k = 0;
        while k < self.species.len() {
            if self.species.len() > 1 && self.species[k].stagnation() > config.max_species_age {
                let species = self.species.remove(k);
                warn!(
                    "species {} removed after {} stagnant generations ({} members)",
                    species.id(),
                    species.stagnation(),
                    species.len()
                );
                dissolved.extend_from_slice(species.members());
            } else {
                k += 1;
            }
        }
        dissolved.sort_unstable();

        let replaced = match config.policy {
            StagnationPolicy::Redistribute => Vec::new(),
            StagnationPolicy::Discard => {
                for &i in &dissolved {
                    population[i] = fresh();
                }
                dissolved.clone()
            }
        };
        self.assign(config, population, dissolved);
        if !replaced.is_empty() {
            position = positions(population, objective);
        }

        for species in &mut self.species {
            if let Some(best) = best_member(species, &position) {
                species.set_representative(population[best].genotype().clone());
            }
        }
        replaced
    }

    /// Assigns every member again without touching species history or
    /// representatives. Species left empty are dropped.
    pub(crate) fn assign_members(&mut self, config: &Speciation, population: &Population) {
        self.species.iter_mut().for_each(Species::clear_members);
        self.assign(config, population, 0..population.len());
        self.species.retain(|s| !s.is_empty());
    }

    fn assign(
        &mut self,
        config: &Speciation,
        population: &Population,
        indices: impl IntoIterator<Item = usize>,
    ) {
        for i in indices {
            let genotype = population[i].genotype();
            let home = self.species.iter_mut().find(|s| {
                config.diversity.distance(s.representative(), genotype) <= config.threshold
            });
            match home {
                Some(species) => species.add_member(i),
                None => {
                    let mut species = Species::new(self.next_id, genotype.clone());
                    self.next_id += 1;
                    species.add_member(i);
                    self.species.push(species);
                }
            }
        }
    }
}

/// Position of every member in best-first order.
fn positions(population: &Population, objective: &Objective) -> Vec<usize> {
    let mut position = vec![0; population.len()];
    for (rank, i) in objective.order(population).into_iter().enumerate() {
        position[i] = rank;
    }
    position
}

/// Member with the best population position.
fn best_member(species: &Species, position: &[usize]) -> Option<usize> {
    species.members().iter().copied().min_by_key(|&i| position[i])
}
