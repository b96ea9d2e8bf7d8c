//! The generation loop.
//!
//! [`Engine`] owns the codec, the problem, the population and the random
//! generator, and advances them one generation at a time:
//! evaluate → speciate → select survivors and parents → alter → age →
//! evaluate → rebuild the front → report → check limits.

use super::config::EngineConfig;
use super::event::{GenerationEvent, Subscribers};
use super::executor::Pool;
use super::limit::Progress;
use super::metrics::{self, MetricSet};
use crate::alter::{self, Alterer};
use crate::codec::{Codec, GenomeSpec};
use crate::diversity::SpeciesTracker;
use crate::error::{EvolveError, FitnessError, Result};
use crate::genome::{Ecosystem, Genotype, Phenotype, Population, Score, Species};
use crate::objective::Front;
use crate::problem::Problem;
use crate::random::{create_rng, EvolveRng};
use log::{debug, info};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of a completed generation.
#[derive(Debug, Clone)]
pub struct Generation<T> {
    /// Completed generations, starting at 1.
    pub index: usize,

    /// Decoded best individual.
    pub value: T,

    /// Score of the best individual.
    pub score: Score,

    pub population: Population,

    /// Species partition (empty without speciation).
    pub species: Vec<Species>,

    /// Pareto front (multi-objective runs only).
    pub front: Option<Front>,

    pub metrics: MetricSet,

    /// Time since the run started.
    pub duration: Duration,
}

impl<T> Generation<T> {
    /// Population and species together.
    pub fn ecosystem(&self) -> Ecosystem {
        Ecosystem::new(self.population.clone(), self.species.clone())
    }
}

/// Evolutionary engine over a codec and a problem.
///
/// # Examples
///
/// ```
/// use u_evolve::codec::VectorCodec;
/// use u_evolve::engine::{Engine, EngineConfig};
/// use u_evolve::problem::fitness_fn;
///
/// let codec = VectorCodec::float(3, -5.0..5.0).unwrap();
/// let sphere = fitness_fn(|x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>());
/// let config = EngineConfig::default()
///     .with_population_size(30)
///     .with_max_generations(20)
///     .with_seed(1);
///
/// let mut engine = Engine::new(codec, sphere, config).unwrap();
/// let best = engine.run().unwrap();
/// assert_eq!(best.index, 20);
/// assert_eq!(best.population.len(), 30);
/// ```
pub struct Engine<C, P>
where
    C: Codec,
    P: Problem<C::Value>,
{
    codec: C,
    problem: P,
    config: EngineConfig,
    genome: GenomeSpec,
    alterers: Vec<Alterer>,
    pool: Pool,
    rng: EvolveRng,
    population: Population,
    tracker: SpeciesTracker,
    front: Option<Front>,
    metrics: MetricSet,
    /// Best first-dimension score per generation, minimization form.
    history: Vec<f64>,
    subscribers: Subscribers,
    cancel: Arc<AtomicBool>,
    generation: usize,
    next_id: u64,
    started: Option<Instant>,
}

impl<C, P> Engine<C, P>
where
    C: Codec,
    P: Problem<C::Value>,
{
    /// Builds an engine and its initial population.
    ///
    /// Fails with a configuration error if the configuration is invalid or
    /// an alterer or the speciation distance does not support the codec's
    /// gene type. Limits are checked by [`run`](Self::run).
    pub fn new(codec: C, problem: P, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let genome = codec.spec();
        let alterers = if config.alterers.is_empty() {
            alter::defaults_for(&genome)
        } else {
            config.alterers.clone()
        };
        for alterer in &alterers {
            if !alterer.supports(genome.gene_type) {
                return Err(EvolveError::config(format!(
                    "{} does not support {} genes",
                    alterer.name(),
                    genome.gene_type
                )));
            }
        }
        if let Some(speciation) = &config.speciation {
            if !speciation.diversity.supports(genome.gene_type) {
                return Err(EvolveError::config(format!(
                    "{} distance does not support {} genes",
                    speciation.diversity.name(),
                    genome.gene_type
                )));
            }
        }

        let pool = Pool::new(config.executor)?;
        let mut rng = create_rng(config.seed.unwrap_or_else(rand::random));
        let mut next_id = 0;
        let population: Population = (0..config.population_size)
            .map(|_| spawn(&codec, &mut rng, &mut next_id, 0))
            .collect();
        for phenotype in &population {
            codec.validate(phenotype.genotype()).map_err(|e| {
                EvolveError::invariant(format!("initial genotype failed validation: {e}"))
            })?;
        }

        debug!(
            "engine ready: {} {} genomes, {} individuals, {} alterers, {} evaluation threads",
            genome.gene_type,
            if config.objective.is_multi() { "multi-objective" } else { "single-objective" },
            config.population_size,
            alterers.len(),
            pool.threads()
        );

        Ok(Self {
            codec,
            problem,
            config,
            genome,
            alterers,
            pool,
            rng,
            population,
            tracker: SpeciesTracker::new(),
            front: None,
            metrics: MetricSet::new(),
            history: Vec::new(),
            subscribers: Subscribers::default(),
            cancel: Arc::new(AtomicBool::new(false)),
            generation: 0,
            next_id,
            started: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Alterers in effect, including defaults chosen for the gene type.
    pub fn alterers(&self) -> &[Alterer] {
        &self.alterers
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn species(&self) -> &[Species] {
        self.tracker.species()
    }

    /// Completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Receives one [`GenerationEvent`] per completed generation. Dropping
    /// the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<GenerationEvent> {
        self.subscribers.subscribe()
    }

    /// Flag that stops [`run`](Self::run) at the next generation boundary
    /// once set to `true`.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs generations until a limit is satisfied or the run is
    /// cancelled, and returns the last completed generation.
    ///
    /// At least one generation always runs. Limits count generations over
    /// the lifetime of the engine; the clock restarts with every call.
    pub fn run(&mut self) -> Result<Generation<C::Value>> {
        self.config.validate_limits()?;
        let started = Instant::now();
        self.started = Some(started);

        loop {
            let generation = self.step()?;

            let progress = Progress {
                generation: generation.index,
                elapsed: started.elapsed(),
                population: &generation.population,
                objective: &self.config.objective,
                history: &self.history,
            };
            let reason = if self.cancel.load(Ordering::Relaxed) {
                Some("cancelled")
            } else {
                self.config
                    .limits
                    .iter()
                    .find(|limit| limit.is_satisfied(&progress))
                    .map(|limit| limit.name())
            };

            if let Some(reason) = reason {
                info!(
                    "run stopped after {} generations in {:.3?} ({}), best {:?}",
                    generation.index,
                    generation.duration,
                    reason,
                    generation.score.values()
                );
                return Ok(generation);
            }
        }
    }

    /// Advances one generation.
    pub fn step(&mut self) -> Result<Generation<C::Value>> {
        let step_started = Instant::now();
        let run_started = *self.started.get_or_insert(step_started);
        let generation = self.generation + 1;
        let mut evaluations = 0;
        let mut evaluation_time = Duration::ZERO;

        let t = Instant::now();
        evaluations += self.evaluate(false)?;
        evaluation_time += t.elapsed();

        if self.config.speciation.is_some() {
            let replaced = self.speciate(generation);
            self.metrics
                .record_value(metrics::SPECIES_REPLACED, replaced as f64);
            if replaced > 0 {
                let t = Instant::now();
                evaluations += self.evaluate(false)?;
                evaluation_time += t.elapsed();
            }
        }

        let survivors = self.config.survivor_selector.select(
            &self.population,
            &self.config.objective,
            self.config.survivor_count(),
            &mut self.rng,
        );
        let offspring_count = self.config.offspring_count();
        let parents = self.select_parents(offspring_count);

        let t = Instant::now();
        let (offspring, altered) = self.breed(&parents, generation)?;
        self.metrics.record_time(metrics::ALTERED, t.elapsed());
        self.metrics.record_value(metrics::ALTERED, altered as f64);

        let mut members: Vec<Phenotype> = survivors.into_iter().chain(offspring).collect();
        let age_replaced = self.age(&mut members, generation);
        self.metrics
            .record_value(metrics::AGE_REPLACED, age_replaced as f64);

        let next = Population::new(members);
        if next.len() != self.config.population_size {
            return Err(EvolveError::invariant(format!(
                "population size drifted to {} (expected {})",
                next.len(),
                self.config.population_size
            )));
        }
        self.population = next;

        let t = Instant::now();
        evaluations += self.evaluate(true)?;
        evaluation_time += t.elapsed();
        self.metrics.record_value(metrics::EVALUATIONS, evaluations as f64);
        self.metrics.record_time(metrics::EVALUATIONS, evaluation_time);

        if let Some(speciation) = &self.config.speciation {
            self.tracker.assign_members(speciation, &self.population);
        }
        self.front = self.config.objective.is_multi().then(|| {
            Front::from_population(
                &self.population,
                &self.config.objective,
                self.config.front_range,
            )
        });

        let (best, score) = self
            .config
            .objective
            .best_index(&self.population)
            .and_then(|i| self.population[i].score().map(|s| (i, s.clone())))
            .ok_or_else(|| EvolveError::invariant("no evaluated individual after evaluation"))?;
        let best_value = self
            .config
            .objective
            .to_minimization(&score)
            .first()
            .copied()
            .unwrap_or(f64::INFINITY);
        self.history.push(best_value);

        self.record_population_metrics(&score);
        let duration = step_started.elapsed();
        self.metrics.record_time(metrics::GENERATION_TIME, duration);
        self.generation = generation;

        debug!(
            "generation {}: best {:?}, {} evaluations, {} altered, {} species in {:.3?}",
            generation,
            score.values(),
            evaluations,
            altered,
            self.tracker.species().len(),
            duration
        );

        if !self.subscribers.is_empty() {
            self.subscribers.publish(&GenerationEvent {
                index: generation,
                best: Some(score.clone()),
                duration,
                metrics: self.metrics.clone(),
            });
        }

        Ok(Generation {
            index: generation,
            value: self.codec.decode(self.population[best].genotype()),
            score,
            population: self.population.clone(),
            species: self.tracker.species().to_vec(),
            front: self.front.clone(),
            metrics: self.metrics.clone(),
            duration: run_started.elapsed(),
        })
    }

    /// Scores every unevaluated member and returns how many were scored.
    ///
    /// Batch problems score members relative to each other, so they get the
    /// whole population whenever any member is unevaluated or the
    /// population was just rebuilt (`refresh`).
    fn evaluate(&mut self, refresh: bool) -> Result<usize> {
        let batch = self.problem.prefers_batch();
        let mut pending: Vec<usize> = (0..self.population.len())
            .filter(|&i| !self.population[i].is_evaluated())
            .collect();
        if batch && (refresh || !pending.is_empty()) {
            pending = (0..self.population.len()).collect();
        }
        if pending.is_empty() {
            return Ok(0);
        }

        let codec = &self.codec;
        let problem = &self.problem;
        let genotypes: Vec<&Genotype> = pending
            .iter()
            .map(|&i| self.population[i].genotype())
            .collect();

        let results: Vec<std::result::Result<Score, FitnessError>> = if batch {
            let values: Vec<C::Value> = self.pool.map(&genotypes, |g| codec.decode(g));
            match problem.evaluate_batch(&values) {
                Ok(scores) if scores.len() == values.len() => scores.into_iter().map(Ok).collect(),
                Ok(scores) => {
                    return Err(EvolveError::Evaluation {
                        index: pending[0],
                        source: FitnessError::new(format!(
                            "batch returned {} scores for {} values",
                            scores.len(),
                            values.len()
                        )),
                    })
                }
                Err(source) => {
                    return Err(EvolveError::Evaluation {
                        index: pending[0],
                        source,
                    })
                }
            }
        } else {
            self.pool
                .map(&genotypes, |g| problem.evaluate(&codec.decode(g)))
        };

        let dimensions = self.config.objective.dimensions();
        let mut scores = Vec::with_capacity(results.len());
        for (&index, result) in pending.iter().zip(results) {
            let score = result.map_err(|source| EvolveError::Evaluation { index, source })?;
            if !self.config.objective.accepts(&score) {
                return Err(EvolveError::Evaluation {
                    index,
                    source: FitnessError::new(format!(
                        "expected {} objective values, got {}",
                        dimensions,
                        score.len()
                    )),
                });
            }
            scores.push(score);
        }
        for (&i, score) in pending.iter().zip(scores) {
            self.population[i].set_score(score);
        }
        Ok(pending.len())
    }

    /// Partitions the population into species and returns how many
    /// members were replaced by fresh individuals.
    fn speciate(&mut self, generation: usize) -> usize {
        let Some(speciation) = &self.config.speciation else {
            return 0;
        };
        let codec = &self.codec;
        let rng = &mut self.rng;
        let next_id = &mut self.next_id;
        self.tracker
            .speciate(speciation, &mut self.population, &self.config.objective, || {
                spawn(codec, rng, next_id, generation)
            })
            .len()
    }

    /// Parent indices. With species, every species breeds its quota from
    /// its own members.
    fn select_parents(&mut self, count: usize) -> Vec<usize> {
        let species = self.tracker.species();
        if self.config.speciation.is_none() || species.is_empty() {
            return self.config.offspring_selector.select_indices(
                &self.population,
                &self.config.objective,
                count,
                &mut self.rng,
            );
        }

        let mut position = vec![0; self.population.len()];
        for (rank, i) in self
            .config
            .objective
            .order(&self.population)
            .into_iter()
            .enumerate()
        {
            position[i] = rank;
        }
        let mut ranked: Vec<&Species> = species.iter().collect();
        ranked.sort_by_key(|s| s.members().iter().map(|&i| position[i]).min());

        let mut parents = Vec::with_capacity(count);
        for (species, quota) in ranked.iter().zip(rank_quotas(ranked.len(), count)) {
            if quota == 0 {
                continue;
            }
            let members: Population = species
                .members()
                .iter()
                .map(|&i| self.population[i].clone())
                .collect();
            let picked = self.config.offspring_selector.select_indices(
                &members,
                &self.config.objective,
                quota,
                &mut self.rng,
            );
            parents.extend(picked.into_iter().map(|k| species.members()[k]));
        }
        parents
    }

    /// Alters copies of the parents. Touched genotypes become new, unscored
    /// individuals; untouched ones stay clones of their parent.
    fn breed(&mut self, parents: &[usize], generation: usize) -> Result<(Vec<Phenotype>, usize)> {
        let mut genotypes: Vec<Genotype> = parents
            .iter()
            .map(|&i| self.population[i].genotype().clone())
            .collect();
        let mut touched = vec![false; genotypes.len()];
        for alterer in &self.alterers {
            for i in alterer.alter(&mut genotypes, &self.genome, &mut self.rng)? {
                touched[i] = true;
            }
        }

        let mut offspring = Vec::with_capacity(genotypes.len());
        let mut altered = 0;
        for ((genotype, changed), &parent) in genotypes.into_iter().zip(touched).zip(parents) {
            if changed {
                self.codec.validate(&genotype).map_err(|e| {
                    EvolveError::invariant(format!("offspring failed validation: {e}"))
                })?;
                offspring.push(Phenotype::new(self.next_id, genotype, generation));
                self.next_id += 1;
                altered += 1;
            } else {
                offspring.push(self.population[parent].clone());
            }
        }
        Ok((offspring, altered))
    }

    /// Ages every member carried over from an earlier generation, survivors
    /// and unaltered clones alike, and replaces those past the maximum age
    /// with fresh individuals.
    fn age(&mut self, members: &mut [Phenotype], generation: usize) -> usize {
        let mut replaced = 0;
        for phenotype in members.iter_mut() {
            if phenotype.generation() >= generation {
                continue;
            }
            phenotype.increment_age();
            if phenotype.age() > self.config.max_phenotype_age {
                *phenotype = spawn(&self.codec, &mut self.rng, &mut self.next_id, generation);
                replaced += 1;
            }
        }
        replaced
    }

    fn record_population_metrics(&mut self, best: &Score) {
        let n = self.population.len().max(1) as f64;
        let mean_age = self.population.iter().map(|p| p.age() as f64).sum::<f64>() / n;
        let unique: HashSet<Vec<u64>> = self
            .population
            .iter()
            .filter_map(|p| p.score().map(|s| s.values().iter().map(|v| v.to_bits()).collect()))
            .collect();

        self.metrics.record_value(metrics::BEST_SCORE, best.as_f64());
        self.metrics.record_value(metrics::MEAN_AGE, mean_age);
        self.metrics
            .record_value(metrics::UNIQUE_SCORES, unique.len() as f64);
        if self.config.speciation.is_some() {
            self.metrics
                .record_value(metrics::SPECIES, self.tracker.species().len() as f64);
        }
        if let Some(front) = &self.front {
            self.metrics.record_value(metrics::FRONT_SIZE, front.len() as f64);
        }
    }
}

/// Creates a fresh random individual with the next id.
fn spawn<C: Codec>(codec: &C, rng: &mut EvolveRng, next_id: &mut u64, generation: usize) -> Phenotype {
    let phenotype = Phenotype::new(*next_id, codec.encode(rng), generation);
    *next_id += 1;
    phenotype
}

/// Splits `total` offspring among `species` species ranked best first.
///
/// The species at rank `r` gets weight `species - r`. Shares are floored
/// and the remainder goes to the largest fractional parts, better ranks
/// first on ties.
pub(crate) fn rank_quotas(species: usize, total: usize) -> Vec<usize> {
    if species == 0 {
        return Vec::new();
    }
    let weight_sum = (species * (species + 1) / 2) as f64;
    let exact: Vec<f64> = (0..species)
        .map(|r| total as f64 * (species - r) as f64 / weight_sum)
        .collect();
    let mut quotas: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let assigned: usize = quotas.iter().sum();
    let mut by_remainder: Vec<usize> = (0..species).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &r in by_remainder.iter().take(total.saturating_sub(assigned)) {
        quotas[r] += 1;
    }
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alter::{CrossoverKind, MutatorKind};
    use crate::codec::{PermutationCodec, VectorCodec};
    use crate::diversity::{Diversity, Speciation};
    use crate::engine::{Executor, Limit};
    use crate::objective::{Objective, Optimize};
    use crate::problem::{fitness_fn, try_fitness_fn};
    use crate::selection::Selector;
    use std::sync::Mutex;

    fn sphere() -> impl Problem<Vec<f64>> {
        fitness_fn(|x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>())
    }

    fn float_engine(config: EngineConfig) -> Engine<VectorCodec<f64>, impl Problem<Vec<f64>>> {
        let codec = VectorCodec::float(4, -5.0..5.0).unwrap();
        Engine::new(codec, sphere(), config).unwrap()
    }

    // ================================================================
    // Quotas
    // ================================================================

    #[test]
    fn test_rank_quotas_sum_and_order() {
        assert_eq!(rank_quotas(1, 7), vec![7]);
        assert_eq!(rank_quotas(3, 12), vec![6, 4, 2]);
        // exact: 4.0, 2.67, 1.33 -> 4, 3, 1
        assert_eq!(rank_quotas(3, 8), vec![4, 3, 1]);
        assert!(rank_quotas(0, 5).is_empty());
        for s in 1..8 {
            for total in 0..40 {
                let q = rank_quotas(s, total);
                assert_eq!(q.iter().sum::<usize>(), total);
                assert!(q.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }

    // ================================================================
    // Construction
    // ================================================================

    #[test]
    fn test_initial_population() {
        let engine = float_engine(EngineConfig::default().with_population_size(12).with_seed(1));
        assert_eq!(engine.population().len(), 12);
        assert!(!engine.population().is_evaluated());
        let ids: Vec<u64> = engine.population().iter().map(Phenotype::id).collect();
        assert_eq!(ids, (0..12).collect::<Vec<_>>());
        assert_eq!(engine.generation(), 0);
        // default alterers for floats
        assert_eq!(engine.alterers().len(), 2);
    }

    #[test]
    fn test_unsupported_alterer_rejected() {
        let codec = VectorCodec::float(4, 0.0..1.0).unwrap();
        let config =
            EngineConfig::default().with_alterer(Alterer::mutator(MutatorKind::BitFlip, 0.1));
        assert!(matches!(
            Engine::new(codec, sphere(), config),
            Err(EvolveError::Configuration(_))
        ));

        let perm = PermutationCodec::indices(5).unwrap();
        let config =
            EngineConfig::default().with_alterer(Alterer::crossover(CrossoverKind::Blend { alpha: 0.5 }, 0.5));
        let tour = fitness_fn(|p: &Vec<usize>| p[0] as f64);
        assert!(Engine::new(perm, tour, config).is_err());
    }

    #[test]
    fn test_unsupported_diversity_rejected() {
        let codec = VectorCodec::float(4, 0.0..1.0).unwrap();
        let config = EngineConfig::default().with_speciation(Speciation::new(Diversity::neat(), 1.0));
        assert!(Engine::new(codec, sphere(), config).is_err());
    }

    // ================================================================
    // Stepping
    // ================================================================

    #[test]
    fn test_step_keeps_population_size_and_ids_increase() {
        let mut engine = float_engine(EngineConfig::default().with_population_size(20).with_seed(3));
        let mut max_id = 19;
        for g in 1..=5 {
            let generation = engine.step().unwrap();
            assert_eq!(generation.index, g);
            assert_eq!(generation.population.len(), 20);
            assert!(generation.population.is_evaluated());
            let newest = generation.population.iter().map(Phenotype::id).max().unwrap();
            assert!(newest >= max_id);
            max_id = newest;
        }
    }

    #[test]
    fn test_generation_reports_best() {
        let mut engine = float_engine(EngineConfig::default().with_population_size(20).with_seed(5));
        let generation = engine.step().unwrap();
        let best = generation
            .population
            .iter()
            .filter_map(Phenotype::score)
            .map(Score::as_f64)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(generation.score.as_f64(), best);
        let decoded: f64 = generation.value.iter().map(|v| v * v).sum();
        assert!((decoded - best).abs() < 1e-12);
        assert!(generation.front.is_none());
        assert!(generation.metrics.get(metrics::EVALUATIONS).is_some());
    }

    #[test]
    fn test_old_survivors_replaced() {
        let config = EngineConfig::default()
            .with_population_size(10)
            .with_offspring_fraction(0.0)
            .with_max_phenotype_age(2)
            .with_seed(9);
        let mut engine = float_engine(config);
        for _ in 0..3 {
            engine.step().unwrap();
        }
        assert!(engine.population().iter().all(|p| p.age() <= 2));
        assert!(engine.metrics.last_value(metrics::AGE_REPLACED).unwrap() > 0.0);
    }

    #[test]
    fn test_unaltered_clones_age_and_retire() {
        let config = EngineConfig::default()
            .with_population_size(10)
            .with_offspring_fraction(1.0)
            .with_alterer(Alterer::mutator(MutatorKind::Uniform, 0.0))
            .with_max_phenotype_age(2)
            .with_seed(9);
        let mut engine = float_engine(config);
        let generation = engine.step().unwrap();
        assert!(generation.population.iter().all(|p| p.age() == 1 && p.id() < 10));
        engine.step().unwrap();
        engine.step().unwrap();
        assert!(engine.population().iter().all(|p| p.age() <= 2));
        assert_eq!(engine.metrics.last_value(metrics::AGE_REPLACED), Some(10.0));
    }

    #[test]
    fn test_events_delivered_per_generation() {
        let mut engine = float_engine(
            EngineConfig::default()
                .with_population_size(10)
                .with_max_generations(4)
                .with_seed(2),
        );
        let events = engine.subscribe();
        engine.run().unwrap();
        let indices: Vec<usize> = events.try_iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_stops_after_one_generation() {
        let mut engine = float_engine(EngineConfig::default().with_population_size(10).with_seed(2));
        engine.cancel_handle().store(true, Ordering::Relaxed);
        let result = engine.run().unwrap();
        assert_eq!(result.index, 1);
    }

    #[test]
    fn test_species_quota_breeding() {
        let config = EngineConfig::default()
            .with_population_size(30)
            .with_speciation(Speciation::new(Diversity::Euclidean, 2.0))
            .with_max_generations(5)
            .with_seed(11);
        let mut engine = float_engine(config);
        let result = engine.run().unwrap();
        assert_eq!(result.population.len(), 30);
        assert!(!result.species.is_empty());
        let covered: usize = result.species.iter().map(Species::len).sum();
        assert_eq!(covered, 30);
        assert_eq!(result.ecosystem().species().len(), result.species.len());
    }

    struct BatchSizes(Mutex<Vec<usize>>);

    impl Problem<Vec<f64>> for BatchSizes {
        fn evaluate(&self, value: &Vec<f64>) -> std::result::Result<Score, FitnessError> {
            Ok(Score::from(value[0]))
        }

        fn evaluate_batch(
            &self,
            values: &[Vec<f64>],
        ) -> std::result::Result<Vec<Score>, FitnessError> {
            self.0.lock().unwrap().push(values.len());
            values.iter().map(|v| self.evaluate(v)).collect()
        }

        fn prefers_batch(&self) -> bool {
            true
        }
    }

    fn batch_sizes(config: EngineConfig) -> Vec<usize> {
        let codec = VectorCodec::float(2, 0.0..1.0).unwrap();
        let mut engine = Engine::new(codec, BatchSizes(Mutex::new(Vec::new())), config).unwrap();
        for _ in 0..3 {
            engine.step().unwrap();
        }
        let sizes = engine.problem().0.lock().unwrap().clone();
        sizes
    }

    #[test]
    fn test_batch_problems_score_whole_population() {
        let config = EngineConfig::default()
            .with_population_size(30)
            .with_offspring_fraction(0.5)
            .with_seed(6);
        // initial scoring, then one rescoring per generation
        assert_eq!(batch_sizes(config.clone()), vec![30; 4]);

        // nothing altered: the rebuilt population is still rescored together
        let untouched = config.with_alterer(Alterer::mutator(MutatorKind::Uniform, 0.0));
        assert_eq!(batch_sizes(untouched), vec![30; 4]);
    }

    // ================================================================
    // Errors
    // ================================================================

    #[test]
    fn test_evaluation_error_propagates() {
        let codec = VectorCodec::float(2, 0.0..1.0).unwrap();
        let failing = try_fitness_fn(|_: &Vec<f64>| -> std::result::Result<f64, FitnessError> {
            Err(FitnessError::new("boom"))
        });
        let mut engine = Engine::new(codec, failing, EngineConfig::default().with_seed(1)).unwrap();
        match engine.step() {
            Err(EvolveError::Evaluation { index, source }) => {
                assert_eq!(index, 0);
                assert_eq!(source.0, "boom");
            }
            other => panic!("expected evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_dimension_count_is_evaluation_error() {
        let codec = VectorCodec::float(2, 0.0..1.0).unwrap();
        let two = fitness_fn(|x: &Vec<f64>| [x[0], x[1]]);
        let mut engine = Engine::new(codec, two, EngineConfig::default().with_seed(1)).unwrap();
        assert!(matches!(engine.step(), Err(EvolveError::Evaluation { .. })));
    }

    #[test]
    fn test_zero_generation_limit_rejected_at_run() {
        let mut engine = float_engine(EngineConfig::default().with_max_generations(0));
        assert!(matches!(engine.run(), Err(EvolveError::Configuration(_))));
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_multi_objective_front() {
        let codec = VectorCodec::float(1, 0.0..2.0).unwrap();
        let problem = fitness_fn(|x: &Vec<f64>| [x[0] * x[0], (x[0] - 2.0).powi(2)]);
        let config = EngineConfig::default()
            .with_population_size(20)
            .with_objective(Objective::multi(vec![Optimize::Minimize; 2]).unwrap())
            .with_selector(Selector::TournamentNsga2(2))
            .with_survivor_selector(Selector::Nsga2)
            .with_executor(Executor::Serial)
            .with_limit(Limit::Generations(3))
            .with_seed(4);
        let mut engine = Engine::new(codec, problem, config).unwrap();
        let result = engine.run().unwrap();
        let front = result.front.unwrap();
        assert!(!front.is_empty());
        assert!(front.len() <= 20);
    }
}
