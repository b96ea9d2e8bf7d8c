//! Engine configuration.
//!
//! [`EngineConfig`] holds every parameter of the generation loop. Components
//! are plain values; the engine checks them against the codec's gene type
//! when it is built.

use super::executor::Executor;
use super::limit::Limit;
use crate::alter::Alterer;
use crate::diversity::Speciation;
use crate::error::{EvolveError, Result};
use crate::objective::Objective;
use crate::selection::Selector;

/// Configuration for an [`Engine`](super::Engine).
///
/// # Defaults
///
/// ```
/// use u_evolve::engine::{EngineConfig, Limit};
///
/// let config = EngineConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.limits, vec![Limit::Generations(500)]);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::engine::{EngineConfig, Executor, Limit};
/// use u_evolve::selection::Selector;
///
/// let config = EngineConfig::default()
///     .with_population_size(200)
///     .with_survivor_selector(Selector::Elite)
///     .with_offspring_fraction(0.7)
///     .with_executor(Executor::WorkerPool(4))
///     .with_limit(Limit::Seconds(5.0))
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Number of individuals, constant across generations.
    pub population_size: usize,

    /// Share of each new population produced by alteration (0.0–1.0).
    ///
    /// The rest are survivors of the previous generation.
    pub offspring_fraction: f64,

    /// Chooses which individuals survive unchanged.
    pub survivor_selector: Selector,

    /// Chooses the parents of the offspring.
    pub offspring_selector: Selector,

    /// Alteration steps, applied in order. Empty means the defaults for the
    /// codec's gene type.
    pub alterers: Vec<Alterer>,

    pub objective: Objective,

    /// Species partitioning. `None` disables speciation.
    pub speciation: Option<Speciation>,

    pub executor: Executor,

    /// Stopping conditions; the run ends when any one holds.
    pub limits: Vec<Limit>,

    /// Survivors older than this many generations are replaced by fresh
    /// random individuals.
    pub max_phenotype_age: usize,

    /// Minimum and maximum size of the Pareto front kept for
    /// multi-objective runs.
    pub front_range: (usize, usize),

    /// Random seed. `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            offspring_fraction: 0.8,
            survivor_selector: Selector::default(),
            offspring_selector: Selector::default(),
            alterers: Vec::new(),
            objective: Objective::default(),
            speciation: None,
            executor: Executor::default(),
            limits: vec![Limit::Generations(500)],
            max_phenotype_age: 20,
            front_range: (1, 1000),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Clamped to `[0, 1]`.
    pub fn with_offspring_fraction(mut self, fraction: f64) -> Self {
        self.offspring_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_survivor_selector(mut self, selector: Selector) -> Self {
        self.survivor_selector = selector;
        self
    }

    pub fn with_offspring_selector(mut self, selector: Selector) -> Self {
        self.offspring_selector = selector;
        self
    }

    /// Uses `selector` for both survivors and parents.
    pub fn with_selector(self, selector: Selector) -> Self {
        self.with_survivor_selector(selector)
            .with_offspring_selector(selector)
    }

    pub fn with_alterers(mut self, alterers: Vec<Alterer>) -> Self {
        self.alterers = alterers;
        self
    }

    /// Appends one alteration step.
    pub fn with_alterer(mut self, alterer: Alterer) -> Self {
        self.alterers.push(alterer);
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_speciation(mut self, speciation: Speciation) -> Self {
        self.speciation = Some(speciation);
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Replaces all limits with `limit`.
    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.limits = vec![limit];
        self
    }

    pub fn with_limits(mut self, limits: Vec<Limit>) -> Self {
        self.limits = limits;
        self
    }

    /// Shorthand for `with_limit(Limit::Generations(n))`.
    pub fn with_max_generations(self, n: usize) -> Self {
        self.with_limit(Limit::Generations(n))
    }

    pub fn with_max_phenotype_age(mut self, age: usize) -> Self {
        self.max_phenotype_age = age;
        self
    }

    pub fn with_front_range(mut self, min: usize, max: usize) -> Self {
        self.front_range = (min, max);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for quick runs: 50 individuals, at most 100 generations or
    /// 10 seconds.
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            limits: vec![Limit::Generations(100), Limit::Seconds(10.0)],
            ..Self::default()
        }
    }

    /// Preset trading quality for time: 100 individuals, at most 300
    /// generations or 30 seconds, stop early after 50 flat generations.
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            limits: vec![
                Limit::Generations(300),
                Limit::Seconds(30.0),
                Limit::Convergence {
                    window: 50,
                    epsilon: 1e-3,
                },
            ],
            ..Self::default()
        }
    }

    /// Preset for solution quality: 150 individuals, at most 500
    /// generations or 60 seconds, stop early after 80 flat generations.
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            limits: vec![
                Limit::Generations(500),
                Limit::Seconds(60.0),
                Limit::Convergence {
                    window: 80,
                    epsilon: 5e-4,
                },
            ],
            ..Self::default()
        }
    }

    /// Number of offspring bred each generation.
    pub fn offspring_count(&self) -> usize {
        let n = (self.population_size as f64 * self.offspring_fraction).round() as usize;
        n.min(self.population_size)
    }

    /// Number of survivors kept each generation.
    pub fn survivor_count(&self) -> usize {
        self.population_size - self.offspring_count()
    }

    /// Checks everything except the limits, which are checked when the run
    /// starts.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(EvolveError::config("population_size must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.offspring_fraction) {
            return Err(EvolveError::config(format!(
                "offspring_fraction must be in [0, 1], got {}",
                self.offspring_fraction
            )));
        }
        if self.max_phenotype_age == 0 {
            return Err(EvolveError::config("max_phenotype_age must be at least 1"));
        }
        let (min, max) = self.front_range;
        if max == 0 || min > max {
            return Err(EvolveError::config(format!(
                "front_range must satisfy min <= max and max >= 1, got ({min}, {max})"
            )));
        }
        self.survivor_selector.validate()?;
        self.offspring_selector.validate()?;
        for alterer in &self.alterers {
            alterer.validate()?;
        }
        if let Some(speciation) = &self.speciation {
            speciation.validate()?;
        }
        self.executor.validate()
    }

    /// Checks the limits. Called by [`Engine::run`](super::Engine::run).
    pub fn validate_limits(&self) -> Result<()> {
        if self.limits.is_empty() {
            return Err(EvolveError::config("at least one limit is required"));
        }
        self.limits.iter().try_for_each(Limit::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alter::MutatorKind;
    use crate::diversity::Diversity;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.population_size, 100);
        assert!((config.offspring_fraction - 0.8).abs() < 1e-12);
        assert_eq!(config.survivor_selector, Selector::Tournament(3));
        assert_eq!(config.offspring_selector, Selector::Tournament(3));
        assert!(config.alterers.is_empty());
        assert_eq!(config.objective, Objective::minimize());
        assert!(config.speciation.is_none());
        assert_eq!(config.executor, Executor::Serial);
        assert_eq!(config.limits, vec![Limit::Generations(500)]);
        assert_eq!(config.max_phenotype_age, 20);
        assert_eq!(config.front_range, (1, 1000));
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_population_size(40)
            .with_offspring_fraction(1.7)
            .with_selector(Selector::Rank)
            .with_alterer(Alterer::mutator(MutatorKind::BitFlip, 0.2))
            .with_speciation(Speciation::new(Diversity::Hamming, 0.2))
            .with_max_generations(10)
            .with_max_phenotype_age(5)
            .with_front_range(2, 8)
            .with_seed(7);

        assert_eq!(config.population_size, 40);
        assert_eq!(config.offspring_fraction, 1.0);
        assert_eq!(config.survivor_selector, Selector::Rank);
        assert_eq!(config.offspring_selector, Selector::Rank);
        assert_eq!(config.alterers.len(), 1);
        assert!(config.speciation.is_some());
        assert_eq!(config.limits, vec![Limit::Generations(10)]);
        assert_eq!(config.front_range, (2, 8));
        assert_eq!(config.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_offspring_and_survivor_counts() {
        let config = EngineConfig::default().with_population_size(10);
        assert_eq!(config.offspring_count(), 8);
        assert_eq!(config.survivor_count(), 2);

        let all = config.clone().with_offspring_fraction(1.0);
        assert_eq!(all.offspring_count(), 10);
        assert_eq!(all.survivor_count(), 0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(EngineConfig::default()
            .with_population_size(1)
            .validate()
            .is_err());
        assert!(EngineConfig::default()
            .with_max_phenotype_age(0)
            .validate()
            .is_err());
        assert!(EngineConfig::default()
            .with_front_range(5, 2)
            .validate()
            .is_err());
        assert!(EngineConfig::default()
            .with_survivor_selector(Selector::Tournament(0))
            .validate()
            .is_err());
        assert!(EngineConfig::default()
            .with_executor(Executor::WorkerPool(0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_limits_checked_separately() {
        let config = EngineConfig::default().with_max_generations(0);
        assert!(config.validate().is_ok());
        assert!(config.validate_limits().is_err());
        assert!(EngineConfig::default()
            .with_limits(vec![])
            .validate_limits()
            .is_err());
    }

    #[test]
    fn test_presets() {
        for config in [
            EngineConfig::fast(),
            EngineConfig::balanced(),
            EngineConfig::quality(),
        ] {
            assert!(config.validate().is_ok());
            assert!(config.validate_limits().is_ok());
        }
        assert_eq!(EngineConfig::fast().population_size, 50);
        assert_eq!(EngineConfig::quality().population_size, 150);
    }
}
