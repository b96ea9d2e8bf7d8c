//! Named per-run statistics.
//!
//! Every metric keeps running statistics over the values recorded under
//! its name, and separately over the timings recorded under it.

use std::collections::BTreeMap;
use std::time::Duration;

/// Wall time of a whole generation.
pub const GENERATION_TIME: &str = "generation_time";
/// Fitness evaluation time and the number of evaluations.
pub const EVALUATIONS: &str = "evaluations";
/// Alteration time and the number of altered offspring.
pub const ALTERED: &str = "altered";
/// Survivors replaced for exceeding the maximum age.
pub const AGE_REPLACED: &str = "age_replaced";
/// Best first-dimension score.
pub const BEST_SCORE: &str = "best_score";
/// Mean age of the population.
pub const MEAN_AGE: &str = "mean_age";
/// Number of distinct scores in the population.
pub const UNIQUE_SCORES: &str = "unique_scores";
/// Number of species.
pub const SPECIES: &str = "species";
/// Members replaced after their species was dissolved.
pub const SPECIES_REPLACED: &str = "species_replaced";
/// Size of the Pareto front.
pub const FRONT_SIZE: &str = "front_size";

/// Running count, sum, extremes and last value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistic {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl Default for Statistic {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            last: f64::NAN,
        }
    }
}

impl Statistic {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.last = value;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// NaN while empty.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn last(&self) -> f64 {
        self.last
    }
}

/// Value and timing statistics recorded under one name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metric {
    value: Statistic,
    time: Statistic,
}

impl Metric {
    pub fn value(&self) -> &Statistic {
        &self.value
    }

    /// Timings in seconds.
    pub fn time(&self) -> &Statistic {
        &self.time
    }

    pub fn last_duration(&self) -> Option<Duration> {
        (self.time.count > 0).then(|| Duration::from_secs_f64(self.time.last.max(0.0)))
    }
}

/// Metrics by name, in name order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSet {
    metrics: BTreeMap<String, Metric>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_value(&mut self, name: &str, value: f64) {
        self.entry(name).value.add(value);
    }

    pub fn record_time(&mut self, name: &str, elapsed: Duration) {
        self.entry(name).time.add(elapsed.as_secs_f64());
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    /// Most recent value recorded under `name`.
    pub fn last_value(&self, name: &str) -> Option<f64> {
        self.get(name)
            .filter(|m| m.value.count > 0)
            .map(|m| m.value.last)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    fn entry(&mut self, name: &str) -> &mut Metric {
        self.metrics.entry(name.to_string()).or_default()
    }
}
