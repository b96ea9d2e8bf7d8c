//! Termination predicates checked at every generation boundary.

use crate::error::{EvolveError, Result};
use crate::genome::{Population, Score};
use crate::objective::Objective;
use std::time::Duration;

/// A stopping condition. The engine stops as soon as any configured limit
/// is satisfied.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Limit {
    /// Stop after this many completed generations.
    Generations(usize),

    /// Stop once the run has lasted this many seconds.
    Seconds(f64),

    /// Stop once some member reaches the target: every objective value at
    /// least as good as the target's.
    Score(Score),

    /// Stop when the best score moved by at most `epsilon` over the last
    /// `window` generations (first objective dimension).
    Convergence { window: usize, epsilon: f64 },
}

/// What a limit can look at after a generation.
pub(crate) struct Progress<'a> {
    /// Completed generations.
    pub generation: usize,
    pub elapsed: Duration,
    pub population: &'a Population,
    pub objective: &'a Objective,
    /// Best first-dimension score per generation, in minimization form.
    pub history: &'a [f64],
}

impl Limit {
    pub fn name(&self) -> &'static str {
        match self {
            Limit::Generations(_) => "generations",
            Limit::Seconds(_) => "seconds",
            Limit::Score(_) => "score",
            Limit::Convergence { .. } => "convergence",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Limit::Generations(0) => Err(EvolveError::config(
                "generation limit must be at least 1",
            )),
            Limit::Seconds(s) if !(s.is_finite() && *s > 0.0) => Err(EvolveError::config(
                format!("seconds limit must be positive, got {s}"),
            )),
            Limit::Score(target) if target.is_empty() => {
                Err(EvolveError::config("score limit needs at least one value"))
            }
            Limit::Score(target) if target.values().iter().any(|v| v.is_nan()) => {
                Err(EvolveError::config("score limit must not contain NaN"))
            }
            Limit::Convergence { window, .. } if *window < 2 => Err(EvolveError::config(
                format!("convergence window must be at least 2, got {window}"),
            )),
            Limit::Convergence { epsilon, .. } if !(epsilon.is_finite() && *epsilon >= 0.0) => {
                Err(EvolveError::config(format!(
                    "convergence epsilon must be finite and non-negative, got {epsilon}"
                )))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn is_satisfied(&self, progress: &Progress<'_>) -> bool {
        match self {
            Limit::Generations(n) => progress.generation >= *n,
            Limit::Seconds(s) => progress.elapsed.as_secs_f64() >= *s,
            Limit::Score(target) => {
                if !progress.objective.accepts(target) {
                    return false;
                }
                let goal = progress.objective.to_minimization(target);
                progress.population.iter().any(|p| {
                    p.score().is_some_and(|s| {
                        progress
                            .objective
                            .to_minimization(s)
                            .iter()
                            .zip(&goal)
                            .all(|(v, g)| v <= g)
                    })
                })
            }
            Limit::Convergence { window, epsilon } => {
                let h = progress.history;
                if h.len() < *window {
                    return false;
                }
                let recent = &h[h.len() - window..];
                let lo = recent.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                hi - lo <= *epsilon
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Chromosome, Gene, Genotype, Phenotype};

    fn population(scores: &[f64]) -> Population {
        scores
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let genotype = Genotype::new(vec![Chromosome::new(vec![Gene::Bit(true)]).unwrap()]);
                let mut p = Phenotype::new(i as u64, genotype, 0);
                p.set_score(Score::from(s));
                p
            })
            .collect()
    }

    fn progress<'a>(
        generation: usize,
        population: &'a Population,
        objective: &'a Objective,
        history: &'a [f64],
    ) -> Progress<'a> {
        Progress {
            generation,
            elapsed: Duration::from_millis(10),
            population,
            objective,
            history,
        }
    }

    #[test]
    fn test_generations() {
        let pop = population(&[1.0]);
        let obj = Objective::minimize();
        let limit = Limit::Generations(3);
        assert!(!limit.is_satisfied(&progress(2, &pop, &obj, &[])));
        assert!(limit.is_satisfied(&progress(3, &pop, &obj, &[])));
    }

    #[test]
    fn test_score_respects_direction() {
        let pop = population(&[5.0, 2.0]);
        let min = Objective::minimize();
        assert!(Limit::Score(Score::from(2.0)).is_satisfied(&progress(1, &pop, &min, &[])));
        assert!(!Limit::Score(Score::from(1.0)).is_satisfied(&progress(1, &pop, &min, &[])));

        let max = Objective::maximize();
        assert!(Limit::Score(Score::from(4.0)).is_satisfied(&progress(1, &pop, &max, &[])));
        assert!(!Limit::Score(Score::from(6.0)).is_satisfied(&progress(1, &pop, &max, &[])));
    }

    #[test]
    fn test_convergence_window() {
        let pop = population(&[1.0]);
        let obj = Objective::minimize();
        let limit = Limit::Convergence {
            window: 3,
            epsilon: 0.01,
        };
        assert!(!limit.is_satisfied(&progress(2, &pop, &obj, &[1.0, 1.0])));
        assert!(!limit.is_satisfied(&progress(3, &pop, &obj, &[2.0, 1.0, 1.0])));
        assert!(limit.is_satisfied(&progress(4, &pop, &obj, &[2.0, 1.0, 1.0, 0.995])));
    }

    #[test]
    fn test_seconds() {
        let pop = population(&[1.0]);
        let obj = Objective::minimize();
        assert!(Limit::Seconds(0.005).is_satisfied(&progress(1, &pop, &obj, &[])));
        assert!(!Limit::Seconds(60.0).is_satisfied(&progress(1, &pop, &obj, &[])));
    }

    #[test]
    fn test_validate() {
        assert!(Limit::Generations(0).validate().is_err());
        assert!(Limit::Generations(1).validate().is_ok());
        assert!(Limit::Seconds(0.0).validate().is_err());
        assert!(Limit::Seconds(f64::INFINITY).validate().is_err());
        assert!(Limit::Score(Score::new(vec![])).validate().is_err());
        assert!(Limit::Convergence {
            window: 1,
            epsilon: 0.1
        }
        .validate()
        .is_err());
        assert!(Limit::Convergence {
            window: 5,
            epsilon: -1.0
        }
        .validate()
        .is_err());
    }
}
