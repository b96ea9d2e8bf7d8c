//! Fitness evaluation contract.
//!
//! A [`Problem`] scores decoded values. It must be `Send + Sync` because the
//! engine may evaluate many values at once on a worker pool.
//!
//! Most problems are a plain function; [`fitness_fn`] wraps one:
//!
//! ```
//! use u_evolve::problem::{fitness_fn, Problem};
//!
//! let sphere = fitness_fn(|x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>());
//! let score = sphere.evaluate(&vec![1.0, 2.0]).unwrap();
//! assert_eq!(score.as_f64(), 5.0);
//! ```

use crate::error::FitnessError;
use crate::genome::Score;

/// Scores decoded values.
pub trait Problem<T>: Send + Sync {
    /// Scores one value.
    fn evaluate(&self, value: &T) -> Result<Score, FitnessError>;

    /// Scores a batch at once. Results are in input order.
    ///
    /// The default maps [`evaluate`](Problem::evaluate) over the batch.
    fn evaluate_batch(&self, values: &[T]) -> Result<Vec<Score>, FitnessError> {
        values.iter().map(|v| self.evaluate(v)).collect()
    }

    /// Whether the engine should call [`evaluate_batch`](Problem::evaluate_batch)
    /// with the whole population instead of scoring values independently.
    ///
    /// Problems whose score depends on the rest of the population (novelty
    /// search) return `true`.
    fn prefers_batch(&self) -> bool {
        false
    }
}

/// A problem backed by an infallible closure.
pub struct FnProblem<F> {
    func: F,
}

impl<T, S, F> Problem<T> for FnProblem<F>
where
    F: Fn(&T) -> S + Send + Sync,
    S: Into<Score>,
{
    fn evaluate(&self, value: &T) -> Result<Score, FitnessError> {
        Ok((self.func)(value).into())
    }
}

/// Wraps an infallible fitness closure. The closure may return `f64`,
/// `Vec<f64>`, `[f64; N]` or a [`Score`].
pub fn fitness_fn<F>(func: F) -> FnProblem<F> {
    FnProblem { func }
}

/// A problem backed by a fallible closure.
pub struct TryFnProblem<F> {
    func: F,
}

impl<T, S, F> Problem<T> for TryFnProblem<F>
where
    F: Fn(&T) -> Result<S, FitnessError> + Send + Sync,
    S: Into<Score>,
{
    fn evaluate(&self, value: &T) -> Result<Score, FitnessError> {
        (self.func)(value).map(Into::into)
    }
}

/// Wraps a fallible fitness closure.
pub fn try_fitness_fn<F>(func: F) -> TryFnProblem<F> {
    TryFnProblem { func }
}
