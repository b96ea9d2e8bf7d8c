//! Fitness evaluation strategies.
//!
//! Evaluation is the only parallel stage of a generation. Results are
//! always gathered back in input order, so serial and pooled runs with the
//! same seed produce identical populations.

use crate::error::{EvolveError, Result};
#[cfg(not(feature = "parallel"))]
use log::warn;

/// Where fitness evaluation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Executor {
    /// In the calling thread, one individual at a time.
    #[default]
    Serial,
    /// On a fixed pool of `n` worker threads, built once per engine.
    ///
    /// Without the `parallel` feature this falls back to serial
    /// evaluation.
    WorkerPool(usize),
}

impl Executor {
    pub fn name(&self) -> &'static str {
        match self {
            Executor::Serial => "serial",
            Executor::WorkerPool(_) => "worker_pool",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Executor::WorkerPool(0) => Err(EvolveError::config(
                "worker_pool needs at least one thread",
            )),
            _ => Ok(()),
        }
    }
}

/// Runtime form of an [`Executor`].
pub(crate) enum Pool {
    Serial,
    #[cfg(feature = "parallel")]
    Rayon(rayon::ThreadPool),
}

impl Pool {
    pub(crate) fn new(executor: Executor) -> Result<Self> {
        executor.validate()?;
        match executor {
            Executor::Serial => Ok(Pool::Serial),
            #[cfg(feature = "parallel")]
            Executor::WorkerPool(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("u-evolve-worker-{i}"))
                .build()
                .map(Pool::Rayon)
                .map_err(|e| EvolveError::config(format!("cannot build worker pool: {e}"))),
            #[cfg(not(feature = "parallel"))]
            Executor::WorkerPool(threads) => {
                warn!(
                    "worker_pool({threads}) requested without the `parallel` feature; \
                     evaluating serially"
                );
                Ok(Pool::Serial)
            }
        }
    }

    /// Applies `f` to every item and returns the results in item order.
    pub(crate) fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        match self {
            Pool::Serial => items.iter().map(f).collect(),
            #[cfg(feature = "parallel")]
            Pool::Rayon(pool) => {
                use rayon::prelude::*;
                pool.install(|| items.par_iter().map(f).collect())
            }
        }
    }

    pub(crate) fn threads(&self) -> usize {
        match self {
            Pool::Serial => 1,
            #[cfg(feature = "parallel")]
            Pool::Rayon(pool) => pool.current_num_threads(),
        }
    }
}
