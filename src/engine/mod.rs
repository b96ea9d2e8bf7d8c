//! The evolutionary engine.
//!
//! An [`Engine`] evolves a population of genotypes produced by a
//! [`Codec`](crate::codec::Codec) and scored by a
//! [`Problem`](crate::problem::Problem), one generation at a time, until one
//! of the configured [`Limit`]s holds.
//!
//! # Key Types
//!
//! - [`EngineConfig`]: population size, selectors, alterers, objective,
//!   speciation, executor, limits (builder with presets)
//! - [`Engine`]: runs the generation loop
//! - [`Generation`]: snapshot returned after each generation
//! - [`GenerationEvent`]: per-generation notification for subscribers
//! - [`MetricSet`]: named value and timing statistics
//! - [`ComponentSpec`]: components resolved by name
//!
//! # Determinism
//!
//! All randomness comes from one generator seeded by
//! [`EngineConfig::seed`]. Evaluation draws no random numbers and results
//! are gathered in population order, so a seeded run gives the same
//! generations with any [`Executor`].
//!
//! # References
//!
//! - Eiben & Smith (2015), *Introduction to Evolutionary Computing*, 2nd ed.
//! - Deb et al. (2002), *A Fast and Elitist Multiobjective GA: NSGA-II*

mod config;
mod event;
mod executor;
mod limit;
pub mod metrics;
mod registry;
mod runner;

pub use config::EngineConfig;
pub use event::GenerationEvent;
pub use executor::Executor;
pub use limit::Limit;
pub use metrics::{Metric, MetricSet, Statistic};
pub use registry::ComponentSpec;
pub use runner::{Engine, Generation};
