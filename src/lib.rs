//! Domain-agnostic evolutionary computation engine.
//!
//! One generation loop drives every genome kind:
//!
//! - **Vectors and matrices** of floats, integers, bits or characters
//!   ([`codec::VectorCodec`], [`codec::MatrixCodec`]).
//! - **Permutations** of an arbitrary alphabet ([`codec::PermutationCodec`]).
//! - **Programs**: expression trees and computation graphs, directed or
//!   recurrent ([`codec::TreeCodec`], [`codec::GraphCodec`]).
//!
//! Around the loop sit pluggable selection, crossover and mutation,
//! NSGA-II multi-objective ranking with a Pareto front, NEAT-style
//! speciation, and novelty search.
//!
//! # Quick Start
//!
//! ```
//! use u_evolve::codec::VectorCodec;
//! use u_evolve::engine::{Engine, EngineConfig, Limit};
//! use u_evolve::genome::Score;
//! use u_evolve::problem::fitness_fn;
//!
//! let codec = VectorCodec::float(5, -5.12..5.12).unwrap();
//! let sphere = fitness_fn(|x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>());
//!
//! let config = EngineConfig::default()
//!     .with_population_size(50)
//!     .with_limits(vec![Limit::Generations(200), Limit::Score(Score::from(0.01))])
//!     .with_seed(42);
//!
//! let best = Engine::new(codec, sphere, config).unwrap().run().unwrap();
//! assert_eq!(best.value.len(), 5);
//! assert!(best.score.as_f64() >= 0.0);
//! ```
//!
//! # Architecture
//!
//! Components are closed enums resolved at configuration time
//! ([`selection::Selector`], [`alter::Alterer`], [`diversity::Diversity`],
//! [`engine::Limit`], [`engine::Executor`]); each declares the gene types it
//! supports and the engine rejects mismatches before the first generation.
//! The user supplies only a [`codec::Codec`] (or uses a built-in one) and a
//! [`problem::Problem`].
//!
//! # Features
//!
//! - `parallel` (default): worker-pool fitness evaluation on `rayon`.
//! - `serde`: `Serialize`/`Deserialize` for configuration types.

pub mod alter;
pub mod codec;
pub mod diversity;
pub mod engine;
pub mod error;
pub mod genome;
pub mod novelty;
pub mod objective;
pub mod problem;
pub mod program;
pub mod random;
pub mod selection;

pub use engine::{Engine, EngineConfig, Generation};
pub use error::{EvolveError, FitnessError, Result};
