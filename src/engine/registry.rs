//! Name-based component lookup.
//!
//! A [`ComponentSpec`] names a component and carries its arguments as
//! strings, so configurations can come from files or command lines. Each
//! configurable enum resolves a spec with `from_spec`; unknown names and
//! missing or unparsable arguments are configuration errors.
//!
//! Specs also parse from text of the form `name` or
//! `name(key=value, key=value)`:
//!
//! ```
//! use u_evolve::engine::{ComponentSpec, Limit};
//! use u_evolve::selection::Selector;
//!
//! let spec: ComponentSpec = "tournament(size=5)".parse().unwrap();
//! assert_eq!(Selector::from_spec(&spec).unwrap(), Selector::Tournament(5));
//!
//! let limit = Limit::from_spec(&"generations(count=100)".parse().unwrap()).unwrap();
//! assert_eq!(limit, Limit::Generations(100));
//! ```

use super::executor::Executor;
use super::limit::Limit;
use crate::alter::{Alterer, CrossoverKind, MutatorKind};
use crate::diversity::Diversity;
use crate::error::{EvolveError, Result};
use crate::genome::Score;
use crate::selection::Selector;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A component name with string arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentSpec {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub args: BTreeMap<String, String>,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args.insert(key.into(), value.to_string());
        self
    }

    /// Required argument.
    pub fn arg<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.args.get(key).ok_or_else(|| {
            EvolveError::config(format!("{}: missing argument `{key}`", self.name))
        })?;
        self.parse(key, raw)
    }

    /// Optional argument with a default.
    pub fn arg_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.args.get(key) {
            Some(raw) => self.parse(key, raw),
            None => Ok(default),
        }
    }

    fn parse<T: FromStr>(&self, key: &str, raw: &str) -> Result<T> {
        raw.trim().parse().map_err(|_| {
            EvolveError::config(format!(
                "{}: cannot parse argument `{key}` from {raw:?}",
                self.name
            ))
        })
    }

    fn unknown(&self, kind: &str) -> EvolveError {
        EvolveError::config(format!("unknown {kind} `{}`", self.name))
    }
}

impl FromStr for ComponentSpec {
    type Err = EvolveError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = match s.find('(') {
            Some(open) => {
                let inner = s[open + 1..].strip_suffix(')').ok_or_else(|| {
                    EvolveError::config(format!("unbalanced parentheses in {s:?}"))
                })?;
                (&s[..open], Some(inner))
            }
            None => (s, None),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(EvolveError::config(format!("missing component name in {s:?}")));
        }

        let mut spec = ComponentSpec::new(name);
        for pair in rest.into_iter().flat_map(|r| r.split(',')) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                EvolveError::config(format!("expected key=value, got {pair:?}"))
            })?;
            spec.args.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(spec)
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}

impl Selector {
    /// Resolves `tournament(size)`, `roulette`, `rank`,
    /// `linear_rank(pressure)`, `boltzmann(temperature)`, `elite`,
    /// `steady_state(replace)`, `nsga2`, `tournament_nsga2(size)`,
    /// `stochastic_universal` and `random`. Tournament sizes default to 3.
    pub fn from_spec(spec: &ComponentSpec) -> Result<Self> {
        let selector = match spec.name.as_str() {
            "tournament" => Selector::Tournament(spec.arg_or("size", 3)?),
            "roulette" => Selector::Roulette,
            "rank" => Selector::Rank,
            "linear_rank" => Selector::LinearRank(spec.arg("pressure")?),
            "boltzmann" => Selector::Boltzmann(spec.arg("temperature")?),
            "elite" => Selector::Elite,
            "steady_state" => Selector::SteadyState(spec.arg("replace")?),
            "nsga2" => Selector::Nsga2,
            "tournament_nsga2" => Selector::TournamentNsga2(spec.arg_or("size", 3)?),
            "stochastic_universal" => Selector::StochasticUniversal,
            "random" => Selector::Random,
            _ => return Err(spec.unknown("selector")),
        };
        selector.validate()?;
        Ok(selector)
    }
}

impl Alterer {
    /// Resolves any crossover or mutator by its name, e.g.
    /// `uniform_crossover(rate=0.5)` or `gaussian_mutator(rate=0.1, std_dev=0.3)`.
    ///
    /// `rate` is required. Operator parameters default to the values of
    /// [`defaults_for`](crate::alter::defaults_for) where one exists.
    pub fn from_spec(spec: &ComponentSpec) -> Result<Self> {
        let rate: f64 = spec.arg("rate")?;
        let crossover = match spec.name.as_str() {
            "uniform_crossover" => Some(CrossoverKind::Uniform),
            "multi_point_crossover" => Some(CrossoverKind::MultiPoint(spec.arg_or("points", 2)?)),
            "shuffle_crossover" => Some(CrossoverKind::Shuffle),
            "blend_crossover" => Some(CrossoverKind::Blend {
                alpha: spec.arg_or("alpha", 0.5)?,
            }),
            "intermediate_crossover" => Some(CrossoverKind::Intermediate {
                alpha: spec.arg_or("alpha", 0.5)?,
            }),
            "mean_crossover" => Some(CrossoverKind::Mean),
            "simulated_binary_crossover" => Some(CrossoverKind::SimulatedBinary {
                contiguity: spec.arg_or("contiguity", 20.0)?,
            }),
            "pmx_crossover" => Some(CrossoverKind::PartiallyMapped),
            "order_crossover" => Some(CrossoverKind::Order),
            "edge_recombination_crossover" => Some(CrossoverKind::EdgeRecombination),
            "tree_crossover" => Some(CrossoverKind::Tree {
                max_depth: spec.arg_or("max_depth", 10)?,
            }),
            "graph_crossover" => Some(CrossoverKind::Graph),
            _ => None,
        };

        let alterer = match crossover {
            Some(kind) => Alterer::crossover(kind, rate),
            None => {
                let kind = match spec.name.as_str() {
                    "uniform_mutator" => MutatorKind::Uniform,
                    "gaussian_mutator" => MutatorKind::Gaussian {
                        std_dev: spec.arg_or("std_dev", 0.1)?,
                    },
                    "arithmetic_mutator" => MutatorKind::Arithmetic,
                    "polynomial_mutator" => MutatorKind::Polynomial {
                        eta: spec.arg_or("eta", 20.0)?,
                    },
                    "jitter_mutator" => MutatorKind::Jitter {
                        magnitude: spec.arg_or("magnitude", 0.1)?,
                    },
                    "bit_flip_mutator" => MutatorKind::BitFlip,
                    "swap_mutator" => MutatorKind::Swap,
                    "scramble_mutator" => MutatorKind::Scramble,
                    "inversion_mutator" => MutatorKind::Inversion,
                    "insert_mutator" => MutatorKind::Insert,
                    "hoist_mutator" => MutatorKind::Hoist,
                    "tree_operation_mutator" => MutatorKind::TreeOperation {
                        weight_std: spec.arg_or("weight_std", 0.1)?,
                    },
                    "graph_structure_mutator" => MutatorKind::GraphStructure {
                        vertex_rate: spec.arg_or("vertex_rate", 0.5)?,
                        edge_rate: spec.arg_or("edge_rate", 0.5)?,
                    },
                    "graph_operation_mutator" => MutatorKind::GraphOperation {
                        weight_std: spec.arg_or("weight_std", 0.1)?,
                    },
                    _ => return Err(spec.unknown("alterer")),
                };
                Alterer::mutator(kind, rate)
            }
        };
        if !(0.0..=1.0).contains(&rate) {
            return Err(EvolveError::config(format!(
                "{}: rate must be in [0, 1], got {rate}",
                spec.name
            )));
        }
        alterer.validate()?;
        Ok(alterer)
    }
}

impl Diversity {
    /// Resolves `hamming`, `euclidean`, `cosine` and
    /// `neat(excess, disjoint, weight)` (coefficients default to 1, 1, 0.4).
    pub fn from_spec(spec: &ComponentSpec) -> Result<Self> {
        let diversity = match spec.name.as_str() {
            "hamming" => Diversity::Hamming,
            "euclidean" => Diversity::Euclidean,
            "cosine" => Diversity::Cosine,
            "neat" => Diversity::Neat {
                excess: spec.arg_or("excess", 1.0)?,
                disjoint: spec.arg_or("disjoint", 1.0)?,
                weight: spec.arg_or("weight", 0.4)?,
            },
            _ => return Err(spec.unknown("diversity measure")),
        };
        diversity.validate()?;
        Ok(diversity)
    }
}

impl Limit {
    /// Resolves `generations(count)`, `seconds(seconds)`,
    /// `score(values)` with `values` separated by `;` or spaces, and
    /// `convergence(window, epsilon)`.
    pub fn from_spec(spec: &ComponentSpec) -> Result<Self> {
        let limit = match spec.name.as_str() {
            "generations" => Limit::Generations(spec.arg("count")?),
            "seconds" => Limit::Seconds(spec.arg("seconds")?),
            "score" => {
                let raw: String = spec.arg("values")?;
                let values = raw
                    .split(|c: char| c == ';' || c.is_whitespace())
                    .filter(|v| !v.is_empty())
                    .map(|v| spec.parse::<f64>("values", v))
                    .collect::<Result<Vec<f64>>>()?;
                Limit::Score(Score::new(values))
            }
            "convergence" => Limit::Convergence {
                window: spec.arg("window")?,
                epsilon: spec.arg("epsilon")?,
            },
            _ => return Err(spec.unknown("limit")),
        };
        limit.validate()?;
        Ok(limit)
    }
}

impl Executor {
    /// Resolves `serial` and `worker_pool(threads)`.
    pub fn from_spec(spec: &ComponentSpec) -> Result<Self> {
        let executor = match spec.name.as_str() {
            "serial" => Executor::Serial,
            "worker_pool" => Executor::WorkerPool(spec.arg("threads")?),
            _ => return Err(spec.unknown("executor")),
        };
        executor.validate()?;
        Ok(executor)
    }
}
