//! Operations used as program nodes.
//!
//! An [`Op`] is either a leaf (input variable, constant, mutable weight) or a
//! fixed-arity / variadic function. Function ops hold a plain `fn` pointer, so
//! they are `Copy`-cheap to clone and safe to share across worker threads.

use rand::Rng;
use std::fmt;

/// Number of arguments an operation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// Any number of arguments (aggregators such as `sum`).
    Any,
}

/// A program operation.
#[derive(Clone)]
pub enum Op {
    /// Reads input `index` (0.0 when the input is missing).
    Var { index: usize },
    /// Fixed constant.
    Const { value: f64 },
    /// Constant that mutators are allowed to perturb.
    Weight { value: f64 },
    /// Function applied to the evaluated arguments.
    Fn {
        name: &'static str,
        arity: Arity,
        func: fn(&[f64]) -> f64,
    },
}

impl Op {
    pub fn var(index: usize) -> Self {
        Op::Var { index }
    }

    pub fn constant(value: f64) -> Self {
        Op::Const { value }
    }

    pub fn weight(value: f64) -> Self {
        Op::Weight { value }
    }

    /// Custom function op.
    pub fn function(name: &'static str, arity: Arity, func: fn(&[f64]) -> f64) -> Self {
        Op::Fn { name, arity, func }
    }

    pub fn add() -> Self {
        Op::function("add", Arity::Exact(2), |x| x[0] + x[1])
    }

    pub fn sub() -> Self {
        Op::function("sub", Arity::Exact(2), |x| x[0] - x[1])
    }

    pub fn mul() -> Self {
        Op::function("mul", Arity::Exact(2), |x| x[0] * x[1])
    }

    /// Protected division: returns 1.0 when the divisor is (nearly) zero.
    pub fn div() -> Self {
        Op::function("div", Arity::Exact(2), |x| {
            if x[1].abs() < 1e-12 {
                1.0
            } else {
                x[0] / x[1]
            }
        })
    }

    pub fn neg() -> Self {
        Op::function("neg", Arity::Exact(1), |x| -x[0])
    }

    pub fn sin() -> Self {
        Op::function("sin", Arity::Exact(1), |x| x[0].sin())
    }

    pub fn cos() -> Self {
        Op::function("cos", Arity::Exact(1), |x| x[0].cos())
    }

    /// Exponential with the argument clamped to `[-50, 50]`.
    pub fn exp() -> Self {
        Op::function("exp", Arity::Exact(1), |x| x[0].clamp(-50.0, 50.0).exp())
    }

    /// Protected natural log of `|x|`; 0.0 near zero.
    pub fn log() -> Self {
        Op::function("log", Arity::Exact(1), |x| {
            if x[0].abs() < 1e-12 {
                0.0
            } else {
                x[0].abs().ln()
            }
        })
    }

    pub fn sigmoid() -> Self {
        Op::function("sigmoid", Arity::Any, |x| {
            let s: f64 = x.iter().sum();
            1.0 / (1.0 + (-s).exp())
        })
    }

    pub fn tanh() -> Self {
        Op::function("tanh", Arity::Any, |x| x.iter().sum::<f64>().tanh())
    }

    pub fn relu() -> Self {
        Op::function("relu", Arity::Any, |x| x.iter().sum::<f64>().max(0.0))
    }

    pub fn identity() -> Self {
        Op::function("identity", Arity::Exact(1), |x| x[0])
    }

    pub fn sum() -> Self {
        Op::function("sum", Arity::Any, |x| x.iter().sum())
    }

    pub fn prod() -> Self {
        Op::function("prod", Arity::Any, |x| {
            if x.is_empty() {
                0.0
            } else {
                x.iter().product()
            }
        })
    }

    pub fn max() -> Self {
        Op::function("max", Arity::Any, |x| {
            x.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(f64::MIN)
        })
    }

    pub fn min() -> Self {
        Op::function("min", Arity::Any, |x| {
            x.iter().copied().fold(f64::INFINITY, f64::min).min(f64::MAX)
        })
    }

    /// Short label used by `Display`.
    pub fn name(&self) -> String {
        match self {
            Op::Var { index } => format!("x{index}"),
            Op::Const { value } => format!("{value}"),
            Op::Weight { value } => format!("w({value:.4})"),
            Op::Fn { name, .. } => (*name).to_string(),
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Op::Var { .. } | Op::Const { .. } | Op::Weight { .. } => Arity::Exact(0),
            Op::Fn { arity, .. } => *arity,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.arity() == Arity::Exact(0)
    }

    /// Value carried by `Const` and `Weight` ops.
    pub fn value(&self) -> Option<f64> {
        match self {
            Op::Const { value } | Op::Weight { value } => Some(*value),
            _ => None,
        }
    }

    /// Returns a copy with a new value if this op is a `Weight`.
    pub fn with_weight(&self, value: f64) -> Option<Op> {
        match self {
            Op::Weight { .. } => Some(Op::Weight { value }),
            _ => None,
        }
    }

    /// Applies the operation.
    ///
    /// `inputs` are the program inputs (read by `Var`), `args` the evaluated
    /// children or weighted incoming values.
    pub fn apply(&self, inputs: &[f64], args: &[f64]) -> f64 {
        match self {
            Op::Var { index } => inputs.get(*index).copied().unwrap_or(0.0),
            Op::Const { value } | Op::Weight { value } => *value,
            Op::Fn { arity, func, .. } => match arity {
                Arity::Any => func(args),
                Arity::Exact(0) => func(&[]),
                Arity::Exact(n) => {
                    if args.len() == *n {
                        func(args)
                    } else {
                        let mut padded = vec![0.0; *n];
                        for (slot, value) in padded.iter_mut().zip(args) {
                            *slot = *value;
                        }
                        func(&padded)
                    }
                }
            },
        }
    }
}

impl PartialEq for Op {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Op::Var { index: a }, Op::Var { index: b }) => a == b,
            (Op::Const { value: a }, Op::Const { value: b }) => a == b,
            (Op::Weight { value: a }, Op::Weight { value: b }) => a == b,
            (
                Op::Fn {
                    name: a, arity: x, ..
                },
                Op::Fn {
                    name: b, arity: y, ..
                },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Op({})", self.name())
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// The operations a program codec draws from.
///
/// `leaves` are zero-arity ops (variables, constants, weights); `functions`
/// are internal tree nodes or graph vertex operations.
#[derive(Debug, Clone, PartialEq)]
pub struct OpSet {
    leaves: Vec<Op>,
    functions: Vec<Op>,
}

impl OpSet {
    pub fn new(leaves: Vec<Op>, functions: Vec<Op>) -> Self {
        Self { leaves, functions }
    }

    /// Inputs `x0..x{n-1}`, a mutable weight and the four arithmetic ops.
    pub fn arithmetic(inputs: usize) -> Self {
        let mut leaves: Vec<Op> = (0..inputs).map(Op::var).collect();
        leaves.push(Op::weight(1.0));
        Self::new(leaves, vec![Op::add(), Op::sub(), Op::mul(), Op::div()])
    }

    /// Activation functions suitable for graph vertices.
    pub fn activations() -> Self {
        Self::new(
            Vec::new(),
            vec![Op::sum(), Op::sigmoid(), Op::tanh(), Op::relu()],
        )
    }

    pub fn leaves(&self) -> &[Op] {
        &self.leaves
    }

    pub fn functions(&self) -> &[Op] {
        &self.functions
    }

    /// Picks a random leaf. `Weight` leaves get a fresh value in `[-1, 1)`.
    ///
    /// # Panics
    /// Panics if there are no leaves.
    pub fn random_leaf<R: Rng>(&self, rng: &mut R) -> Op {
        let op = &self.leaves[rng.random_range(0..self.leaves.len())];
        match op {
            Op::Weight { .. } => Op::weight(rng.random_range(-1.0..1.0)),
            other => other.clone(),
        }
    }

    /// Picks a random function op.
    ///
    /// # Panics
    /// Panics if there are no functions.
    pub fn random_function<R: Rng>(&self, rng: &mut R) -> Op {
        self.functions[rng.random_range(0..self.functions.len())].clone()
    }

    /// Picks a random op with the given arity, from leaves or functions.
    pub fn random_with_arity<R: Rng>(&self, arity: Arity, rng: &mut R) -> Option<Op> {
        let candidates: Vec<&Op> = self
            .leaves
            .iter()
            .chain(self.functions.iter())
            .filter(|op| op.arity() == arity)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let op = candidates[rng.random_range(0..candidates.len())];
        Some(match op {
            Op::Weight { .. } => Op::weight(rng.random_range(-1.0..1.0)),
            other => other.clone(),
        })
    }
}
