//! Expression trees.
//!
//! A [`TreeNode`] owns its children; trees are small enough that structural
//! edits simply rebuild the affected path. Nodes are addressed by pre-order
//! index (root = 0), which is what the tree crossover and hoist mutation use
//! to pick attachment points.

use super::op::{Arity, Op, OpSet};
use rand::Rng;

/// A node of an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    op: Op,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(op: Op, children: Vec<TreeNode>) -> Self {
        Self { op, children }
    }

    pub fn leaf(op: Op) -> Self {
        Self::new(op, Vec::new())
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Returns a copy of this node with a different operation.
    pub fn with_op(&self, op: Op) -> Self {
        Self::new(op, self.children.clone())
    }

    /// Evaluates the tree bottom-up.
    pub fn eval(&self, inputs: &[f64]) -> f64 {
        if self.children.is_empty() {
            return self.op.apply(inputs, &[]);
        }
        let args: Vec<f64> = self.children.iter().map(|c| c.eval(inputs)).collect();
        self.op.apply(inputs, &args)
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    /// Depth of the tree; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Checks that every node has as many children as its op's arity.
    pub fn is_valid(&self) -> bool {
        let arity_ok = match self.op.arity() {
            Arity::Exact(n) => self.children.len() == n,
            Arity::Any => !self.children.is_empty(),
        };
        arity_ok && self.children.iter().all(TreeNode::is_valid)
    }

    /// Returns the subtree at pre-order `index`.
    pub fn subtree(&self, index: usize) -> Option<&TreeNode> {
        let mut counter = index;
        self.find(&mut counter)
    }

    fn find(&self, remaining: &mut usize) -> Option<&TreeNode> {
        if *remaining == 0 {
            return Some(self);
        }
        *remaining -= 1;
        for child in &self.children {
            if let Some(found) = child.find(remaining) {
                return Some(found);
            }
        }
        None
    }

    /// Builds a new tree with the subtree at pre-order `index` replaced.
    ///
    /// Out-of-range indices return an unchanged copy.
    pub fn replace_subtree(&self, index: usize, replacement: &TreeNode) -> TreeNode {
        let mut counter = index;
        self.rebuild(&mut counter, replacement)
    }

    fn rebuild(&self, remaining: &mut usize, replacement: &TreeNode) -> TreeNode {
        if *remaining == 0 {
            *remaining = usize::MAX;
            return replacement.clone();
        }
        if *remaining != usize::MAX {
            *remaining -= 1;
        }
        let children = self
            .children
            .iter()
            .map(|c| c.rebuild(remaining, replacement))
            .collect();
        TreeNode::new(self.op.clone(), children)
    }

    /// Grows a random tree of at most `depth` levels below the root.
    ///
    /// The root is always a function when `depth > 0`; deeper nodes pick a
    /// leaf or a function with equal probability. Variadic functions get two
    /// children.
    ///
    /// # Panics
    /// Panics if `ops` has no leaves, or no functions while `depth > 0`.
    pub fn grow<R: Rng>(ops: &OpSet, depth: usize, rng: &mut R) -> TreeNode {
        Self::grow_level(ops, depth, true, rng)
    }

    fn grow_level<R: Rng>(ops: &OpSet, depth: usize, is_root: bool, rng: &mut R) -> TreeNode {
        let use_function =
            depth > 0 && !ops.functions().is_empty() && (is_root || rng.random_bool(0.5));
        if !use_function {
            return TreeNode::leaf(ops.random_leaf(rng));
        }
        let op = ops.random_function(rng);
        let arity = match op.arity() {
            Arity::Exact(n) => n,
            Arity::Any => 2,
        };
        let children = (0..arity)
            .map(|_| Self::grow_level(ops, depth - 1, false, rng))
            .collect();
        TreeNode::new(op, children)
    }

    /// Pre-order iterator over the nodes.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// A decoded program: one expression tree per output.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    roots: Vec<TreeNode>,
}

impl Tree {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Evaluates every root on the same inputs.
    pub fn eval(&self, inputs: &[f64]) -> Vec<f64> {
        self.roots.iter().map(|r| r.eval(inputs)).collect()
    }

    /// Total node count over all roots.
    pub fn size(&self) -> usize {
        self.roots.iter().map(TreeNode::size).sum()
    }
}
