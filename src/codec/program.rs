//! Codecs for program genomes: expression trees and computation graphs.

use super::{Codec, GenomeSpec};
use crate::error::{EvolveError, Result};
use crate::genome::{Chromosome, Gene, GeneType, Genotype};
use crate::program::graph::is_valid_arena;
use crate::program::{Edge, Graph, GraphMode, GraphNode, NodeKind, Op, OpSet, Tree, TreeNode};
use rand::Rng;

/// Expression-tree programs with `roots` outputs.
///
/// The genotype is one chromosome holding one tree gene per root.
#[derive(Debug, Clone)]
pub struct TreeCodec {
    ops: OpSet,
    depth: usize,
    roots: usize,
}

impl TreeCodec {
    /// Trees grown to at most `depth` levels below the root.
    pub fn new(ops: OpSet, depth: usize, roots: usize) -> Result<Self> {
        if ops.leaves().is_empty() {
            return Err(EvolveError::config("tree op set needs at least one leaf"));
        }
        if depth > 0 && ops.functions().is_empty() {
            return Err(EvolveError::config(
                "tree op set needs at least one function when depth > 0",
            ));
        }
        if roots == 0 {
            return Err(EvolveError::config("tree codec needs at least one root"));
        }
        Ok(Self { ops, depth, roots })
    }

    pub fn ops(&self) -> &OpSet {
        &self.ops
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Codec for TreeCodec {
    type Value = Tree;

    fn spec(&self) -> GenomeSpec {
        GenomeSpec::new(GeneType::Tree).with_ops(self.ops.clone())
    }

    fn encode<R: Rng>(&self, rng: &mut R) -> Genotype {
        let genes = (0..self.roots)
            .map(|_| Gene::Tree(TreeNode::grow(&self.ops, self.depth, rng)))
            .collect();
        Genotype::new(vec![Chromosome::from_genes(genes)])
    }

    fn decode(&self, genotype: &Genotype) -> Tree {
        Tree::new(
            genotype
                .genes()
                .filter_map(|g| match g {
                    Gene::Tree(node) => Some(node.clone()),
                    _ => None,
                })
                .collect(),
        )
    }

    fn validate(&self, genotype: &Genotype) -> Result<()> {
        if genotype.len() != 1 || genotype.gene_count() != self.roots {
            return Err(EvolveError::invariant(format!(
                "tree genotype must be one chromosome of {} trees",
                self.roots
            )));
        }
        if genotype
            .genes()
            .any(|g| !matches!(g, Gene::Tree(node) if node.is_valid()))
        {
            return Err(EvolveError::invariant("tree gene violates op arity"));
        }
        Ok(())
    }
}

/// Computation graphs with fixed input and output counts.
///
/// A fresh genotype is the minimal fully connected graph: every input feeds
/// every output with a weight drawn from `[-1, 1)`. In recurrent mode each
/// output also gets a self loop. Vertices are only added later by the graph
/// structure mutator.
#[derive(Debug, Clone)]
pub struct GraphCodec {
    inputs: usize,
    outputs: usize,
    ops: OpSet,
    output_op: Op,
    mode: GraphMode,
}

impl GraphCodec {
    pub fn new(inputs: usize, outputs: usize, mode: GraphMode) -> Result<Self> {
        if inputs == 0 || outputs == 0 {
            return Err(EvolveError::config(format!(
                "graph needs at least one input and one output, got {inputs}x{outputs}"
            )));
        }
        Ok(Self {
            inputs,
            outputs,
            ops: OpSet::activations(),
            output_op: Op::sum(),
            mode,
        })
    }

    pub fn directed(inputs: usize, outputs: usize) -> Result<Self> {
        Self::new(inputs, outputs, GraphMode::Directed)
    }

    pub fn recurrent(inputs: usize, outputs: usize) -> Result<Self> {
        Self::new(inputs, outputs, GraphMode::Recurrent)
    }

    /// Operations new vertices draw from.
    pub fn with_ops(mut self, ops: OpSet) -> Result<Self> {
        if ops.functions().is_empty() {
            return Err(EvolveError::config(
                "graph op set needs at least one vertex function",
            ));
        }
        self.ops = ops;
        Ok(self)
    }

    /// Operation applied by the output nodes (default `sum`).
    pub fn with_output_op(mut self, op: Op) -> Self {
        self.output_op = op;
        self
    }

    pub fn mode(&self) -> GraphMode {
        self.mode
    }
}

impl Codec for GraphCodec {
    type Value = Graph;

    fn spec(&self) -> GenomeSpec {
        GenomeSpec::new(GeneType::Graph)
            .with_ops(self.ops.clone())
            .with_graph_mode(self.mode)
    }

    fn encode<R: Rng>(&self, rng: &mut R) -> Genotype {
        let mut genes: Vec<Gene> = (0..self.inputs)
            .map(|slot| Gene::Graph(GraphNode::input(slot, slot)))
            .collect();
        for k in 0..self.outputs {
            let index = self.inputs + k;
            let mut incoming: Vec<Edge> = (0..self.inputs)
                .map(|source| Edge::new(source, rng.random_range(-1.0..1.0)))
                .collect();
            if self.mode == GraphMode::Recurrent {
                incoming.push(Edge::new(index, rng.random_range(-1.0..1.0)));
            }
            genes.push(Gene::Graph(GraphNode::new(
                index,
                NodeKind::Output,
                self.output_op.clone(),
                incoming,
            )));
        }
        Genotype::new(vec![Chromosome::from_genes(genes)])
    }

    fn decode(&self, genotype: &Genotype) -> Graph {
        Graph::new(
            genotype
                .genes()
                .filter_map(|g| match g {
                    Gene::Graph(node) => Some(node.clone()),
                    _ => None,
                })
                .collect(),
        )
    }

    fn validate(&self, genotype: &Genotype) -> Result<()> {
        if genotype.len() != 1 {
            return Err(EvolveError::invariant("graph genotype must be one chromosome"));
        }
        let nodes: Vec<GraphNode> = genotype
            .genes()
            .map(|g| match g {
                Gene::Graph(node) => Ok(node.clone()),
                other => Err(EvolveError::invariant(format!(
                    "graph chromosome holds a {} gene",
                    other.gene_type()
                ))),
            })
            .collect::<Result<_>>()?;
        let count = |kind: NodeKind| nodes.iter().filter(|n| n.kind() == kind).count();
        if count(NodeKind::Input) != self.inputs || count(NodeKind::Output) != self.outputs {
            return Err(EvolveError::invariant(format!(
                "graph must keep {} inputs and {} outputs",
                self.inputs, self.outputs
            )));
        }
        if !is_valid_arena(&nodes, self.mode) {
            return Err(EvolveError::invariant(format!(
                "graph arena is inconsistent for {:?} mode",
                self.mode
            )));
        }
        Ok(())
    }
}
