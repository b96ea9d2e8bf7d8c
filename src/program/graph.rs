//! Computation graphs stored in a flat arena.
//!
//! Nodes live in a `Vec` and refer to each other by index. Every edge is kept
//! on its target node as `(source, weight)`. Evaluation order is fixed:
//! inputs, then vertices, then outputs, each group in arena order. An edge
//! whose source does not come strictly before its target in that order is a
//! *recurrent* edge and reads the source's value from the previous call.

use super::op::Op;

/// Role of a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Input,
    Vertex,
    Output,
}

/// Whether a graph may contain recurrent edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphMode {
    /// Feed-forward only.
    Directed,
    /// Back edges and self loops allowed.
    Recurrent,
}

/// Weighted incoming connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub weight: f64,
}

impl Edge {
    pub fn new(source: usize, weight: f64) -> Self {
        Self { source, weight }
    }
}

/// One node of the arena; also the gene payload of graph chromosomes.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    index: usize,
    kind: NodeKind,
    op: Op,
    incoming: Vec<Edge>,
}

impl GraphNode {
    pub fn new(index: usize, kind: NodeKind, op: Op, incoming: Vec<Edge>) -> Self {
        Self {
            index,
            kind,
            op,
            incoming,
        }
    }

    /// Input node reading program input `slot`.
    pub fn input(index: usize, slot: usize) -> Self {
        Self::new(index, NodeKind::Input, Op::var(slot), Vec::new())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn incoming(&self) -> &[Edge] {
        &self.incoming
    }

    pub fn with_op(&self, op: Op) -> Self {
        Self::new(self.index, self.kind, op, self.incoming.clone())
    }

    pub fn with_incoming(&self, incoming: Vec<Edge>) -> Self {
        Self::new(self.index, self.kind, self.op.clone(), incoming)
    }

    pub fn has_edge_from(&self, source: usize) -> bool {
        self.incoming.iter().any(|e| e.source == source)
    }
}

/// Position of every node in evaluation order.
pub fn evaluation_ranks(nodes: &[GraphNode]) -> Vec<usize> {
    let mut ranks = vec![0; nodes.len()];
    for (rank, index) in evaluation_order(nodes).into_iter().enumerate() {
        ranks[index] = rank;
    }
    ranks
}

/// Node indices in evaluation order.
pub fn evaluation_order(nodes: &[GraphNode]) -> Vec<usize> {
    let mut order = Vec::with_capacity(nodes.len());
    for kind in [NodeKind::Input, NodeKind::Vertex, NodeKind::Output] {
        order.extend(nodes.iter().filter(|n| n.kind == kind).map(|n| n.index));
    }
    order
}

/// Checks arena consistency: indices match positions, edge sources exist,
/// inputs have no incoming edges, and directed graphs have no back edges.
pub fn is_valid_arena(nodes: &[GraphNode], mode: GraphMode) -> bool {
    let ranks = evaluation_ranks(nodes);
    nodes.iter().enumerate().all(|(position, node)| {
        node.index == position
            && (node.kind != NodeKind::Input || node.incoming.is_empty())
            && node.incoming.iter().all(|e| {
                e.source < nodes.len()
                    && (mode == GraphMode::Recurrent || ranks[e.source] < ranks[position])
            })
    })
}

/// A decoded, executable graph with per-node state.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    order: Vec<usize>,
    ranks: Vec<usize>,
    state: Vec<f64>,
}

impl Graph {
    /// Builds a graph from an arena. Node `i` must have index `i`.
    pub fn new(nodes: Vec<GraphNode>) -> Self {
        let order = evaluation_order(&nodes);
        let ranks = evaluation_ranks(&nodes);
        let state = vec![0.0; nodes.len()];
        Self {
            nodes,
            order,
            ranks,
            state,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.incoming.len()).sum()
    }

    pub fn input_count(&self) -> usize {
        self.count_kind(NodeKind::Input)
    }

    pub fn output_count(&self) -> usize {
        self.count_kind(NodeKind::Output)
    }

    fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Whether `source -> target` reads the previous step's value.
    pub fn is_recurrent_edge(&self, source: usize, target: usize) -> bool {
        self.ranks[source] >= self.ranks[target]
    }

    /// Whether any edge is recurrent.
    pub fn is_recurrent(&self) -> bool {
        self.nodes.iter().any(|node| {
            node.incoming
                .iter()
                .any(|e| self.is_recurrent_edge(e.source, node.index))
        })
    }

    /// Node values produced by the last `eval` call.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Clears the hidden state. Call between independent episodes.
    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Runs one step and returns the output node values in arena order.
    ///
    /// Recurrent edges read values from the previous call; the state is kept
    /// until [`reset`](Self::reset).
    pub fn eval(&mut self, inputs: &[f64]) -> Vec<f64> {
        let previous = std::mem::take(&mut self.state);
        let mut current = vec![0.0; self.nodes.len()];

        for &index in &self.order {
            let node = &self.nodes[index];
            let value = match node.kind {
                NodeKind::Input => node.op.apply(inputs, &[]),
                NodeKind::Vertex | NodeKind::Output => {
                    let args: Vec<f64> = node
                        .incoming
                        .iter()
                        .map(|e| {
                            let source = if self.ranks[e.source] >= self.ranks[index] {
                                previous[e.source]
                            } else {
                                current[e.source]
                            };
                            source * e.weight
                        })
                        .collect();
                    // leaf ops act as a bias on top of the weighted sum
                    if node.op.is_leaf() {
                        node.op.apply(inputs, &[]) + args.iter().sum::<f64>()
                    } else {
                        node.op.apply(inputs, &args)
                    }
                }
            };
            current[index] = if value.is_finite() { value } else { 0.0 };
        }

        let outputs = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Output)
            .map(|n| current[n.index])
            .collect();
        self.state = current;
        outputs
    }
}
