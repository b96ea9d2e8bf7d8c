//! Structural operators for tree and graph genomes.

use crate::error::{EvolveError, Result};
use crate::genome::{Chromosome, Gene};
use crate::program::graph::evaluation_ranks;
use crate::program::{Edge, GraphMode, GraphNode, NodeKind, Op, OpSet, TreeNode};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Graph nodes of a chromosome, in arena order.
pub(crate) fn graph_nodes(chromosome: &Chromosome) -> Result<Vec<GraphNode>> {
    chromosome
        .iter()
        .map(|g| match g {
            Gene::Graph(node) => Ok(node.clone()),
            other => Err(EvolveError::invariant(format!(
                "graph operator on a {} gene",
                other.gene_type()
            ))),
        })
        .collect()
}

pub(crate) fn graph_chromosome(nodes: Vec<GraphNode>) -> Chromosome {
    Chromosome::from_genes(nodes.into_iter().map(Gene::Graph).collect())
}

/// `value + N(0, std_dev)`; unchanged when `std_dev` is not positive.
fn perturb<R: Rng>(value: f64, std_dev: f64, rng: &mut R) -> f64 {
    match Normal::new(0.0, std_dev) {
        Ok(normal) if std_dev > 0.0 => value + normal.sample(rng),
        _ => value,
    }
}

// ============================================================================
// Trees
// ============================================================================

/// Swaps a random subtree of `a` with a random subtree of `b`.
///
/// A child deeper than `max_depth` is replaced by its parent.
pub(crate) fn tree_crossover<R: Rng>(
    a: &TreeNode,
    b: &TreeNode,
    max_depth: usize,
    rng: &mut R,
) -> (TreeNode, TreeNode) {
    let i = rng.random_range(0..a.size());
    let j = rng.random_range(0..b.size());
    let (Some(sub_a), Some(sub_b)) = (a.subtree(i), b.subtree(j)) else {
        return (a.clone(), b.clone());
    };

    let c1 = a.replace_subtree(i, sub_b);
    let c2 = b.replace_subtree(j, sub_a);
    (
        if c1.depth() <= max_depth { c1 } else { a.clone() },
        if c2.depth() <= max_depth { c2 } else { b.clone() },
    )
}

/// Replaces the tree by one of its own subtrees. Never grows the tree.
pub(crate) fn hoist<R: Rng>(tree: &TreeNode, rng: &mut R) -> TreeNode {
    let index = rng.random_range(0..tree.size());
    tree.subtree(index).cloned().unwrap_or_else(|| tree.clone())
}

/// Changes one random node: `Weight` leaves are perturbed, every other node
/// gets a different op of the same arity from `ops` (if one exists).
pub(crate) fn tree_operation<R: Rng>(
    tree: &TreeNode,
    ops: Option<&OpSet>,
    weight_std: f64,
    rng: &mut R,
) -> TreeNode {
    let index = rng.random_range(0..tree.size());
    let Some(node) = tree.subtree(index) else {
        return tree.clone();
    };

    let replacement = match node.op() {
        Op::Weight { value } => Op::weight(perturb(*value, weight_std, rng)),
        op => match ops.and_then(|set| set.random_with_arity(op.arity(), rng)) {
            Some(new_op) => new_op,
            None => return tree.clone(),
        },
    };
    tree.replace_subtree(index, &node.with_op(replacement))
}

// ============================================================================
// Graphs
// ============================================================================

/// Keeps the edges of `node` whose source exists and, in directed mode,
/// comes earlier in evaluation order. Duplicate sources are dropped.
fn valid_edges(node: &GraphNode, ranks: &[usize], mode: GraphMode) -> Vec<Edge> {
    let mut kept: Vec<Edge> = Vec::with_capacity(node.incoming().len());
    for edge in node.incoming() {
        let exists = edge.source < ranks.len();
        let forward = exists && ranks[edge.source] < ranks[node.index()];
        let duplicate = kept.iter().any(|e| e.source == edge.source);
        if exists && !duplicate && (mode == GraphMode::Recurrent || forward) {
            kept.push(*edge);
        }
    }
    kept
}

/// Exchanges ops and incoming edges between nodes that share index and
/// kind (inputs excluded), each with probability 1/2. Edges that are not
/// valid in the receiving arena are dropped.
pub(crate) fn graph_crossover<R: Rng>(
    a: &[GraphNode],
    b: &[GraphNode],
    mode: GraphMode,
    rng: &mut R,
) -> (Vec<GraphNode>, Vec<GraphNode>) {
    let mut left = a.to_vec();
    let mut right = b.to_vec();
    let ranks_left = evaluation_ranks(&left);
    let ranks_right = evaluation_ranks(&right);

    for i in 0..left.len().min(right.len()) {
        let (x, y) = (&a[i], &b[i]);
        if x.kind() != y.kind() || x.kind() == NodeKind::Input || !rng.random_bool(0.5) {
            continue;
        }
        let into_left = GraphNode::new(i, x.kind(), y.op().clone(), y.incoming().to_vec());
        let into_right = GraphNode::new(i, y.kind(), x.op().clone(), x.incoming().to_vec());
        left[i] = into_left.with_incoming(valid_edges(&into_left, &ranks_left, mode));
        right[i] = into_right.with_incoming(valid_edges(&into_right, &ranks_right, mode));
    }

    (left, right)
}

/// Grows the graph by one vertex or one edge.
///
/// With probability `vertex_rate` an edge is split: `s -> t` becomes
/// `s -> v` (weight 1) and `v -> t` (old weight), with `v` a new vertex
/// appended to the arena. Directed graphs only split edges into outputs,
/// so the new vertex sits between the two ends in evaluation order.
/// Otherwise, with probability `edge_rate`, a missing edge is added; directed
/// graphs only gain forward edges.
pub(crate) fn graph_structure<R: Rng>(
    nodes: &[GraphNode],
    ops: Option<&OpSet>,
    mode: GraphMode,
    vertex_rate: f64,
    edge_rate: f64,
    rng: &mut R,
) -> Option<Vec<GraphNode>> {
    if rng.random_bool(vertex_rate.clamp(0.0, 1.0)) {
        if let Some(split) = split_edge(nodes, ops, mode, rng) {
            return Some(split);
        }
    }
    if rng.random_bool(edge_rate.clamp(0.0, 1.0)) {
        return add_edge(nodes, mode, rng);
    }
    None
}

fn split_edge<R: Rng>(
    nodes: &[GraphNode],
    ops: Option<&OpSet>,
    mode: GraphMode,
    rng: &mut R,
) -> Option<Vec<GraphNode>> {
    let candidates: Vec<(usize, usize)> = nodes
        .iter()
        .filter(|n| n.kind() != NodeKind::Input)
        .filter(|n| mode == GraphMode::Recurrent || n.kind() == NodeKind::Output)
        .flat_map(|n| {
            n.incoming()
                .iter()
                .enumerate()
                .filter(|(_, e)| {
                    mode == GraphMode::Recurrent
                        || nodes
                            .get(e.source)
                            .is_some_and(|s| s.kind() != NodeKind::Output)
                })
                .map(move |(k, _)| (n.index(), k))
        })
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let (target, k) = candidates[rng.random_range(0..candidates.len())];
    let old = nodes[target].incoming()[k];
    let vertex = nodes.len();
    let op = match ops {
        Some(set) if !set.functions().is_empty() => set.random_function(rng),
        _ => Op::sum(),
    };

    let mut grown = nodes.to_vec();
    let mut incoming = grown[target].incoming().to_vec();
    incoming[k] = Edge::new(vertex, old.weight);
    grown[target] = grown[target].with_incoming(incoming);
    grown.push(GraphNode::new(
        vertex,
        NodeKind::Vertex,
        op,
        vec![Edge::new(old.source, 1.0)],
    ));
    Some(grown)
}

fn add_edge<R: Rng>(nodes: &[GraphNode], mode: GraphMode, rng: &mut R) -> Option<Vec<GraphNode>> {
    let ranks = evaluation_ranks(nodes);
    let candidates: Vec<(usize, usize)> = nodes
        .iter()
        .filter(|t| t.kind() != NodeKind::Input)
        .flat_map(|t| {
            let ranks = &ranks;
            nodes
                .iter()
                .filter(move |s| {
                    !t.has_edge_from(s.index())
                        && (mode == GraphMode::Recurrent || ranks[s.index()] < ranks[t.index()])
                })
                .map(move |s| (s.index(), t.index()))
        })
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let (source, target) = candidates[rng.random_range(0..candidates.len())];
    let mut grown = nodes.to_vec();
    let mut incoming = grown[target].incoming().to_vec();
    incoming.push(Edge::new(source, rng.random_range(-1.0..1.0)));
    grown[target] = grown[target].with_incoming(incoming);
    Some(grown)
}

/// Mutates one node: vertices swap their op for another vertex function or
/// get an edge weight perturbed (equal odds); outputs only get a weight
/// perturbed. Returns `None` when nothing could change.
pub(crate) fn graph_operation<R: Rng>(
    node: &GraphNode,
    ops: Option<&OpSet>,
    weight_std: f64,
    rng: &mut R,
) -> Option<GraphNode> {
    let can_swap_op = node.kind() == NodeKind::Vertex
        && ops.is_some_and(|set| !set.functions().is_empty());
    let has_edges = !node.incoming().is_empty();

    match node.kind() {
        NodeKind::Input => None,
        _ if can_swap_op && (!has_edges || rng.random_bool(0.5)) => {
            let op = ops.map(|set| set.random_function(rng))?;
            Some(node.with_op(op))
        }
        _ if has_edges => {
            let k = rng.random_range(0..node.incoming().len());
            let mut incoming = node.incoming().to_vec();
            incoming[k].weight = perturb(incoming[k].weight, weight_std, rng);
            Some(node.with_incoming(incoming))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, GraphCodec};
    use crate::genome::Genotype;
    use crate::program::graph::is_valid_arena;
    use crate::random::create_rng;

    fn sample_tree() -> TreeNode {
        // (x0 + w) * x1
        TreeNode::new(
            Op::mul(),
            vec![
                TreeNode::new(
                    Op::add(),
                    vec![TreeNode::leaf(Op::var(0)), TreeNode::leaf(Op::weight(0.5))],
                ),
                TreeNode::leaf(Op::var(1)),
            ],
        )
    }

    #[test]
    fn test_hoist_never_grows() {
        let tree = sample_tree();
        let mut rng = create_rng(42);
        for _ in 0..50 {
            let hoisted = hoist(&tree, &mut rng);
            assert!(hoisted.size() <= tree.size());
            assert!(hoisted.is_valid());
        }
    }

    #[test]
    fn test_tree_crossover_respects_max_depth() {
        let ops = OpSet::arithmetic(2);
        let mut rng = create_rng(7);
        for _ in 0..100 {
            let a = TreeNode::grow(&ops, 4, &mut rng);
            let b = TreeNode::grow(&ops, 4, &mut rng);
            let (c1, c2) = tree_crossover(&a, &b, 4, &mut rng);
            assert!(c1.depth() <= 4 && c2.depth() <= 4);
            assert!(c1.is_valid() && c2.is_valid());
        }
    }

    #[test]
    fn test_tree_operation_keeps_arity() {
        let ops = OpSet::arithmetic(2);
        let tree = sample_tree();
        let mut rng = create_rng(3);
        let mut changed = false;
        for _ in 0..50 {
            let mutated = tree_operation(&tree, Some(&ops), 0.1, &mut rng);
            assert!(mutated.is_valid());
            assert_eq!(mutated.size(), tree.size());
            changed |= mutated != tree;
        }
        assert!(changed);
    }

    fn directed_nodes(seed: u64) -> Vec<GraphNode> {
        let codec = GraphCodec::directed(2, 1).unwrap();
        graph_nodes(&codec.encode(&mut create_rng(seed)).chromosomes()[0]).unwrap()
    }

    #[test]
    fn test_split_edge_keeps_directed_graph_acyclic() {
        let mut rng = create_rng(42);
        let mut nodes = directed_nodes(1);
        let ops = OpSet::activations();
        for _ in 0..20 {
            if let Some(grown) =
                graph_structure(&nodes, Some(&ops), GraphMode::Directed, 1.0, 1.0, &mut rng)
            {
                nodes = grown;
            }
            assert!(is_valid_arena(&nodes, GraphMode::Directed));
        }
        assert!(nodes.len() > 3, "vertices were added");
    }

    #[test]
    fn test_add_edge_in_recurrent_mode_may_create_cycles() {
        let codec = GraphCodec::recurrent(1, 1).unwrap();
        let genotype: Genotype = codec.encode(&mut create_rng(5));
        let mut nodes = graph_nodes(&genotype.chromosomes()[0]).unwrap();
        let mut rng = create_rng(9);
        for _ in 0..10 {
            if let Some(grown) = graph_structure(&nodes, None, GraphMode::Recurrent, 0.5, 1.0, &mut rng)
            {
                nodes = grown;
            }
        }
        assert!(is_valid_arena(&nodes, GraphMode::Recurrent));
        assert!(codec.validate(&Genotype::new(vec![graph_chromosome(nodes)])).is_ok());
    }

    #[test]
    fn test_graph_crossover_drops_invalid_edges() {
        let mut rng = create_rng(2);
        let a = directed_nodes(1);
        let grown = graph_structure(&a, None, GraphMode::Directed, 1.0, 0.0, &mut rng).unwrap();
        for seed in 0..20 {
            let mut rng = create_rng(seed);
            let (c1, c2) = graph_crossover(&a, &grown, GraphMode::Directed, &mut rng);
            // c1 has no vertex 3, so any edge from it must have been dropped
            assert!(is_valid_arena(&c1, GraphMode::Directed));
            assert!(is_valid_arena(&c2, GraphMode::Directed));
        }
    }

    #[test]
    fn test_graph_operation_skips_inputs() {
        let nodes = directed_nodes(4);
        let mut rng = create_rng(1);
        assert!(graph_operation(&nodes[0], None, 0.1, &mut rng).is_none());
        let output = graph_operation(&nodes[2], None, 0.5, &mut rng).unwrap();
        assert_eq!(output.op(), nodes[2].op());
        assert_ne!(output.incoming(), nodes[2].incoming());
    }
}
