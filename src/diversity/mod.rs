//! Genotype distance measures and speciation.
//!
//! # Distances
//!
//! | Measure | Genes | Definition |
//! |---------|-------|------------|
//! | Hamming | any but graph | fraction of differing positions |
//! | Euclidean | float / int / bit | `sqrt(sum (a_i - b_i)^2)` |
//! | Cosine | float / int / bit | `1 - cos(a, b)` |
//! | NEAT | graph | `c1*E/N + c2*D/N + c3*W` |
//!
//! # References
//!
//! - Stanley & Miikkulainen (2002), "Evolving Neural Networks through
//!   Augmenting Topologies"

pub mod speciation;

pub use speciation::{Speciation, SpeciesTracker, StagnationPolicy};

use crate::error::{EvolveError, Result};
use crate::genome::{Gene, GeneType, Genotype};
use std::collections::BTreeMap;

/// Genotype distance. Non-negative and symmetric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Diversity {
    Hamming,
    Euclidean,
    Cosine,
    /// NEAT compatibility distance with coefficients for excess genes,
    /// disjoint genes and mean weight difference.
    Neat {
        excess: f64,
        disjoint: f64,
        weight: f64,
    },
}

impl Diversity {
    /// NEAT distance with the usual coefficients (1.0, 1.0, 0.4).
    pub fn neat() -> Self {
        Diversity::Neat {
            excess: 1.0,
            disjoint: 1.0,
            weight: 0.4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Diversity::Hamming => "hamming",
            Diversity::Euclidean => "euclidean",
            Diversity::Cosine => "cosine",
            Diversity::Neat { .. } => "neat",
        }
    }

    pub fn supports(&self, gene_type: GeneType) -> bool {
        match self {
            Diversity::Hamming => gene_type != GeneType::Graph,
            Diversity::Euclidean | Diversity::Cosine => {
                gene_type.is_numeric() || gene_type == GeneType::Bit
            }
            Diversity::Neat { .. } => gene_type == GeneType::Graph,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Diversity::Neat {
            excess,
            disjoint,
            weight,
        } = *self
        {
            if [excess, disjoint, weight]
                .iter()
                .any(|c| !(c.is_finite() && *c >= 0.0))
            {
                return Err(EvolveError::config(
                    "neat coefficients must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }

    pub fn distance(&self, a: &Genotype, b: &Genotype) -> f64 {
        match *self {
            Diversity::Hamming => hamming(a, b),
            Diversity::Euclidean => {
                let (x, y) = numeric_vectors(a, b);
                x.iter()
                    .zip(&y)
                    .map(|(p, q)| (p - q).powi(2))
                    .sum::<f64>()
                    .sqrt()
            }
            Diversity::Cosine => {
                let (x, y) = numeric_vectors(a, b);
                let dot: f64 = x.iter().zip(&y).map(|(p, q)| p * q).sum();
                let norm_x = x.iter().map(|v| v * v).sum::<f64>().sqrt();
                let norm_y = y.iter().map(|v| v * v).sum::<f64>().sqrt();
                match (norm_x == 0.0, norm_y == 0.0) {
                    (true, true) => 0.0,
                    (true, false) | (false, true) => 1.0,
                    _ => (1.0 - dot / (norm_x * norm_y)).clamp(0.0, 2.0),
                }
            }
            Diversity::Neat {
                excess,
                disjoint,
                weight,
            } => neat(a, b, excess, disjoint, weight),
        }
    }
}

fn hamming(a: &Genotype, b: &Genotype) -> f64 {
    let la = a.gene_count();
    let lb = b.gene_count();
    let longest = la.max(lb);
    if longest == 0 {
        return 0.0;
    }
    let differing = a.genes().zip(b.genes()).filter(|(x, y)| x != y).count();
    (differing + longest - la.min(lb)) as f64 / longest as f64
}

/// Numeric views padded with zeros to a common length.
fn numeric_vectors(a: &Genotype, b: &Genotype) -> (Vec<f64>, Vec<f64>) {
    let mut x: Vec<f64> = a.genes().filter_map(Gene::as_f64).collect();
    let mut y: Vec<f64> = b.genes().filter_map(Gene::as_f64).collect();
    let n = x.len().max(y.len());
    x.resize(n, 0.0);
    y.resize(n, 0.0);
    (x, y)
}

/// Structural genes of a graph genotype, ordered by key.
#[derive(Default)]
struct Structure {
    nodes: BTreeMap<usize, ()>,
    edges: BTreeMap<(usize, usize), f64>,
}

impl Structure {
    fn of(genotype: &Genotype) -> Self {
        let mut s = Structure::default();
        for gene in genotype.genes() {
            if let Gene::Graph(node) = gene {
                s.nodes.insert(node.index(), ());
                for edge in node.incoming() {
                    s.edges.insert((edge.source, node.index()), edge.weight);
                }
            }
        }
        s
    }

    fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }
}

/// Excess and disjoint counts of two key sets: keys beyond the other
/// side's largest key are excess, other unmatched keys are disjoint.
fn mismatch<K: Ord + Copy, V>(a: &BTreeMap<K, V>, b: &BTreeMap<K, V>) -> (usize, usize) {
    let max_a = a.keys().next_back().copied();
    let max_b = b.keys().next_back().copied();
    let mut excess = 0;
    let mut disjoint = 0;
    let mut count = |key: &K, other: &BTreeMap<K, V>, other_max: Option<K>| {
        if !other.contains_key(key) {
            if other_max.map_or(true, |m| *key > m) {
                excess += 1;
            } else {
                disjoint += 1;
            }
        }
    };
    a.keys().for_each(|k| count(k, b, max_b));
    b.keys().for_each(|k| count(k, a, max_a));
    (excess, disjoint)
}

fn neat(a: &Genotype, b: &Genotype, c_excess: f64, c_disjoint: f64, c_weight: f64) -> f64 {
    let sa = Structure::of(a);
    let sb = Structure::of(b);

    let (node_excess, node_disjoint) = mismatch(&sa.nodes, &sb.nodes);
    let (edge_excess, edge_disjoint) = mismatch(&sa.edges, &sb.edges);
    let excess = (node_excess + edge_excess) as f64;
    let disjoint = (node_disjoint + edge_disjoint) as f64;

    let diffs: Vec<f64> = sa
        .edges
        .iter()
        .filter_map(|(key, wa)| sb.edges.get(key).map(|wb| (wa - wb).abs()))
        .collect();
    let mean_weight_diff = if diffs.is_empty() {
        0.0
    } else {
        diffs.iter().sum::<f64>() / diffs.len() as f64
    };

    let largest = sa.len().max(sb.len());
    let n = if largest < 20 { 1.0 } else { largest as f64 };
    c_excess * excess / n + c_disjoint * disjoint / n + c_weight * mean_weight_diff
}
