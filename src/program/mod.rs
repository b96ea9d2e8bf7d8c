//! Executable program structures: expression trees and computation graphs.
//!
//! Both are built from the same [`Op`] vocabulary. Trees evaluate
//! bottom-up and are stateless; graphs keep per-node state so recurrent edges
//! can read the previous step.

pub mod graph;
pub mod op;
pub mod tree;

pub use graph::{Edge, Graph, GraphMode, GraphNode, NodeKind};
pub use op::{Arity, Op, OpSet};
pub use tree::{Tree, TreeNode};
