//! Graph abstractions and algorithms.
//!
//! The algorithms in [`algorithms`] are written against the small traits in this module rather
//! than a concrete graph type, so the basic block graph can be analyzed in place without copying
//! it into an adjacency structure first.

pub mod algorithms;
mod node;

pub use node::NodeId;

/// A directed graph whose nodes are the dense indices `0..node_count()`.
pub trait Successors {
    /// Number of nodes.
    fn node_count(&self) -> usize;

    /// Successors of `node`, in edge order.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_;
}

/// A directed graph that can also enumerate incoming edges.
pub trait Predecessors: Successors {
    /// Predecessors of `node`, in edge order.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_;
}
