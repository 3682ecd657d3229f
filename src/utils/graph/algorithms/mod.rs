//! Graph algorithms for control flow analysis.
//!
//! ## Dominator Analysis
//!
//! - [`compute_dominators`] - Compute the dominator tree using Lengauer-Tarjan
//! - [`compute_dominance_frontiers`] - Compute dominance frontiers for SSA
//! - [`iterated_dominance_frontier`] - Phi placement sets
//! - [`DominatorTree`] - Result of dominator computation
//!
//! ## Strongly Connected Components
//!
//! - [`strongly_connected_components`] - Tarjan's SCC algorithm
//!
//! | Algorithm | Time Complexity | Use Case |
//! |-----------|-----------------|----------|
//! | Dominators | O(E log V) | SSA construction |
//! | Frontiers | O(V + E) per join depth | Phi placement |
//! | SCC | O(V + E) | Loop detection, SCC overlay |

mod dominators;
mod scc;

pub use dominators::{
    compute_dominance_frontiers, compute_dominators, iterated_dominance_frontier, DominatorTree,
};
pub use scc::strongly_connected_components;
