//! Strongly Connected Components (SCC) using Tarjan's algorithm.
//!
//! A strongly connected component is a maximal set of nodes such that there is a path from every
//! node to every other node in the set. On a control flow graph the non-trivial components are the
//! loops, which is what the basic block SCC overlay is built from.

use crate::utils::graph::{NodeId, Successors};

/// Computes the strongly connected components of a directed graph.
///
/// Uses Tarjan's algorithm with a single DFS pass. Every node ends up in exactly one component,
/// including nodes unreachable from node `0`.
///
/// # Returns
///
/// The components in **reverse topological order**: if there is an edge from component A to
/// component B, A appears after B.
///
/// # Complexity
///
/// - Time: O(V + E)
/// - Space: O(V)
pub fn strongly_connected_components<G>(graph: &G) -> Vec<Vec<NodeId>>
where
    G: Successors,
{
    let node_count = graph.node_count();
    let mut state = TarjanState::new(node_count);

    for i in 0..node_count {
        if state.index[i].is_none() {
            state.strongconnect(graph, NodeId::new(i));
        }
    }

    state.sccs
}

/// Internal state for Tarjan's algorithm.
struct TarjanState {
    /// Discovery index for each node (None if not yet visited)
    index: Vec<Option<usize>>,
    /// Lowlink value for each node
    lowlink: Vec<usize>,
    /// Whether a node is currently on the stack
    on_stack: Vec<bool>,
    stack: Vec<NodeId>,
    current_index: usize,
    sccs: Vec<Vec<NodeId>>,
}

/// A node whose successors are still being walked.
struct Frame {
    node: NodeId,
    index: usize,
    succs: std::vec::IntoIter<NodeId>,
}

impl TarjanState {
    fn new(n: usize) -> Self {
        Self {
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            current_index: 0,
            sccs: Vec::new(),
        }
    }

    fn visit<G: Successors>(&mut self, graph: &G, v: NodeId) -> Frame {
        let v_index = self.current_index;
        self.index[v.index()] = Some(v_index);
        self.lowlink[v.index()] = v_index;
        self.current_index += 1;
        self.stack.push(v);
        self.on_stack[v.index()] = true;

        let succs: Vec<NodeId> = graph.successors(v).collect();
        Frame {
            node: v,
            index: v_index,
            succs: succs.into_iter(),
        }
    }

    /// Depth-first walk from `root` on an explicit frame stack.
    fn strongconnect<G: Successors>(&mut self, graph: &G, root: NodeId) {
        let mut frames = vec![self.visit(graph, root)];

        while let Some(frame) = frames.last_mut() {
            let v_idx = frame.node.index();
            if let Some(w) = frame.succs.next() {
                let w_idx = w.index();
                match self.index[w_idx] {
                    None => {
                        let child = self.visit(graph, w);
                        frames.push(child);
                    }
                    Some(w_index) if self.on_stack[w_idx] => {
                        self.lowlink[v_idx] = self.lowlink[v_idx].min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            let (v, v_index) = (frame.node, frame.index);
            frames.pop();
            if let Some(parent) = frames.last() {
                let p_idx = parent.node.index();
                self.lowlink[p_idx] = self.lowlink[p_idx].min(self.lowlink[v_idx]);
            }

            // v is the root of a component: pop it off the stack
            if self.lowlink[v_idx] == v_index {
                let mut scc = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w.index()] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                self.sccs.push(scc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::{
        test::AdjacencyGraph,
        utils::graph::{algorithms::scc::strongly_connected_components, NodeId},
    };

    #[test]
    fn test_scc_empty_graph() {
        let graph = AdjacencyGraph::new(0, &[]);
        assert!(strongly_connected_components(&graph).is_empty());
    }

    #[test]
    fn test_scc_single_node_self_loop() {
        let graph = AdjacencyGraph::new(1, &[(0, 0)]);
        let sccs = strongly_connected_components(&graph);
        assert_eq!(sccs, vec![vec![NodeId::new(0)]]);
    }

    #[test]
    fn test_scc_linear_chain() {
        // 0 -> 1 -> 2
        let graph = AdjacencyGraph::new(3, &[(0, 1), (1, 2)]);
        let sccs = strongly_connected_components(&graph);

        // Reverse topological order: 2, 1, 0
        let scc_nodes: Vec<NodeId> = sccs.iter().map(|scc| scc[0]).collect();
        assert_eq!(
            scc_nodes,
            vec![NodeId::new(2), NodeId::new(1), NodeId::new(0)]
        );
    }

    #[test]
    fn test_scc_loop_with_exit() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3
        let graph = AdjacencyGraph::new(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let sccs = strongly_connected_components(&graph);
        assert_eq!(sccs.len(), 3);

        let loop_scc: HashSet<NodeId> = sccs
            .iter()
            .find(|scc| scc.len() == 2)
            .expect("loop component")
            .iter()
            .copied()
            .collect();
        assert!(loop_scc.contains(&NodeId::new(1)));
        assert!(loop_scc.contains(&NodeId::new(2)));
    }

    #[test]
    fn test_scc_unreachable_nodes_covered() {
        // 1 is not reachable from 0
        let graph = AdjacencyGraph::new(3, &[(0, 2), (1, 2)]);
        let sccs = strongly_connected_components(&graph);
        let total: usize = sccs.iter().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_scc_long_cycle() {
        // 0 -> 1 -> ... -> n-1 -> 0, deeper than any call stack would allow
        let n = 200_000;
        let edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        let graph = AdjacencyGraph::new(n, &edges);
        let sccs = strongly_connected_components(&graph);
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), n);
    }

    #[test]
    fn test_scc_long_chain_order() {
        let n = 100_000;
        let edges: Vec<(usize, usize)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let graph = AdjacencyGraph::new(n, &edges);
        let sccs = strongly_connected_components(&graph);
        assert_eq!(sccs.len(), n);
        assert_eq!(sccs[0], vec![NodeId::new(n - 1)]);
        assert_eq!(sccs[n - 1], vec![NodeId::new(0)]);
    }
}
