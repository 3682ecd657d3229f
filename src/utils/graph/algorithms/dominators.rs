//! Dominator tree computation using the Lengauer-Tarjan algorithm.
//!
//! A node `d` **dominates** a node `n` if every path from the entry node to `n` passes through
//! `d`. The **immediate dominator** of `n` is the unique strict dominator of `n` that does not
//! strictly dominate any other dominator of `n`. Making every node's immediate dominator its
//! parent yields the dominator tree, rooted at the entry.
//!
//! SSA construction walks this tree to rename variables and uses the dominance frontiers
//! computed here to place phi nodes.
//!
//! Nodes that are not reachable from the entry have no immediate dominator and no frontier.

use std::collections::BTreeSet;

use crate::utils::graph::{NodeId, Predecessors, Successors};

/// Result of dominator tree computation.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// Immediate dominator per node; `None` for the entry and for unreachable nodes
    idom: Vec<Option<NodeId>>,
    /// Dominator tree children per node, in increasing node order
    children: Vec<Vec<NodeId>>,
    reachable: Vec<bool>,
}

impl DominatorTree {
    /// Immediate dominator of `node`, `None` for the entry and for unreachable nodes.
    fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom.get(node.index()).copied().flatten()
    }

    fn is_reachable(&self, node: NodeId) -> bool {
        self.reachable.get(node.index()).copied().unwrap_or(false)
    }

    /// Children of `node` in the dominator tree.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Computes the dominator tree of `graph` rooted at `entry`.
///
/// # Arguments
///
/// * `graph` - The graph to analyze
/// * `entry` - The root; must be a node of `graph`
pub fn compute_dominators<G>(graph: &G, entry: NodeId) -> DominatorTree
where
    G: Predecessors,
{
    let node_count = graph.node_count();
    if node_count == 0 {
        return DominatorTree {
            idom: Vec::new(),
            children: Vec::new(),
            reachable: Vec::new(),
        };
    }

    let mut lt = LengauerTarjan::new(node_count, entry);
    lt.compute(graph);

    let reachable: Vec<bool> = lt.dfnum.iter().map(|&n| n != 0).collect();
    let mut idom = vec![None; node_count];
    let mut children = vec![Vec::new(); node_count];
    for node in 0..node_count {
        if node != entry.index() && reachable[node] {
            let parent = lt.idom[node];
            idom[node] = Some(parent);
            children[parent.index()].push(NodeId::new(node));
        }
    }

    DominatorTree {
        idom,
        children,
        reachable,
    }
}

/// Lengauer-Tarjan state.
///
/// Uses "simple" eval/link with path compression, O(E log V).
struct LengauerTarjan {
    entry: NodeId,
    /// DFS preorder number, 1-based; 0 means unvisited
    dfnum: Vec<usize>,
    /// Node by preorder number - 1
    vertex: Vec<NodeId>,
    parent: Vec<NodeId>,
    semi: Vec<NodeId>,
    idom: Vec<NodeId>,
    ancestor: Vec<Option<NodeId>>,
    best: Vec<NodeId>,
    bucket: Vec<Vec<NodeId>>,
    dfs_counter: usize,
}

impl LengauerTarjan {
    fn new(n: usize, entry: NodeId) -> Self {
        Self {
            entry,
            dfnum: vec![0; n],
            vertex: Vec::with_capacity(n),
            parent: vec![entry; n],
            semi: (0..n).map(NodeId::new).collect(),
            idom: vec![entry; n],
            ancestor: vec![None; n],
            best: (0..n).map(NodeId::new).collect(),
            bucket: vec![Vec::new(); n],
            dfs_counter: 0,
        }
    }

    fn compute<G: Predecessors>(&mut self, graph: &G) {
        self.dfs(graph);

        for i in (1..self.dfs_counter).rev() {
            let w = self.vertex[i];
            let parent_w = self.parent[w.index()];

            // semi(w) = min over predecessors v of semi(eval(v))
            for v in graph.predecessors(w) {
                if self.dfnum[v.index()] == 0 {
                    continue;
                }
                let u = self.eval(v);
                if self.dfnum[self.semi[u.index()].index()]
                    < self.dfnum[self.semi[w.index()].index()]
                {
                    self.semi[w.index()] = self.semi[u.index()];
                }
            }

            let semi_w = self.semi[w.index()];
            self.bucket[semi_w.index()].push(w);
            self.ancestor[w.index()] = Some(parent_w);

            let bucket = std::mem::take(&mut self.bucket[parent_w.index()]);
            for v in bucket {
                let u = self.eval(v);
                self.idom[v.index()] = if self.semi[u.index()] == self.semi[v.index()] {
                    parent_w
                } else {
                    u
                };
            }
        }

        for i in 1..self.dfs_counter {
            let w = self.vertex[i];
            if self.idom[w.index()] != self.semi[w.index()] {
                self.idom[w.index()] = self.idom[self.idom[w.index()].index()];
            }
        }
        self.idom[self.entry.index()] = self.entry;
    }

    /// Iterative preorder DFS recording the spanning tree parent of each node.
    fn dfs<G: Successors>(&mut self, graph: &G) {
        let mut stack = vec![(self.entry, self.entry)];
        while let Some((node, parent)) = stack.pop() {
            if self.dfnum[node.index()] != 0 {
                continue;
            }
            self.dfs_counter += 1;
            self.dfnum[node.index()] = self.dfs_counter;
            self.vertex.push(node);
            self.parent[node.index()] = parent;

            let succs: Vec<NodeId> = graph.successors(node).collect();
            for &succ in succs.iter().rev() {
                if self.dfnum[succ.index()] == 0 {
                    stack.push((succ, node));
                }
            }
        }
    }

    fn eval(&mut self, v: NodeId) -> NodeId {
        if self.ancestor[v.index()].is_none() {
            return v;
        }
        self.compress(v);
        self.best[v.index()]
    }

    /// Path compression along the ancestor chain of `v`, deepest link first.
    fn compress(&mut self, v: NodeId) {
        let mut path = Vec::new();
        let mut current = v;
        while let Some(ancestor) = self.ancestor[current.index()] {
            if self.ancestor[ancestor.index()].is_none() {
                break;
            }
            path.push(current);
            current = ancestor;
        }

        for &node in path.iter().rev() {
            let Some(ancestor) = self.ancestor[node.index()] else {
                continue;
            };
            let best_ancestor = self.best[ancestor.index()];
            let best_node = self.best[node.index()];
            if self.dfnum[self.semi[best_ancestor.index()].index()]
                < self.dfnum[self.semi[best_node.index()].index()]
            {
                self.best[node.index()] = best_ancestor;
            }
            self.ancestor[node.index()] = self.ancestor[ancestor.index()];
        }
    }
}

/// Computes the dominance frontier of every node.
///
/// The frontier of `n` is the set of nodes `m` such that `n` dominates a predecessor of `m` but
/// does not strictly dominate `m`. Unreachable predecessors are ignored.
///
/// Uses the Cooper-Harvey-Kennedy runner formulation over join points.
pub fn compute_dominance_frontiers<G>(graph: &G, dom_tree: &DominatorTree) -> Vec<BTreeSet<NodeId>>
where
    G: Predecessors,
{
    let n = graph.node_count();
    let mut frontiers: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); n];

    for node_idx in 0..n {
        let node = NodeId::new(node_idx);
        if !dom_tree.is_reachable(node) {
            continue;
        }
        let preds: Vec<NodeId> = graph
            .predecessors(node)
            .filter(|&p| dom_tree.is_reachable(p))
            .collect();
        if preds.len() < 2 {
            continue;
        }

        let idom_node = dom_tree.immediate_dominator(node);
        for pred in preds {
            let mut runner = Some(pred);
            while let Some(r) = runner {
                if Some(r) == idom_node {
                    break;
                }
                frontiers[r.index()].insert(node);
                runner = dom_tree.immediate_dominator(r);
            }
        }
    }

    frontiers
}

/// Iterated dominance frontier of a set of nodes.
///
/// This is where phi nodes are needed for a variable defined in `defs`.
#[must_use]
pub fn iterated_dominance_frontier(
    frontiers: &[BTreeSet<NodeId>],
    defs: impl IntoIterator<Item = NodeId>,
) -> BTreeSet<NodeId> {
    let mut result = BTreeSet::new();
    let mut worklist: Vec<NodeId> = defs.into_iter().collect();
    let mut queued: BTreeSet<NodeId> = worklist.iter().copied().collect();

    while let Some(node) = worklist.pop() {
        let Some(frontier) = frontiers.get(node.index()) else {
            continue;
        };
        for &df in frontier {
            if result.insert(df) && queued.insert(df) {
                worklist.push(df);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use crate::{
        test::AdjacencyGraph,
        utils::graph::{
            algorithms::dominators::{
                compute_dominance_frontiers, compute_dominators, iterated_dominance_frontier,
            },
            NodeId,
        },
    };

    fn n(i: usize) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn test_dominators_diamond() {
        //     0
        //    / \
        //   1   2
        //    \ /
        //     3
        let graph = AdjacencyGraph::new(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let dom = compute_dominators(&graph, n(0));

        assert_eq!(dom.immediate_dominator(n(0)), None);
        assert_eq!(dom.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(dom.immediate_dominator(n(2)), Some(n(0)));
        assert_eq!(dom.immediate_dominator(n(3)), Some(n(0)));
        assert_eq!(dom.children(n(0)), &[n(1), n(2), n(3)]);
        assert!(dom.children(n(1)).is_empty());
    }

    #[test]
    fn test_dominators_loop() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3
        let graph = AdjacencyGraph::new(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let dom = compute_dominators(&graph, n(0));

        assert_eq!(dom.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(dom.immediate_dominator(n(2)), Some(n(1)));
        assert_eq!(dom.immediate_dominator(n(3)), Some(n(2)));
        assert_eq!(dom.children(n(1)), &[n(2)]);
    }

    #[test]
    fn test_dominators_unreachable_node() {
        // 2 has an edge into the graph but cannot be reached
        let graph = AdjacencyGraph::new(3, &[(0, 1), (2, 1)]);
        let dom = compute_dominators(&graph, n(0));

        assert!(!dom.is_reachable(n(2)));
        assert_eq!(dom.immediate_dominator(n(2)), None);
        assert_eq!(dom.immediate_dominator(n(1)), Some(n(0)));
        assert!(!dom.children(n(0)).contains(&n(2)));
    }

    #[test]
    fn test_dominators_non_trivial_semidominator() {
        // Classic case where idom differs from the DFS parent:
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3, 3 -> 4, 1 -> 4
        let graph = AdjacencyGraph::new(5, &[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4), (1, 4)]);
        let dom = compute_dominators(&graph, n(0));

        assert_eq!(dom.immediate_dominator(n(3)), Some(n(0)));
        assert_eq!(dom.immediate_dominator(n(4)), Some(n(0)));
    }

    #[test]
    fn test_frontiers_diamond_and_loop() {
        let diamond = AdjacencyGraph::new(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let dom = compute_dominators(&diamond, n(0));
        let df = compute_dominance_frontiers(&diamond, &dom);
        assert!(df[0].is_empty());
        assert_eq!(df[1].iter().copied().collect::<Vec<_>>(), vec![n(3)]);
        assert_eq!(df[2].iter().copied().collect::<Vec<_>>(), vec![n(3)]);

        let looped = AdjacencyGraph::new(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let dom = compute_dominators(&looped, n(0));
        let df = compute_dominance_frontiers(&looped, &dom);
        assert_eq!(df[2].iter().copied().collect::<Vec<_>>(), vec![n(1)]);
        assert_eq!(df[1].iter().copied().collect::<Vec<_>>(), vec![n(1)]);
    }

    #[test]
    fn test_iterated_frontier() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3; a definition in 2 needs a phi at 1
        let graph = AdjacencyGraph::new(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let dom = compute_dominators(&graph, n(0));
        let df = compute_dominance_frontiers(&graph, &dom);
        let idf = iterated_dominance_frontier(&df, [n(2)]);
        assert_eq!(idf.into_iter().collect::<Vec<_>>(), vec![n(1)]);
    }

    #[test]
    fn test_dominators_long_loop() {
        // 0 -> 1 -> ... -> len-1 -> 1, the back edge forces a full ancestor chain walk
        let len = 100_000;
        let mut edges: Vec<(usize, usize)> = (0..len - 1).map(|i| (i, i + 1)).collect();
        edges.push((len - 1, 1));
        let graph = AdjacencyGraph::new(len, &edges);
        let dom = compute_dominators(&graph, n(0));
        assert_eq!(dom.immediate_dominator(n(len - 1)), Some(n(len - 2)));
        assert_eq!(dom.children(n(1)), &[n(2)]);

        let df = compute_dominance_frontiers(&graph, &dom);
        let idf = iterated_dominance_frontier(&df, [n(len - 1)]);
        assert_eq!(idf.into_iter().collect::<Vec<_>>(), vec![n(1)]);
    }
}
