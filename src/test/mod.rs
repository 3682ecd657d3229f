//! Helpers shared by the unit tests.

use crate::{
    mir::{BaseNode, LabelIdx, MirFunction, Opcode, PrimType, StIdx, StmtNode, SymbolTable},
    utils::graph::{NodeId, Predecessors, Successors},
};

/// Plain adjacency-list graph for exercising the graph algorithms.
pub struct AdjacencyGraph {
    succs: Vec<Vec<NodeId>>,
    preds: Vec<Vec<NodeId>>,
}

impl AdjacencyGraph {
    /// Builds a graph with `n` nodes and the given `(from, to)` edges.
    pub fn new(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut succs = vec![Vec::new(); n];
        let mut preds = vec![Vec::new(); n];
        for &(from, to) in edges {
            succs[from].push(NodeId::new(to));
            preds[to].push(NodeId::new(from));
        }
        AdjacencyGraph { succs, preds }
    }
}

impl Successors for AdjacencyGraph {
    fn node_count(&self) -> usize {
        self.succs.len()
    }

    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.succs[node.index()].iter().copied()
    }
}

impl Predecessors for AdjacencyGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.preds[node.index()].iter().copied()
    }
}

/// The variables of [`diamond_function`].
pub struct DiamondVars {
    /// Condition, a formal
    pub c: StIdx,
    /// Assigned on both arms
    pub x: StIdx,
    /// Assigned on the `then` arm only
    pub y: StIdx,
}

/// ```text
/// entry:  brfalse c, @L1
///         x = 1; y = 5; goto @L2
/// @L1:    x = 2
/// @L2:    return x
/// ```
pub fn diamond_function() -> (MirFunction, DiamondVars) {
    let mut symbols = SymbolTable::new();
    let c = symbols.declare_formal("c", PrimType::I32);
    let x = symbols.declare_local("x", PrimType::I32);
    let y = symbols.declare_local("y", PrimType::I32);
    let l1 = LabelIdx::new(1);
    let l2 = LabelIdx::new(2);

    let body = vec![
        StmtNode::cond_goto(Opcode::Brfalse, BaseNode::dread(PrimType::I32, c), l1),
        StmtNode::dassign(x, BaseNode::int(PrimType::I32, 1)),
        StmtNode::dassign(y, BaseNode::int(PrimType::I32, 5)),
        StmtNode::goto(l2),
        StmtNode::label(l1),
        StmtNode::dassign(x, BaseNode::int(PrimType::I32, 2)),
        StmtNode::label(l2),
        StmtNode::ret(vec![BaseNode::dread(PrimType::I32, x)]),
    ];
    (MirFunction::new("diamond", symbols, body), DiamondVars { c, x, y })
}

/// ```text
/// entry:  i = 0
/// @L1:    i = i + 1
///         brtrue i < n, @L1
///         return i
/// ```
pub fn counting_loop() -> (MirFunction, StIdx) {
    let mut symbols = SymbolTable::new();
    let n = symbols.declare_formal("n", PrimType::I32);
    let i = symbols.declare_local("i", PrimType::I32);
    let head = LabelIdx::new(1);

    let body = vec![
        StmtNode::dassign(i, BaseNode::int(PrimType::I32, 0)),
        StmtNode::label(head),
        StmtNode::dassign(
            i,
            BaseNode::operator(
                Opcode::Add,
                PrimType::I32,
                vec![BaseNode::dread(PrimType::I32, i), BaseNode::int(PrimType::I32, 1)],
            ),
        ),
        StmtNode::cond_goto(
            Opcode::Brtrue,
            BaseNode::operator(
                Opcode::Lt,
                PrimType::U1,
                vec![BaseNode::dread(PrimType::I32, i), BaseNode::dread(PrimType::I32, n)],
            ),
            head,
        ),
        StmtNode::ret(vec![BaseNode::dread(PrimType::I32, i)]),
    ];
    (MirFunction::new("counting_loop", symbols, body), i)
}
