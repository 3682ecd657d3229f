//! The basic block graph of one function.
//!
//! [`MeCfg`] owns the blocks and is the only place where edge lists change. Every operation
//! keeps `A ∈ pred(B) ⇔ B ∈ succ(A)`; asking to remove an edge that does not exist is a
//! contract violation and aborts.
//!
//! Edge operations here are purely structural. Phi operands are positional, so the operations
//! that shift a predecessor list report the removed position; [`super::MeFunction`] wraps them
//! and keeps the phi tables aligned.

use crate::{
    me::{remove_bb_from_vector, BasicBlock, BbAttr, BbId, BbKind},
    utils::{
        graph::{NodeId, Predecessors, Successors},
        Arena, BitSet,
    },
};

/// Blocks and edges of a function, plus the block layout order used when emitting.
#[derive(Debug, Clone, Default)]
pub struct MeCfg {
    blocks: Arena<BasicBlock, BbId>,
    layout: Vec<BbId>,
    entry: Option<BbId>,
}

impl MeCfg {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new block to the layout.
    pub fn create_bb(&mut self) -> BbId {
        let id = self.blocks.alloc_with(BasicBlock::new);
        self.layout.push(id);
        id
    }

    /// Creates a new block placed right after `after` in the layout.
    pub fn create_bb_after(&mut self, after: BbId) -> BbId {
        let id = self.blocks.alloc_with(BasicBlock::new);
        let pos = self.layout_position(after);
        self.layout.insert(pos + 1, id);
        id
    }

    /// Creates a new block placed right before `before` in the layout.
    pub fn create_bb_before(&mut self, before: BbId) -> BbId {
        let id = self.blocks.alloc_with(BasicBlock::new);
        let pos = self.layout_position(before);
        self.layout.insert(pos, id);
        id
    }

    fn layout_position(&self, bb: BbId) -> usize {
        match self.layout.iter().position(|&b| b == bb) {
            Some(pos) => pos,
            None => fatal!("{} is not in the block layout", bb),
        }
    }

    /// Entry block.
    #[must_use]
    pub fn entry(&self) -> BbId {
        match self.entry {
            Some(entry) => entry,
            None => fatal!("cfg has no entry block"),
        }
    }

    /// Entry block, if one was set.
    #[must_use]
    pub fn try_entry(&self) -> Option<BbId> {
        self.entry
    }

    /// Makes `bb` the entry block.
    pub fn set_entry(&mut self, bb: BbId) {
        if let Some(old) = self.entry {
            self.blocks[old].attrs.remove(BbAttr::IS_ENTRY);
        }
        self.blocks[bb].attrs.insert(BbAttr::IS_ENTRY);
        self.entry = Some(bb);
    }

    /// Block at `id`.
    #[must_use]
    pub fn bb(&self, id: BbId) -> &BasicBlock {
        &self.blocks[id]
    }

    /// Mutable block at `id`.
    pub fn bb_mut(&mut self, id: BbId) -> &mut BasicBlock {
        &mut self.blocks[id]
    }

    /// Number of blocks ever created, removed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if no block was created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Live blocks in layout order.
    #[must_use]
    pub fn layout(&self) -> &[BbId] {
        &self.layout
    }

    /// Every block ever created, by id.
    pub fn all_bbs(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter().map(|(_, bb)| bb)
    }

    /// Live blocks in layout order.
    pub fn bbs(&self) -> impl Iterator<Item = &BasicBlock> {
        self.layout.iter().map(|&id| &self.blocks[id])
    }

    /// Live blocks flagged [`BbAttr::IS_EXIT`].
    #[must_use]
    pub fn exits(&self) -> Vec<BbId> {
        self.bbs()
            .filter(|bb| bb.has_attr(BbAttr::IS_EXIT))
            .map(BasicBlock::id)
            .collect()
    }

    /// Adds the edge `from -> to` on both sides. Parallel edges are allowed.
    pub fn add_edge(&mut self, from: BbId, to: BbId) {
        check_fatal!(
            !self.blocks[from].deleted && !self.blocks[to].deleted,
            "edge {} -> {} touches a removed block",
            from,
            to
        );
        self.blocks[from].succ.push(to);
        self.blocks[to].pred.push(from);
    }

    /// Adds `pred` as the last predecessor of `bb`.
    pub fn add_pred(&mut self, bb: BbId, pred: BbId) {
        self.add_edge(pred, bb);
    }

    /// Adds `succ` as the last successor of `bb`.
    pub fn add_succ(&mut self, bb: BbId, succ: BbId) {
        self.add_edge(bb, succ);
    }

    /// Replaces predecessor `old` of `bb` with `new`, keeping its position in `bb`'s list.
    ///
    /// `old` loses `bb` as successor; `new` gains it as its last successor.
    pub fn replace_pred(&mut self, bb: BbId, old: BbId, new: BbId) {
        let Some(pos) = self.blocks[bb].pred_index(old) else {
            fatal!("{} is not a predecessor of {}", old, bb);
        };
        if remove_bb_from_vector(&mut self.blocks[old].succ, bb).is_none() {
            fatal!("{} is not a successor of {}", bb, old);
        }
        self.blocks[bb].pred[pos] = new;
        self.blocks[new].succ.push(bb);
    }

    /// Replaces successor `old` of `bb` with `new`, keeping its position in `bb`'s list.
    ///
    /// `old` loses `bb` as predecessor; `new` gains it as its last predecessor. Returns the
    /// position `bb` had in `old`'s predecessor list.
    pub fn replace_succ(&mut self, bb: BbId, old: BbId, new: BbId) -> usize {
        let Some(pos) = self.blocks[bb].succ_index(old) else {
            fatal!("{} is not a successor of {}", old, bb);
        };
        let Some(removed) = remove_bb_from_vector(&mut self.blocks[old].pred, bb) else {
            fatal!("{} is not a predecessor of {}", bb, old);
        };
        self.blocks[bb].succ[pos] = new;
        self.blocks[new].pred.push(bb);
        removed
    }

    /// Removes the edge `pred -> bb`, returning the position `pred` had in `bb`'s predecessors.
    pub fn remove_pred(&mut self, bb: BbId, pred: BbId) -> usize {
        if remove_bb_from_vector(&mut self.blocks[pred].succ, bb).is_none() {
            fatal!("{} is not a successor of {}", bb, pred);
        }
        match remove_bb_from_vector(&mut self.blocks[bb].pred, pred) {
            Some(pos) => pos,
            None => fatal!("{} is not a predecessor of {}", pred, bb),
        }
    }

    /// Removes the edge `bb -> succ`, returning the position `bb` had in `succ`'s predecessors.
    pub fn remove_succ(&mut self, bb: BbId, succ: BbId) -> usize {
        let pos = match remove_bb_from_vector(&mut self.blocks[succ].pred, bb) {
            Some(pos) => pos,
            None => fatal!("{} is not a predecessor of {}", bb, succ),
        };
        if remove_bb_from_vector(&mut self.blocks[bb].succ, succ).is_none() {
            fatal!("{} is not a successor of {}", succ, bb);
        }
        pos
    }

    /// Returns `true` if `candidate` is a predecessor of `bb`.
    #[must_use]
    pub fn is_pred_bb(&self, bb: BbId, candidate: BbId) -> bool {
        self.blocks[bb].pred.contains(&candidate)
    }

    /// Returns `true` if `candidate` is a successor of `bb`.
    #[must_use]
    pub fn is_succ_bb(&self, bb: BbId, candidate: BbId) -> bool {
        self.blocks[bb].succ.contains(&candidate)
    }

    /// Detaches `bb` from every neighbour and marks it removed.
    ///
    /// Returns, for every edge to a former successor, that successor and the position `bb` had
    /// in its predecessor list, in removal order.
    pub fn remove_bb(&mut self, bb: BbId) -> Vec<(BbId, usize)> {
        check_fatal!(
            self.entry != Some(bb),
            "entry block {} cannot be removed",
            bb
        );
        while let Some(&pred) = self.blocks[bb].pred.last() {
            self.remove_pred(bb, pred);
        }
        let mut removed = Vec::new();
        while let Some(&succ) = self.blocks[bb].succ.first() {
            removed.push((succ, self.remove_succ(bb, succ)));
        }

        let block = &mut self.blocks[bb];
        block.deleted = true;
        block.kind = BbKind::Invalid;
        block.first = None;
        block.last = None;
        block.phi_list.clear();
        block.var_phis.clear();
        block.reg_phis.clear();
        self.layout.retain(|&b| b != bb);
        removed
    }

    /// Splits `bb` into a head and a new tail block placed after it.
    ///
    /// The tail takes over every successor edge (keeping `bb`'s position in each successor's
    /// predecessor list) together with the block kind and the region flags. The head falls
    /// through into the tail. Statements are not moved.
    pub fn split_bb(&mut self, bb: BbId) -> BbId {
        let tail = self.create_bb_after(bb);

        let succs = std::mem::take(&mut self.blocks[bb].succ);
        for &succ in &succs {
            for slot in self.blocks[succ].pred.iter_mut() {
                if *slot == bb {
                    *slot = tail;
                }
            }
        }
        self.blocks[tail].succ = succs;

        let head = &self.blocks[bb];
        let (kind, frequency, attrs) = (head.kind, head.frequency, head.attrs);
        let tail_block = &mut self.blocks[tail];
        tail_block.kind = kind;
        tail_block.frequency = frequency;
        tail_block.copy_split_flags(attrs);

        let head_block = &mut self.blocks[bb];
        head_block.kind = BbKind::Fallthru;
        head_block
            .attrs
            .remove(BbAttr::IS_EXIT | BbAttr::IS_TRY_END);

        self.add_edge(bb, tail);
        log::trace!("split {} at its end, tail {}", bb, tail);
        tail
    }

    /// Flood fill over successor edges from the entry, marking reached blocks in `visited`.
    pub fn find_reachable_bbs(&self, visited: &mut BitSet) {
        check_fatal!(
            visited.len() >= self.blocks.len(),
            "visited set holds {} blocks, graph has {}",
            visited.len(),
            self.blocks.len()
        );
        let mut worklist = vec![self.entry()];
        while let Some(bb) = worklist.pop() {
            if !visited.insert(bb.index()) {
                continue;
            }
            worklist.extend(
                self.blocks[bb]
                    .succ
                    .iter()
                    .copied()
                    .filter(|s| !visited.contains(s.index())),
            );
        }
    }

    /// Flood fill over predecessor edges from every exit block, marking blocks that can reach an
    /// exit in `visited`.
    pub fn find_will_exit_bbs(&self, visited: &mut BitSet) {
        check_fatal!(
            visited.len() >= self.blocks.len(),
            "visited set holds {} blocks, graph has {}",
            visited.len(),
            self.blocks.len()
        );
        let mut worklist = self.exits();
        while let Some(bb) = worklist.pop() {
            if !visited.insert(bb.index()) {
                continue;
            }
            worklist.extend(
                self.blocks[bb]
                    .pred
                    .iter()
                    .copied()
                    .filter(|p| !visited.contains(p.index())),
            );
        }
    }
}

fn node(bb: BbId) -> NodeId {
    NodeId::new(bb.index())
}

impl Successors for MeCfg {
    fn node_count(&self) -> usize {
        self.blocks.len()
    }

    fn successors(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.blocks[BbId::new(n.index() as u32)]
            .succ
            .iter()
            .map(|&s| node(s))
    }
}

impl Predecessors for MeCfg {
    fn predecessors(&self, n: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.blocks[BbId::new(n.index() as u32)]
            .pred
            .iter()
            .map(|&p| node(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_symmetric(cfg: &MeCfg) {
        for bb in cfg.all_bbs() {
            for &s in bb.succs() {
                assert!(cfg.is_pred_bb(s, bb.id()), "{} -> {} missing pred", bb.id(), s);
            }
            for &p in bb.preds() {
                assert!(cfg.is_succ_bb(p, bb.id()), "{} -> {} missing succ", p, bb.id());
            }
        }
    }

    /// 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
    fn diamond() -> (MeCfg, [BbId; 4]) {
        let mut cfg = MeCfg::new();
        let b: [BbId; 4] = std::array::from_fn(|_| cfg.create_bb());
        cfg.set_entry(b[0]);
        cfg.add_edge(b[0], b[1]);
        cfg.add_edge(b[0], b[2]);
        cfg.add_edge(b[1], b[3]);
        cfg.add_edge(b[2], b[3]);
        (cfg, b)
    }

    #[test]
    fn test_add_and_remove_edges() {
        let (mut cfg, b) = diamond();
        assert_symmetric(&cfg);
        assert_eq!(cfg.bb(b[3]).preds(), &[b[1], b[2]]);

        assert_eq!(cfg.remove_pred(b[3], b[1]), 0);
        assert_eq!(cfg.bb(b[3]).preds(), &[b[2]]);
        assert!(!cfg.is_succ_bb(b[1], b[3]));
        assert_symmetric(&cfg);

        assert_eq!(cfg.remove_succ(b[0], b[2]), 0);
        assert_eq!(cfg.bb(b[0]).succs(), &[b[1]]);
        assert_symmetric(&cfg);
    }

    #[test]
    #[should_panic(expected = "is not a successor")]
    fn test_remove_missing_edge_is_fatal() {
        let (mut cfg, b) = diamond();
        cfg.remove_pred(b[3], b[0]);
    }

    #[test]
    fn test_replace_preserves_position() {
        let (mut cfg, b) = diamond();
        let extra = cfg.create_bb();

        cfg.replace_pred(b[3], b[1], extra);
        assert_eq!(cfg.bb(b[3]).preds(), &[extra, b[2]]);
        assert_eq!(cfg.bb(extra).succs(), &[b[3]]);
        assert!(cfg.bb(b[1]).succs().is_empty());
        assert_symmetric(&cfg);

        let pos = cfg.replace_succ(b[0], b[2], b[1]);
        assert_eq!(pos, 0);
        assert_eq!(cfg.bb(b[0]).succs(), &[b[1], b[1]]);
        assert!(cfg.bb(b[2]).preds().is_empty());
        assert_symmetric(&cfg);
    }

    #[test]
    fn test_remove_bb() {
        let (mut cfg, b) = diamond();
        let removed = cfg.remove_bb(b[1]);
        assert_eq!(removed, vec![(b[3], 0)]);
        assert!(cfg.bb(b[1]).is_deleted());
        assert_eq!(cfg.bb(b[1]).kind, BbKind::Invalid);
        for bb in cfg.all_bbs() {
            assert!(!bb.preds().contains(&b[1]));
            assert!(!bb.succs().contains(&b[1]));
        }
        assert_eq!(cfg.layout(), &[b[0], b[2], b[3]]);
        assert_symmetric(&cfg);
    }

    #[test]
    fn test_split_bb() {
        let (mut cfg, b) = diamond();
        cfg.bb_mut(b[1]).kind = BbKind::Goto;
        cfg.bb_mut(b[1]).attrs = BbAttr::IS_TRY | BbAttr::IS_TRY_END | BbAttr::IS_IN_LOOP;

        let tail = cfg.split_bb(b[1]);
        assert_eq!(cfg.layout(), &[b[0], b[1], tail, b[2], b[3]]);
        assert_eq!(cfg.bb(b[1]).succs(), &[tail]);
        assert_eq!(cfg.bb(tail).succs(), &[b[3]]);
        assert_eq!(cfg.bb(b[3]).preds(), &[tail, b[2]]);
        assert_eq!(cfg.bb(tail).kind, BbKind::Goto);
        assert_eq!(cfg.bb(b[1]).kind, BbKind::Fallthru);
        assert!(cfg.bb(tail).has_attr(BbAttr::IS_TRY_END));
        assert!(!cfg.bb(b[1]).has_attr(BbAttr::IS_TRY_END));
        assert!(cfg.bb(b[1]).has_attr(BbAttr::IS_TRY));
        assert!(cfg.bb(tail).has_attr(BbAttr::IS_IN_LOOP));
        assert!(cfg.bb(b[1]).has_attr(BbAttr::IS_IN_LOOP));
        assert_symmetric(&cfg);
    }

    #[test]
    fn test_reachability() {
        let (mut cfg, b) = diamond();
        let island = cfg.create_bb();
        cfg.add_edge(island, b[3]);
        cfg.bb_mut(b[3]).attrs.insert(BbAttr::IS_EXIT);
        let looping = cfg.create_bb();
        cfg.add_edge(b[2], looping);
        cfg.add_edge(looping, looping);

        let mut reached = BitSet::new(cfg.len());
        cfg.find_reachable_bbs(&mut reached);
        assert!(reached.contains(b[3].index()));
        assert!(reached.contains(looping.index()));
        assert!(!reached.contains(island.index()));

        let mut exits = BitSet::new(cfg.len());
        cfg.find_will_exit_bbs(&mut exits);
        assert!(exits.contains(island.index()));
        assert!(exits.contains(b[0].index()));
        assert!(!exits.contains(looping.index()));
    }
}
