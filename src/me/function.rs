//! One function in SSA form.
//!
//! [`MeFunction`] bundles the block graph, the node store and the symbol tables of a routine.
//! Edge edits made through it keep positional phi operands aligned with predecessor lists, and
//! statement edits keep the per-block doubly linked lists consistent.

use std::collections::HashMap;

use crate::{
    me::{builder, BbId, IrMap, MeCfg, SccTopology, SsaTab, StmtId},
    mir::{LabelIdx, MirFunction, PuIdx},
    MeConfig, Result,
};

/// A function of the middle end: CFG, SSA nodes and symbol tables.
#[derive(Debug)]
pub struct MeFunction {
    name: String,
    pu: PuIdx,
    cfg: MeCfg,
    irmap: IrMap,
    ssatab: SsaTab,
    sccs: Option<SccTopology>,
    labels: HashMap<LabelIdx, BbId>,
}

impl MeFunction {
    /// Builds the SSA form of `func`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] for an empty body, and a malformed-input error when the
    /// body references undeclared symbols, branches to an undefined label or uses an opcode that
    /// is not a statement.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use meir::{
    ///     me::MeFunction,
    ///     mir::{BaseNode, MirFunction, PrimType, StmtNode, SymbolTable},
    ///     MeConfig,
    /// };
    ///
    /// let mut symbols = SymbolTable::new();
    /// let x = symbols.declare_local("x", PrimType::I32);
    /// let body = vec![
    ///     StmtNode::dassign(x, BaseNode::int(PrimType::I32, 1)),
    ///     StmtNode::ret(vec![BaseNode::dread(PrimType::I32, x)]),
    /// ];
    /// let func = MeFunction::build(&MirFunction::new("f", symbols, body), &MeConfig::minimal())?;
    /// assert_eq!(func.cfg().layout().len(), 1);
    /// # Ok::<(), meir::Error>(())
    /// ```
    pub fn build(func: &MirFunction, config: &MeConfig) -> Result<Self> {
        builder::SsaConstructor::build(func, config)
    }

    pub(super) fn new(name: &str, pu: PuIdx, ssatab: SsaTab) -> Self {
        MeFunction {
            name: name.to_string(),
            pu,
            cfg: MeCfg::new(),
            irmap: IrMap::new(),
            ssatab,
            sccs: None,
            labels: HashMap::new(),
        }
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function index.
    #[must_use]
    pub fn pu(&self) -> PuIdx {
        self.pu
    }

    /// Block graph.
    #[must_use]
    pub fn cfg(&self) -> &MeCfg {
        &self.cfg
    }

    /// Mutable block graph.
    ///
    /// Edge edits made directly on the graph do not touch phi operands; prefer the wrappers on
    /// this type when the target blocks carry phis.
    pub fn cfg_mut(&mut self) -> &mut MeCfg {
        &mut self.cfg
    }

    /// Node store.
    #[must_use]
    pub fn irmap(&self) -> &IrMap {
        &self.irmap
    }

    /// Mutable node store.
    pub fn irmap_mut(&mut self) -> &mut IrMap {
        &mut self.irmap
    }

    /// Symbol tables.
    #[must_use]
    pub fn ssatab(&self) -> &SsaTab {
        &self.ssatab
    }

    /// Mutable symbol tables.
    pub fn ssatab_mut(&mut self) -> &mut SsaTab {
        &mut self.ssatab
    }

    /// Disjoint mutable access to graph, node store and symbol tables.
    pub fn parts_mut(&mut self) -> (&mut MeCfg, &mut IrMap, &mut SsaTab) {
        (&mut self.cfg, &mut self.irmap, &mut self.ssatab)
    }

    /// Block starting with `label`.
    #[must_use]
    pub fn label_bb(&self, label: LabelIdx) -> Option<BbId> {
        self.labels.get(&label).copied()
    }

    pub(super) fn bind_label(&mut self, label: LabelIdx, bb: BbId) -> bool {
        self.cfg.bb_mut(bb).label = Some(label);
        self.labels.insert(label, bb).is_none()
    }

    /// SCC overlay, if it was built and no edge changed since.
    #[must_use]
    pub fn sccs(&self) -> Option<&SccTopology> {
        self.sccs.as_ref()
    }

    /// Rebuilds the SCC overlay over the current graph.
    pub fn build_sccs(&mut self) -> &SccTopology {
        self.sccs.insert(SccTopology::build(&mut self.cfg))
    }

    fn invalidate_sccs(&mut self) {
        if self.sccs.take().is_some() {
            log::trace!("{}: scc overlay dropped after an edge change", self.name);
        }
    }

    /// Statements of `bb` in order.
    pub fn stmts(&self, bb: BbId) -> StmtIter<'_> {
        StmtIter {
            irmap: &self.irmap,
            cursor: self.cfg.bb(bb).first(),
        }
    }

    /// Number of statements in `bb`.
    #[must_use]
    pub fn stmt_count(&self, bb: BbId) -> usize {
        self.stmts(bb).count()
    }

    fn check_detached(&self, stmt: StmtId) {
        check_fatal!(
            self.irmap.stmt(stmt).bb.is_none(),
            "{} is already in {:?}",
            stmt,
            self.irmap.stmt(stmt).bb
        );
    }

    fn owner(&self, stmt: StmtId) -> BbId {
        match self.irmap.stmt(stmt).bb {
            Some(bb) => bb,
            None => fatal!("{} is not in a block", stmt),
        }
    }

    /// Prepends a detached statement to `bb`.
    pub fn add_stmt_first(&mut self, bb: BbId, stmt: StmtId) {
        match self.cfg.bb(bb).first() {
            Some(first) => self.insert_stmt_before(first, stmt),
            None => self.link_only(bb, stmt),
        }
    }

    /// Appends a detached statement to `bb`.
    pub fn add_stmt_last(&mut self, bb: BbId, stmt: StmtId) {
        match self.cfg.bb(bb).last() {
            Some(last) => self.insert_stmt_after(last, stmt),
            None => self.link_only(bb, stmt),
        }
    }

    fn link_only(&mut self, bb: BbId, stmt: StmtId) {
        self.check_detached(stmt);
        let s = self.irmap.stmt_mut(stmt);
        s.bb = Some(bb);
        s.prev = None;
        s.next = None;
        let block = self.cfg.bb_mut(bb);
        block.first = Some(stmt);
        block.last = Some(stmt);
    }

    /// Inserts a detached statement right before `anchor`.
    pub fn insert_stmt_before(&mut self, anchor: StmtId, stmt: StmtId) {
        self.check_detached(stmt);
        let bb = self.owner(anchor);
        let prev = self.irmap.stmt(anchor).prev;

        let s = self.irmap.stmt_mut(stmt);
        s.bb = Some(bb);
        s.prev = prev;
        s.next = Some(anchor);
        self.irmap.stmt_mut(anchor).prev = Some(stmt);
        match prev {
            Some(p) => self.irmap.stmt_mut(p).next = Some(stmt),
            None => self.cfg.bb_mut(bb).first = Some(stmt),
        }
    }

    /// Inserts a detached statement right after `anchor`.
    pub fn insert_stmt_after(&mut self, anchor: StmtId, stmt: StmtId) {
        self.check_detached(stmt);
        let bb = self.owner(anchor);
        let next = self.irmap.stmt(anchor).next;

        let s = self.irmap.stmt_mut(stmt);
        s.bb = Some(bb);
        s.prev = Some(anchor);
        s.next = next;
        self.irmap.stmt_mut(anchor).next = Some(stmt);
        match next {
            Some(n) => self.irmap.stmt_mut(n).prev = Some(stmt),
            None => self.cfg.bb_mut(bb).last = Some(stmt),
        }
    }

    /// Appends a detached statement to `bb`, before its terminating branch if it has one.
    pub fn insert_stmt_last_br(&mut self, bb: BbId, stmt: StmtId) {
        match self.cfg.bb(bb).last() {
            Some(last) if self.irmap.stmt(last).ends_block() => {
                self.insert_stmt_before(last, stmt);
            }
            _ => self.add_stmt_last(bb, stmt),
        }
    }

    /// Unlinks `stmt` from its block. The statement stays in the arena, detached.
    pub fn remove_stmt(&mut self, stmt: StmtId) {
        let bb = self.owner(stmt);
        let (prev, next) = {
            let s = self.irmap.stmt(stmt);
            (s.prev, s.next)
        };
        match prev {
            Some(p) => self.irmap.stmt_mut(p).next = next,
            None => self.cfg.bb_mut(bb).first = next,
        }
        match next {
            Some(n) => self.irmap.stmt_mut(n).prev = prev,
            None => self.cfg.bb_mut(bb).last = prev,
        }
        let s = self.irmap.stmt_mut(stmt);
        s.bb = None;
        s.prev = None;
        s.next = None;
    }

    /// Puts detached `new` where `old` is and detaches `old`.
    pub fn replace_stmt(&mut self, old: StmtId, new: StmtId) {
        self.insert_stmt_before(old, new);
        self.remove_stmt(old);
    }

    /// Drops phi operand `index` of every phi in `bb`.
    fn remove_phi_opnd(&mut self, bb: BbId, index: usize) {
        let block = self.cfg.bb_mut(bb);
        for phi in block.phi_list.values_mut() {
            check_fatal!(
                index < phi.opnds.len(),
                "phi operand {} of {} out of range",
                index,
                bb
            );
            phi.opnds.remove(index);
        }
        let phis: Vec<_> = block
            .var_phis
            .values()
            .chain(block.reg_phis.values())
            .copied()
            .collect();
        for phi in phis {
            self.irmap.phi_mut(phi).remove_opnd(index);
        }
    }

    /// Adds the edge `from -> to`. Fatal if `to` has phis, which would be left without an
    /// operand for the new predecessor.
    pub fn add_edge(&mut self, from: BbId, to: BbId) {
        check_fatal!(
            !self.cfg.bb(to).has_phis(),
            "new edge {} -> {} into a block with phis",
            from,
            to
        );
        self.cfg.add_edge(from, to);
        self.invalidate_sccs();
    }

    /// Removes the edge `pred -> bb` and the matching phi operands of `bb`.
    pub fn remove_pred(&mut self, bb: BbId, pred: BbId) {
        let index = self.cfg.remove_pred(bb, pred);
        self.remove_phi_opnd(bb, index);
        self.invalidate_sccs();
    }

    /// Removes the edge `bb -> succ` and the matching phi operands of `succ`.
    pub fn remove_succ(&mut self, bb: BbId, succ: BbId) {
        let index = self.cfg.remove_succ(bb, succ);
        self.remove_phi_opnd(succ, index);
        self.invalidate_sccs();
    }

    /// Replaces predecessor `old` of `bb` with `new`. Phi operands keep their position.
    pub fn replace_pred(&mut self, bb: BbId, old: BbId, new: BbId) {
        self.cfg.replace_pred(bb, old, new);
        self.invalidate_sccs();
    }

    /// Redirects the edge `bb -> old` to `new`, dropping `old`'s phi operands for `bb`.
    ///
    /// Fatal if `new` has phis.
    pub fn replace_succ(&mut self, bb: BbId, old: BbId, new: BbId) {
        check_fatal!(
            !self.cfg.bb(new).has_phis(),
            "{} gains predecessor {} but has phis",
            new,
            bb
        );
        let index = self.cfg.replace_succ(bb, old, new);
        self.remove_phi_opnd(old, index);
        self.invalidate_sccs();
    }

    /// Removes `bb` from the function: its statements are detached and every successor loses
    /// the phi operands that flowed in from it.
    pub fn remove_bb(&mut self, bb: BbId) {
        let stmts: Vec<StmtId> = self.stmts(bb).collect();
        for stmt in stmts {
            let s = self.irmap.stmt_mut(stmt);
            s.bb = None;
            s.prev = None;
            s.next = None;
        }
        for (succ, index) in self.cfg.remove_bb(bb) {
            self.remove_phi_opnd(succ, index);
        }
        if let Some(label) = self.cfg.bb(bb).label {
            self.labels.remove(&label);
        }
        self.invalidate_sccs();
    }

    /// Splits `bb` after `at`; the statements following `at` move to the returned tail block,
    /// which also takes over every successor edge.
    pub fn split_bb(&mut self, bb: BbId, at: StmtId) -> BbId {
        check_fatal!(
            self.owner(at) == bb,
            "{} is not a statement of {}",
            at,
            bb
        );
        let tail = self.cfg.split_bb(bb);

        let moved = self.irmap.stmt(at).next;
        if let Some(first) = moved {
            let last = self.cfg.bb(bb).last();
            self.irmap.stmt_mut(at).next = None;
            self.irmap.stmt_mut(first).prev = None;
            self.cfg.bb_mut(bb).last = Some(at);
            let tail_block = self.cfg.bb_mut(tail);
            tail_block.first = Some(first);
            tail_block.last = last;

            let mut cursor = Some(first);
            while let Some(stmt) = cursor {
                let s = self.irmap.stmt_mut(stmt);
                s.bb = Some(tail);
                cursor = s.next;
            }
        }
        self.invalidate_sccs();
        log::trace!("{}: split {} after {}, tail {}", self.name, bb, at, tail);
        tail
    }
}

/// Iterator over the statements of a block.
pub struct StmtIter<'a> {
    irmap: &'a IrMap,
    cursor: Option<StmtId>,
}

impl Iterator for StmtIter<'_> {
    type Item = StmtId;

    fn next(&mut self) -> Option<StmtId> {
        let current = self.cursor?;
        self.cursor = self.irmap.stmt(current).next();
        Some(current)
    }
}
