//! SSA construction from the flat statement tree.
//!
//! Construction runs in these steps:
//!
//! 1. **Symbol pass**: validate opcodes and symbol references, create field symbols, mark
//!    address-taken variables and decide whether the virtual heap location is needed
//! 2. **Block formation**: labels and block-ending statements delimit blocks; terminators decide
//!    block kinds and edges; `try`/`endtry` mark regions and add handler edges
//! 3. **Entry and reachability**: an artificial entry is added when the first block has
//!    predecessors; unreachable blocks are dropped
//! 4. **Pruned phi placement**: phis go at the iterated dominance frontier of each symbol's
//!    definitions, restricted to blocks where the symbol is live on entry
//! 5. **Renaming**: a preorder walk of the dominator tree translates each statement with the
//!    current versions, attaches chi/mu/must-def nodes and fills successor phi operands
//!
//! The alias model is deliberately coarse: every symbol that may alias (globals, address-taken
//! variables and the heap) is may-used by calls, returns, throws, `gosub`/`retsub` and monitors,
//! and may-defined by calls, indirect stores and monitors.

use std::collections::BTreeMap;

use crate::{
    config::PHASE_SSA,
    me::{
        verify, BbAttr, BbId, BbKind, CallMeStmt, CallParts, ChiList, DassignMeStmt, ExprId,
        IassignMeStmt, IcallMeStmt, IntrinsiccallMeStmt, IvarMeExpr, MaydassignMeStmt, MeDefBy,
        MeExprKind, MeFunction, MeStmtKind, MuList, NaryMeExpr, OStIdx, OpMeExpr,
        RegassignMeStmt, SsaTab, StmtId, SwitchMeStmt, VersionPhi,
    },
    mir::{
        BaseNode, CallReturn, Callee, LabelIdx, MirFunction, Opcode, PrimType, StIdx, StmtKind,
        StmtNode,
    },
    utils::{
        graph::{
            algorithms::{
                compute_dominance_frontiers, compute_dominators, iterated_dominance_frontier,
                DominatorTree,
            },
            NodeId,
        },
        BitSet,
    },
    Error, MeConfig, Result,
};

/// Symbols a statement reads and writes, by original symbol.
#[derive(Debug, Default, Clone)]
struct StmtEffects {
    /// Read by the operand trees, including the heap read of indirect loads
    uses: Vec<OStIdx>,
    /// May-used
    mu: Vec<OStIdx>,
    /// May-defined; each also reads the incoming version
    chi: Vec<OStIdx>,
    /// Assigned call return values
    must_defs: Vec<OStIdx>,
    /// Directly assigned symbol of `dassign`/`regassign`
    lhs: Option<OStIdx>,
}

impl StmtEffects {
    fn reads(&self) -> impl Iterator<Item = OStIdx> + '_ {
        self.uses
            .iter()
            .chain(&self.mu)
            .chain(&self.chi)
            .copied()
    }

    fn writes(&self) -> impl Iterator<Item = OStIdx> + '_ {
        self.chi
            .iter()
            .chain(&self.must_defs)
            .chain(self.lhs.as_ref())
            .copied()
    }
}

/// Top-level operand trees of a statement, in operand order.
fn stmt_exprs(stmt: &StmtNode) -> Vec<&BaseNode> {
    match &stmt.kind {
        StmtKind::Dassign { rhs, .. } | StmtKind::Regassign { rhs, .. } => vec![rhs],
        StmtKind::Iassign { addr, rhs, .. } => vec![addr, rhs],
        StmtKind::Call { args, .. } => args.iter().collect(),
        StmtKind::CondGoto { cond, .. } => vec![cond],
        StmtKind::Switch { opnd, .. } => vec![opnd],
        StmtKind::Nary(opnds) => opnds.iter().collect(),
        StmtKind::Unary(opnd) => vec![opnd],
        StmtKind::Assert { array, index } => vec![array, index],
        StmtKind::Label(_)
        | StmtKind::Goto(_)
        | StmtKind::Try(_)
        | StmtKind::Catch(_)
        | StmtKind::Plain
        | StmtKind::Comment(_) => Vec::new(),
    }
}

/// Returns `true` if `op` may carry `kind`.
fn opcode_fits(op: Opcode, kind: &StmtKind) -> bool {
    match kind {
        StmtKind::Dassign { .. } => matches!(op, Opcode::Dassign | Opcode::Maydassign),
        StmtKind::Regassign { .. } => op == Opcode::Regassign,
        StmtKind::Iassign { .. } => op == Opcode::Iassign,
        StmtKind::Call { callee, .. } => match callee {
            Callee::Direct(_) => matches!(
                op,
                Opcode::Call
                    | Opcode::Virtualcall
                    | Opcode::Callassigned
                    | Opcode::Virtualcallassigned
            ),
            Callee::Indirect { .. } => matches!(op, Opcode::Icall | Opcode::Icallassigned),
            Callee::Intrinsic { .. } => {
                matches!(op, Opcode::Intrinsiccall | Opcode::Intrinsiccallassigned)
            }
        },
        StmtKind::Label(_) => op == Opcode::Label,
        StmtKind::Goto(_) => matches!(op, Opcode::Goto | Opcode::Gosub),
        StmtKind::CondGoto { .. } => op.is_cond_br(),
        StmtKind::Switch { .. } => op == Opcode::Switch,
        StmtKind::Nary(_) => matches!(op, Opcode::Return | Opcode::Syncenter | Opcode::Syncexit),
        StmtKind::Unary(_) => op.is_unary_stmt() || op == Opcode::Throw,
        StmtKind::Assert { .. } => op.is_assert_bce(),
        StmtKind::Try(_) => op == Opcode::Try,
        StmtKind::Catch(_) => op == Opcode::Catch,
        StmtKind::Plain => matches!(op, Opcode::Endtry | Opcode::Retsub),
        StmtKind::Comment(_) => op == Opcode::Comment,
    }
}

fn node(bb: BbId) -> NodeId {
    NodeId::new(bb.index())
}

fn bb_of(node: NodeId) -> BbId {
    BbId::new(node.index() as u32)
}

/// Step of the renaming walk over the dominator tree.
enum RenameStep {
    Enter(BbId),
    /// Leaving a block: pop one version per listed symbol
    Leave(Vec<OStIdx>),
}

/// Builds the SSA form of one [`MirFunction`].
///
/// One constructor is used per function and consumed by [`SsaConstructor::build`].
pub(crate) struct SsaConstructor<'a> {
    mir: &'a MirFunction,
    config: &'a MeConfig,
    func: MeFunction,
    /// Statement indices of each block, by block index
    block_body: Vec<Vec<usize>>,
    /// Symbols taking part in chi/mu lists
    aliased: Vec<OStIdx>,
    /// Heap location, when aliasing is modeled and memory is touched
    heap: Option<OStIdx>,
    /// Version stack per original symbol during renaming
    stacks: Vec<Vec<ExprId>>,
}

impl<'a> SsaConstructor<'a> {
    /// Builds the SSA form of `mir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] for an empty body, [`Error::UnknownSymbol`] /
    /// [`Error::UnknownPreg`] for undeclared references, [`Error::InvalidOpcode`] for opcodes
    /// that do not fit their statement or operator position and [`Error::Malformed`] for
    /// undefined labels or control falling off a conditional branch. With
    /// [`MeConfig::verify_after_build`] set, a failed check is returned as
    /// [`Error::Verification`].
    pub(crate) fn build(mir: &'a MirFunction, config: &'a MeConfig) -> Result<MeFunction> {
        if mir.body.is_empty() {
            return Err(Error::Empty);
        }
        if config.dump_before && config.should_dump(PHASE_SSA, &mir.name) {
            for stmt in &mir.body {
                log::info!("{} before {}: {:?}", mir.name, PHASE_SSA, stmt);
            }
        }

        let mut ctor = SsaConstructor {
            mir,
            config,
            func: MeFunction::new(&mir.name, mir.pu, SsaTab::from_symbols(&mir.symbols)),
            block_body: Vec::new(),
            aliased: Vec::new(),
            heap: None,
            stacks: Vec::new(),
        };

        ctor.collect_symbols()?;
        ctor.split_blocks()?;
        ctor.link_blocks()?;
        ctor.mark_regions()?;
        ctor.finish_entry();
        ctor.remove_unreachable();

        let effects = mir
            .body
            .iter()
            .map(|stmt| ctor.effects(stmt))
            .collect::<Result<Vec<_>>>()?;
        let dom = compute_dominators(ctor.func.cfg(), node(ctor.func.cfg().entry()));
        ctor.place_phis(&effects, &dom);

        ctor.stacks = vec![Vec::new(); ctor.func.ssatab().ost_count()];
        let entry = ctor.func.cfg().entry();
        ctor.rename_blocks(entry, &effects, &dom)?;

        let mut func = ctor.func;
        let scc_count = func.build_sccs().len();
        log::debug!(
            "{}: {} blocks, {} sccs, {} phis, {} statements, {} expressions",
            func.name(),
            func.cfg().layout().len(),
            scc_count,
            func.irmap().phi_count(),
            func.irmap().stmt_count(),
            func.irmap().expr_count()
        );

        if config.verify_after_build {
            verify(&func)?;
        }
        if !config.dump_before && config.should_dump(PHASE_SSA, func.name()) {
            log::info!("{}", func.dump(config));
        }
        Ok(func)
    }

    fn symbol(&self, st: StIdx, field_id: i32) -> Result<OStIdx> {
        self.func
            .ssatab()
            .find_symbol(st, field_id)
            .ok_or(Error::UnknownSymbol(st))
    }

    /// Validates the body and creates every original symbol it references.
    fn collect_symbols(&mut self) -> Result<()> {
        let mir = self.mir;
        let mut address_taken = Vec::new();
        let mut touches_memory = false;

        for stmt in &mir.body {
            if !opcode_fits(stmt.op, &stmt.kind) {
                return Err(Error::InvalidOpcode {
                    opcode: stmt.op,
                    context: "statement",
                });
            }
            let (ssatab, symbols) = (self.func.ssatab_mut(), &mir.symbols);
            match &stmt.kind {
                StmtKind::Dassign { st, field_id, .. } => {
                    ssatab.find_or_create_symbol(*st, *field_id, symbols)?;
                }
                StmtKind::Regassign { preg, .. } => {
                    ssatab.find_preg(*preg)?;
                }
                StmtKind::Iassign { .. } => touches_memory = true,
                StmtKind::Call { rets, .. } => {
                    touches_memory = true;
                    if !rets.is_empty() && !stmt.op.is_call_assigned() {
                        return Err(malformed_error!(
                            "{} in {} has {} return values",
                            stmt.op,
                            mir.name,
                            rets.len()
                        ));
                    }
                    for ret in rets {
                        match *ret {
                            CallReturn::Var(st, field_id) => {
                                ssatab.find_or_create_symbol(st, field_id, symbols)?;
                            }
                            CallReturn::Reg(preg) => {
                                ssatab.find_preg(preg)?;
                            }
                        }
                    }
                }
                StmtKind::Nary(_) if stmt.op != Opcode::Return => touches_memory = true,
                _ => {}
            }
            for expr in stmt_exprs(stmt) {
                self.collect_expr(expr, &mut address_taken, &mut touches_memory)?;
            }
        }

        let ssatab = self.func.ssatab_mut();
        for st in address_taken {
            ssatab.mark_address_taken(st);
        }
        if self.config.models_aliasing() {
            if touches_memory || !ssatab.aliased_osts().is_empty() {
                self.heap = Some(ssatab.heap());
            }
            self.aliased = ssatab.aliased_osts();
        }
        Ok(())
    }

    fn collect_expr(
        &mut self,
        expr: &BaseNode,
        address_taken: &mut Vec<StIdx>,
        touches_memory: &mut bool,
    ) -> Result<()> {
        let mir = self.mir;
        let symbols = &mir.symbols;
        match expr {
            BaseNode::Dread { st, field_id, .. } => {
                self.func
                    .ssatab_mut()
                    .find_or_create_symbol(*st, *field_id, symbols)?;
            }
            BaseNode::Addrof { st, field_id, .. } => {
                self.func
                    .ssatab_mut()
                    .find_or_create_symbol(*st, *field_id, symbols)?;
                address_taken.push(*st);
            }
            BaseNode::Regread { preg, .. } => {
                self.func.ssatab().find_preg(*preg)?;
            }
            BaseNode::Iread { .. } => *touches_memory = true,
            BaseNode::Gcmalloc { op, .. } if !op.is_gcmalloc() => {
                return Err(Error::InvalidOpcode {
                    opcode: *op,
                    context: "allocation",
                });
            }
            BaseNode::Op { op, opnds, .. } => match op.operator_arity() {
                Some(arity) if arity == opnds.len() => {}
                Some(arity) => {
                    return Err(malformed_error!(
                        "{} expects {} operands, found {}",
                        op,
                        arity,
                        opnds.len()
                    ));
                }
                None => {
                    return Err(Error::InvalidOpcode {
                        opcode: *op,
                        context: "operator",
                    });
                }
            },
            BaseNode::Nary { op, intrinsic, .. } => match op {
                Opcode::Array => {}
                Opcode::Intrinsicop if intrinsic.is_some() => {}
                Opcode::Intrinsicop => {
                    return Err(malformed_error!("intrinsicop without an intrinsic"));
                }
                _ => {
                    return Err(Error::InvalidOpcode {
                        opcode: *op,
                        context: "n-ary operator",
                    });
                }
            },
            _ => {}
        }
        for child in expr.children() {
            self.collect_expr(child, address_taken, touches_memory)?;
        }
        Ok(())
    }

    fn new_block(&mut self) -> BbId {
        let bb = self.func.cfg_mut().create_bb();
        check_fatal!(
            bb.index() == self.block_body.len(),
            "{} created out of order",
            bb
        );
        self.block_body.push(Vec::new());
        bb
    }

    /// Labels and block-ending statements delimit blocks.
    fn split_blocks(&mut self) -> Result<()> {
        let mut current: Option<BbId> = None;
        for (i, stmt) in self.mir.body.iter().enumerate() {
            if let StmtKind::Label(label) = stmt.kind {
                let bb = self.new_block();
                if !self.func.bind_label(label, bb) {
                    return Err(malformed_error!(
                        "label {} defined twice in {}",
                        label,
                        self.mir.name
                    ));
                }
                current = Some(bb);
                continue;
            }
            let bb = match current {
                Some(bb) => bb,
                None => self.new_block(),
            };
            self.block_body[bb.index()].push(i);
            current = if stmt.op.ends_block() { None } else { Some(bb) };
        }
        Ok(())
    }

    fn target(&self, label: LabelIdx) -> Result<BbId> {
        self.func.label_bb(label).ok_or_else(|| {
            malformed_error!("branch to undefined label {} in {}", label, self.mir.name)
        })
    }

    fn last_stmt(&self, bb: BbId) -> Option<&'a StmtNode> {
        let mir = self.mir;
        self.block_body[bb.index()]
            .last()
            .map(|&i| &mir.body[i])
    }

    /// Sets block kinds from terminators and adds the control flow edges.
    fn link_blocks(&mut self) -> Result<()> {
        let blocks = self.func.cfg().layout().to_vec();
        let mut after_gosub = Vec::new();

        for (k, &bb) in blocks.iter().enumerate() {
            let next = blocks.get(k + 1).copied();
            let fallthrough = || {
                next.ok_or_else(|| {
                    malformed_error!("control falls off the end of {}", self.mir.name)
                })
            };

            let (kind, succs, exit) = match self.last_stmt(bb) {
                Some(StmtNode {
                    kind: StmtKind::CondGoto { target, .. },
                    ..
                }) => (
                    BbKind::CondGoto,
                    vec![fallthrough()?, self.target(*target)?],
                    false,
                ),
                Some(StmtNode {
                    op: Opcode::Gosub,
                    kind: StmtKind::Goto(target),
                    ..
                }) => {
                    let resume = fallthrough()?;
                    after_gosub.push(resume);
                    (BbKind::Goto, vec![self.target(*target)?, resume], false)
                }
                Some(StmtNode {
                    kind: StmtKind::Goto(target),
                    ..
                }) => (BbKind::Goto, vec![self.target(*target)?], false),
                Some(StmtNode {
                    kind: StmtKind::Switch { default, cases, .. },
                    ..
                }) => {
                    let mut succs = vec![self.target(*default)?];
                    for (_, label) in cases {
                        let bb = self.target(*label)?;
                        if !succs.contains(&bb) {
                            succs.push(bb);
                        }
                    }
                    (BbKind::Switch, succs, false)
                }
                Some(StmtNode {
                    op: Opcode::Return | Opcode::Throw,
                    ..
                }) => (BbKind::Return, Vec::new(), true),
                Some(StmtNode {
                    op: Opcode::Retsub,
                    ..
                }) => (BbKind::Return, Vec::new(), false),
                _ => match next {
                    Some(next) => (BbKind::Fallthru, vec![next], false),
                    None => (BbKind::Return, Vec::new(), true),
                },
            };

            let cfg = self.func.cfg_mut();
            let block = cfg.bb_mut(bb);
            block.kind = kind;
            if exit {
                block.attrs.insert(BbAttr::IS_EXIT);
            }
            for succ in succs {
                cfg.add_edge(bb, succ);
            }
        }

        for bb in after_gosub {
            let block = self.func.cfg_mut().bb_mut(bb);
            if block.kind == BbKind::Fallthru {
                block.kind = BbKind::AfterGosub;
            }
        }
        Ok(())
    }

    /// Flags try regions and catch blocks, and links every block of a try region to its
    /// handlers.
    fn mark_regions(&mut self) -> Result<()> {
        let mir = self.mir;
        let blocks = self.func.cfg().layout().to_vec();
        let mut regions: Vec<Vec<BbId>> = Vec::new();

        for bb in blocks {
            let first = self.block_body[bb.index()].first().map(|&i| &mir.body[i]);
            if matches!(first.map(|s| &s.kind), Some(StmtKind::Catch(_))) {
                self.func.cfg_mut().bb_mut(bb).attrs.insert(BbAttr::IS_CATCH);
            }

            if let Some(handlers) = regions.last() {
                let cfg = self.func.cfg_mut();
                cfg.bb_mut(bb).attrs.insert(BbAttr::IS_TRY);
                for &handler in handlers {
                    if !cfg.is_succ_bb(bb, handler) {
                        cfg.add_edge(bb, handler);
                    }
                }
            }

            match self.last_stmt(bb) {
                Some(StmtNode {
                    kind: StmtKind::Try(labels),
                    ..
                }) => {
                    let handlers = labels
                        .iter()
                        .map(|&label| self.target(label))
                        .collect::<Result<Vec<_>>>()?;
                    regions.push(handlers);
                }
                Some(StmtNode {
                    op: Opcode::Endtry,
                    ..
                }) => {
                    if regions.pop().is_none() {
                        return Err(malformed_error!("endtry without try in {}", mir.name));
                    }
                    self.func
                        .cfg_mut()
                        .bb_mut(bb)
                        .attrs
                        .insert(BbAttr::IS_TRY_END);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The first block becomes the entry; if something branches back to it, an empty
    /// artificial block is placed in front.
    fn finish_entry(&mut self) {
        let first = self.func.cfg().layout()[0];
        if self.func.cfg().bb(first).preds().is_empty() {
            self.func.cfg_mut().set_entry(first);
            return;
        }
        let cfg = self.func.cfg_mut();
        let entry = cfg.create_bb_before(first);
        self.block_body.push(Vec::new());
        let block = cfg.bb_mut(entry);
        block.kind = BbKind::Fallthru;
        block.attrs.insert(BbAttr::ARTIFICIAL);
        cfg.add_edge(entry, first);
        cfg.set_entry(entry);
        log::trace!("{}: artificial entry {}", self.mir.name, entry);
    }

    fn remove_unreachable(&mut self) {
        let cfg = self.func.cfg();
        let mut reached = BitSet::new(cfg.len());
        cfg.find_reachable_bbs(&mut reached);
        let dead: Vec<BbId> = cfg
            .layout()
            .iter()
            .copied()
            .filter(|bb| !reached.contains(bb.index()))
            .collect();
        for bb in dead {
            log::warn!(
                "{}: {} is unreachable, dropping {} statements",
                self.mir.name,
                bb,
                self.block_body[bb.index()].len()
            );
            self.block_body[bb.index()].clear();
            self.func.remove_bb(bb);
        }

        let cfg = self.func.cfg();
        let mut will_exit = BitSet::new(cfg.len());
        cfg.find_will_exit_bbs(&mut will_exit);
        let stuck: Vec<BbId> = cfg
            .layout()
            .iter()
            .copied()
            .filter(|bb| !will_exit.contains(bb.index()))
            .collect();
        for bb in stuck {
            self.func.cfg_mut().bb_mut(bb).attrs.insert(BbAttr::WONT_EXIT);
        }
    }

    fn expr_reads(&self, expr: &BaseNode, out: &mut Vec<OStIdx>) -> Result<()> {
        match expr {
            BaseNode::Dread { st, field_id, .. } => out.push(self.symbol(*st, *field_id)?),
            BaseNode::Regread { preg, .. } => out.push(self.func.ssatab().find_preg(*preg)?),
            BaseNode::Iread { .. } => out.extend(self.heap),
            _ => {}
        }
        for child in expr.children() {
            self.expr_reads(child, out)?;
        }
        Ok(())
    }

    /// Computes what `stmt` reads and writes under the alias model.
    fn effects(&self, stmt: &StmtNode) -> Result<StmtEffects> {
        let mut fx = StmtEffects::default();
        for expr in stmt_exprs(stmt) {
            self.expr_reads(expr, &mut fx.uses)?;
        }

        match (&stmt.kind, stmt.op) {
            (StmtKind::Dassign { st, field_id, .. }, Opcode::Maydassign) => {
                let target = self.symbol(*st, *field_id)?;
                fx.chi.push(target);
                fx.chi
                    .extend(self.aliased.iter().copied().filter(|&o| o != target));
            }
            (StmtKind::Dassign { st, field_id, .. }, _) => {
                let target = self.symbol(*st, *field_id)?;
                fx.lhs = Some(target);
                if self.func.ssatab().ost(target).may_alias {
                    fx.chi.extend(self.heap);
                }
            }
            (StmtKind::Regassign { preg, .. }, _) => {
                fx.lhs = Some(self.func.ssatab().find_preg(*preg)?);
            }
            (StmtKind::Iassign { .. }, _) => fx.chi.clone_from(&self.aliased),
            (StmtKind::Call { rets, .. }, _) => {
                for ret in rets {
                    fx.must_defs.push(match *ret {
                        CallReturn::Var(st, field_id) => self.symbol(st, field_id)?,
                        CallReturn::Reg(preg) => self.func.ssatab().find_preg(preg)?,
                    });
                }
                fx.mu.clone_from(&self.aliased);
                fx.chi = self
                    .aliased
                    .iter()
                    .copied()
                    .filter(|o| !fx.must_defs.contains(o))
                    .collect();
            }
            (StmtKind::Nary(_), Opcode::Syncenter | Opcode::Syncexit) => {
                fx.mu.clone_from(&self.aliased);
                fx.chi.clone_from(&self.aliased);
            }
            (StmtKind::Nary(_), _)
            | (StmtKind::Unary(_), Opcode::Throw)
            | (StmtKind::Goto(_), Opcode::Gosub)
            | (StmtKind::Plain, Opcode::Retsub) => fx.mu.clone_from(&self.aliased),
            _ => {}
        }
        Ok(fx)
    }

    /// Places pruned phis: at the iterated dominance frontier of each symbol's defining
    /// blocks, where the symbol is live on entry and the block has at least two predecessors.
    fn place_phis(&mut self, effects: &[StmtEffects], dom: &DominatorTree) {
        let cfg = self.func.cfg();
        let (nbbs, nosts) = (cfg.len(), self.func.ssatab().ost_count());
        let layout = cfg.layout().to_vec();

        let mut exposed = vec![BitSet::new(nosts); nbbs];
        let mut defined = vec![BitSet::new(nosts); nbbs];
        for &bb in &layout {
            for &i in &self.block_body[bb.index()] {
                let fx = &effects[i];
                for ost in fx.reads() {
                    if !defined[bb.index()].contains(ost.index()) {
                        exposed[bb.index()].insert(ost.index());
                    }
                }
                for ost in fx.writes() {
                    defined[bb.index()].insert(ost.index());
                }
            }
        }

        let mut live_in = exposed;
        let mut changed = true;
        while changed {
            changed = false;
            for &bb in layout.iter().rev() {
                let incoming: Vec<usize> = cfg
                    .bb(bb)
                    .succs()
                    .iter()
                    .flat_map(|s| live_in[s.index()].iter().collect::<Vec<_>>())
                    .collect();
                for ost in incoming {
                    if !defined[bb.index()].contains(ost) {
                        changed |= live_in[bb.index()].insert(ost);
                    }
                }
            }
        }

        let mut def_blocks: BTreeMap<OStIdx, Vec<NodeId>> = BTreeMap::new();
        for &bb in &layout {
            for ost in defined[bb.index()].iter() {
                def_blocks
                    .entry(OStIdx::new(ost as u32))
                    .or_default()
                    .push(node(bb));
            }
        }

        let frontiers = compute_dominance_frontiers(cfg, dom);
        let mut placed = 0usize;
        for (ost, blocks) in def_blocks {
            for join in iterated_dominance_frontier(&frontiers, blocks) {
                let bb = bb_of(join);
                let preds = self.func.cfg().bb(bb).preds().len();
                if preds >= 2 && live_in[bb.index()].contains(ost.index()) {
                    self.insert_phi(bb, ost, preds);
                    placed += 1;
                }
            }
        }
        log::debug!("{}: placed {} phis", self.mir.name, placed);
    }

    fn insert_phi(&mut self, bb: BbId, ost: OStIdx, preds: usize) {
        let (cfg, irmap, ssatab) = self.func.parts_mut();
        let zero_vst = ssatab.zero_version(ost);
        let zero = irmap.version_expr(ssatab, zero_vst);
        let vst = ssatab.new_version(ost);
        let lhs = irmap.version_expr(ssatab, vst);
        let phi = irmap.new_phi(lhs, bb, vec![zero; preds]);

        let block = cfg.bb_mut(bb);
        block.phi_list.insert(
            ost,
            VersionPhi {
                result: vst,
                opnds: vec![zero_vst; preds],
            },
        );
        if ssatab.ost(ost).is_preg() {
            block.reg_phis.insert(ost, phi);
        } else {
            block.var_phis.insert(ost, phi);
        }
        log::trace!("phi for {} at {}", ssatab.ost(ost).name, bb);
    }

    /// Version of `ost` reaching the current point of the walk.
    fn current(&mut self, ost: OStIdx) -> ExprId {
        if let Some(&top) = self.stacks[ost.index()].last() {
            return top;
        }
        let (_, irmap, ssatab) = self.func.parts_mut();
        let zero = ssatab.zero_version(ost);
        irmap.version_expr(ssatab, zero)
    }

    /// Fresh version of `ost`; it becomes current only once pushed.
    fn new_def(&mut self, ost: OStIdx) -> ExprId {
        let (_, irmap, ssatab) = self.func.parts_mut();
        let vst = ssatab.new_version(ost);
        irmap.version_expr(ssatab, vst)
    }

    fn create(&mut self, op: Opcode, ptype: PrimType, kind: MeExprKind) -> ExprId {
        self.func.irmap_mut().create_expr(op, ptype, kind)
    }

    fn translate_expr(&mut self, expr: &BaseNode) -> Result<ExprId> {
        Ok(match expr {
            BaseNode::Dread { st, field_id, .. } => {
                let ost = self.symbol(*st, *field_id)?;
                self.current(ost)
            }
            BaseNode::Regread { preg, .. } => {
                let ost = self.func.ssatab().find_preg(*preg)?;
                self.current(ost)
            }
            BaseNode::Constval { ptype, value } => {
                self.create(Opcode::Constval, *ptype, MeExprKind::Const(*value))
            }
            BaseNode::Conststr { ptype, str_idx } => {
                self.create(Opcode::Conststr, *ptype, MeExprKind::Conststr(*str_idx))
            }
            BaseNode::Conststr16 { ptype, str_idx } => {
                self.create(Opcode::Conststr16, *ptype, MeExprKind::Conststr16(*str_idx))
            }
            BaseNode::Addrof {
                ptype,
                st,
                field_id,
            } => {
                let ost = self.symbol(*st, *field_id)?;
                self.create(
                    Opcode::Addrof,
                    *ptype,
                    MeExprKind::Addrof {
                        ost,
                        field_id: *field_id,
                    },
                )
            }
            BaseNode::Addroffunc { ptype, pu } => {
                self.create(Opcode::Addroffunc, *ptype, MeExprKind::Addroffunc(*pu))
            }
            BaseNode::Gcmalloc { op, ptype, ty } => {
                self.create(*op, *ptype, MeExprKind::Gcmalloc(*ty))
            }
            BaseNode::Sizeoftype { ptype, ty } => {
                self.create(Opcode::Sizeoftype, *ptype, MeExprKind::Sizeoftype(*ty))
            }
            BaseNode::Fieldsdist {
                ptype,
                ty,
                field1,
                field2,
            } => self.create(
                Opcode::Fieldsdist,
                *ptype,
                MeExprKind::FieldsDist {
                    ty: *ty,
                    field1: *field1,
                    field2: *field2,
                },
            ),
            BaseNode::Iread {
                ptype,
                ty,
                field_id,
                base,
            } => {
                let base = self.translate_expr(base)?;
                let mu = self.heap.map(|heap| self.current(heap));
                self.create(
                    Opcode::Iread,
                    *ptype,
                    MeExprKind::Ivar(IvarMeExpr {
                        base,
                        ty: *ty,
                        field_id: *field_id,
                        mu,
                        maybe_null: true,
                    }),
                )
            }
            BaseNode::Op {
                op,
                ptype,
                opnd_type,
                opnds,
                ty,
                field_id,
                bits_offset,
                bits_size,
            } => {
                let opnds = self.translate_exprs(opnds)?;
                self.create(
                    *op,
                    *ptype,
                    MeExprKind::Op(OpMeExpr {
                        opnds,
                        opnd_type: *opnd_type,
                        ty: *ty,
                        field_id: *field_id,
                        bits_offset: *bits_offset,
                        bits_size: *bits_size,
                    }),
                )
            }
            BaseNode::Nary {
                op,
                ptype,
                ty,
                intrinsic,
                bound_check,
                opnds,
            } => {
                let opnds = self.translate_exprs(opnds)?;
                self.create(
                    *op,
                    *ptype,
                    MeExprKind::Nary(NaryMeExpr {
                        ty: *ty,
                        intrinsic: *intrinsic,
                        bound_check: *bound_check,
                        opnds,
                    }),
                )
            }
        })
    }

    fn translate_exprs(&mut self, exprs: &[BaseNode]) -> Result<Vec<ExprId>> {
        exprs.iter().map(|e| self.translate_expr(e)).collect()
    }

    /// Translates body statement `index` with the current versions. Returns the statement and
    /// the versions it defines, which the caller pushes.
    fn translate_stmt(
        &mut self,
        index: usize,
        fx: &StmtEffects,
    ) -> Result<(StmtId, Vec<(OStIdx, ExprId)>)> {
        let mir = self.mir;
        let stmt = &mir.body[index];
        let mut direct: Option<(OStIdx, ExprId)> = None;

        let kind = match &stmt.kind {
            StmtKind::Dassign { field_id, rhs, .. } => {
                let rhs = self.translate_expr(rhs)?;
                match fx.lhs {
                    Some(ost) => {
                        let lhs = self.new_def(ost);
                        direct = Some((ost, lhs));
                        MeStmtKind::Dassign(DassignMeStmt {
                            lhs,
                            rhs,
                            chi: ChiList::new(),
                            rc: Default::default(),
                            propagated: false,
                        })
                    }
                    None => MeStmtKind::Maydassign(MaydassignMeStmt {
                        rhs,
                        chi: ChiList::new(),
                        may_def_ost: fx.chi[0],
                        field_id: *field_id,
                        rc: Default::default(),
                    }),
                }
            }
            StmtKind::Regassign { rhs, .. } => {
                let rhs = self.translate_expr(rhs)?;
                let Some(ost) = fx.lhs else {
                    fatal!("regassign without a target register");
                };
                let lhs = self.new_def(ost);
                direct = Some((ost, lhs));
                MeStmtKind::Regassign(RegassignMeStmt {
                    lhs,
                    rhs,
                    rc: Default::default(),
                })
            }
            StmtKind::Iassign {
                ty,
                field_id,
                addr,
                rhs,
            } => {
                let base = self.translate_expr(addr)?;
                let rhs = self.translate_expr(rhs)?;
                MeStmtKind::Iassign(IassignMeStmt {
                    ty: *ty,
                    field_id: *field_id,
                    base,
                    rhs,
                    chi: ChiList::new(),
                    rc: Default::default(),
                })
            }
            StmtKind::Call { callee, args, .. } => {
                let parts = CallParts {
                    operands: self.translate_exprs(args)?,
                    ..CallParts::default()
                };
                match *callee {
                    Callee::Direct(pu) => MeStmtKind::Call(CallMeStmt { pu, parts }),
                    Callee::Indirect { ret_ty } => {
                        MeStmtKind::Icall(IcallMeStmt { ret_ty, parts })
                    }
                    Callee::Intrinsic { id, ty, ret_ptype } => {
                        MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt {
                            intrinsic: id,
                            ty,
                            ret_ptype,
                            parts,
                        })
                    }
                }
            }
            StmtKind::Label(label) => fatal!("label {} inside a block body", label),
            StmtKind::Goto(target) if stmt.op == Opcode::Gosub => MeStmtKind::Gosub {
                target: *target,
                mu: MuList::new(),
            },
            StmtKind::Goto(target) => MeStmtKind::Goto(*target),
            StmtKind::CondGoto { cond, target } => MeStmtKind::CondGoto {
                cond: self.translate_expr(cond)?,
                target: *target,
            },
            StmtKind::Switch {
                opnd,
                default,
                cases,
            } => MeStmtKind::Switch(SwitchMeStmt {
                opnd: self.translate_expr(opnd)?,
                default: *default,
                cases: cases.clone(),
            }),
            StmtKind::Nary(opnds) if stmt.op == Opcode::Return => MeStmtKind::Return {
                opnds: self.translate_exprs(opnds)?,
                mu: MuList::new(),
            },
            StmtKind::Nary(opnds) => MeStmtKind::Sync {
                opnds: self.translate_exprs(opnds)?,
                effects: Default::default(),
            },
            StmtKind::Unary(opnd) if stmt.op == Opcode::Throw => MeStmtKind::Throw {
                opnd: self.translate_expr(opnd)?,
                mu: MuList::new(),
            },
            StmtKind::Unary(opnd) => MeStmtKind::Unary {
                opnd: self.translate_expr(opnd)?,
                decref_before_exit: false,
            },
            StmtKind::Assert { array, index } => MeStmtKind::Assert {
                opnds: [self.translate_expr(array)?, self.translate_expr(index)?],
            },
            StmtKind::Try(labels) => MeStmtKind::Try(labels.clone()),
            StmtKind::Catch(types) => MeStmtKind::Catch(types.clone()),
            StmtKind::Plain if stmt.op == Opcode::Retsub => MeStmtKind::Retsub(MuList::new()),
            StmtKind::Plain => MeStmtKind::Plain,
            StmtKind::Comment(text) => MeStmtKind::Comment(text.clone()),
        };

        let id = self
            .func
            .irmap_mut()
            .new_stmt(stmt.op, stmt.src_pos, kind);
        let mut defs = Vec::new();
        if let Some((ost, lhs)) = direct {
            self.func.irmap_mut().set_def(lhs, MeDefBy::Stmt(id));
            defs.push((ost, lhs));
        }
        for &ost in &fx.mu {
            let opnd = self.current(ost);
            self.func.irmap_mut().add_mu(id, opnd);
        }
        for &ost in &fx.chi {
            let rhs = self.current(ost);
            let lhs = self.new_def(ost);
            self.func.irmap_mut().add_chi(id, rhs, lhs);
            defs.push((ost, lhs));
        }
        for &ost in &fx.must_defs {
            let lhs = self.new_def(ost);
            self.func.irmap_mut().add_must_def(id, lhs);
            defs.push((ost, lhs));
        }
        Ok((id, defs))
    }

    /// Renames every block in dominator tree preorder.
    ///
    /// Versions pushed by a block stay on the stacks while its dominator subtree is renamed
    /// and are popped when the walk leaves it.
    fn rename_blocks(
        &mut self,
        entry: BbId,
        effects: &[StmtEffects],
        dom: &DominatorTree,
    ) -> Result<()> {
        let mut work = vec![RenameStep::Enter(entry)];
        while let Some(step) = work.pop() {
            match step {
                RenameStep::Enter(bb) => {
                    let pushed = self.rename_block(bb, effects)?;
                    work.push(RenameStep::Leave(pushed));
                    for &child in dom.children(node(bb)).iter().rev() {
                        work.push(RenameStep::Enter(bb_of(child)));
                    }
                }
                RenameStep::Leave(pushed) => {
                    for ost in pushed {
                        self.stacks[ost.index()].pop();
                    }
                }
            }
        }
        Ok(())
    }

    /// Renames the phis and statements of `bb` and fills the phi operands of its successors.
    /// Returns the symbols whose stacks got a new version.
    fn rename_block(&mut self, bb: BbId, effects: &[StmtEffects]) -> Result<Vec<OStIdx>> {
        let mut pushed: Vec<OStIdx> = Vec::new();

        let block = self.func.cfg().bb(bb);
        let phis: Vec<_> = block
            .var_phis
            .iter()
            .chain(&block.reg_phis)
            .map(|(&ost, &phi)| (ost, phi))
            .collect();
        for (ost, phi) in phis {
            let lhs = self.func.irmap().phi(phi).lhs();
            self.stacks[ost.index()].push(lhs);
            pushed.push(ost);
        }

        let body = self.block_body[bb.index()].clone();
        for index in body {
            self.func.irmap_mut().set_tree_id(index as u32);
            let (stmt, defs) = self.translate_stmt(index, &effects[index])?;
            self.func.add_stmt_last(bb, stmt);
            for (ost, lhs) in defs {
                self.stacks[ost.index()].push(lhs);
                pushed.push(ost);
            }
        }

        let mut succs = self.func.cfg().bb(bb).succs().to_vec();
        succs.dedup();
        for succ in succs {
            self.fill_phi_opnds(bb, succ);
        }
        Ok(pushed)
    }

    /// Sets the operands of `succ`'s phis that flow in from `pred`.
    fn fill_phi_opnds(&mut self, pred: BbId, succ: BbId) {
        let block = self.func.cfg().bb(succ);
        if !block.has_phis() {
            return;
        }
        let positions: Vec<usize> = block
            .preds()
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == pred)
            .map(|(j, _)| j)
            .collect();
        let phis: Vec<_> = block
            .var_phis
            .iter()
            .chain(&block.reg_phis)
            .map(|(&ost, &phi)| (ost, phi))
            .collect();

        for (ost, phi) in phis {
            let opnd = self.current(ost);
            let vst = match self.func.irmap().expr(opnd).vst() {
                Some(vst) => vst,
                None => fatal!("phi operand {} is not a version", opnd),
            };
            let (cfg, irmap, _) = self.func.parts_mut();
            for &j in &positions {
                irmap.phi_mut(phi).set_opnd(j, opnd);
                if let Some(version_phi) = cfg.bb_mut(succ).phi_list.get_mut(&ost) {
                    version_phi.opnds[j] = vst;
                }
            }
        }
    }
}
