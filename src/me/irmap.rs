//! The node store of one function's SSA form.
//!
//! [`IrMap`] owns the arenas of expressions, statements, phis, chis and must-defs, creates every
//! node, and is the only place where the definition of a version changes ([`IrMap::set_def`]).
//! Handles returned by one map are only meaningful for that map.

use crate::{
    me::{
        BbId, ChiId, ChiMeNode, ExprId, HashConsTable, MeDefBy, MeExpr, MeExprKind, MePhiNode, MeStmt,
        MeStmtKind, MustDefId, MustDefMeNode, OStIdx, OstKind, PhiId, RegMeExpr, SsaTab, StmtId,
        VStIdx, VarMeExpr,
    },
    mir::{ConstValue, Opcode, PrimType, SrcPosition},
    utils::Arena,
};

/// Arenas and hash-consing table of a function.
#[derive(Debug, Default)]
pub struct IrMap {
    exprs: Arena<MeExpr, ExprId>,
    stmts: Arena<MeStmt, StmtId>,
    phis: Arena<MePhiNode, PhiId>,
    chis: Arena<ChiMeNode, ChiId>,
    must_defs: Arena<MustDefMeNode, MustDefId>,
    table: HashConsTable,
    vst_exprs: Vec<Option<ExprId>>,
    tree_id: u32,
    cons_hits: usize,
}

impl IrMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expression at `id`.
    #[must_use]
    pub fn expr(&self, id: ExprId) -> &MeExpr {
        &self.exprs[id]
    }

    /// Mutable expression at `id`.
    ///
    /// Only fields that do not take part in hashing or definitions are reachable through it.
    pub fn expr_mut(&mut self, id: ExprId) -> &mut MeExpr {
        &mut self.exprs[id]
    }

    /// Statement at `id`.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &MeStmt {
        &self.stmts[id]
    }

    /// Mutable statement at `id`.
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut MeStmt {
        &mut self.stmts[id]
    }

    /// Phi at `id`.
    #[must_use]
    pub fn phi(&self, id: PhiId) -> &MePhiNode {
        &self.phis[id]
    }

    /// Mutable phi at `id`.
    pub fn phi_mut(&mut self, id: PhiId) -> &mut MePhiNode {
        &mut self.phis[id]
    }

    /// Chi at `id`.
    #[must_use]
    pub fn chi(&self, id: ChiId) -> &ChiMeNode {
        &self.chis[id]
    }

    /// Mutable chi at `id`.
    pub fn chi_mut(&mut self, id: ChiId) -> &mut ChiMeNode {
        &mut self.chis[id]
    }

    /// Must-def at `id`.
    #[must_use]
    pub fn must_def(&self, id: MustDefId) -> &MustDefMeNode {
        &self.must_defs[id]
    }

    /// Mutable must-def at `id`.
    pub fn must_def_mut(&mut self, id: MustDefId) -> &mut MustDefMeNode {
        &mut self.must_defs[id]
    }

    /// Every expression.
    pub fn exprs(&self) -> impl Iterator<Item = &MeExpr> {
        self.exprs.iter().map(|(_, e)| e)
    }

    /// Every statement, attached or not.
    pub fn stmts(&self) -> impl Iterator<Item = &MeStmt> {
        self.stmts.iter().map(|(_, s)| s)
    }

    /// Every phi with its id.
    pub fn phis(&self) -> impl Iterator<Item = (PhiId, &MePhiNode)> {
        self.phis.iter()
    }

    /// Every chi with its id.
    pub fn chis(&self) -> impl Iterator<Item = (ChiId, &ChiMeNode)> {
        self.chis.iter()
    }

    /// Every must-def with its id.
    pub fn must_defs(&self) -> impl Iterator<Item = (MustDefId, &MustDefMeNode)> {
        self.must_defs.iter()
    }

    /// Number of expressions.
    #[must_use]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Number of statements.
    #[must_use]
    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    /// Number of phis.
    #[must_use]
    pub fn phi_count(&self) -> usize {
        self.phis.len()
    }

    /// Number of expression requests answered from the consing table.
    #[must_use]
    pub fn cons_hits(&self) -> usize {
        self.cons_hits
    }

    /// The consing table.
    #[must_use]
    pub fn cons_table(&self) -> &HashConsTable {
        &self.table
    }

    /// Sets the tree id stamped on expressions created from now on.
    pub fn set_tree_id(&mut self, tree_id: u32) {
        self.tree_id = tree_id;
    }

    /// Expression of a version, if one was created.
    #[must_use]
    pub fn find_version_expr(&self, vst: VStIdx) -> Option<ExprId> {
        self.vst_exprs.get(vst.index()).copied().flatten()
    }

    /// The one expression standing for version `vst`, created on first request.
    pub fn version_expr(&mut self, ssatab: &SsaTab, vst: VStIdx) -> ExprId {
        if let Some(id) = self.find_version_expr(vst) {
            return id;
        }
        let ost_idx = ssatab.ost_of(vst);
        let ost = ssatab.ost(ost_idx);
        let (op, kind) = match ost.kind {
            OstKind::Symbol { field_id, .. } => (
                Opcode::Dread,
                MeExprKind::Var(VarMeExpr::new(ost_idx, vst, field_id)),
            ),
            OstKind::Heap => (
                Opcode::Dread,
                MeExprKind::Var(VarMeExpr::new(ost_idx, vst, 0)),
            ),
            OstKind::Preg(preg) => (
                Opcode::Regread,
                MeExprKind::Reg(RegMeExpr::new(ost_idx, vst, preg)),
            ),
        };
        let ptype = ost.ptype;
        let tree_id = self.tree_id;
        let id = self.exprs.alloc_with(|id| {
            let mut expr = MeExpr::new(id, op, ptype, kind);
            expr.set_tree_id(tree_id);
            expr
        });
        if self.vst_exprs.len() <= vst.index() {
            self.vst_exprs.resize(vst.index() + 1, None);
        }
        self.vst_exprs[vst.index()] = Some(id);
        log::trace!("{} stands for {}", id, vst);
        id
    }

    /// Returns `true` if building `candidate` through the consing table may reuse a node.
    ///
    /// Indirect loads, allocations, impure intrinsics and anything with an indirect load below
    /// it are never shared.
    fn is_consable(&self, candidate: &MeExpr) -> bool {
        candidate.pure() && !candidate.opnds().iter().any(|&o| self.has_ivar(o))
    }

    /// Creates a non-version expression, reusing an identical pure one when it exists.
    pub fn create_expr(&mut self, op: Opcode, ptype: PrimType, kind: MeExprKind) -> ExprId {
        check_fatal!(
            !matches!(kind, MeExprKind::Var(_) | MeExprKind::Reg(_)),
            "versions are created through version_expr, not {}",
            op
        );
        if let MeExprKind::Op(inner) = &kind {
            check_fatal!(
                (1..=3).contains(&inner.opnds.len()),
                "{} with {} operands",
                op,
                inner.opnds.len()
            );
        }

        let mut candidate = MeExpr::new(self.exprs.next_id(), op, ptype, kind);
        let consable = self.is_consable(&candidate);
        if consable {
            if let Some(found) = self.table.lookup(&candidate, &self.exprs) {
                self.cons_hits += 1;
                return found;
            }
        }

        let depth = candidate
            .opnds()
            .iter()
            .map(|&o| self.exprs[o].depth())
            .max()
            .map_or(0, |d| d.saturating_add(1));
        candidate.set_depth(depth);
        candidate.set_tree_id(self.tree_id);
        let id = self.exprs.alloc(candidate);
        if consable {
            self.table.insert(id, &mut self.exprs);
        }
        id
    }

    /// Integer constant.
    pub fn int_const(&mut self, ptype: PrimType, value: i64) -> ExprId {
        self.create_expr(
            Opcode::Constval,
            ptype,
            MeExprKind::Const(ConstValue::Int(value)),
        )
    }

    /// Creates a detached statement.
    pub fn new_stmt(&mut self, op: Opcode, src_pos: SrcPosition, kind: MeStmtKind) -> StmtId {
        self.stmts
            .alloc_with(|id| MeStmt::new(id, op, src_pos, kind))
    }

    /// Creates a phi defining `lhs` in `def_bb`.
    pub fn new_phi(&mut self, lhs: ExprId, def_bb: BbId, opnds: Vec<ExprId>) -> PhiId {
        let id = self.phis.alloc(MePhiNode::new(lhs, def_bb, opnds));
        self.set_def(lhs, MeDefBy::Phi(id));
        id
    }

    /// Adds a may-def of `lhs`'s symbol to `stmt`, consuming `rhs`.
    ///
    /// Fatal if the statement has no chi list or `lhs` is a register.
    pub fn add_chi(&mut self, stmt: StmtId, rhs: ExprId, lhs: ExprId) -> ChiId {
        let ost = self.ost_of(lhs);
        check_fatal!(
            self.stmts[stmt].chi_list().is_some(),
            "{} {} has no chi list",
            self.stmts[stmt].op(),
            stmt
        );
        let id = self.chis.alloc(ChiMeNode::new(rhs, lhs, stmt));
        self.set_def(lhs, MeDefBy::Chi(id));
        if let Some(chi) = self.stmts[stmt].chi_list_mut() {
            chi.insert(ost, id);
        }
        id
    }

    /// Adds a must-def of `lhs` as the next return value of call `stmt`.
    pub fn add_must_def(&mut self, stmt: StmtId, lhs: ExprId) -> MustDefId {
        check_fatal!(
            self.stmts[stmt].must_def_list().is_some(),
            "{} {} has no must-def list",
            self.stmts[stmt].op(),
            stmt
        );
        let id = self.must_defs.alloc(MustDefMeNode::new(lhs, stmt));
        self.set_def(lhs, MeDefBy::MustDef(id));
        if let Some(list) = self.stmts[stmt].must_def_list_mut() {
            list.push(id);
        }
        id
    }

    /// Adds a may-use of `opnd`'s symbol to `stmt`. Fatal if the statement has no mu list.
    pub fn add_mu(&mut self, stmt: StmtId, opnd: ExprId) {
        let ost = self.ost_of(opnd);
        let op = self.stmts[stmt].op();
        match self.stmts[stmt].mu_list_mut() {
            Some(mu) => {
                mu.insert(ost, opnd);
            }
            None => fatal!("{} {} has no mu list", op, stmt),
        }
    }

    fn ost_of(&self, expr: ExprId) -> OStIdx {
        match self.exprs[expr].ost() {
            Some(ost) => ost,
            None => fatal!("{} is not a version", expr),
        }
    }

    /// Makes `def` the definition of version `expr` and returns the one it replaces.
    ///
    /// In one step this retags the expression, points it at the defining node and makes that
    /// node's `lhs` name `expr`. A version the defining node previously produced is reset to
    /// [`MeDefBy::No`], so every node defines exactly one version.
    ///
    /// Fatal if `expr` is not a version, if a register is given a chi, if a statement cannot
    /// define `expr`, or if the node currently defining `expr` still names it as its `lhs`. To
    /// move a definition, first point the old node at another version, which resets `expr` to
    /// [`MeDefBy::No`].
    pub fn set_def(&mut self, expr: ExprId, def: MeDefBy) -> MeDefBy {
        let is_reg = match self.exprs[expr].kind() {
            MeExprKind::Var(_) => false,
            MeExprKind::Reg(_) => true,
            _ => fatal!("{} {} is not a version", self.exprs[expr].op(), expr),
        };
        if let Some(current) = self.exprs[expr].def_by().filter(|&d| d != def) {
            check_fatal!(
                self.definer_lhs(current) != Some(expr),
                "{} is still the lhs of {:?}",
                expr,
                current
            );
        }

        let displaced = match def {
            MeDefBy::No => None,
            MeDefBy::Stmt(s) => {
                let stmt = &mut self.stmts[s];
                let fits = match stmt.kind() {
                    MeStmtKind::Dassign(_) => !is_reg,
                    MeStmtKind::Regassign(_) => is_reg,
                    _ => false,
                };
                check_fatal!(fits, "{} {} cannot define {}", stmt.op(), s, expr);
                let old = stmt.lhs();
                stmt.set_lhs(expr);
                old
            }
            MeDefBy::Phi(p) => {
                let old = self.phis[p].lhs();
                self.phis[p].set_lhs(expr);
                Some(old)
            }
            MeDefBy::Chi(c) => {
                check_fatal!(!is_reg, "register {} cannot be chi-defined", expr);
                let old = self.chis[c].lhs();
                self.chis[c].set_lhs(expr);
                Some(old)
            }
            MeDefBy::MustDef(m) => {
                let old = self.must_defs[m].lhs();
                self.must_defs[m].set_lhs(expr);
                Some(old)
            }
        };

        if let Some(old) = displaced.filter(|&old| old != expr) {
            if self.exprs[old].def_by() == Some(def) {
                self.exprs[old].replace_def(MeDefBy::No);
            }
        }
        let previous = self.exprs[expr].replace_def(def);
        log::trace!("{} defined by {:?}, was {:?}", expr, def, previous);
        previous
    }

    /// The version the node named by `def` currently produces.
    fn definer_lhs(&self, def: MeDefBy) -> Option<ExprId> {
        match def {
            MeDefBy::No => None,
            MeDefBy::Stmt(s) => self.stmts[s].lhs(),
            MeDefBy::Phi(p) => Some(self.phis[p].lhs()),
            MeDefBy::Chi(c) => Some(self.chis[c].lhs()),
            MeDefBy::MustDef(m) => Some(self.must_defs[m].lhs()),
        }
    }

    /// Version defined by an assignment: the direct lhs, or for `maydassign` the lhs of the
    /// target's chi.
    #[must_use]
    pub fn stmt_lhs(&self, stmt: StmtId) -> Option<ExprId> {
        let s = &self.stmts[stmt];
        match s.kind() {
            MeStmtKind::Maydassign(may) => may
                .chi
                .get(&may.may_def_ost)
                .map(|&chi| self.chis[chi].lhs()),
            _ => s.lhs(),
        }
    }

    /// The version a statement assigns: [`IrMap::stmt_lhs`] for assignments, the first return
    /// value for assigned calls.
    #[must_use]
    pub fn assigned_lhs(&self, stmt: StmtId) -> Option<ExprId> {
        match self.stmts[stmt].must_def_list() {
            Some(list) => list.first().map(|&m| self.must_defs[m].lhs()),
            None => self.stmt_lhs(stmt),
        }
    }

    /// Returns `true` if `a` and `b` read the same symbols in the same shape: versions compare
    /// by original symbol, composite nodes by opcode and operands, everything else by id.
    #[must_use]
    pub fn is_use_same_symbol(&self, a: ExprId, b: ExprId) -> bool {
        let (ea, eb) = (&self.exprs[a], &self.exprs[b]);
        match (ea.kind(), eb.kind()) {
            (MeExprKind::Var(_), MeExprKind::Var(_)) | (MeExprKind::Reg(_), MeExprKind::Reg(_)) => {
                ea.ost() == eb.ost()
            }
            (MeExprKind::Op(_), MeExprKind::Op(_))
            | (MeExprKind::Nary(_), MeExprKind::Nary(_))
            | (MeExprKind::Ivar(_), MeExprKind::Ivar(_)) => {
                ea.op() == eb.op()
                    && ea.num_opnds() == eb.num_opnds()
                    && ea
                        .opnds()
                        .iter()
                        .zip(eb.opnds())
                        .all(|(&x, &y)| self.is_use_same_symbol(x, y))
            }
            _ => a == b,
        }
    }

    /// Returns `true` if `expr` is or contains an indirect load.
    #[must_use]
    pub fn has_ivar(&self, expr: ExprId) -> bool {
        let e = &self.exprs[expr];
        matches!(e.kind(), MeExprKind::Ivar(_)) || e.opnds().iter().any(|&o| self.has_ivar(o))
    }

    /// Returns `true` if a version of `ost` occurs in `expr`.
    #[must_use]
    pub fn sym_appears(&self, expr: ExprId, ost: OStIdx) -> bool {
        self.find_sym_appearance(expr, ost).is_some()
    }

    /// First version of `ost` found in `expr`, operands left to right.
    #[must_use]
    pub fn find_sym_appearance(&self, expr: ExprId, ost: OStIdx) -> Option<ExprId> {
        let e = &self.exprs[expr];
        if e.ost() == Some(ost) {
            return Some(expr);
        }
        e.opnds()
            .iter()
            .find_map(|&o| self.find_sym_appearance(o, ost))
    }

    /// Returns `true` if `a` and `b` have the same operand handles in the same order.
    #[must_use]
    pub fn is_all_opnds_identical(&self, a: ExprId, b: ExprId) -> bool {
        self.exprs[a].opnds() == self.exprs[b].opnds()
    }

    /// Returns `true` if some indirect load in `expr` carries a may-use.
    #[must_use]
    pub fn has_may_use_opnd(&self, expr: ExprId) -> bool {
        let e = &self.exprs[expr];
        if e.as_ivar().is_some_and(|ivar| ivar.mu.is_some()) {
            return true;
        }
        e.opnds().iter().any(|&o| self.has_may_use_opnd(o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        me::{DassignMeStmt, IvarMeExpr, OpMeExpr, RegassignMeStmt},
        mir::{PrimType, SymbolTable, TyIdx},
    };

    struct Fixture {
        ssatab: SsaTab,
        irmap: IrMap,
        a: OStIdx,
        p: OStIdx,
    }

    fn fixture() -> Fixture {
        let mut symbols = SymbolTable::new();
        let a = symbols.declare_local("a", PrimType::I32);
        let p = symbols.declare_preg(PrimType::I32);
        let ssatab = SsaTab::from_symbols(&symbols);
        let a = ssatab.find_symbol(a, 0).unwrap();
        let p = ssatab.find_preg(p).unwrap();
        Fixture {
            ssatab,
            irmap: IrMap::new(),
            a,
            p,
        }
    }

    fn binary(irmap: &mut IrMap, op: Opcode, x: ExprId, y: ExprId) -> ExprId {
        irmap.create_expr(
            op,
            PrimType::I32,
            MeExprKind::Op(OpMeExpr {
                opnds: vec![x, y],
                opnd_type: PrimType::I32,
                ty: TyIdx::new(0),
                field_id: 0,
                bits_offset: 0,
                bits_size: 0,
            }),
        )
    }

    fn ivar(irmap: &mut IrMap, base: ExprId) -> ExprId {
        irmap.create_expr(
            Opcode::Iread,
            PrimType::I32,
            MeExprKind::Ivar(IvarMeExpr {
                base,
                ty: TyIdx::new(1),
                field_id: 0,
                mu: None,
                maybe_null: true,
            }),
        )
    }

    fn dassign(irmap: &mut IrMap, lhs: ExprId, rhs: ExprId) -> StmtId {
        irmap.new_stmt(
            Opcode::Dassign,
            SrcPosition::default(),
            MeStmtKind::Dassign(DassignMeStmt {
                lhs,
                rhs,
                chi: Default::default(),
                rc: Default::default(),
                propagated: false,
            }),
        )
    }

    #[test]
    fn test_one_expr_per_version() {
        let Fixture {
            mut ssatab,
            mut irmap,
            a,
            ..
        } = fixture();
        let v1 = ssatab.new_version(a);
        let x = irmap.version_expr(&ssatab, v1);
        assert_eq!(irmap.version_expr(&ssatab, v1), x);
        assert_eq!(irmap.find_version_expr(v1), Some(x));
        assert_eq!(irmap.expr(x).def_by(), Some(MeDefBy::No));
    }

    #[test]
    fn test_consing_shares_pure_nodes() {
        let Fixture {
            ssatab,
            mut irmap,
            a,
            ..
        } = fixture();
        let x = irmap.version_expr(&ssatab, ssatab.zero_version(a));
        let one = irmap.int_const(PrimType::I32, 1);
        assert_eq!(irmap.int_const(PrimType::I32, 1), one);

        let s1 = binary(&mut irmap, Opcode::Add, x, one);
        let s2 = binary(&mut irmap, Opcode::Add, x, one);
        assert_eq!(s1, s2);
        assert_eq!(irmap.expr(s1).depth(), 1);
        assert!(irmap.cons_hits() >= 2);
    }

    #[test]
    fn test_ivar_never_consed() {
        let Fixture {
            ssatab,
            mut irmap,
            a,
            ..
        } = fixture();
        let x = irmap.version_expr(&ssatab, ssatab.zero_version(a));
        let l1 = ivar(&mut irmap, x);
        let l2 = ivar(&mut irmap, x);
        assert_ne!(l1, l2);

        let one = irmap.int_const(PrimType::I32, 1);
        let w1 = binary(&mut irmap, Opcode::Add, l1, one);
        let w2 = binary(&mut irmap, Opcode::Add, l1, one);
        assert_ne!(w1, w2);
        assert!(irmap.has_ivar(w1));
        assert!(irmap.is_all_opnds_identical(w1, w2));
        assert!(irmap.is_use_same_symbol(w1, w2));
    }

    #[test]
    fn test_set_def_is_atomic() {
        let Fixture {
            mut ssatab,
            mut irmap,
            a,
            ..
        } = fixture();
        let v1 = ssatab.new_version(a);
        let v2 = ssatab.new_version(a);
        let x1 = irmap.version_expr(&ssatab, v1);
        let x2 = irmap.version_expr(&ssatab, v2);
        let one = irmap.int_const(PrimType::I32, 1);

        let s = dassign(&mut irmap, x1, one);
        assert_eq!(irmap.set_def(x1, MeDefBy::Stmt(s)), MeDefBy::No);
        assert_eq!(irmap.stmt(s).lhs(), Some(x1));

        // Re-pointing the statement at x2 leaves x1 undefined.
        assert_eq!(irmap.set_def(x2, MeDefBy::Stmt(s)), MeDefBy::No);
        assert_eq!(irmap.stmt(s).lhs(), Some(x2));
        assert_eq!(irmap.expr(x1).def_by(), Some(MeDefBy::No));
        assert_eq!(irmap.expr(x2).def_by(), Some(MeDefBy::Stmt(s)));
    }

    #[test]
    #[should_panic(expected = "is still the lhs of")]
    fn test_untagging_a_named_version_is_fatal() {
        let Fixture {
            mut ssatab,
            mut irmap,
            a,
            ..
        } = fixture();
        let v = ssatab.new_version(a);
        let x = irmap.version_expr(&ssatab, v);
        let one = irmap.int_const(PrimType::I32, 1);
        let s = dassign(&mut irmap, x, one);
        irmap.set_def(x, MeDefBy::Stmt(s));

        irmap.set_def(x, MeDefBy::No);
    }

    #[test]
    #[should_panic(expected = "is still the lhs of")]
    fn test_second_definer_is_fatal() {
        let Fixture {
            mut ssatab,
            mut irmap,
            a,
            ..
        } = fixture();
        let v = ssatab.new_version(a);
        let x = irmap.version_expr(&ssatab, v);
        let one = irmap.int_const(PrimType::I32, 1);
        let first = dassign(&mut irmap, x, one);
        let second = dassign(&mut irmap, x, one);
        irmap.set_def(x, MeDefBy::Stmt(first));

        irmap.set_def(x, MeDefBy::Stmt(second));
    }

    #[test]
    #[should_panic(expected = "cannot be chi-defined")]
    fn test_register_chi_is_fatal() {
        let Fixture {
            mut ssatab,
            mut irmap,
            p,
            ..
        } = fixture();
        let v = ssatab.new_version(p);
        let r = irmap.version_expr(&ssatab, v);
        let zero = irmap.version_expr(&ssatab, ssatab.zero_version(p));
        let one = irmap.int_const(PrimType::I32, 1);
        let s = irmap.new_stmt(
            Opcode::Regassign,
            SrcPosition::default(),
            MeStmtKind::Regassign(RegassignMeStmt {
                lhs: r,
                rhs: one,
                rc: Default::default(),
            }),
        );
        let chi = irmap.chis.alloc(ChiMeNode::new(zero, r, s));
        irmap.set_def(r, MeDefBy::Chi(chi));
    }

    #[test]
    #[should_panic(expected = "cannot define")]
    fn test_var_by_regassign_is_fatal() {
        let Fixture {
            mut ssatab,
            mut irmap,
            a,
            p,
        } = fixture();
        let (va, vp) = (ssatab.new_version(a), ssatab.new_version(p));
        let x = irmap.version_expr(&ssatab, va);
        let r = irmap.version_expr(&ssatab, vp);
        let one = irmap.int_const(PrimType::I32, 1);
        let s = irmap.new_stmt(
            Opcode::Regassign,
            SrcPosition::default(),
            MeStmtKind::Regassign(RegassignMeStmt {
                lhs: r,
                rhs: one,
                rc: Default::default(),
            }),
        );
        irmap.set_def(x, MeDefBy::Stmt(s));
    }

    #[test]
    fn test_symbol_queries() {
        let Fixture {
            ssatab,
            mut irmap,
            a,
            p,
        } = fixture();
        let x = irmap.version_expr(&ssatab, ssatab.zero_version(a));
        let r = irmap.version_expr(&ssatab, ssatab.zero_version(p));
        let one = irmap.int_const(PrimType::I32, 1);
        let sum = binary(&mut irmap, Opcode::Add, one, x);
        let load = ivar(&mut irmap, sum);

        assert!(irmap.sym_appears(load, a));
        assert!(!irmap.sym_appears(load, p));
        assert_eq!(irmap.find_sym_appearance(load, a), Some(x));
        assert!(!irmap.is_use_same_symbol(x, r));
        assert!(!irmap.has_may_use_opnd(load));
    }
}
