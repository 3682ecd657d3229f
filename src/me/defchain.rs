//! Walking SSA definitions back to the statements that may have produced them.

use std::{collections::HashSet, fmt};

use crate::{
    me::{ChiList, MeDefBy, MeFunction, MeStmtKind, StmtId, VStIdx},
    MeConfig,
};

impl MeFunction {
    /// Finds the chi list of the statement that may-defines `vst`.
    ///
    /// Phi definitions are followed through their operands, depth first and in operand order,
    /// until a chi definition turns up. One visited set is shared by the whole walk, so phi cycles
    /// through loop headers terminate and every phi is expanded at most once.
    ///
    /// Returns `None` for entry versions, for versions assigned by an ordinary statement or a
    /// call return, and when no phi path reaches a chi.
    #[must_use]
    pub fn resolve_may_defs(&self, vst: VStIdx) -> Option<&ChiList> {
        let mut visited = HashSet::new();
        self.resolve_may_defs_from(vst, &mut visited)
    }

    fn resolve_may_defs_from(
        &self,
        vst: VStIdx,
        visited: &mut HashSet<VStIdx>,
    ) -> Option<&ChiList> {
        let irmap = self.irmap();
        let mut pending = vec![vst];
        while let Some(vst) = pending.pop() {
            if !visited.insert(vst) {
                continue;
            }
            let Some(expr) = irmap.find_version_expr(vst) else {
                continue;
            };
            match irmap.expr(expr).def_by() {
                Some(MeDefBy::Chi(chi)) => return irmap.stmt(irmap.chi(chi).base()).chi_list(),
                Some(MeDefBy::Phi(phi)) => pending.extend(
                    irmap
                        .phi(phi)
                        .opnds()
                        .iter()
                        .rev()
                        .filter_map(|&opnd| irmap.expr(opnd).vst()),
                ),
                _ => {}
            }
        }
        None
    }

    /// Renders the SSA-only parts of `stmt`: its mu, chi and must-def lists, each on its own
    /// indented line. Statements without such lists render as the empty string.
    #[must_use]
    pub fn ssa_parts(&self, stmt: StmtId, config: &MeConfig) -> String {
        SsaParts {
            func: self,
            stmt,
            config,
        }
        .to_string()
    }

    pub(super) fn write_ssa_parts(
        &self,
        out: &mut impl fmt::Write,
        stmt: StmtId,
        config: &MeConfig,
    ) -> fmt::Result {
        let irmap = self.irmap();
        let node = irmap.stmt(stmt);
        let name = |expr| self.expr_name(expr, config);

        let (mu, chi) = match node.kind() {
            MeStmtKind::Dassign(_)
            | MeStmtKind::Maydassign(_)
            | MeStmtKind::Iassign(_) => (None, node.chi_list()),
            MeStmtKind::Call(_)
            | MeStmtKind::Icall(_)
            | MeStmtKind::Intrinsiccall(_)
            | MeStmtKind::Sync { .. } => (node.mu_list(), node.chi_list()),
            MeStmtKind::Return { .. }
            | MeStmtKind::Throw { .. }
            | MeStmtKind::Gosub { .. }
            | MeStmtKind::Retsub(_) => (node.mu_list(), None),
            _ => (None, None),
        };

        if let Some(mu) = mu.filter(|mu| !mu.is_empty()) {
            let items: Vec<String> = mu.values().map(|&e| name(e)).collect();
            writeln!(out, "    mu: {}", items.join(" "))?;
        }
        if let Some(chi) = chi.filter(|chi| !chi.is_empty()) {
            let items: Vec<String> = chi
                .values()
                .map(|&c| {
                    let node = irmap.chi(c);
                    format!("{} = chi({})", name(node.lhs()), name(node.rhs()))
                })
                .collect();
            writeln!(out, "    chi: {}", items.join(", "))?;
        }
        if let Some(must_defs) = node.must_def_list().filter(|list| !list.is_empty()) {
            let items: Vec<String> = must_defs
                .iter()
                .map(|&m| name(irmap.must_def(m).lhs()))
                .collect();
            writeln!(out, "    mustdef: {}", items.join(" "))?;
        }
        Ok(())
    }
}

struct SsaParts<'a> {
    func: &'a MeFunction,
    stmt: StmtId,
    config: &'a MeConfig,
}

impl fmt::Display for SsaParts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.func.write_ssa_parts(f, self.stmt, self.config)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        me::MeFunction,
        mir::{
            BaseNode, CallReturn, Callee, LabelIdx, MirFunction, Opcode, PrimType, PuIdx,
            StmtKind, StmtNode, SymbolTable,
        },
        test::counting_loop,
        MeConfig,
    };

    /// ```text
    ///         brfalse c, @L1
    ///         call f()
    ///         goto @L2
    /// @L1:    g = 4
    /// @L2:    return g
    /// ```
    fn call_on_one_arm() -> MirFunction {
        let mut symbols = SymbolTable::new();
        let c = symbols.declare_formal("c", PrimType::I32);
        let g = symbols.declare_global("g", PrimType::I32);
        let r = symbols.declare_preg(PrimType::I32);
        let (l1, l2) = (LabelIdx::new(1), LabelIdx::new(2));
        let body = vec![
            StmtNode::cond_goto(Opcode::Brfalse, BaseNode::dread(PrimType::I32, c), l1),
            StmtNode::new(
                Opcode::Callassigned,
                StmtKind::Call {
                    callee: Callee::Direct(PuIdx::new(1)),
                    args: Vec::new(),
                    rets: vec![CallReturn::Reg(r)],
                },
            ),
            StmtNode::goto(l2),
            StmtNode::label(l1),
            StmtNode::dassign(g, BaseNode::int(PrimType::I32, 4)),
            StmtNode::label(l2),
            StmtNode::ret(vec![BaseNode::dread(PrimType::I32, g)]),
        ];
        MirFunction::new("one_arm", symbols, body)
    }

    #[test]
    fn test_resolve_through_phi() {
        let mir = call_on_one_arm();
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        let irmap = func.irmap();
        let g = func.ssatab().find_symbol(mir.symbols.lookup("g").unwrap(), 0).unwrap();

        let join = *func.cfg().layout().last().unwrap();
        let phi = irmap.phi(func.cfg().bb(join).var_phis[&g]);
        let merged = irmap.expr(phi.lhs()).vst().unwrap();

        let call_bb = func.cfg().layout()[1];
        let call = func.cfg().bb(call_bb).first().unwrap();
        let chi = func.resolve_may_defs(merged).unwrap();
        assert!(std::ptr::eq(chi, irmap.stmt(call).chi_list().unwrap()));
    }

    #[test]
    fn test_resolve_stops_at_plain_defs() {
        let (mir, i) = counting_loop();
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        let i = func.ssatab().find_symbol(i, 0).unwrap();

        for &vst in func.ssatab().ost(i).versions() {
            assert!(func.resolve_may_defs(vst).is_none());
        }
    }

    #[test]
    fn test_phi_cycle_terminates() {
        let (mir, i) = counting_loop();
        let mut func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        let i = func.ssatab().find_symbol(i, 0).unwrap();
        let head = func.label_bb(LabelIdx::new(1)).unwrap();
        let phi = func.cfg().bb(head).var_phis[&i];

        // Feed the phi its own result on both edges.
        let lhs = func.irmap().phi(phi).lhs();
        func.irmap_mut().phi_mut(phi).set_opnd(0, lhs);
        func.irmap_mut().phi_mut(phi).set_opnd(1, lhs);

        let vst = func.irmap().expr(lhs).vst().unwrap();
        assert!(func.resolve_may_defs(vst).is_none());
    }

    #[test]
    fn test_ssa_parts() {
        let mir = call_on_one_arm();
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        let call_bb = func.cfg().layout()[1];
        let call = func.cfg().bb(call_bb).first().unwrap();

        let text = func.ssa_parts(call, &MeConfig::default());
        assert!(text.contains("mu: "));
        assert!(text.contains(" = chi(g_0)"));
        assert!(text.contains("mustdef: %"));

        let goto = func.cfg().bb(call_bb).last().unwrap();
        assert!(func.ssa_parts(goto, &MeConfig::default()).is_empty());
    }
}
