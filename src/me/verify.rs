//! Structural consistency checks over a function in SSA form.
//!
//! Every check collects problems instead of stopping at the first one, so a single run reports
//! the full damage done by a broken transformation.

use crate::{
    me::{BbId, MeDefBy, MeExprKind, MeFunction},
    Error, Result,
};

/// Checks edge symmetry, statement lists, definition tags, chi and must-def ownership, phi
/// operand counts and, when built, the SCC overlay.
///
/// # Errors
///
/// Returns [`Error::Verification`] listing every problem found.
pub fn verify(func: &MeFunction) -> Result<()> {
    let mut problems = Vec::new();
    check_edges(func, &mut problems);
    check_stmt_lists(func, &mut problems);
    check_defs(func, &mut problems);
    check_alias_lists(func, &mut problems);
    check_phis(func, &mut problems);
    if let Some(sccs) = func.sccs() {
        if let Err(Error::Verification(more)) = sccs.verify(func.cfg()) {
            problems.extend(more);
        }
    }

    if problems.is_empty() {
        log::trace!("{}: verified", func.name());
        Ok(())
    } else {
        log::warn!("{}: {} verification problems", func.name(), problems.len());
        Err(Error::Verification(problems))
    }
}

fn count(list: &[BbId], bb: BbId) -> usize {
    list.iter().filter(|&&b| b == bb).count()
}

fn check_edges(func: &MeFunction, problems: &mut Vec<String>) {
    let cfg = func.cfg();
    for block in cfg.all_bbs() {
        let bb = block.id();
        if block.is_deleted() {
            if !block.preds().is_empty() || !block.succs().is_empty() {
                problems.push(format!("removed {bb} still has edges"));
            }
            continue;
        }
        for &succ in block.succs() {
            let other = cfg.bb(succ);
            if other.is_deleted() {
                problems.push(format!("{bb} has removed successor {succ}"));
            } else if count(other.preds(), bb) != count(block.succs(), succ) {
                problems.push(format!("{bb} -> {succ} is not mirrored in the predecessors"));
            }
        }
        for &pred in block.preds() {
            let other = cfg.bb(pred);
            if other.is_deleted() {
                problems.push(format!("{bb} has removed predecessor {pred}"));
            } else if count(other.succs(), bb) != count(block.preds(), pred) {
                problems.push(format!("{pred} -> {bb} is not mirrored in the successors"));
            }
        }
    }
}

fn check_stmt_lists(func: &MeFunction, problems: &mut Vec<String>) {
    let irmap = func.irmap();
    for &bb in func.cfg().layout() {
        let block = func.cfg().bb(bb);
        let mut prev = None;
        let mut cursor = block.first();
        let mut steps = 0usize;
        while let Some(stmt) = cursor {
            let node = irmap.stmt(stmt);
            if node.bb() != Some(bb) {
                problems.push(format!("{stmt} is linked into {bb} but owned by {:?}", node.bb()));
            }
            if node.prev() != prev {
                problems.push(format!("{stmt} in {bb} has a stale prev link"));
            }
            steps += 1;
            if steps > irmap.stmt_count() {
                problems.push(format!("statement list of {bb} is cyclic"));
                break;
            }
            prev = cursor;
            cursor = node.next();
        }
        if block.last() != prev {
            problems.push(format!("last statement of {bb} is stale"));
        }
    }
}

fn check_defs(func: &MeFunction, problems: &mut Vec<String>) {
    let irmap = func.irmap();

    for expr in irmap.exprs() {
        let id = expr.id();
        let Some(def) = expr.def_by() else {
            continue;
        };
        let lhs = match def {
            MeDefBy::No => continue,
            MeDefBy::Stmt(stmt) => irmap.stmt_lhs(stmt),
            MeDefBy::Phi(phi) => Some(irmap.phi(phi).lhs()),
            MeDefBy::Chi(chi) => Some(irmap.chi(chi).lhs()),
            MeDefBy::MustDef(must) => Some(irmap.must_def(must).lhs()),
        };
        if lhs != Some(id) {
            problems.push(format!("{id} claims {def:?} but that defines {lhs:?}"));
        }
        if matches!((def, expr.kind()), (MeDefBy::Chi(_), MeExprKind::Reg(_))) {
            problems.push(format!("register {id} is chi-defined"));
        }
    }

    let mut expect = |lhs, def: MeDefBy| {
        let found = irmap.expr(lhs).def_by();
        if found != Some(def) {
            problems.push(format!("{def:?} defines {lhs}, which claims {found:?}"));
        }
    };
    for stmt in irmap.stmts() {
        if let Some(lhs) = stmt.lhs() {
            expect(lhs, MeDefBy::Stmt(stmt.id()));
        }
    }
    for (id, phi) in irmap.phis() {
        expect(phi.lhs(), MeDefBy::Phi(id));
    }
    for (id, chi) in irmap.chis() {
        expect(chi.lhs(), MeDefBy::Chi(id));
    }
    for (id, must) in irmap.must_defs() {
        expect(must.lhs(), MeDefBy::MustDef(id));
    }
}

/// Every chi and must-def is listed by the statement it names as base, and every listed node
/// names the listing statement.
fn check_alias_lists(func: &MeFunction, problems: &mut Vec<String>) {
    let irmap = func.irmap();

    for (id, chi) in irmap.chis() {
        let base = chi.base();
        let listed = irmap
            .stmt(base)
            .chi_list()
            .is_some_and(|list| list.values().any(|&c| c == id));
        if !listed {
            problems.push(format!("{id} is missing from the chi list of {base}"));
        }
    }
    for (id, must) in irmap.must_defs() {
        let base = must.base();
        let listed = irmap
            .stmt(base)
            .must_def_list()
            .is_some_and(|list| list.contains(&id));
        if !listed {
            problems.push(format!("{id} is missing from the must-def list of {base}"));
        }
    }

    for stmt in irmap.stmts() {
        let owner = stmt.id();
        for (ost, &chi) in stmt.chi_list().into_iter().flatten() {
            let node = irmap.chi(chi);
            if node.base() != owner {
                problems.push(format!("{chi} is listed by {owner} but based on {}", node.base()));
            }
            if irmap.expr(node.lhs()).ost() != Some(*ost) {
                problems.push(format!(
                    "{chi} in {owner} is keyed by {ost} but defines another symbol"
                ));
            }
        }
        for &must in stmt.must_def_list().unwrap_or_default() {
            let base = irmap.must_def(must).base();
            if base != owner {
                problems.push(format!("{must} is listed by {owner} but based on {base}"));
            }
        }
    }
}

fn check_phis(func: &MeFunction, problems: &mut Vec<String>) {
    let irmap = func.irmap();
    for &bb in func.cfg().layout() {
        let block = func.cfg().bb(bb);
        let npreds = block.preds().len();
        for (ost, &phi) in block.var_phis.iter().chain(&block.reg_phis) {
            let node = irmap.phi(phi);
            if node.def_bb() != bb {
                problems.push(format!("{phi} is listed in {bb} but owned by {}", node.def_bb()));
            }
            if node.opnds().len() != npreds {
                problems.push(format!(
                    "{phi} in {bb} has {} operands for {} predecessors",
                    node.opnds().len(),
                    npreds
                ));
            }
            if irmap.expr(node.lhs()).ost() != Some(*ost) {
                problems.push(format!("{phi} in {bb} is keyed by {ost} but defines another symbol"));
            }
            match block.phi_list.get(ost) {
                Some(version) if version.opnds.len() == npreds => {}
                Some(_) => problems.push(format!("version phi of {ost} in {bb} has stale operands")),
                None => problems.push(format!("{phi} in {bb} has no version phi")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        me::{CallMeStmt, MeStmtKind},
        mir::{
            BaseNode, CallReturn, Callee, MirFunction, Opcode, PrimType, PuIdx, StmtKind,
            StmtNode, SymbolTable,
        },
        test::diamond_function,
        MeConfig,
    };

    #[test]
    fn test_built_function_verifies() {
        let (mir, _) = diamond_function();
        let func = MeFunction::build(&mir, &MeConfig::minimal()).unwrap();
        verify(&func).unwrap();
    }

    #[test]
    fn test_detects_stale_def_tag() {
        let (mir, vars) = diamond_function();
        let mut func = MeFunction::build(&mir, &MeConfig::minimal()).unwrap();
        let x = func.ssatab().find_symbol(vars.x, 0).unwrap();
        let join = func.cfg().layout()[3];
        let phi = func.cfg().bb(join).var_phis[&x];
        let first_arm = func.irmap().phi(phi).opnd(0);

        // Retag without going through set_def: the dassign still names the version.
        func.irmap_mut()
            .expr_mut(first_arm)
            .replace_def(MeDefBy::Phi(phi));
        let Err(Error::Verification(problems)) = verify(&func) else {
            panic!("stale definition not reported");
        };
        assert!(problems
            .iter()
            .any(|p| p.starts_with("Stmt(") && p.contains(&first_arm.to_string())));
        assert!(problems
            .iter()
            .any(|p| p.starts_with(&first_arm.to_string()) && p.contains("claims Phi(")));
    }

    #[test]
    fn test_verifies_after_moving_a_definition() {
        let (mir, vars) = diamond_function();
        let mut func = MeFunction::build(&mir, &MeConfig::minimal()).unwrap();
        let x = func.ssatab().find_symbol(vars.x, 0).unwrap();
        let join = func.cfg().layout()[3];
        let phi = func.cfg().bb(join).var_phis[&x];
        let first_arm = func.irmap().phi(phi).opnd(0);
        let Some(MeDefBy::Stmt(assign)) = func.irmap().expr(first_arm).def_by() else {
            panic!("first arm is not assigned");
        };

        // Give the dassign a fresh version and route it into the join.
        let (cfg, irmap, ssatab) = func.parts_mut();
        let vst = ssatab.new_version(x);
        let fresh = irmap.version_expr(ssatab, vst);
        assert_eq!(irmap.set_def(fresh, MeDefBy::Stmt(assign)), MeDefBy::No);
        assert_eq!(irmap.expr(first_arm).def_by(), Some(MeDefBy::No));
        assert_eq!(irmap.stmt(assign).lhs(), Some(fresh));

        irmap.phi_mut(phi).set_opnd(0, fresh);
        if let Some(version_phi) = cfg.bb_mut(join).phi_list.get_mut(&x) {
            version_phi.opnds[0] = vst;
        }

        verify(&func).unwrap();
    }

    /// ```text
    ///         callassigned f() { r }
    ///         call f()
    ///         return g, r
    /// ```
    fn two_calls() -> MeFunction {
        let mut symbols = SymbolTable::new();
        let g = symbols.declare_global("g", PrimType::I32);
        let r = symbols.declare_preg(PrimType::I32);
        let call = |op, rets| {
            StmtNode::new(
                op,
                StmtKind::Call {
                    callee: Callee::Direct(PuIdx::new(1)),
                    args: Vec::new(),
                    rets,
                },
            )
        };
        let body = vec![
            call(Opcode::Callassigned, vec![CallReturn::Reg(r)]),
            call(Opcode::Call, Vec::new()),
            StmtNode::ret(vec![
                BaseNode::dread(PrimType::I32, g),
                BaseNode::regread(PrimType::I32, r),
            ]),
        ];
        let mir = MirFunction::new("two_calls", symbols, body);
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        verify(&func).unwrap();
        func
    }

    #[test]
    fn test_detects_unlisted_must_def() {
        let mut func = two_calls();
        let entry = func.cfg().entry();
        let call = func.cfg().bb(entry).first().unwrap();
        let must = func.irmap().stmt(call).must_def_list().unwrap()[0];
        match func.irmap_mut().stmt_mut(call).kind_mut() {
            MeStmtKind::Call(CallMeStmt { parts, .. }) => parts.results.must_defs.clear(),
            other => panic!("unexpected statement {other:?}"),
        }

        let Err(Error::Verification(problems)) = verify(&func) else {
            panic!("unlisted must-def not reported");
        };
        assert_eq!(
            problems,
            vec![format!("{must} is missing from the must-def list of {call}")]
        );
    }

    #[test]
    fn test_detects_foreign_chi() {
        let mut func = two_calls();
        let entry = func.cfg().entry();
        let first = func.cfg().bb(entry).first().unwrap();
        let second = func.irmap().stmt(first).next().unwrap();

        // The second call lists the first call's chi in place of its own.
        let (&ost, &foreign) = func
            .irmap()
            .stmt(first)
            .chi_list()
            .unwrap()
            .iter()
            .next()
            .unwrap();
        let own = func.irmap().stmt(second).chi_list().unwrap()[&ost];
        func.irmap_mut()
            .stmt_mut(second)
            .chi_list_mut()
            .unwrap()
            .insert(ost, foreign);

        let Err(Error::Verification(problems)) = verify(&func) else {
            panic!("foreign chi not reported");
        };
        assert!(problems.contains(&format!("{own} is missing from the chi list of {second}")));
        assert!(
            problems.contains(&format!("{foreign} is listed by {second} but based on {first}"))
        );
    }

    #[test]
    fn test_detects_missing_phi_operand() {
        let (mir, vars) = diamond_function();
        let mut func = MeFunction::build(&mir, &MeConfig::minimal()).unwrap();
        let x = func.ssatab().find_symbol(vars.x, 0).unwrap();
        let join = func.cfg().layout()[3];
        func.cfg_mut().bb_mut(join).phi_list.get_mut(&x).unwrap().opnds.pop();

        let Err(Error::Verification(problems)) = verify(&func) else {
            panic!("stale version phi not reported");
        };
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("stale operands"));
    }
}
