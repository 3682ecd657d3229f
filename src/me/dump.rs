//! Textual rendering of a function in SSA form.
//!
//! The layout follows the usual middle-end dump: one header per block with its kind, edges and
//! attributes, then the block's phis and statements. Versions print as `name_version`, or as raw
//! version indices with [`MeConfig::dump_vsym_num`]. [`MeConfig::simple_dump`] drops block
//! attributes and the chi/mu/must-def lines.

use std::fmt::{self, Write};

use crate::{
    me::{BbId, ExprId, MeExprKind, MeFunction, MeStmtKind, StmtId},
    MeConfig,
};

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>, sep: &str) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

impl MeFunction {
    /// Short name of an expression: the version name for variables and registers, the full
    /// rendering otherwise.
    #[must_use]
    pub fn expr_name(&self, expr: ExprId, config: &MeConfig) -> String {
        match self.irmap().expr(expr).vst() {
            Some(vst) => self.ssatab().version_name(vst, config.dump_vsym_num),
            None => self.expr_text(expr, config),
        }
    }

    /// Renders the expression tree rooted at `expr`.
    #[must_use]
    pub fn expr_text(&self, expr: ExprId, config: &MeConfig) -> String {
        let node = self.irmap().expr(expr);
        let (op, ptype) = (node.op(), node.ptype());
        let opnds = |ids: &[ExprId]| join(ids.iter().map(|&e| self.expr_name(e, config)), ", ");
        match node.kind() {
            MeExprKind::Var(_) | MeExprKind::Reg(_) => self.expr_name(expr, config),
            MeExprKind::Const(value) => format!("{op} {ptype} {value}"),
            MeExprKind::Conststr(idx) => format!("{op} {ptype} {idx}"),
            MeExprKind::Conststr16(idx) => format!("{op} {ptype} {idx}"),
            MeExprKind::Sizeoftype(ty) => format!("{op} {ptype} {ty}"),
            MeExprKind::FieldsDist { ty, field1, field2 } => {
                format!("{op} {ptype} {ty} {field1} {field2}")
            }
            MeExprKind::Addrof { ost, field_id } => {
                format!("{op} {ptype} {} {field_id}", self.ssatab().ost(*ost).name)
            }
            MeExprKind::Addroffunc(pu) => format!("{op} {ptype} {pu}"),
            MeExprKind::Gcmalloc(ty) => format!("{op} {ptype} {ty}"),
            MeExprKind::Op(inner) => format!("{op} {ptype} ({})", opnds(&inner.opnds)),
            MeExprKind::Ivar(ivar) => {
                let mu = ivar
                    .mu
                    .filter(|_| !config.simple_dump)
                    .map(|mu| format!(" mu({})", self.expr_name(mu, config)))
                    .unwrap_or_default();
                format!(
                    "{op} {ptype} {} {} ({}){mu}",
                    ivar.ty,
                    ivar.field_id,
                    self.expr_name(ivar.base, config)
                )
            }
            MeExprKind::Nary(nary) => match nary.intrinsic {
                Some(intrinsic) => format!("{op} {ptype} {intrinsic} ({})", opnds(&nary.opnds)),
                None => format!("{op} {ptype} ({})", opnds(&nary.opnds)),
            },
        }
    }

    /// Renders one statement, without its chi/mu/must-def lines.
    #[must_use]
    pub fn stmt_text(&self, stmt: StmtId, config: &MeConfig) -> String {
        let node = self.irmap().stmt(stmt);
        let op = node.op();
        let name = |e: ExprId| self.expr_name(e, config);
        let list = |ids: &[ExprId]| join(ids.iter().map(|&e| name(e)), ", ");

        let text = match node.kind() {
            MeStmtKind::Dassign(dassign) => {
                format!("{} = {op} {}", name(dassign.lhs), name(dassign.rhs))
            }
            MeStmtKind::Regassign(regassign) => {
                format!("{} = {op} {}", name(regassign.lhs), name(regassign.rhs))
            }
            MeStmtKind::Maydassign(may) => format!(
                "{op} {} {}",
                self.ssatab().ost(may.may_def_ost).name,
                name(may.rhs)
            ),
            MeStmtKind::Iassign(iassign) => format!(
                "{op} {} {} ({}) = {}",
                iassign.ty,
                iassign.field_id,
                name(iassign.base),
                name(iassign.rhs)
            ),
            MeStmtKind::Call(call) => format!("{op} {} ({})", call.pu, list(&call.parts.operands)),
            MeStmtKind::Icall(icall) => format!("{op} ({})", list(&icall.parts.operands)),
            MeStmtKind::Intrinsiccall(call) => {
                format!("{op} {} ({})", call.intrinsic, list(&call.parts.operands))
            }
            MeStmtKind::Goto(target) | MeStmtKind::Gosub { target, .. } => {
                format!("{op} {target}")
            }
            MeStmtKind::CondGoto { cond, target } => format!("{op} ({}) {target}", name(*cond)),
            MeStmtKind::Switch(switch) => format!(
                "{op} ({}) {} {{{}}}",
                name(switch.opnd),
                switch.default,
                join(
                    switch.cases.iter().map(|(value, label)| format!("{value}: {label}")),
                    ", "
                )
            ),
            MeStmtKind::Return { opnds, .. } | MeStmtKind::Sync { opnds, .. } => {
                format!("{op} ({})", list(opnds))
            }
            MeStmtKind::Unary { opnd, .. } | MeStmtKind::Throw { opnd, .. } => {
                format!("{op} ({})", name(*opnd))
            }
            MeStmtKind::Assert { opnds } => format!("{op} ({})", list(&opnds[..])),
            MeStmtKind::Try(labels) => format!("{op} {{{}}}", join(labels, ", ")),
            MeStmtKind::Catch(types) => format!("{op} {{{}}}", join(types, ", ")),
            MeStmtKind::Retsub(_) | MeStmtKind::Plain => op.to_string(),
            MeStmtKind::Comment(text) => format!("# {text}"),
        };
        if node.is_live() {
            text
        } else {
            format!("(dead) {text}")
        }
    }

    fn write_block(&self, out: &mut impl Write, bb: BbId, config: &MeConfig) -> fmt::Result {
        let block = self.cfg().bb(bb);
        write!(
            out,
            "{bb} {} preds [{}] succs [{}]",
            block.kind,
            join(block.preds(), " "),
            join(block.succs(), " ")
        )?;
        if !config.simple_dump {
            if !block.attrs.is_empty() {
                write!(out, " {:?}", block.attrs)?;
            }
            if block.frequency != 0 {
                write!(out, " freq {}", block.frequency)?;
            }
        }
        writeln!(out)?;
        if let Some(label) = block.label {
            writeln!(out, "{label}:")?;
        }

        for &phi in block.var_phis.values().chain(block.reg_phis.values()) {
            let node = self.irmap().phi(phi);
            writeln!(
                out,
                "  {} = phi({})",
                self.expr_name(node.lhs(), config),
                join(node.opnds().iter().map(|&e| self.expr_name(e, config)), ", ")
            )?;
        }
        for stmt in self.stmts(bb) {
            writeln!(out, "  {}", self.stmt_text(stmt, config))?;
            if !config.simple_dump {
                self.write_ssa_parts(out, stmt, config)?;
            }
        }
        Ok(())
    }

    fn write_dump(&self, out: &mut impl Write, config: &MeConfig) -> fmt::Result {
        writeln!(out, "func {} {}", self.name(), self.pu())?;
        for &bb in self.cfg().layout() {
            self.write_block(out, bb, config)?;
        }
        if let Some(sccs) = self.sccs().filter(|_| !config.simple_dump) {
            out.write_str(&sccs.dump())?;
        }
        Ok(())
    }

    /// Renders the whole function.
    #[must_use]
    pub fn dump(&self, config: &MeConfig) -> String {
        Dump { func: self, config }.to_string()
    }
}

struct Dump<'a> {
    func: &'a MeFunction,
    config: &'a MeConfig,
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.func.write_dump(f, self.config)
    }
}

impl fmt::Display for MeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_dump(f, &MeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use crate::{me::MeFunction, test::diamond_function, MeConfig};

    #[test]
    fn test_dump_diamond() {
        let (mir, _) = diamond_function();
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        let text = func.to_string();

        assert!(text.starts_with("func diamond pu0\n"));
        assert!(text.contains("BB0 CondGoto preds [] succs [BB1 BB2]"));
        assert!(text.contains("x_1 = phi(x_2, x_3)"));
        assert!(text.contains("x_2 = dassign constval i32 1"));
        assert!(text.contains("brfalse (c_0) @L1"));
        assert!(text.contains("return (x_1)"));
        assert!(text.contains("@L2:"));
    }

    #[test]
    fn test_dump_options() {
        let (mir, _) = diamond_function();
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        let config = MeConfig {
            dump_vsym_num: true,
            simple_dump: true,
            ..MeConfig::default()
        };
        let text = func.dump(&config);
        assert!(text.contains(" = phi(vst"));
        assert!(!text.contains("IS_EXIT"));
        assert!(!text.contains("scc"));
    }
}
