//! Re-materialization of the non-SSA statement tree.
//!
//! Versions collapse back to their original symbol, phis and chi/mu/must-def lists disappear, and
//! call return values are recovered from the must-def list. Emitting a freshly built function
//! reproduces the input body block by block, minus unreachable code.

use crate::{
    config::PHASE_EMIT,
    me::{ExprId, MeExprKind, MeFunction, MeStmtKind, OStIdx, OstKind, StmtId},
    mir::{BaseNode, CallReturn, Callee, FieldId, PregIdx, StIdx, StmtKind, StmtNode},
    MeConfig,
};

/// Rebuilds non-SSA nodes from SSA nodes.
pub trait EmitStmt {
    /// Rebuilds the expression tree rooted at `expr`.
    fn emit_expr(&self, expr: ExprId) -> BaseNode;

    /// Rebuilds one statement.
    fn emit_stmt(&self, stmt: StmtId) -> StmtNode;
}

impl MeFunction {
    fn variable_of(&self, ost: OStIdx) -> (StIdx, FieldId) {
        match self.ssatab().ost(ost).kind {
            OstKind::Symbol { st, field_id } => (st, field_id),
            OstKind::Preg(preg) => fatal!("{} is register {}, not a variable", ost, preg),
            OstKind::Heap => fatal!("heap location {} has no variable", ost),
        }
    }

    fn register_of(&self, ost: OStIdx) -> PregIdx {
        match self.ssatab().ost(ost).kind {
            OstKind::Preg(preg) => preg,
            _ => fatal!("{} is not a register", ost),
        }
    }

    fn lhs_ost(&self, stmt: StmtId) -> OStIdx {
        let lhs = match self.irmap().stmt(stmt).lhs() {
            Some(lhs) => lhs,
            None => fatal!("{} has no lhs", stmt),
        };
        match self.irmap().expr(lhs).ost() {
            Some(ost) => ost,
            None => fatal!("lhs {} of {} is not a version", lhs, stmt),
        }
    }

    fn emit_exprs(&self, exprs: &[ExprId]) -> Vec<BaseNode> {
        exprs.iter().map(|&e| self.emit_expr(e)).collect()
    }

    /// Return destinations come back from the must-def list, in return order.
    fn emit_call(&self, stmt: StmtId, callee: Callee) -> StmtKind {
        let irmap = self.irmap();
        let Some(parts) = irmap.stmt(stmt).call_parts() else {
            fatal!("{} has no call parts", stmt);
        };
        let rets = parts
            .results
            .must_defs
            .iter()
            .map(|&m| {
                let lhs = irmap.must_def(m).lhs();
                match irmap.expr(lhs).kind() {
                    MeExprKind::Var(var) => {
                        let (st, field_id) = self.variable_of(var.ost());
                        CallReturn::Var(st, field_id)
                    }
                    MeExprKind::Reg(reg) => CallReturn::Reg(reg.preg()),
                    _ => fatal!("return value {} of {} is not a version", lhs, stmt),
                }
            })
            .collect();
        StmtKind::Call {
            callee,
            args: self.emit_exprs(&parts.operands),
            rets,
        }
    }

    /// Rebuilds the whole body: a `label` statement for every labelled block, then the live
    /// statements of each block in layout order.
    pub fn emit(&self) -> Vec<StmtNode> {
        let mut body = Vec::new();
        for &bb in self.cfg().layout() {
            if let Some(label) = self.cfg().bb(bb).label {
                body.push(StmtNode::label(label));
            }
            for stmt in self.stmts(bb) {
                if self.irmap().stmt(stmt).is_live() {
                    body.push(self.emit_stmt(stmt));
                }
            }
        }
        log::trace!("{}: emitted {} statements", self.name(), body.len());
        body
    }

    /// [`MeFunction::emit`], logging the result when the emit phase is selected for dumping.
    pub fn emit_with(&self, config: &MeConfig) -> Vec<StmtNode> {
        let body = self.emit();
        if config.should_dump(PHASE_EMIT, self.name()) {
            for stmt in &body {
                log::info!("{} {}: {:?}", self.name(), PHASE_EMIT, stmt);
            }
        }
        body
    }
}

impl EmitStmt for MeFunction {
    fn emit_expr(&self, expr: ExprId) -> BaseNode {
        let node = self.irmap().expr(expr);
        let ptype = node.ptype();
        match node.kind() {
            MeExprKind::Var(var) => {
                let (st, field_id) = self.variable_of(var.ost());
                BaseNode::Dread {
                    ptype,
                    st,
                    field_id,
                }
            }
            MeExprKind::Reg(reg) => BaseNode::Regread {
                ptype,
                preg: reg.preg(),
            },
            MeExprKind::Const(value) => BaseNode::Constval {
                ptype,
                value: *value,
            },
            MeExprKind::Conststr(str_idx) => BaseNode::Conststr {
                ptype,
                str_idx: *str_idx,
            },
            MeExprKind::Conststr16(str_idx) => BaseNode::Conststr16 {
                ptype,
                str_idx: *str_idx,
            },
            MeExprKind::Sizeoftype(ty) => BaseNode::Sizeoftype { ptype, ty: *ty },
            MeExprKind::FieldsDist { ty, field1, field2 } => BaseNode::Fieldsdist {
                ptype,
                ty: *ty,
                field1: *field1,
                field2: *field2,
            },
            MeExprKind::Addrof { ost, field_id } => BaseNode::Addrof {
                ptype,
                st: self.variable_of(*ost).0,
                field_id: *field_id,
            },
            MeExprKind::Addroffunc(pu) => BaseNode::Addroffunc { ptype, pu: *pu },
            MeExprKind::Gcmalloc(ty) => BaseNode::Gcmalloc {
                op: node.op(),
                ptype,
                ty: *ty,
            },
            MeExprKind::Op(op) => BaseNode::Op {
                op: node.op(),
                ptype,
                opnd_type: op.opnd_type,
                opnds: self.emit_exprs(&op.opnds),
                ty: op.ty,
                field_id: op.field_id,
                bits_offset: op.bits_offset,
                bits_size: op.bits_size,
            },
            MeExprKind::Ivar(ivar) => BaseNode::Iread {
                ptype,
                ty: ivar.ty,
                field_id: ivar.field_id,
                base: Box::new(self.emit_expr(ivar.base)),
            },
            MeExprKind::Nary(nary) => BaseNode::Nary {
                op: node.op(),
                ptype,
                ty: nary.ty,
                intrinsic: nary.intrinsic,
                bound_check: nary.bound_check,
                opnds: self.emit_exprs(&nary.opnds),
            },
        }
    }

    fn emit_stmt(&self, stmt: StmtId) -> StmtNode {
        let irmap = self.irmap();
        let node = irmap.stmt(stmt);
        let kind = match node.kind() {
            MeStmtKind::Dassign(dassign) => {
                let (st, field_id) = self.variable_of(self.lhs_ost(stmt));
                StmtKind::Dassign {
                    st,
                    field_id,
                    rhs: self.emit_expr(dassign.rhs),
                }
            }
            MeStmtKind::Maydassign(may) => StmtKind::Dassign {
                st: self.variable_of(may.may_def_ost).0,
                field_id: may.field_id,
                rhs: self.emit_expr(may.rhs),
            },
            MeStmtKind::Regassign(regassign) => StmtKind::Regassign {
                preg: self.register_of(self.lhs_ost(stmt)),
                rhs: self.emit_expr(regassign.rhs),
            },
            MeStmtKind::Iassign(iassign) => StmtKind::Iassign {
                ty: iassign.ty,
                field_id: iassign.field_id,
                addr: self.emit_expr(iassign.base),
                rhs: self.emit_expr(iassign.rhs),
            },
            MeStmtKind::Call(call) => self.emit_call(stmt, Callee::Direct(call.pu)),
            MeStmtKind::Icall(icall) => self.emit_call(
                stmt,
                Callee::Indirect {
                    ret_ty: icall.ret_ty,
                },
            ),
            MeStmtKind::Intrinsiccall(intrinsic) => self.emit_call(
                stmt,
                Callee::Intrinsic {
                    id: intrinsic.intrinsic,
                    ty: intrinsic.ty,
                    ret_ptype: intrinsic.ret_ptype,
                },
            ),
            MeStmtKind::Goto(target) | MeStmtKind::Gosub { target, .. } => StmtKind::Goto(*target),
            MeStmtKind::CondGoto { cond, target } => StmtKind::CondGoto {
                cond: self.emit_expr(*cond),
                target: *target,
            },
            MeStmtKind::Switch(switch) => StmtKind::Switch {
                opnd: self.emit_expr(switch.opnd),
                default: switch.default,
                cases: switch.cases.clone(),
            },
            MeStmtKind::Return { opnds, .. } | MeStmtKind::Sync { opnds, .. } => {
                StmtKind::Nary(self.emit_exprs(opnds))
            }
            MeStmtKind::Unary { opnd, .. } | MeStmtKind::Throw { opnd, .. } => {
                StmtKind::Unary(self.emit_expr(*opnd))
            }
            MeStmtKind::Try(labels) => StmtKind::Try(labels.clone()),
            MeStmtKind::Catch(types) => StmtKind::Catch(types.clone()),
            MeStmtKind::Retsub(_) | MeStmtKind::Plain => StmtKind::Plain,
            MeStmtKind::Assert { opnds: [array, index] } => StmtKind::Assert {
                array: self.emit_expr(*array),
                index: self.emit_expr(*index),
            },
            MeStmtKind::Comment(text) => StmtKind::Comment(text.clone()),
        };

        StmtNode {
            op: node.op(),
            src_pos: node.src_pos,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mir::{IntrinsicId, LabelIdx, MirFunction, Opcode, PrimType, PuIdx, SymbolTable, TyIdx},
        test::{counting_loop, diamond_function},
    };

    #[test]
    fn test_diamond_round_trip() {
        let (mir, _) = diamond_function();
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        assert_eq!(func.emit(), mir.body);
    }

    #[test]
    fn test_loop_round_trip() {
        let (mir, _) = counting_loop();
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        assert_eq!(func.emit(), mir.body);
    }

    #[test]
    fn test_calls_and_registers_round_trip() {
        let mut symbols = SymbolTable::new();
        let g = symbols.declare_global("g", PrimType::I64);
        let r = symbols.declare_preg(PrimType::I64);
        let p = symbols.declare_formal("p", PrimType::Ptr);
        let body = vec![
            StmtNode::new(
                Opcode::Callassigned,
                StmtKind::Call {
                    callee: Callee::Direct(PuIdx::new(3)),
                    args: vec![BaseNode::dread(PrimType::Ptr, p)],
                    rets: vec![CallReturn::Reg(r)],
                },
            ),
            StmtNode::new(
                Opcode::Maydassign,
                StmtKind::Dassign {
                    st: g,
                    field_id: 0,
                    rhs: BaseNode::regread(PrimType::I64, r),
                },
            ),
            StmtNode::new(
                Opcode::Intrinsiccall,
                StmtKind::Call {
                    callee: Callee::Intrinsic {
                        id: IntrinsicId::ArrayLength,
                        ty: TyIdx::new(0),
                        ret_ptype: PrimType::Void,
                    },
                    args: vec![BaseNode::iread(
                        PrimType::I64,
                        TyIdx::new(2),
                        BaseNode::dread(PrimType::Ptr, p),
                    )],
                    rets: Vec::new(),
                },
            ),
            StmtNode::ret(vec![BaseNode::dread(PrimType::I64, g)]),
        ];
        let mir = MirFunction::new("calls", symbols, body);
        let func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        assert_eq!(func.emit(), mir.body);
    }

    #[test]
    fn test_dead_statements_skipped() {
        let (mir, _) = diamond_function();
        let mut func = MeFunction::build(&mir, &MeConfig::default()).unwrap();
        let then_bb = func.cfg().layout()[1];
        let y_store = func.stmts(then_bb).nth(1).unwrap();
        func.irmap_mut().stmt_mut(y_store).set_live(false);

        let body = func.emit();
        assert_eq!(body.len(), mir.body.len() - 1);
        assert!(!body.contains(&mir.body[2]));
        assert_eq!(body[3], StmtNode::label(LabelIdx::new(1)));
    }
}
