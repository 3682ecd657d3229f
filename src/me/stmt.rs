//! SSA statements.
//!
//! A [`MeStmt`] carries the fields every statement has (opcode, block, source position,
//! liveness, list links) and a [`MeStmtKind`] payload. Operand access is uniform across variants
//! through [`MeStmt::num_opnds`], [`MeStmt::opnd`] and [`MeStmt::set_opnd`]; the optional
//! accessors ([`MeStmt::lhs`], [`MeStmt::mu_list`], [`MeStmt::chi_list`], ...) return `None` for
//! variants without the part.
//!
//! Operand layout per variant:
//!
//! | Variant | Operands |
//! |---------|----------|
//! | dassign, maydassign, regassign | `[rhs]` |
//! | iassign | `[base, rhs]` |
//! | calls, return, sync | the argument list |
//! | condgoto, switch, unary, throw | `[opnd]` |
//! | assertge, assertlt | `[array, index]` |
//! | everything else | none |

use crate::{
    me::{
        AliasEffects, BbId, CallResults, ChiList, ExprId, MuList, MustDefId, OStIdx,
        RefCountFlags,
    },
    mir::{FieldId, IntrinsicId, LabelIdx, Opcode, PrimType, PuIdx, SrcPosition, TyIdx},
};

index_type!(
    /// Index of an SSA statement
    StmtId, "stmt"
);

/// Direct assignment to a variable version.
#[derive(Debug, Clone)]
pub struct DassignMeStmt {
    pub(super) lhs: ExprId,
    /// Stored value
    pub rhs: ExprId,
    pub(super) chi: ChiList,
    /// Reference counting requests
    pub rc: RefCountFlags,
    /// The value was propagated into uses
    pub propagated: bool,
}

/// Assignment whose target may be reached through aliases; the target version is the lhs of
/// the chi entry for [`MaydassignMeStmt::may_def_ost`].
#[derive(Debug, Clone)]
pub struct MaydassignMeStmt {
    /// Stored value
    pub rhs: ExprId,
    pub(super) chi: ChiList,
    /// Target symbol
    pub may_def_ost: OStIdx,
    /// Target field
    pub field_id: FieldId,
    /// Reference counting requests
    pub rc: RefCountFlags,
}

/// Assignment to a register version.
#[derive(Debug, Clone)]
pub struct RegassignMeStmt {
    pub(super) lhs: ExprId,
    /// Stored value
    pub rhs: ExprId,
    /// Reference counting requests
    pub rc: RefCountFlags,
}

/// Store through an address.
#[derive(Debug, Clone)]
pub struct IassignMeStmt {
    /// Pointer type of the address
    pub ty: TyIdx,
    /// Field stored
    pub field_id: FieldId,
    /// Address
    pub base: ExprId,
    /// Stored value
    pub rhs: ExprId,
    pub(super) chi: ChiList,
    /// Reference counting requests
    pub rc: RefCountFlags,
}

/// What every call form is made of.
#[derive(Debug, Clone, Default)]
pub struct CallParts {
    /// Arguments; for indirect calls the first is the function pointer
    pub operands: Vec<ExprId>,
    /// Memory read and possibly written by the callee
    pub effects: AliasEffects,
    /// Assigned return values
    pub results: CallResults,
    /// Reference counting requests
    pub rc: RefCountFlags,
}

/// Direct call.
#[derive(Debug, Clone)]
pub struct CallMeStmt {
    /// Callee
    pub pu: PuIdx,
    /// Operands and effects
    pub parts: CallParts,
}

/// Call through a function pointer.
#[derive(Debug, Clone)]
pub struct IcallMeStmt {
    /// Return type of the called signature
    pub ret_ty: TyIdx,
    /// Operands and effects
    pub parts: CallParts,
}

/// Intrinsic call.
#[derive(Debug, Clone)]
pub struct IntrinsiccallMeStmt {
    /// Intrinsic
    pub intrinsic: IntrinsicId,
    /// Type argument
    pub ty: TyIdx,
    /// Type of the returned value
    pub ret_ptype: PrimType,
    /// Operands and effects
    pub parts: CallParts,
}

/// `switch`
#[derive(Debug, Clone)]
pub struct SwitchMeStmt {
    /// Switched value
    pub opnd: ExprId,
    /// Target when no case matches
    pub default: LabelIdx,
    /// `(case value, target)` pairs
    pub cases: Vec<(i64, LabelIdx)>,
}

/// Payload of an [`MeStmt`].
#[derive(Debug, Clone)]
pub enum MeStmtKind {
    /// `dassign`
    Dassign(DassignMeStmt),
    /// `maydassign`
    Maydassign(MaydassignMeStmt),
    /// `regassign`
    Regassign(RegassignMeStmt),
    /// `iassign`
    Iassign(IassignMeStmt),
    /// `call`, `virtualcall` and their assigned forms
    Call(CallMeStmt),
    /// `icall` and `icallassigned`
    Icall(IcallMeStmt),
    /// `intrinsiccall` and `intrinsiccallassigned`
    Intrinsiccall(IntrinsiccallMeStmt),
    /// `goto`
    Goto(LabelIdx),
    /// `brtrue` / `brfalse`
    CondGoto {
        /// Condition
        cond: ExprId,
        /// Taken target
        target: LabelIdx,
    },
    /// `switch`
    Switch(SwitchMeStmt),
    /// `return`
    Return {
        /// Returned values
        opnds: Vec<ExprId>,
        /// Memory visible to the caller
        mu: MuList,
    },
    /// `eval`, `free`, `decref`, `incref` and `assertnonnull`
    Unary {
        /// Operand
        opnd: ExprId,
        /// For `decref`: the release happens on the way out of the function
        decref_before_exit: bool,
    },
    /// `throw`
    Throw {
        /// Thrown value
        opnd: ExprId,
        /// Memory visible to the handler
        mu: MuList,
    },
    /// `try`
    Try(Vec<LabelIdx>),
    /// `catch`
    Catch(Vec<TyIdx>),
    /// `syncenter` / `syncexit`
    Sync {
        /// Monitor operands
        opnds: Vec<ExprId>,
        /// Memory ordered by the monitor
        effects: AliasEffects,
    },
    /// `gosub`
    Gosub {
        /// Subroutine label
        target: LabelIdx,
        /// Memory visible to the subroutine
        mu: MuList,
    },
    /// `retsub`
    Retsub(MuList),
    /// `assertge` / `assertlt`
    Assert {
        /// Array address and checked index
        opnds: [ExprId; 2],
    },
    /// `endtry`
    Plain,
    /// `comment`
    Comment(String),
}

/// A statement of the SSA form.
#[derive(Debug, Clone)]
pub struct MeStmt {
    id: StmtId,
    op: Opcode,
    pub(super) bb: Option<BbId>,
    /// Where it came from
    pub src_pos: SrcPosition,
    is_live: bool,
    pub(super) prev: Option<StmtId>,
    pub(super) next: Option<StmtId>,
    kind: MeStmtKind,
}

fn out_of_range(stmt: &MeStmt, i: usize) -> ! {
    fatal!(
        "operand {} of {} {} out of range ({} operands)",
        i,
        stmt.op,
        stmt.id,
        stmt.num_opnds()
    )
}

impl MeStmt {
    pub(super) fn new(id: StmtId, op: Opcode, src_pos: SrcPosition, kind: MeStmtKind) -> Self {
        MeStmt {
            id,
            op,
            bb: None,
            src_pos,
            is_live: true,
            prev: None,
            next: None,
            kind,
        }
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> StmtId {
        self.id
    }

    /// Opcode.
    #[must_use]
    pub fn op(&self) -> Opcode {
        self.op
    }

    /// Block holding the statement, `None` while detached.
    #[must_use]
    pub fn bb(&self) -> Option<BbId> {
        self.bb
    }

    /// Previous statement of the block.
    #[must_use]
    pub fn prev(&self) -> Option<StmtId> {
        self.prev
    }

    /// Next statement of the block.
    #[must_use]
    pub fn next(&self) -> Option<StmtId> {
        self.next
    }

    /// Whether the statement is still needed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_live
    }

    /// Marks the statement live or dead. Dead statements are skipped when emitting.
    pub fn set_live(&mut self, live: bool) {
        self.is_live = live;
    }

    /// Variant payload.
    #[must_use]
    pub fn kind(&self) -> &MeStmtKind {
        &self.kind
    }

    /// Mutable variant payload.
    ///
    /// Defined versions, chi lists and must-def lists are private to the IR and are not
    /// reachable through it; they change only through [`super::IrMap`].
    pub fn kind_mut(&mut self) -> &mut MeStmtKind {
        &mut self.kind
    }

    /// Operands in layout order.
    #[must_use]
    pub fn opnds(&self) -> Vec<ExprId> {
        (0..self.num_opnds()).map(|i| self.opnd(i)).collect()
    }

    /// Number of operands.
    #[must_use]
    pub fn num_opnds(&self) -> usize {
        match &self.kind {
            MeStmtKind::Dassign(_) | MeStmtKind::Maydassign(_) | MeStmtKind::Regassign(_) => 1,
            MeStmtKind::Iassign(_) | MeStmtKind::Assert { .. } => 2,
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => parts.operands.len(),
            MeStmtKind::Return { opnds, .. } | MeStmtKind::Sync { opnds, .. } => opnds.len(),
            MeStmtKind::CondGoto { .. }
            | MeStmtKind::Switch(_)
            | MeStmtKind::Unary { .. }
            | MeStmtKind::Throw { .. } => 1,
            MeStmtKind::Goto(_)
            | MeStmtKind::Try(_)
            | MeStmtKind::Catch(_)
            | MeStmtKind::Gosub { .. }
            | MeStmtKind::Retsub(_)
            | MeStmtKind::Plain
            | MeStmtKind::Comment(_) => 0,
        }
    }

    /// Operand `i`. Out of range is fatal.
    #[must_use]
    pub fn opnd(&self, i: usize) -> ExprId {
        let found = match &self.kind {
            MeStmtKind::Dassign(s) if i == 0 => Some(s.rhs),
            MeStmtKind::Maydassign(s) if i == 0 => Some(s.rhs),
            MeStmtKind::Regassign(s) if i == 0 => Some(s.rhs),
            MeStmtKind::Iassign(s) => match i {
                0 => Some(s.base),
                1 => Some(s.rhs),
                _ => None,
            },
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => {
                parts.operands.get(i).copied()
            }
            MeStmtKind::Return { opnds, .. } | MeStmtKind::Sync { opnds, .. } => {
                opnds.get(i).copied()
            }
            MeStmtKind::CondGoto { cond, .. } if i == 0 => Some(*cond),
            MeStmtKind::Switch(s) if i == 0 => Some(s.opnd),
            MeStmtKind::Unary { opnd, .. } | MeStmtKind::Throw { opnd, .. } if i == 0 => {
                Some(*opnd)
            }
            MeStmtKind::Assert { opnds } => opnds.get(i).copied(),
            _ => None,
        };
        match found {
            Some(opnd) => opnd,
            None => out_of_range(self, i),
        }
    }

    /// Replaces operand `i`. Out of range is fatal.
    pub fn set_opnd(&mut self, i: usize, value: ExprId) {
        let slot = match &mut self.kind {
            MeStmtKind::Dassign(s) if i == 0 => Some(&mut s.rhs),
            MeStmtKind::Maydassign(s) if i == 0 => Some(&mut s.rhs),
            MeStmtKind::Regassign(s) if i == 0 => Some(&mut s.rhs),
            MeStmtKind::Iassign(s) => match i {
                0 => Some(&mut s.base),
                1 => Some(&mut s.rhs),
                _ => None,
            },
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => {
                parts.operands.get_mut(i)
            }
            MeStmtKind::Return { opnds, .. } | MeStmtKind::Sync { opnds, .. } => opnds.get_mut(i),
            MeStmtKind::CondGoto { cond, .. } if i == 0 => Some(cond),
            MeStmtKind::Switch(s) if i == 0 => Some(&mut s.opnd),
            MeStmtKind::Unary { opnd, .. } | MeStmtKind::Throw { opnd, .. } if i == 0 => {
                Some(opnd)
            }
            MeStmtKind::Assert { opnds } => opnds.get_mut(i),
            _ => None,
        };
        match slot {
            Some(slot) => *slot = value,
            None => out_of_range(self, i),
        }
    }

    /// Directly assigned version of `dassign` and `regassign`.
    ///
    /// A `maydassign`'s target lives in its chi list; `IrMap::stmt_lhs` resolves every form.
    #[must_use]
    pub fn lhs(&self) -> Option<ExprId> {
        match &self.kind {
            MeStmtKind::Dassign(s) => Some(s.lhs),
            MeStmtKind::Regassign(s) => Some(s.lhs),
            _ => None,
        }
    }

    pub(super) fn set_lhs(&mut self, lhs: ExprId) -> bool {
        match &mut self.kind {
            MeStmtKind::Dassign(s) => s.lhs = lhs,
            MeStmtKind::Regassign(s) => s.lhs = lhs,
            _ => return false,
        }
        true
    }

    /// Stored value of the assignment forms.
    #[must_use]
    pub fn rhs(&self) -> Option<ExprId> {
        match &self.kind {
            MeStmtKind::Dassign(s) => Some(s.rhs),
            MeStmtKind::Maydassign(s) => Some(s.rhs),
            MeStmtKind::Regassign(s) => Some(s.rhs),
            MeStmtKind::Iassign(s) => Some(s.rhs),
            _ => None,
        }
    }

    /// May-use list.
    #[must_use]
    pub fn mu_list(&self) -> Option<&MuList> {
        match &self.kind {
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => {
                Some(&parts.effects.mu)
            }
            MeStmtKind::Sync { effects, .. } => Some(&effects.mu),
            MeStmtKind::Return { mu, .. }
            | MeStmtKind::Throw { mu, .. }
            | MeStmtKind::Gosub { mu, .. }
            | MeStmtKind::Retsub(mu) => Some(mu),
            _ => None,
        }
    }

    /// Mutable may-use list.
    pub fn mu_list_mut(&mut self) -> Option<&mut MuList> {
        match &mut self.kind {
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => {
                Some(&mut parts.effects.mu)
            }
            MeStmtKind::Sync { effects, .. } => Some(&mut effects.mu),
            MeStmtKind::Return { mu, .. }
            | MeStmtKind::Throw { mu, .. }
            | MeStmtKind::Gosub { mu, .. }
            | MeStmtKind::Retsub(mu) => Some(mu),
            _ => None,
        }
    }

    /// May-def list.
    #[must_use]
    pub fn chi_list(&self) -> Option<&ChiList> {
        match &self.kind {
            MeStmtKind::Dassign(s) => Some(&s.chi),
            MeStmtKind::Maydassign(s) => Some(&s.chi),
            MeStmtKind::Iassign(s) => Some(&s.chi),
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => {
                Some(&parts.effects.chi)
            }
            MeStmtKind::Sync { effects, .. } => Some(&effects.chi),
            _ => None,
        }
    }

    pub(super) fn chi_list_mut(&mut self) -> Option<&mut ChiList> {
        match &mut self.kind {
            MeStmtKind::Dassign(s) => Some(&mut s.chi),
            MeStmtKind::Maydassign(s) => Some(&mut s.chi),
            MeStmtKind::Iassign(s) => Some(&mut s.chi),
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => {
                Some(&mut parts.effects.chi)
            }
            MeStmtKind::Sync { effects, .. } => Some(&mut effects.chi),
            _ => None,
        }
    }

    /// Must-defs of the assigned call forms.
    #[must_use]
    pub fn must_def_list(&self) -> Option<&[MustDefId]> {
        self.call_parts().map(|parts| parts.results.must_defs.as_slice())
    }

    pub(super) fn must_def_list_mut(&mut self) -> Option<&mut Vec<MustDefId>> {
        self.call_parts_mut().map(|parts| &mut parts.results.must_defs)
    }

    /// The parts of a call form.
    #[must_use]
    pub fn call_parts(&self) -> Option<&CallParts> {
        match &self.kind {
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => Some(parts),
            _ => None,
        }
    }

    fn call_parts_mut(&mut self) -> Option<&mut CallParts> {
        match &mut self.kind {
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => Some(parts),
            _ => None,
        }
    }

    fn rc_flags_mut(&mut self) -> Option<&mut RefCountFlags> {
        match &mut self.kind {
            MeStmtKind::Dassign(s) => Some(&mut s.rc),
            MeStmtKind::Maydassign(s) => Some(&mut s.rc),
            MeStmtKind::Regassign(s) => Some(&mut s.rc),
            MeStmtKind::Iassign(s) => Some(&mut s.rc),
            MeStmtKind::Call(CallMeStmt { parts, .. })
            | MeStmtKind::Icall(IcallMeStmt { parts, .. })
            | MeStmtKind::Intrinsiccall(IntrinsiccallMeStmt { parts, .. }) => Some(&mut parts.rc),
            _ => None,
        }
    }

    /// Reference counting requests of the assignment and call forms.
    #[must_use]
    pub fn rc_flags(&self) -> Option<RefCountFlags> {
        match &self.kind {
            MeStmtKind::Dassign(s) => Some(s.rc),
            MeStmtKind::Maydassign(s) => Some(s.rc),
            MeStmtKind::Regassign(s) => Some(s.rc),
            MeStmtKind::Iassign(s) => Some(s.rc),
            _ => self.call_parts().map(|parts| parts.rc),
        }
    }

    /// The old value must be released; `false` for forms without the flag.
    #[must_use]
    pub fn need_decref(&self) -> bool {
        self.rc_flags().is_some_and(RefCountFlags::need_decref)
    }

    /// The new value must be retained; `false` for forms without the flag.
    #[must_use]
    pub fn need_incref(&self) -> bool {
        self.rc_flags().is_some_and(RefCountFlags::need_incref)
    }

    /// Requests a release. Fatal on forms without the flag.
    pub fn enable_need_decref(&mut self) {
        self.rc_or_fatal().enable_need_decref();
    }

    /// Cancels a release. Fatal on forms without the flag.
    pub fn disable_need_decref(&mut self) {
        self.rc_or_fatal().disable_need_decref();
    }

    /// Requests a retain. Fatal on forms without the flag.
    pub fn enable_need_incref(&mut self) {
        self.rc_or_fatal().enable_need_incref();
    }

    /// Cancels a retain. Fatal on forms without the flag.
    pub fn disable_need_incref(&mut self) {
        self.rc_or_fatal().disable_need_incref();
    }

    fn rc_or_fatal(&mut self) -> &mut RefCountFlags {
        let (op, id) = (self.op, self.id);
        match self.rc_flags_mut() {
            Some(rc) => rc,
            None => fatal!("{} {} has no reference counting flags", op, id),
        }
    }

    /// Returns `true` for `assertge` and `assertlt`.
    #[must_use]
    pub fn is_assert_bce(&self) -> bool {
        self.op.is_assert_bce()
    }

    /// Returns `true` for `gosub`, `retsub`, `throw` and `return`.
    #[must_use]
    pub fn is_return(&self) -> bool {
        self.op.is_return()
    }

    /// Returns `true` for `brtrue` and `brfalse`.
    #[must_use]
    pub fn is_cond_br(&self) -> bool {
        self.op.is_cond_br()
    }

    /// Returns `true` for the four assignment forms.
    #[must_use]
    pub fn is_assign(&self) -> bool {
        self.op.is_assign()
    }

    /// Returns `true` if control does not fall through past this statement.
    #[must_use]
    pub fn ends_block(&self) -> bool {
        self.op.ends_block()
    }

    /// Branch target of `goto`, `gosub`, `brtrue` and `brfalse`.
    #[must_use]
    pub fn offset(&self) -> Option<LabelIdx> {
        match &self.kind {
            MeStmtKind::Goto(target)
            | MeStmtKind::CondGoto { target, .. }
            | MeStmtKind::Gosub { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Retargets `goto`, `gosub`, `brtrue` and `brfalse`. Fatal on other forms.
    pub fn set_offset(&mut self, label: LabelIdx) {
        match &mut self.kind {
            MeStmtKind::Goto(target)
            | MeStmtKind::CondGoto { target, .. }
            | MeStmtKind::Gosub { target, .. } => *target = label,
            _ => fatal!("{} {} has no branch target", self.op, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(op: Opcode, kind: MeStmtKind) -> MeStmt {
        MeStmt::new(StmtId::new(0), op, SrcPosition::default(), kind)
    }

    fn iassign() -> MeStmt {
        stmt(
            Opcode::Iassign,
            MeStmtKind::Iassign(IassignMeStmt {
                ty: TyIdx::new(0),
                field_id: 0,
                base: ExprId::new(1),
                rhs: ExprId::new(2),
                chi: ChiList::new(),
                rc: RefCountFlags::default(),
            }),
        )
    }

    #[test]
    fn test_operand_layout() {
        let mut s = iassign();
        assert_eq!(s.num_opnds(), 2);
        assert_eq!(s.opnds(), vec![ExprId::new(1), ExprId::new(2)]);
        s.set_opnd(1, ExprId::new(9));
        assert_eq!(s.rhs(), Some(ExprId::new(9)));
        assert!(s.lhs().is_none());
        assert!(s.chi_list().is_some());
        assert!(s.mu_list().is_none());
        assert!(s.is_assign());

        let assert = stmt(
            Opcode::Assertlt,
            MeStmtKind::Assert {
                opnds: [ExprId::new(3), ExprId::new(4)],
            },
        );
        assert_eq!(assert.num_opnds(), 2);
        assert_eq!(assert.opnd(1), ExprId::new(4));
        assert!(assert.is_assert_bce());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_opnd_out_of_range() {
        let s = iassign();
        let _ = s.opnd(2);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_set_opnd_out_of_range() {
        let mut s = stmt(Opcode::Goto, MeStmtKind::Goto(LabelIdx::new(1)));
        s.set_opnd(0, ExprId::new(0));
    }

    #[test]
    fn test_call_parts() {
        let mut call = stmt(
            Opcode::Callassigned,
            MeStmtKind::Call(CallMeStmt {
                pu: PuIdx::new(1),
                parts: CallParts {
                    operands: vec![ExprId::new(1)],
                    ..CallParts::default()
                },
            }),
        );
        assert_eq!(call.num_opnds(), 1);
        assert!(call.mu_list().is_some());
        assert!(call.chi_list().is_some());
        assert_eq!(call.must_def_list(), Some(&[][..]));

        assert!(!call.need_decref());
        call.enable_need_decref();
        call.enable_need_incref();
        assert!(call.need_decref() && call.need_incref());
        call.disable_need_incref();
        assert!(!call.need_incref());
    }

    #[test]
    #[should_panic(expected = "no reference counting flags")]
    fn test_ref_count_on_goto_is_fatal() {
        let mut s = stmt(Opcode::Goto, MeStmtKind::Goto(LabelIdx::new(1)));
        s.enable_need_decref();
    }

    #[test]
    fn test_predicates_and_offsets() {
        let mut br = stmt(
            Opcode::Brtrue,
            MeStmtKind::CondGoto {
                cond: ExprId::new(0),
                target: LabelIdx::new(3),
            },
        );
        assert!(br.is_cond_br());
        assert_eq!(br.offset(), Some(LabelIdx::new(3)));
        br.set_offset(LabelIdx::new(4));
        assert_eq!(br.offset(), Some(LabelIdx::new(4)));

        let throw = stmt(
            Opcode::Throw,
            MeStmtKind::Throw {
                opnd: ExprId::new(0),
                mu: MuList::new(),
            },
        );
        assert!(throw.is_return());
        assert!(throw.mu_list().is_some());
        assert!(!throw.need_incref());
    }
}
