//! SSA expressions.
//!
//! An [`MeExpr`] is a node of the expression DAG of one function. Variables and registers appear
//! once per version ([`VarMeExpr`], [`RegMeExpr`]); pure composite expressions are hash-consed
//! so identical trees share one node. Operands are expression handles, so equality of children
//! is equality of ids.
//!
//! # Hashing
//!
//! [`MeExpr::hash_index`] mixes each variant's payload with fixed shifts. The value only picks a
//! bucket; [`MeExpr::is_identical`] decides equality.

use strum::{Display, EnumIter, IntoStaticStr};

use crate::{
    me::{MeDefBy, OStIdx, VStIdx},
    mir::{
        ConstValue, FieldId, IntrinsicId, Opcode, PregIdx, PrimType, PuIdx, StrIdx, TyIdx,
        U16StrIdx,
    },
};

index_type!(
    /// Index of an SSA expression
    ExprId, "mx"
);

const OPND_HASH_SHIFT: u32 = 3;

/// Variant tag of an [`MeExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[allow(missing_docs)]
pub enum MeExprOp {
    Var,
    Reg,
    Const,
    Conststr,
    Conststr16,
    Sizeoftype,
    FieldsDist,
    Addrof,
    Addroffunc,
    Gcmalloc,
    Op,
    Ivar,
    Nary,
}

/// One version of a variable field.
#[derive(Debug, Clone)]
pub struct VarMeExpr {
    ost: OStIdx,
    vst: VStIdx,
    field_id: FieldId,
    def: MeDefBy,
    /// Type inferred for the value, when more precise than the declared one
    pub inferred_ty: Option<TyIdx>,
    /// The value may be a null reference
    pub maybe_null: bool,
}

impl VarMeExpr {
    pub(super) fn new(ost: OStIdx, vst: VStIdx, field_id: FieldId) -> Self {
        VarMeExpr {
            ost,
            vst,
            field_id,
            def: MeDefBy::No,
            inferred_ty: None,
            maybe_null: true,
        }
    }

    /// Original symbol.
    #[must_use]
    pub fn ost(&self) -> OStIdx {
        self.ost
    }

    /// Version.
    #[must_use]
    pub fn vst(&self) -> VStIdx {
        self.vst
    }

    /// Field of the variable.
    #[must_use]
    pub fn field_id(&self) -> FieldId {
        self.field_id
    }

    /// Definition of this version.
    #[must_use]
    pub fn def(&self) -> MeDefBy {
        self.def
    }
}

/// One version of a pseudo register.
#[derive(Debug, Clone)]
pub struct RegMeExpr {
    ost: OStIdx,
    vst: VStIdx,
    preg: PregIdx,
    def: MeDefBy,
}

impl RegMeExpr {
    pub(super) fn new(ost: OStIdx, vst: VStIdx, preg: PregIdx) -> Self {
        RegMeExpr {
            ost,
            vst,
            preg,
            def: MeDefBy::No,
        }
    }

    /// Original symbol.
    #[must_use]
    pub fn ost(&self) -> OStIdx {
        self.ost
    }

    /// Version.
    #[must_use]
    pub fn vst(&self) -> VStIdx {
        self.vst
    }

    /// Register.
    #[must_use]
    pub fn preg(&self) -> PregIdx {
        self.preg
    }

    /// Definition of this version.
    #[must_use]
    pub fn def(&self) -> MeDefBy {
        self.def
    }
}

/// Unary, binary or ternary operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpMeExpr {
    /// One to three operands
    pub opnds: Vec<ExprId>,
    /// Operand type for comparisons and conversions
    pub opnd_type: PrimType,
    /// Type for `iaddrof`/`retype`
    pub ty: TyIdx,
    /// Field for `iaddrof`
    pub field_id: FieldId,
    /// Bit offset for bit-field operators
    pub bits_offset: u8,
    /// Bit size for bit-field and extension operators
    pub bits_size: u8,
}

/// Indirect load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvarMeExpr {
    /// Address
    pub base: ExprId,
    /// Pointer type of the address
    pub ty: TyIdx,
    /// Field loaded
    pub field_id: FieldId,
    /// Version of the memory read, absent without alias modeling
    pub mu: Option<ExprId>,
    /// The loaded value may be a null reference
    pub maybe_null: bool,
}

/// Array addressing or intrinsic operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaryMeExpr {
    /// Array type, or the intrinsic's type argument
    pub ty: TyIdx,
    /// Intrinsic for `intrinsicop`
    pub intrinsic: Option<IntrinsicId>,
    /// Whether `array` checks bounds
    pub bound_check: bool,
    /// Operands
    pub opnds: Vec<ExprId>,
}

/// Variant payload of an [`MeExpr`].
#[derive(Debug, Clone)]
pub enum MeExprKind {
    /// Variable version
    Var(VarMeExpr),
    /// Register version
    Reg(RegMeExpr),
    /// Constant
    Const(ConstValue),
    /// Narrow string literal
    Conststr(StrIdx),
    /// Wide string literal
    Conststr16(U16StrIdx),
    /// Size of a type
    Sizeoftype(TyIdx),
    /// Distance between two fields
    FieldsDist {
        /// Aggregate type
        ty: TyIdx,
        /// First field
        field1: FieldId,
        /// Second field
        field2: FieldId,
    },
    /// Address of a variable field
    Addrof {
        /// Variable
        ost: OStIdx,
        /// Field
        field_id: FieldId,
    },
    /// Address of a function
    Addroffunc(PuIdx),
    /// Heap allocation
    Gcmalloc(TyIdx),
    /// Operator
    Op(OpMeExpr),
    /// Indirect load
    Ivar(IvarMeExpr),
    /// Array or intrinsic operator
    Nary(NaryMeExpr),
}

/// A node of the SSA expression DAG.
#[derive(Debug, Clone)]
pub struct MeExpr {
    id: ExprId,
    op: Opcode,
    ptype: PrimType,
    depth: u8,
    tree_id: u32,
    next: Option<ExprId>,
    kind: MeExprKind,
}

impl MeExpr {
    pub(super) fn new(id: ExprId, op: Opcode, ptype: PrimType, kind: MeExprKind) -> Self {
        MeExpr {
            id,
            op,
            ptype,
            depth: 0,
            tree_id: 0,
            next: None,
            kind,
        }
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> ExprId {
        self.id
    }

    /// Opcode.
    #[must_use]
    pub fn op(&self) -> Opcode {
        self.op
    }

    /// Value type.
    #[must_use]
    pub fn ptype(&self) -> PrimType {
        self.ptype
    }

    /// Height of the expression tree, leaves are `0`.
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub(super) fn set_depth(&mut self, depth: u8) {
        self.depth = depth;
    }

    /// Id of the statement tree this node was first built for.
    #[must_use]
    pub fn tree_id(&self) -> u32 {
        self.tree_id
    }

    /// Sets the statement tree id.
    pub fn set_tree_id(&mut self, tree_id: u32) {
        self.tree_id = tree_id;
    }

    /// Next node in the same hash bucket.
    #[must_use]
    pub fn next(&self) -> Option<ExprId> {
        self.next
    }

    pub(super) fn set_next(&mut self, next: Option<ExprId>) {
        self.next = next;
    }

    /// Variant payload.
    #[must_use]
    pub fn kind(&self) -> &MeExprKind {
        &self.kind
    }

    /// Variant tag.
    #[must_use]
    pub fn meop(&self) -> MeExprOp {
        match self.kind {
            MeExprKind::Var(_) => MeExprOp::Var,
            MeExprKind::Reg(_) => MeExprOp::Reg,
            MeExprKind::Const(_) => MeExprOp::Const,
            MeExprKind::Conststr(_) => MeExprOp::Conststr,
            MeExprKind::Conststr16(_) => MeExprOp::Conststr16,
            MeExprKind::Sizeoftype(_) => MeExprOp::Sizeoftype,
            MeExprKind::FieldsDist { .. } => MeExprOp::FieldsDist,
            MeExprKind::Addrof { .. } => MeExprOp::Addrof,
            MeExprKind::Addroffunc(_) => MeExprOp::Addroffunc,
            MeExprKind::Gcmalloc(_) => MeExprOp::Gcmalloc,
            MeExprKind::Op(_) => MeExprOp::Op,
            MeExprKind::Ivar(_) => MeExprOp::Ivar,
            MeExprKind::Nary(_) => MeExprOp::Nary,
        }
    }

    /// Operands in order. An indirect load has its address as only operand.
    #[must_use]
    pub fn opnds(&self) -> &[ExprId] {
        match &self.kind {
            MeExprKind::Op(op) => &op.opnds,
            MeExprKind::Nary(nary) => &nary.opnds,
            MeExprKind::Ivar(ivar) => std::slice::from_ref(&ivar.base),
            _ => &[],
        }
    }

    /// Number of operands.
    #[must_use]
    pub fn num_opnds(&self) -> usize {
        self.opnds().len()
    }

    /// Operand `i`.
    #[must_use]
    pub fn opnd(&self, i: usize) -> ExprId {
        let opnds = self.opnds();
        check_fatal!(
            i < opnds.len(),
            "operand {} of {} {} out of range",
            i,
            self.op,
            self.id
        );
        opnds[i]
    }

    /// Returns `true` if the expression has no operands.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.num_opnds() == 0
    }

    /// Returns `true` for allocations.
    #[must_use]
    pub fn is_gcmalloc(&self) -> bool {
        self.op.is_gcmalloc()
    }

    /// Returns `true` if this node has no side effect and reads no memory.
    ///
    /// Children are not inspected.
    #[must_use]
    pub fn pure(&self) -> bool {
        match &self.kind {
            MeExprKind::Ivar(_) | MeExprKind::Gcmalloc(_) => false,
            MeExprKind::Nary(nary) if self.op == Opcode::Intrinsicop => {
                nary.intrinsic.is_some_and(IntrinsicId::is_pure)
            }
            _ => self.op.is_pure(),
        }
    }

    /// Returns `true` for a numeric zero constant.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(&self.kind, MeExprKind::Const(value) if value.is_zero())
    }

    /// Returns `true` for variable and register versions.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, MeExprKind::Var(_) | MeExprKind::Reg(_))
    }

    /// Original symbol of a variable or register version.
    #[must_use]
    pub fn ost(&self) -> Option<OStIdx> {
        match &self.kind {
            MeExprKind::Var(var) => Some(var.ost),
            MeExprKind::Reg(reg) => Some(reg.ost),
            _ => None,
        }
    }

    /// Version of a variable or register version.
    #[must_use]
    pub fn vst(&self) -> Option<VStIdx> {
        match &self.kind {
            MeExprKind::Var(var) => Some(var.vst),
            MeExprKind::Reg(reg) => Some(reg.vst),
            _ => None,
        }
    }

    /// Definition of a variable or register version.
    #[must_use]
    pub fn def_by(&self) -> Option<MeDefBy> {
        match &self.kind {
            MeExprKind::Var(var) => Some(var.def),
            MeExprKind::Reg(reg) => Some(reg.def),
            _ => None,
        }
    }

    /// Replaces the definition, returning the old one. Outside tests only `IrMap::set_def` calls
    /// this.
    pub(super) fn replace_def(&mut self, def: MeDefBy) -> MeDefBy {
        match &mut self.kind {
            MeExprKind::Var(var) => std::mem::replace(&mut var.def, def),
            MeExprKind::Reg(reg) => std::mem::replace(&mut reg.def, def),
            _ => fatal!("{} {} has no definition", self.op, self.id),
        }
    }

    /// Variable payload.
    #[must_use]
    pub fn as_var(&self) -> Option<&VarMeExpr> {
        match &self.kind {
            MeExprKind::Var(var) => Some(var),
            _ => None,
        }
    }

    /// Mutable variable payload.
    pub fn as_var_mut(&mut self) -> Option<&mut VarMeExpr> {
        match &mut self.kind {
            MeExprKind::Var(var) => Some(var),
            _ => None,
        }
    }

    /// Register payload.
    #[must_use]
    pub fn as_reg(&self) -> Option<&RegMeExpr> {
        match &self.kind {
            MeExprKind::Reg(reg) => Some(reg),
            _ => None,
        }
    }

    /// Indirect load payload.
    #[must_use]
    pub fn as_ivar(&self) -> Option<&IvarMeExpr> {
        match &self.kind {
            MeExprKind::Ivar(ivar) => Some(ivar),
            _ => None,
        }
    }

    /// Bucket hash of this node.
    #[must_use]
    pub fn hash_index(&self) -> u32 {
        let opnd_sum = |opnds: &[ExprId]| {
            opnds.iter().fold(0u32, |acc, id| {
                acc.wrapping_add(id.raw().wrapping_shl(OPND_HASH_SHIFT))
            })
        };
        match &self.kind {
            MeExprKind::Var(_) | MeExprKind::Reg(_) => 0,
            MeExprKind::Const(value) => value.hash_bits(),
            MeExprKind::Conststr(idx) => idx.raw().wrapping_shl(6),
            MeExprKind::Conststr16(idx) => idx.raw().wrapping_shl(6),
            MeExprKind::Sizeoftype(ty) => ty.raw().wrapping_shl(5),
            MeExprKind::FieldsDist { ty, field1, field2 } => ty
                .raw()
                .wrapping_shl(10)
                .wrapping_add((*field1 as u32).wrapping_shl(5))
                .wrapping_add(*field2 as u32),
            MeExprKind::Addrof { ost, .. } => ost.raw().wrapping_shl(4),
            MeExprKind::Addroffunc(pu) => pu.raw().wrapping_shl(5),
            MeExprKind::Gcmalloc(ty) => ty.raw().wrapping_shl(4),
            MeExprKind::Op(op) => (self.op as u32).wrapping_add(opnd_sum(&op.opnds)),
            MeExprKind::Ivar(ivar) => (Opcode::Iread as u32)
                .wrapping_add(ivar.field_id as u32)
                .wrapping_add(ivar.base.raw().wrapping_shl(4)),
            MeExprKind::Nary(nary) => (self.op as u32)
                .wrapping_add(opnd_sum(&nary.opnds))
                .wrapping_add(u32::from(nary.bound_check)),
        }
    }

    /// Structural equality: opcode, type, variant payload and operand ids. Ids, depth and bucket
    /// links are ignored.
    #[must_use]
    pub fn is_identical(&self, other: &MeExpr) -> bool {
        if self.op != other.op || self.ptype != other.ptype {
            return false;
        }
        match (&self.kind, &other.kind) {
            (MeExprKind::Var(a), MeExprKind::Var(b)) => a.vst == b.vst,
            (MeExprKind::Reg(a), MeExprKind::Reg(b)) => a.vst == b.vst,
            (MeExprKind::Const(a), MeExprKind::Const(b)) => a == b,
            (MeExprKind::Conststr(a), MeExprKind::Conststr(b)) => a == b,
            (MeExprKind::Conststr16(a), MeExprKind::Conststr16(b)) => a == b,
            (MeExprKind::Sizeoftype(a), MeExprKind::Sizeoftype(b)) => a == b,
            (
                MeExprKind::FieldsDist {
                    ty: t1,
                    field1: a1,
                    field2: a2,
                },
                MeExprKind::FieldsDist {
                    ty: t2,
                    field1: b1,
                    field2: b2,
                },
            ) => t1 == t2 && a1 == b1 && a2 == b2,
            (
                MeExprKind::Addrof {
                    ost: o1,
                    field_id: f1,
                },
                MeExprKind::Addrof {
                    ost: o2,
                    field_id: f2,
                },
            ) => o1 == o2 && f1 == f2,
            (MeExprKind::Addroffunc(a), MeExprKind::Addroffunc(b)) => a == b,
            (MeExprKind::Gcmalloc(a), MeExprKind::Gcmalloc(b)) => a == b,
            (MeExprKind::Op(a), MeExprKind::Op(b)) => a == b,
            (MeExprKind::Ivar(a), MeExprKind::Ivar(b)) => {
                a.base == b.base && a.ty == b.ty && a.field_id == b.field_id && a.mu == b.mu
            }
            (MeExprKind::Nary(a), MeExprKind::Nary(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(id: u32, opcode: Opcode, opnds: Vec<ExprId>) -> MeExpr {
        MeExpr::new(
            ExprId::new(id),
            opcode,
            PrimType::I32,
            MeExprKind::Op(OpMeExpr {
                opnds,
                opnd_type: PrimType::I32,
                ty: TyIdx::new(0),
                field_id: 0,
                bits_offset: 0,
                bits_size: 0,
            }),
        )
    }

    #[test]
    fn test_hash_shifts() {
        let add = op(9, Opcode::Add, vec![ExprId::new(1), ExprId::new(2)]);
        assert_eq!(add.hash_index(), Opcode::Add as u32 + (1 << 3) + (2 << 3));

        let addrof = MeExpr::new(
            ExprId::new(0),
            Opcode::Addrof,
            PrimType::Ptr,
            MeExprKind::Addrof {
                ost: OStIdx::new(3),
                field_id: 0,
            },
        );
        assert_eq!(addrof.hash_index(), 3 << 4);

        let dist = MeExpr::new(
            ExprId::new(0),
            Opcode::Fieldsdist,
            PrimType::I32,
            MeExprKind::FieldsDist {
                ty: TyIdx::new(1),
                field1: 2,
                field2: 3,
            },
        );
        assert_eq!(dist.hash_index(), (1 << 10) + (2 << 5) + 3);

        let ivar = MeExpr::new(
            ExprId::new(0),
            Opcode::Iread,
            PrimType::I32,
            MeExprKind::Ivar(IvarMeExpr {
                base: ExprId::new(5),
                ty: TyIdx::new(0),
                field_id: 2,
                mu: None,
                maybe_null: true,
            }),
        );
        assert_eq!(ivar.hash_index(), Opcode::Iread as u32 + 2 + (5 << 4));
    }

    #[test]
    fn test_identity_ignores_id() {
        let a = op(1, Opcode::Add, vec![ExprId::new(4), ExprId::new(5)]);
        let b = op(2, Opcode::Add, vec![ExprId::new(4), ExprId::new(5)]);
        let c = op(3, Opcode::Add, vec![ExprId::new(5), ExprId::new(4)]);
        let d = op(4, Opcode::Sub, vec![ExprId::new(4), ExprId::new(5)]);
        assert!(a.is_identical(&b));
        assert!(!a.is_identical(&c));
        assert!(!a.is_identical(&d));
    }

    #[test]
    fn test_queries() {
        let zero = MeExpr::new(
            ExprId::new(0),
            Opcode::Constval,
            PrimType::I32,
            MeExprKind::Const(ConstValue::Int(0)),
        );
        assert!(zero.is_zero());
        assert!(zero.is_leaf());
        assert!(zero.pure());
        assert_eq!(zero.meop(), MeExprOp::Const);

        let popcount = MeExpr::new(
            ExprId::new(1),
            Opcode::Intrinsicop,
            PrimType::I32,
            MeExprKind::Nary(NaryMeExpr {
                ty: TyIdx::new(0),
                intrinsic: Some(IntrinsicId::Popcount),
                bound_check: false,
                opnds: vec![ExprId::new(0)],
            }),
        );
        assert!(popcount.pure());
        assert!(!popcount.is_leaf());

        let length = MeExpr::new(
            ExprId::new(2),
            Opcode::Intrinsicop,
            PrimType::I32,
            MeExprKind::Nary(NaryMeExpr {
                ty: TyIdx::new(0),
                intrinsic: Some(IntrinsicId::ArrayLength),
                bound_check: false,
                opnds: vec![ExprId::new(0)],
            }),
        );
        assert!(!length.pure());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_opnd_out_of_range() {
        let a = op(1, Opcode::Neg, vec![ExprId::new(4)]);
        let _ = a.opnd(1);
    }
}
