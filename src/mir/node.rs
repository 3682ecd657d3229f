//! The non-SSA statement tree.
//!
//! This is both the input of SSA construction and the output of re-materialization. Symbols are
//! referenced through [`StIdx`]/[`PregIdx`] of the function's [`super::SymbolTable`].

use std::fmt;

use crate::mir::{
    ConstValue, FieldId, IntrinsicId, LabelIdx, Opcode, PregIdx, PrimType, PuIdx, SrcPosition,
    StIdx, StrIdx, TyIdx, U16StrIdx,
};

/// An expression of the non-SSA tree.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseNode {
    /// Read of a variable (or one of its fields)
    Dread {
        /// Value type
        ptype: PrimType,
        /// Variable
        st: StIdx,
        /// Field, `0` for the whole variable
        field_id: FieldId,
    },
    /// Read of a pseudo register
    Regread {
        /// Value type
        ptype: PrimType,
        /// Register
        preg: PregIdx,
    },
    /// Constant
    Constval {
        /// Value type
        ptype: PrimType,
        /// Value
        value: ConstValue,
    },
    /// Narrow string literal
    Conststr {
        /// Value type
        ptype: PrimType,
        /// Literal
        str_idx: StrIdx,
    },
    /// Wide string literal
    Conststr16 {
        /// Value type
        ptype: PrimType,
        /// Literal
        str_idx: U16StrIdx,
    },
    /// Address of a variable
    Addrof {
        /// Value type
        ptype: PrimType,
        /// Variable
        st: StIdx,
        /// Field
        field_id: FieldId,
    },
    /// Address of a function
    Addroffunc {
        /// Value type
        ptype: PrimType,
        /// Function
        pu: PuIdx,
    },
    /// Heap allocation
    Gcmalloc {
        /// One of the allocation opcodes
        op: Opcode,
        /// Value type
        ptype: PrimType,
        /// Allocated type
        ty: TyIdx,
    },
    /// Size of a type
    Sizeoftype {
        /// Value type
        ptype: PrimType,
        /// Measured type
        ty: TyIdx,
    },
    /// Distance between two fields of an aggregate
    Fieldsdist {
        /// Value type
        ptype: PrimType,
        /// Aggregate type
        ty: TyIdx,
        /// First field
        field1: FieldId,
        /// Second field
        field2: FieldId,
    },
    /// Indirect load through an address
    Iread {
        /// Value type
        ptype: PrimType,
        /// Pointer type of the address
        ty: TyIdx,
        /// Field
        field_id: FieldId,
        /// Address
        base: Box<BaseNode>,
    },
    /// Unary, binary or ternary operator
    Op {
        /// Operator
        op: Opcode,
        /// Result type
        ptype: PrimType,
        /// Operand type for comparisons and conversions
        opnd_type: PrimType,
        /// Operands
        opnds: Vec<BaseNode>,
        /// Type for `iaddrof`/`retype`
        ty: TyIdx,
        /// Field for `iaddrof`
        field_id: FieldId,
        /// Bit offset for `extractbits`/`depositbits`
        bits_offset: u8,
        /// Bit size for `extractbits`/`depositbits`/`sext`/`zext`
        bits_size: u8,
    },
    /// Array indexing or intrinsic operator
    Nary {
        /// `array` or `intrinsicop`
        op: Opcode,
        /// Result type
        ptype: PrimType,
        /// Array type for `array`, result type for `intrinsicop`
        ty: TyIdx,
        /// Intrinsic for `intrinsicop`
        intrinsic: Option<IntrinsicId>,
        /// Whether `array` checks bounds
        bound_check: bool,
        /// Operands
        opnds: Vec<BaseNode>,
    },
}

impl BaseNode {
    /// Opcode of this expression.
    #[must_use]
    pub fn op(&self) -> Opcode {
        match self {
            BaseNode::Dread { .. } => Opcode::Dread,
            BaseNode::Regread { .. } => Opcode::Regread,
            BaseNode::Constval { .. } => Opcode::Constval,
            BaseNode::Conststr { .. } => Opcode::Conststr,
            BaseNode::Conststr16 { .. } => Opcode::Conststr16,
            BaseNode::Addrof { .. } => Opcode::Addrof,
            BaseNode::Addroffunc { .. } => Opcode::Addroffunc,
            BaseNode::Sizeoftype { .. } => Opcode::Sizeoftype,
            BaseNode::Fieldsdist { .. } => Opcode::Fieldsdist,
            BaseNode::Iread { .. } => Opcode::Iread,
            BaseNode::Gcmalloc { op, .. } | BaseNode::Op { op, .. } | BaseNode::Nary { op, .. } => {
                *op
            }
        }
    }

    /// Value type of this expression.
    #[must_use]
    pub fn ptype(&self) -> PrimType {
        match self {
            BaseNode::Dread { ptype, .. }
            | BaseNode::Regread { ptype, .. }
            | BaseNode::Constval { ptype, .. }
            | BaseNode::Conststr { ptype, .. }
            | BaseNode::Conststr16 { ptype, .. }
            | BaseNode::Addrof { ptype, .. }
            | BaseNode::Addroffunc { ptype, .. }
            | BaseNode::Gcmalloc { ptype, .. }
            | BaseNode::Sizeoftype { ptype, .. }
            | BaseNode::Fieldsdist { ptype, .. }
            | BaseNode::Iread { ptype, .. }
            | BaseNode::Op { ptype, .. }
            | BaseNode::Nary { ptype, .. } => *ptype,
        }
    }

    /// Child expressions in operand order.
    #[must_use]
    pub fn children(&self) -> Vec<&BaseNode> {
        match self {
            BaseNode::Iread { base, .. } => vec![base.as_ref()],
            BaseNode::Op { opnds, .. } | BaseNode::Nary { opnds, .. } => opnds.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Shorthand for a whole-variable read.
    #[must_use]
    pub fn dread(ptype: PrimType, st: StIdx) -> Self {
        BaseNode::Dread {
            ptype,
            st,
            field_id: 0,
        }
    }

    /// Shorthand for a register read.
    #[must_use]
    pub fn regread(ptype: PrimType, preg: PregIdx) -> Self {
        BaseNode::Regread { ptype, preg }
    }

    /// Shorthand for an integer constant.
    #[must_use]
    pub fn int(ptype: PrimType, value: i64) -> Self {
        BaseNode::Constval {
            ptype,
            value: ConstValue::Int(value),
        }
    }

    /// Shorthand for a unary, binary or ternary operator without type or bit-field payload.
    #[must_use]
    pub fn operator(op: Opcode, ptype: PrimType, opnds: Vec<BaseNode>) -> Self {
        BaseNode::Op {
            op,
            ptype,
            opnd_type: opnds.first().map(BaseNode::ptype).unwrap_or(ptype),
            opnds,
            ty: TyIdx::new(0),
            field_id: 0,
            bits_offset: 0,
            bits_size: 0,
        }
    }

    /// Shorthand for an indirect load of a whole object.
    #[must_use]
    pub fn iread(ptype: PrimType, ty: TyIdx, base: BaseNode) -> Self {
        BaseNode::Iread {
            ptype,
            ty,
            field_id: 0,
            base: Box::new(base),
        }
    }
}

/// Destination of one return value of an assigned call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallReturn {
    /// Stored to a variable field
    Var(StIdx, FieldId),
    /// Stored to a pseudo register
    Reg(PregIdx),
}

/// Target of a call statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    /// Direct call of a known function
    Direct(PuIdx),
    /// Call through a function pointer, the first argument
    Indirect {
        /// Return type of the called signature
        ret_ty: TyIdx,
    },
    /// Intrinsic
    Intrinsic {
        /// Intrinsic
        id: IntrinsicId,
        /// Type argument of the intrinsic
        ty: TyIdx,
        /// Type of the returned value
        ret_ptype: PrimType,
    },
}

/// Payload of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `dassign` and `maydassign`
    Dassign {
        /// Target variable
        st: StIdx,
        /// Target field
        field_id: FieldId,
        /// Stored value
        rhs: BaseNode,
    },
    /// `regassign`
    Regassign {
        /// Target register
        preg: PregIdx,
        /// Stored value
        rhs: BaseNode,
    },
    /// `iassign`
    Iassign {
        /// Pointer type of the address
        ty: TyIdx,
        /// Field
        field_id: FieldId,
        /// Address
        addr: BaseNode,
        /// Stored value
        rhs: BaseNode,
    },
    /// Every call form
    Call {
        /// What is called
        callee: Callee,
        /// Arguments; for indirect calls the first one is the function pointer
        args: Vec<BaseNode>,
        /// Return destinations, non-empty only for the assigned forms
        rets: Vec<CallReturn>,
    },
    /// `label`
    Label(LabelIdx),
    /// `goto` and `gosub`
    Goto(LabelIdx),
    /// `brtrue` and `brfalse`
    CondGoto {
        /// Condition
        cond: BaseNode,
        /// Taken target
        target: LabelIdx,
    },
    /// `switch`
    Switch {
        /// Switched value
        opnd: BaseNode,
        /// Target when no case matches
        default: LabelIdx,
        /// `(case value, target)` pairs
        cases: Vec<(i64, LabelIdx)>,
    },
    /// `return`, `syncenter` and `syncexit`
    Nary(Vec<BaseNode>),
    /// `eval`, `free`, `decref`, `incref`, `assertnonnull` and `throw`
    Unary(BaseNode),
    /// `assertge` and `assertlt`
    Assert {
        /// Array address
        array: BaseNode,
        /// Index that is checked
        index: BaseNode,
    },
    /// `try`
    Try(Vec<LabelIdx>),
    /// `catch`
    Catch(Vec<TyIdx>),
    /// `endtry` and `retsub`
    Plain,
    /// `comment`
    Comment(String),
}

/// A statement of the non-SSA tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtNode {
    /// Opcode
    pub op: Opcode,
    /// Where it came from
    pub src_pos: SrcPosition,
    /// Payload
    pub kind: StmtKind,
}

impl StmtNode {
    /// Creates a statement without source position.
    #[must_use]
    pub fn new(op: Opcode, kind: StmtKind) -> Self {
        StmtNode {
            op,
            src_pos: SrcPosition::default(),
            kind,
        }
    }

    /// Attaches a source position.
    #[must_use]
    pub fn at(mut self, src_pos: SrcPosition) -> Self {
        self.src_pos = src_pos;
        self
    }

    /// `dassign st = rhs`
    #[must_use]
    pub fn dassign(st: StIdx, rhs: BaseNode) -> Self {
        StmtNode::new(
            Opcode::Dassign,
            StmtKind::Dassign {
                st,
                field_id: 0,
                rhs,
            },
        )
    }

    /// `regassign preg = rhs`
    #[must_use]
    pub fn regassign(preg: PregIdx, rhs: BaseNode) -> Self {
        StmtNode::new(Opcode::Regassign, StmtKind::Regassign { preg, rhs })
    }

    /// `label`
    #[must_use]
    pub fn label(label: LabelIdx) -> Self {
        StmtNode::new(Opcode::Label, StmtKind::Label(label))
    }

    /// `goto`
    #[must_use]
    pub fn goto(label: LabelIdx) -> Self {
        StmtNode::new(Opcode::Goto, StmtKind::Goto(label))
    }

    /// `brtrue`/`brfalse`
    #[must_use]
    pub fn cond_goto(op: Opcode, cond: BaseNode, target: LabelIdx) -> Self {
        StmtNode::new(op, StmtKind::CondGoto { cond, target })
    }

    /// `return` with the given values
    #[must_use]
    pub fn ret(values: Vec<BaseNode>) -> Self {
        StmtNode::new(Opcode::Return, StmtKind::Nary(values))
    }
}

impl fmt::Display for BaseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseNode::Dread {
                ptype, st, field_id, ..
            } => write!(f, "dread {ptype} {st} {field_id}"),
            BaseNode::Regread { ptype, preg } => write!(f, "regread {ptype} {preg}"),
            BaseNode::Constval { ptype, value } => write!(f, "constval {ptype} {value}"),
            BaseNode::Conststr { ptype, str_idx } => write!(f, "conststr {ptype} {str_idx}"),
            BaseNode::Conststr16 { ptype, str_idx } => write!(f, "conststr16 {ptype} {str_idx}"),
            BaseNode::Addrof {
                ptype, st, field_id, ..
            } => write!(f, "addrof {ptype} {st} {field_id}"),
            BaseNode::Addroffunc { ptype, pu } => write!(f, "addroffunc {ptype} {pu}"),
            BaseNode::Gcmalloc { op, ptype, ty } => write!(f, "{op} {ptype} {ty}"),
            BaseNode::Sizeoftype { ptype, ty } => write!(f, "sizeoftype {ptype} {ty}"),
            BaseNode::Fieldsdist {
                ptype,
                ty,
                field1,
                field2,
            } => write!(f, "fieldsdist {ptype} {ty} {field1} {field2}"),
            BaseNode::Iread {
                ptype,
                ty,
                field_id,
                base,
            } => write!(f, "iread {ptype} {ty} {field_id} ({base})"),
            BaseNode::Op {
                op, ptype, opnds, ..
            }
            | BaseNode::Nary {
                op, ptype, opnds, ..
            } => {
                write!(f, "{op} {ptype} (")?;
                for (i, opnd) in opnds.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{opnd}")?;
                }
                write!(f, ")")
            }
        }
    }
}
