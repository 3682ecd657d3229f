//! Opcodes shared by the input tree and the SSA IR.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Operation code of an expression or statement.
///
/// The same opcode space is used before and after SSA construction; a statement keeps the opcode
/// of the tree node it was built from, so re-materialization restores it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)]
pub enum Opcode {
    // Leaf expressions
    Dread,
    Regread,
    Addrof,
    Addroffunc,
    Constval,
    Conststr,
    Conststr16,
    Sizeoftype,
    Fieldsdist,
    Gcmalloc,
    Gcmallocjarray,
    Gcpermalloc,
    Gcpermallocjarray,

    // Memory
    Iread,
    Iaddrof,

    // Unary operators
    Neg,
    Bnot,
    Lnot,
    Abs,
    Sqrt,
    Cvt,
    Retype,
    Sext,
    Zext,
    Extractbits,

    // Binary operators
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Ashr,
    Lshr,
    Band,
    Bior,
    Bxor,
    Land,
    Lior,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Cmp,
    Max,
    Min,
    Depositbits,

    // Ternary operator
    Select,

    // N-ary expressions
    Array,
    Intrinsicop,

    // Assignments
    Dassign,
    Maydassign,
    Regassign,
    Iassign,

    // Calls
    Call,
    Virtualcall,
    Callassigned,
    Virtualcallassigned,
    Icall,
    Icallassigned,
    Intrinsiccall,
    Intrinsiccallassigned,

    // Control flow
    Label,
    Goto,
    Brtrue,
    Brfalse,
    Switch,
    Return,
    Gosub,
    Retsub,

    // Unary statements
    Eval,
    Free,
    Decref,
    Incref,
    Assertnonnull,

    // Exceptions and synchronization
    Throw,
    Try,
    Endtry,
    Catch,
    Syncenter,
    Syncexit,

    // Bounds checks
    Assertge,
    Assertlt,

    Comment,
}

impl Opcode {
    /// Number of operands of a unary/binary/ternary operator, `None` for every other opcode.
    #[must_use]
    pub const fn operator_arity(self) -> Option<usize> {
        match self {
            Opcode::Neg
            | Opcode::Bnot
            | Opcode::Lnot
            | Opcode::Abs
            | Opcode::Sqrt
            | Opcode::Cvt
            | Opcode::Retype
            | Opcode::Sext
            | Opcode::Zext
            | Opcode::Extractbits
            | Opcode::Iaddrof => Some(1),
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rem
            | Opcode::Shl
            | Opcode::Ashr
            | Opcode::Lshr
            | Opcode::Band
            | Opcode::Bior
            | Opcode::Bxor
            | Opcode::Land
            | Opcode::Lior
            | Opcode::Eq
            | Opcode::Ne
            | Opcode::Lt
            | Opcode::Le
            | Opcode::Gt
            | Opcode::Ge
            | Opcode::Cmp
            | Opcode::Max
            | Opcode::Min
            | Opcode::Depositbits => Some(2),
            Opcode::Select => Some(3),
            _ => None,
        }
    }

    /// Returns `true` if the opcode denotes an expression.
    #[must_use]
    pub const fn is_expr(self) -> bool {
        matches!(
            self,
            Opcode::Dread
                | Opcode::Regread
                | Opcode::Addrof
                | Opcode::Addroffunc
                | Opcode::Constval
                | Opcode::Conststr
                | Opcode::Conststr16
                | Opcode::Sizeoftype
                | Opcode::Fieldsdist
                | Opcode::Iread
                | Opcode::Array
                | Opcode::Intrinsicop
        ) || self.is_gcmalloc()
            || self.operator_arity().is_some()
    }

    /// Returns `true` if the opcode denotes a statement.
    #[must_use]
    pub const fn is_stmt(self) -> bool {
        !self.is_expr()
    }

    /// Returns `true` for the allocation opcodes.
    #[must_use]
    pub const fn is_gcmalloc(self) -> bool {
        matches!(
            self,
            Opcode::Gcmalloc
                | Opcode::Gcmallocjarray
                | Opcode::Gcpermalloc
                | Opcode::Gcpermallocjarray
        )
    }

    /// Returns `true` if evaluating the opcode has no side effect and does not depend on
    /// mutable memory state.
    ///
    /// Indirect loads and allocations are never pure; intrinsic operators are decided per
    /// intrinsic by [`IntrinsicId::is_pure`].
    #[must_use]
    pub const fn is_pure(self) -> bool {
        !matches!(self, Opcode::Iread | Opcode::Intrinsicop) && !self.is_gcmalloc()
    }

    /// Returns `true` for every call form.
    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(
            self,
            Opcode::Call
                | Opcode::Virtualcall
                | Opcode::Callassigned
                | Opcode::Virtualcallassigned
                | Opcode::Icall
                | Opcode::Icallassigned
                | Opcode::Intrinsiccall
                | Opcode::Intrinsiccallassigned
        )
    }

    /// Returns `true` for the call forms that assign their return values.
    #[must_use]
    pub const fn is_call_assigned(self) -> bool {
        matches!(
            self,
            Opcode::Callassigned
                | Opcode::Virtualcallassigned
                | Opcode::Icallassigned
                | Opcode::Intrinsiccallassigned
        )
    }

    /// Returns `true` for `brtrue` and `brfalse`.
    #[must_use]
    pub const fn is_cond_br(self) -> bool {
        matches!(self, Opcode::Brtrue | Opcode::Brfalse)
    }

    /// Returns `true` for the bounds-check assertions.
    #[must_use]
    pub const fn is_assert_bce(self) -> bool {
        matches!(self, Opcode::Assertge | Opcode::Assertlt)
    }

    /// Returns `true` for statements that leave the current routine or subroutine.
    #[must_use]
    pub const fn is_return(self) -> bool {
        matches!(
            self,
            Opcode::Gosub | Opcode::Retsub | Opcode::Throw | Opcode::Return
        )
    }

    /// Returns `true` for the four assignment forms.
    #[must_use]
    pub const fn is_assign(self) -> bool {
        matches!(
            self,
            Opcode::Dassign | Opcode::Maydassign | Opcode::Iassign | Opcode::Regassign
        )
    }

    /// Returns `true` for the single-operand statements without SSA side effects.
    #[must_use]
    pub const fn is_unary_stmt(self) -> bool {
        matches!(
            self,
            Opcode::Eval | Opcode::Free | Opcode::Decref | Opcode::Incref | Opcode::Assertnonnull
        )
    }

    /// Returns `true` if control never falls through to the next statement.
    #[must_use]
    pub const fn ends_block(self) -> bool {
        matches!(
            self,
            Opcode::Goto
                | Opcode::Brtrue
                | Opcode::Brfalse
                | Opcode::Switch
                | Opcode::Return
                | Opcode::Throw
                | Opcode::Gosub
                | Opcode::Retsub
                | Opcode::Try
                | Opcode::Endtry
        )
    }
}

/// Intrinsic operations used by `intrinsicop` expressions and `intrinsiccall` statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[allow(missing_docs)]
pub enum IntrinsicId {
    Clz,
    Ctz,
    Popcount,
    ArrayLength,
    ClassInitCheck,
    MemSet,
    MemCopy,
    Prefetch,
}

impl IntrinsicId {
    /// Returns `true` if the intrinsic reads no memory and has no side effect.
    #[must_use]
    pub const fn is_pure(self) -> bool {
        matches!(self, IntrinsicId::Clz | IntrinsicId::Ctz | IntrinsicId::Popcount)
    }
}
