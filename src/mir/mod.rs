//! The non-SSA program representation consumed and produced by the middle end.
//!
//! A front end hands the middle end one [`MirFunction`] per routine: a flat list of
//! [`StmtNode`]s whose expressions are [`BaseNode`] trees, together with the [`SymbolTable`]
//! that declares every variable and pseudo register those trees mention. SSA construction reads
//! this form; [`crate::me::EmitStmt`] writes it back.
//!
//! # Key Types
//!
//! - [`Opcode`] - Operation codes shared with the SSA IR
//! - [`PrimType`] - Primitive value types
//! - [`BaseNode`] / [`StmtNode`] - Expression and statement trees
//! - [`SymbolTable`] - Declared variables and pseudo registers of one function
//! - [`StringTable`] - Interned narrow and wide string literals

mod function;
mod node;
mod opcode;
mod strtab;
mod symbol;
mod types;

pub use function::{MirFunction, MirModule};
pub use node::{BaseNode, CallReturn, Callee, StmtKind, StmtNode};
pub use opcode::{IntrinsicId, Opcode};
pub use strtab::StringTable;
pub use symbol::{MirPreg, MirSymbol, PregIdx, StIdx, StorageClass, SymbolTable};
pub use types::{
    ConstValue, FieldId, LabelIdx, PrimType, PuIdx, SrcPosition, StrIdx, TyIdx, U16StrIdx,
};
