//! # meir Prelude
//!
//! The types a pass over the SSA IR touches most often, for glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all meir operations
pub use crate::Error;

/// The result type used throughout meir
pub use crate::Result;

/// Build and dump options
pub use crate::MeConfig;

// ================================================================================================
// Input Form
// ================================================================================================

/// Statement and expression trees
pub use crate::mir::{BaseNode, CallReturn, Callee, StmtKind, StmtNode};

/// Functions, modules and their symbols
pub use crate::mir::{MirFunction, MirModule, PregIdx, StIdx, SymbolTable};

/// Opcodes, types and literal values
pub use crate::mir::{ConstValue, IntrinsicId, LabelIdx, Opcode, PrimType, PuIdx, TyIdx};

// ================================================================================================
// SSA Form
// ================================================================================================

/// Entry points
pub use crate::me::{build_module, verify, EmitStmt, MeFunction};

/// Blocks and the block graph
pub use crate::me::{BasicBlock, BbAttr, BbId, BbKind, MeCfg, SccTopology};

/// Symbols and versions
pub use crate::me::{OStIdx, OstKind, SsaTab, VStIdx};

/// Nodes and their handles
pub use crate::me::{
    ChiId, ExprId, IrMap, MeDefBy, MeExpr, MeExprKind, MePhiNode, MeStmt, MeStmtKind, MustDefId,
    PhiId, StmtId,
};
