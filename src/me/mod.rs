//! The SSA middle-end IR.
//!
//! A [`MeFunction`] is built from one [`crate::mir::MirFunction`] and owns everything of that
//! function's SSA form: the block graph, the node store and the symbol tables. Cross references
//! between nodes are dense handles into the function's arenas, so a whole function is freed by
//! dropping it.
//!
//! # Architecture
//!
//! - [`SsaTab`] - Original symbols (variable fields, pseudo registers, the heap) and their versions
//! - [`MeCfg`] / [`BasicBlock`] - Blocks, edges and per-block phi tables
//! - [`SccTopology`] - Strongly connected components over the block graph
//! - [`MeExpr`] / [`MeStmt`] - Expression DAG and statements, with chi/mu/must-def lists
//! - [`IrMap`] - Node arenas, hash-consing and the [`IrMap::set_def`] mutator
//! - [`EmitStmt`] - Re-materialization of the non-SSA tree
//! - [`verify`] - Consistency checks
//!
//! # Construction
//!
//! 1. **Blocks**: labels and block-ending statements split the flat body; terminators link them
//! 2. **Phi placement**: pruned, at iterated dominance frontiers of each symbol's definitions
//! 3. **Renaming**: a dominator tree walk assigns versions and attaches chi/mu/must-def nodes
//!
//! # Usage
//!
//! ```rust
//! use meir::{
//!     me::build_module,
//!     mir::{BaseNode, MirFunction, MirModule, PrimType, StmtNode, SymbolTable},
//!     MeConfig,
//! };
//!
//! let mut symbols = SymbolTable::new();
//! let x = symbols.declare_local("x", PrimType::I32);
//! let body = vec![
//!     StmtNode::dassign(x, BaseNode::int(PrimType::I32, 7)),
//!     StmtNode::ret(vec![BaseNode::dread(PrimType::I32, x)]),
//! ];
//! let mut module = MirModule::new();
//! module.add_function(MirFunction::new("seven", symbols, body.clone()));
//!
//! let built = build_module(&module, &MeConfig::default());
//! let func = built[0].as_ref().unwrap().as_ref().unwrap();
//! assert_eq!(func.emit(), body);
//! ```
//!
//! # References
//!
//! - Cytron et al., "Efficiently Computing Static Single Assignment Form and the
//!   Control Dependence Graph", ACM TOPLAS 1991
//! - Chow et al., "Effective Representation of Aliases and Indirect Memory Operations in SSA
//!   Form", CC 1996

mod alias;
mod bb;
mod builder;
mod cfg;
mod defby;
mod defchain;
mod dump;
mod emit;
mod expr;
mod function;
mod hashcons;
mod irmap;
mod phi;
mod scc;
mod ssatab;
mod stmt;
mod verify;

use rayon::prelude::*;

pub use alias::{
    AliasEffects, CallResults, ChiId, ChiList, ChiMeNode, MuList, MustDefId, MustDefMeNode,
    RefCountFlags,
};
pub use bb::{remove_bb_from_vector, BasicBlock, BbAttr, BbId, BbKind, VersionPhi};
pub use cfg::MeCfg;
pub use defby::{DefKind, MeDefBy};
pub use emit::EmitStmt;
pub use expr::{
    ExprId, IvarMeExpr, MeExpr, MeExprKind, MeExprOp, NaryMeExpr, OpMeExpr, RegMeExpr, VarMeExpr,
};
pub use function::{MeFunction, StmtIter};
pub use hashcons::{HashConsTable, HASH_TABLE_SIZE};
pub use irmap::IrMap;
pub use phi::{MePhiNode, PhiId};
pub use scc::{SccId, SccOfBbs, SccTopology};
pub use ssatab::{OStIdx, OriginalSt, OstKind, SsaTab, VStIdx, VersionSt};
pub use stmt::{
    CallMeStmt, CallParts, DassignMeStmt, IassignMeStmt, IcallMeStmt, IntrinsiccallMeStmt,
    MaydassignMeStmt, MeStmt, MeStmtKind, RegassignMeStmt, StmtId, SwitchMeStmt,
};
pub use verify::verify;

use crate::{mir::MirModule, MeConfig, Result};

/// Builds every function of `module` in parallel.
///
/// The result has one entry per function, in declaration order. Functions outside
/// [`MeConfig::range`] are skipped and yield `None`. A function that fails to build does not
/// affect the others.
#[must_use]
pub fn build_module(module: &MirModule, config: &MeConfig) -> Vec<Option<Result<MeFunction>>> {
    let built: Vec<Option<Result<MeFunction>>> = module
        .functions
        .par_iter()
        .enumerate()
        .map(|(index, func)| {
            if !config.in_range(index) {
                return None;
            }
            let result = MeFunction::build(func, config);
            if let Err(error) = &result {
                log::warn!("{}: SSA construction failed: {}", func.name, error);
            }
            Some(result)
        })
        .collect();

    log::debug!(
        "built {} of {} functions",
        built.iter().filter(|r| matches!(r, Some(Ok(_)))).count(),
        module.functions.len()
    );
    built
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mir::{BaseNode, LabelIdx, MirFunction, PrimType, StmtNode, SymbolTable},
        test::{counting_loop, diamond_function},
        Error,
    };

    #[test]
    fn test_build_module_isolates_failures() {
        let mut module = MirModule::new();
        module.add_function(diamond_function().0);
        module.add_function(MirFunction::new(
            "broken",
            SymbolTable::new(),
            vec![StmtNode::goto(LabelIdx::new(4))],
        ));
        module.add_function(counting_loop().0);

        let built = build_module(&module, &MeConfig::default());
        assert_eq!(built.len(), 3);
        assert!(matches!(built[0], Some(Ok(_))));
        assert!(matches!(built[1], Some(Err(Error::Malformed { .. }))));
        let looped = built[2].as_ref().unwrap().as_ref().unwrap();
        assert_eq!(looped.name(), "counting_loop");
    }

    #[test]
    fn test_build_module_range() {
        let mut module = MirModule::new();
        for i in 0..4 {
            let mut symbols = SymbolTable::new();
            let x = symbols.declare_local("x", PrimType::I32);
            module.add_function(MirFunction::new(
                &format!("f{i}"),
                symbols,
                vec![StmtNode::ret(vec![BaseNode::dread(PrimType::I32, x)])],
            ));
        }
        let config = MeConfig {
            range: Some((1, 2)),
            ..MeConfig::default()
        };
        let built = build_module(&module, &config);
        assert!(built[0].is_none());
        assert!(built[1].is_some());
        assert!(built[2].is_some());
        assert!(built[3].is_none());
    }

    #[test]
    fn test_empty_function() {
        let func = MirFunction::new("empty", SymbolTable::new(), Vec::new());
        assert!(matches!(
            MeFunction::build(&func, &MeConfig::default()),
            Err(Error::Empty)
        ));
    }
}
