// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::too_many_arguments)]

//! # meir
//!
//! The SSA-form middle-end IR of an ahead-of-time compiler.
//!
//! A front end lowers each routine to a flat list of [`mir::StmtNode`]s over a
//! [`mir::SymbolTable`]. `meir` turns that list into a basic block graph in SSA form, where every
//! scalar variable field and pseudo register is split into versions, merges are made explicit
//! with phi nodes, and memory effects of stores and calls are recorded as chi (may-def),
//! mu (may-use) and must-def lists. Optimization passes work on this form and hand it back
//! through [`me::EmitStmt`].
//!
//! ## Features
//!
//! - **Handle-based IR** - Blocks, expressions, statements and phi nodes live in per-function
//!   arenas and refer to each other by dense indices
//! - **Hash-consed expressions** - Structurally equal expressions share one node
//! - **Pruned SSA** - Phis only where a symbol is live on entry to a merge point
//! - **Alias modeling** - Chi/mu lists over a single heap symbol, switchable per build
//! - **Parallel module builds** - Independent functions are lowered concurrently
//!
//! ## Quick Start
//!
//! ```rust
//! use meir::prelude::*;
//!
//! let mut symbols = SymbolTable::new();
//! let c = symbols.declare_formal("c", PrimType::I32);
//! let x = symbols.declare_local("x", PrimType::I32);
//! let (else_arm, join) = (LabelIdx::new(1), LabelIdx::new(2));
//!
//! let body = vec![
//!     StmtNode::cond_goto(Opcode::Brfalse, BaseNode::dread(PrimType::I32, c), else_arm),
//!     StmtNode::dassign(x, BaseNode::int(PrimType::I32, 1)),
//!     StmtNode::goto(join),
//!     StmtNode::label(else_arm),
//!     StmtNode::dassign(x, BaseNode::int(PrimType::I32, 2)),
//!     StmtNode::label(join),
//!     StmtNode::ret(vec![BaseNode::dread(PrimType::I32, x)]),
//! ];
//! let mir = MirFunction::new("select", symbols, body);
//!
//! let func = MeFunction::build(&mir, &MeConfig::default())?;
//! assert_eq!(func.cfg().layout().len(), 4);
//! println!("{func}");
//! # Ok::<(), meir::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Malformed input (undefined labels, unknown symbols, opcodes in the wrong position) is
//! reported as an [`Error`]. Broken IR invariants are compiler bugs and abort with a `fatal:`
//! diagnostic that is also logged through the [`log`] facade.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust
/// use meir::prelude::*;
///
/// let config = MeConfig::minimal();
/// assert!(!config.models_aliasing());
/// ```
pub mod prelude;

/// Build options, dump filters and the phase names they refer to.
pub mod config;

/// The non-SSA input and output form: statement trees, symbols, types and opcodes.
///
/// # Key Types
///
/// - [`mir::MirFunction`] / [`mir::MirModule`] - One routine and a whole compilation unit
/// - [`mir::StmtNode`] / [`mir::BaseNode`] - Statement and expression trees
/// - [`mir::SymbolTable`] - Variables and pseudo registers of a function
pub mod mir;

/// The SSA IR itself: block graph, versioned symbols, expression and statement nodes,
/// construction, emission, verification and dumping.
///
/// # Main Entry Points
///
/// - [`me::MeFunction::build`] - Lower one function into SSA form
/// - [`me::build_module`] - Lower every function of a module in parallel
/// - [`me::EmitStmt`] - Turn SSA nodes back into statement trees
/// - [`me::verify`] - Check the IR's structural invariants
pub mod me;

/// Arena storage, bit sets and generic graph algorithms.
pub mod utils;

/// `meir` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `meir` Error type
///
/// # Examples
///
/// ```rust
/// use meir::{mir::{LabelIdx, MirFunction, StmtNode, SymbolTable}, me::MeFunction, Error, MeConfig};
///
/// let func = MirFunction::new("f", SymbolTable::new(), vec![StmtNode::goto(LabelIdx::new(3))]);
/// match MeFunction::build(&func, &MeConfig::default()) {
///     Err(Error::Malformed { message, .. }) => assert!(message.contains("undefined label")),
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
pub use error::Error;

/// Options that steer SSA construction and dumping.
///
/// See [`config::MeConfig`].
pub use config::MeConfig;
