//! May-def, may-use and must-def bookkeeping attached to statements.
//!
//! A chi records that a statement may overwrite an original symbol: it consumes the incoming
//! version (`rhs`) and produces a new one (`lhs`). A mu records that a statement or indirect load
//! may read a symbol. A must-def is a call return value that certainly defines its target.

use std::collections::BTreeMap;

use crate::me::{ExprId, OStIdx, StmtId};

index_type!(
    /// Index of a chi node
    ChiId, "chi"
);

index_type!(
    /// Index of a must-def node
    MustDefId, "mustdef"
);

/// May-def of one original symbol by a statement.
#[derive(Debug, Clone)]
pub struct ChiMeNode {
    rhs: ExprId,
    lhs: ExprId,
    base: StmtId,
    is_live: bool,
}

impl ChiMeNode {
    pub(super) fn new(rhs: ExprId, lhs: ExprId, base: StmtId) -> Self {
        ChiMeNode {
            rhs,
            lhs,
            base,
            is_live: true,
        }
    }

    /// Version before the statement.
    #[must_use]
    pub fn rhs(&self) -> ExprId {
        self.rhs
    }

    /// Replaces the incoming version.
    pub fn set_rhs(&mut self, rhs: ExprId) {
        self.rhs = rhs;
    }

    /// Version after the statement.
    #[must_use]
    pub fn lhs(&self) -> ExprId {
        self.lhs
    }

    pub(super) fn set_lhs(&mut self, lhs: ExprId) {
        self.lhs = lhs;
    }

    /// Statement owning this chi.
    #[must_use]
    pub fn base(&self) -> StmtId {
        self.base
    }

    /// Whether the chi is still needed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_live
    }

    /// Marks the chi live or dead.
    pub fn set_live(&mut self, live: bool) {
        self.is_live = live;
    }
}

/// Definite definition of a call return value.
///
/// Not `Clone`: a must-def belongs to exactly one call statement and its `lhs` names it as
/// definer. A return value moves to another statement only through [`super::IrMap::set_def`].
#[derive(Debug)]
pub struct MustDefMeNode {
    lhs: ExprId,
    base: StmtId,
    is_live: bool,
}

impl MustDefMeNode {
    pub(super) fn new(lhs: ExprId, base: StmtId) -> Self {
        MustDefMeNode {
            lhs,
            base,
            is_live: true,
        }
    }

    /// Defined version.
    #[must_use]
    pub fn lhs(&self) -> ExprId {
        self.lhs
    }

    pub(super) fn set_lhs(&mut self, lhs: ExprId) {
        self.lhs = lhs;
    }

    /// Call statement owning this must-def.
    #[must_use]
    pub fn base(&self) -> StmtId {
        self.base
    }

    /// Whether the definition is still needed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_live
    }

    /// Marks the must-def live or dead.
    pub fn set_live(&mut self, live: bool) {
        self.is_live = live;
    }
}

/// May-uses of a statement or indirect load: original symbol to the version read.
pub type MuList = BTreeMap<OStIdx, ExprId>;

/// May-defs of a statement by original symbol.
pub type ChiList = BTreeMap<OStIdx, ChiId>;

/// Memory side effects of a statement.
///
/// The chi list is read through [`super::MeStmt::chi_list`] and grows only through
/// [`super::IrMap::add_chi`].
#[derive(Debug, Clone, Default)]
pub struct AliasEffects {
    /// Symbols possibly read
    pub mu: MuList,
    pub(super) chi: ChiList,
}

/// Return values of a call: one must-def per value, in return order, added through
/// [`super::IrMap::add_must_def`].
#[derive(Debug, Clone, Default)]
pub struct CallResults {
    pub(super) must_defs: Vec<MustDefId>,
}

/// Reference counting requests on a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefCountFlags {
    need_decref: bool,
    need_incref: bool,
}

impl RefCountFlags {
    /// The old value of the target must be released.
    #[must_use]
    pub fn need_decref(self) -> bool {
        self.need_decref
    }

    /// The new value must be retained.
    #[must_use]
    pub fn need_incref(self) -> bool {
        self.need_incref
    }

    /// Requests a release of the old value.
    pub fn enable_need_decref(&mut self) {
        self.need_decref = true;
    }

    /// Cancels a release of the old value.
    pub fn disable_need_decref(&mut self) {
        self.need_decref = false;
    }

    /// Requests a retain of the new value.
    pub fn enable_need_incref(&mut self) {
        self.need_incref = true;
    }

    /// Cancels a retain of the new value.
    pub fn disable_need_incref(&mut self) {
        self.need_incref = false;
    }

    /// Sets the retain request.
    pub fn set_need_incref(&mut self, need: bool) {
        self.need_incref = need;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_count_flags() {
        let mut flags = RefCountFlags::default();
        assert!(!flags.need_decref() && !flags.need_incref());
        flags.enable_need_decref();
        flags.set_need_incref(true);
        assert!(flags.need_decref() && flags.need_incref());
        flags.disable_need_decref();
        flags.disable_need_incref();
        assert_eq!(flags, RefCountFlags::default());
    }

    #[test]
    fn test_chi_fields() {
        let mut chi = ChiMeNode::new(ExprId::new(1), ExprId::new(2), StmtId::new(0));
        chi.set_rhs(ExprId::new(7));
        assert_eq!(chi.rhs(), ExprId::new(7));
        assert_eq!(chi.lhs(), ExprId::new(2));
        assert_eq!(chi.base(), StmtId::new(0));
        assert!(chi.is_live());
    }
}
