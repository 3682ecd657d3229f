//! Basic blocks of the middle-end CFG.
//!
//! A block owns its edge lists, a doubly linked statement sequence (by handle into the function's
//! statement arena) and three phi tables keyed by original symbol. Edge lists are private: every
//! change goes through [`super::MeCfg`], which updates both endpoints.

use std::collections::BTreeMap;

use bitflags::bitflags;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    me::{OStIdx, PhiId, StmtId, VStIdx},
    mir::LabelIdx,
};

index_type!(
    /// Index of a basic block
    BbId, "BB"
);

/// How control leaves a block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum BbKind {
    /// Not classified yet
    #[default]
    Unknown,
    /// Ends with `brtrue`/`brfalse`; successor 0 is the fallthrough, successor 1 the target
    CondGoto,
    /// Ends with an unconditional jump
    Goto,
    /// Falls into the next block
    Fallthru,
    /// Leaves the function
    Return,
    /// Entered when a finally subroutine returns
    AfterGosub,
    /// Ends with `switch`
    Switch,
    /// Removed from the graph
    Invalid,
}

bitflags! {
    /// Attribute flags of a basic block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BbAttr: u32 {
        /// Function entry
        const IS_ENTRY = 1 << 0;
        /// Leaves the function
        const IS_EXIT = 1 << 1;
        /// Never reaches an exit
        const WONT_EXIT = 1 << 2;
        /// Inside a try region
        const IS_TRY = 1 << 3;
        /// Last block of a try region
        const IS_TRY_END = 1 << 4;
        /// JavaScript catch handler
        const IS_JS_CATCH = 1 << 5;
        /// JavaScript finally handler
        const IS_JS_FINALLY = 1 << 6;
        /// Catch handler
        const IS_CATCH = 1 << 7;
        /// Java finally handler
        const IS_JAVA_FINALLY = 1 << 8;
        /// Created by the middle end, no source counterpart
        const ARTIFICIAL = 1 << 9;
        /// Member of a cyclic strongly connected component
        const IS_IN_LOOP = 1 << 10;
        /// In a loop, for escape analysis
        const IS_IN_LOOP_FOR_EA = 1 << 11;
    }
}

/// Version-level phi: result and operand versions, operand `i` from predecessor `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPhi {
    /// Defined version
    pub result: VStIdx,
    /// Incoming versions
    pub opnds: Vec<VStIdx>,
}

/// A basic block.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    id: BbId,
    /// Label at the block start
    pub label: Option<LabelIdx>,
    /// Kind of the terminator
    pub kind: BbKind,
    /// Attribute flags
    pub attrs: BbAttr,
    /// Profile frequency
    pub frequency: u64,
    pub(super) pred: Vec<BbId>,
    pub(super) succ: Vec<BbId>,
    pub(super) first: Option<StmtId>,
    pub(super) last: Option<StmtId>,
    /// Version-level phis of every symbol kind
    pub phi_list: BTreeMap<OStIdx, VersionPhi>,
    /// Variable phis
    pub var_phis: BTreeMap<OStIdx, PhiId>,
    /// Register phis
    pub reg_phis: BTreeMap<OStIdx, PhiId>,
    pub(super) deleted: bool,
}

impl BasicBlock {
    pub(super) fn new(id: BbId) -> Self {
        BasicBlock {
            id,
            label: None,
            kind: BbKind::Unknown,
            attrs: BbAttr::empty(),
            frequency: 0,
            pred: Vec::new(),
            succ: Vec::new(),
            first: None,
            last: None,
            phi_list: BTreeMap::new(),
            var_phis: BTreeMap::new(),
            reg_phis: BTreeMap::new(),
            deleted: false,
        }
    }

    /// Id of this block.
    #[must_use]
    pub fn id(&self) -> BbId {
        self.id
    }

    /// Predecessors in edge order.
    #[must_use]
    pub fn preds(&self) -> &[BbId] {
        &self.pred
    }

    /// Successors in edge order.
    #[must_use]
    pub fn succs(&self) -> &[BbId] {
        &self.succ
    }

    /// First statement.
    #[must_use]
    pub fn first(&self) -> Option<StmtId> {
        self.first
    }

    /// Last statement.
    #[must_use]
    pub fn last(&self) -> Option<StmtId> {
        self.last
    }

    /// Returns `true` if the block has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Returns `true` once the block was removed from the graph.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Position of `pred` in the predecessor list.
    #[must_use]
    pub fn pred_index(&self, pred: BbId) -> Option<usize> {
        self.pred.iter().position(|&p| p == pred)
    }

    /// Position of `succ` in the successor list.
    #[must_use]
    pub fn succ_index(&self, succ: BbId) -> Option<usize> {
        self.succ.iter().position(|&s| s == succ)
    }

    /// Attribute test.
    #[must_use]
    pub fn has_attr(&self, attr: BbAttr) -> bool {
        self.attrs.contains(attr)
    }

    /// Returns `true` if the block carries any phi.
    #[must_use]
    pub fn has_phis(&self) -> bool {
        !self.phi_list.is_empty() || !self.var_phis.is_empty() || !self.reg_phis.is_empty()
    }

    /// Copies the region flags of the block this one was split from.
    ///
    /// `IS_TRY`, `IS_TRY_END`, `IS_EXIT`, `WONT_EXIT` and `IS_IN_LOOP` end up equal to `from`'s.
    pub fn copy_flags_after_split(&mut self, from: &BasicBlock) {
        self.copy_split_flags(from.attrs);
    }

    pub(super) fn copy_split_flags(&mut self, from: BbAttr) {
        let carried = BbAttr::IS_TRY
            | BbAttr::IS_TRY_END
            | BbAttr::IS_EXIT
            | BbAttr::WONT_EXIT
            | BbAttr::IS_IN_LOOP;
        self.attrs = (self.attrs - carried) | (from & carried);
    }
}

/// Removes the first occurrence of `bb` from `list`, returning its former position.
pub fn remove_bb_from_vector(list: &mut Vec<BbId>, bb: BbId) -> Option<usize> {
    let pos = list.iter().position(|&b| b == bb)?;
    list.remove(pos);
    Some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_flags_after_split() {
        let mut head = BasicBlock::new(BbId::new(0));
        head.attrs = BbAttr::IS_TRY | BbAttr::IS_EXIT | BbAttr::IS_CATCH | BbAttr::IS_IN_LOOP;
        let mut tail = BasicBlock::new(BbId::new(1));
        tail.attrs = BbAttr::WONT_EXIT | BbAttr::ARTIFICIAL;

        tail.copy_flags_after_split(&head);
        assert_eq!(
            tail.attrs,
            BbAttr::IS_TRY | BbAttr::IS_EXIT | BbAttr::IS_IN_LOOP | BbAttr::ARTIFICIAL
        );
    }

    #[test]
    fn test_remove_bb_from_vector() {
        let mut list = vec![BbId::new(3), BbId::new(5), BbId::new(3)];
        assert_eq!(remove_bb_from_vector(&mut list, BbId::new(3)), Some(0));
        assert_eq!(list, vec![BbId::new(5), BbId::new(3)]);
        assert_eq!(remove_bb_from_vector(&mut list, BbId::new(9)), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(BbKind::CondGoto.to_string(), "CondGoto");
        assert_eq!("Switch".parse::<BbKind>().unwrap(), BbKind::Switch);
    }
}
