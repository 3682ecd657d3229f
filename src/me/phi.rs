//! Phi nodes of versioned variables and registers.

use crate::me::{BbId, ExprId};

index_type!(
    /// Index of a phi node
    PhiId, "phi"
);

/// A phi merging one incoming version per predecessor of its block.
///
/// Operand `i` flows in from predecessor `i` of [`MePhiNode::def_bb`].
#[derive(Debug, Clone)]
pub struct MePhiNode {
    lhs: ExprId,
    opnds: Vec<ExprId>,
    is_live: bool,
    def_bb: BbId,
}

impl MePhiNode {
    pub(super) fn new(lhs: ExprId, def_bb: BbId, opnds: Vec<ExprId>) -> Self {
        MePhiNode {
            lhs,
            opnds,
            is_live: true,
            def_bb,
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

    /// Incoming versions in predecessor order.
    #[must_use]
    pub fn opnds(&self) -> &[ExprId] {
        &self.opnds
    }

    /// Incoming version from predecessor `i`.
    #[must_use]
    pub fn opnd(&self, i: usize) -> ExprId {
        check_fatal!(
            i < self.opnds.len(),
            "phi operand {} of {} out of range",
            i,
            self.opnds.len()
        );
        self.opnds[i]
    }

    /// Replaces the incoming version from predecessor `i`.
    pub fn set_opnd(&mut self, i: usize, opnd: ExprId) {
        check_fatal!(
            i < self.opnds.len(),
            "phi operand {} of {} out of range",
            i,
            self.opnds.len()
        );
        self.opnds[i] = opnd;
    }

    pub(super) fn remove_opnd(&mut self, i: usize) -> ExprId {
        check_fatal!(
            i < self.opnds.len(),
            "phi operand {} of {} out of range",
            i,
            self.opnds.len()
        );
        self.opnds.remove(i)
    }

    /// Whether the phi is still needed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_live
    }

    /// Marks the phi live or dead.
    pub fn set_live(&mut self, live: bool) {
        self.is_live = live;
    }

    /// Block the phi belongs to.
    #[must_use]
    pub fn def_bb(&self) -> BbId {
        self.def_bb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operands() {
        let mut phi = MePhiNode::new(
            ExprId::new(0),
            BbId::new(2),
            vec![ExprId::new(1), ExprId::new(2)],
        );
        phi.set_opnd(1, ExprId::new(5));
        assert_eq!(phi.opnds(), &[ExprId::new(1), ExprId::new(5)]);
        assert_eq!(phi.remove_opnd(0), ExprId::new(1));
        assert_eq!(phi.opnd(0), ExprId::new(5));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_operand_out_of_range() {
        let phi = MePhiNode::new(ExprId::new(0), BbId::new(0), vec![ExprId::new(1)]);
        let _ = phi.opnd(1);
    }
}
