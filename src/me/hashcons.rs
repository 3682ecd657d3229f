//! Bucket table for hash-consing pure expressions.
//!
//! Buckets hold the head of a chain threaded through [`MeExpr::next`], so the table itself is a
//! flat vector of optional handles and every consed node costs no extra allocation.

use crate::{
    me::{ExprId, MeExpr},
    utils::Arena,
};

/// Number of buckets.
pub const HASH_TABLE_SIZE: usize = 5107;

/// Bucket heads of the consing table.
#[derive(Debug, Clone)]
pub struct HashConsTable {
    buckets: Vec<Option<ExprId>>,
    entries: usize,
}

impl Default for HashConsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HashConsTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        HashConsTable {
            buckets: vec![None; HASH_TABLE_SIZE],
            entries: 0,
        }
    }

    fn bucket(candidate: &MeExpr) -> usize {
        candidate.hash_index() as usize % HASH_TABLE_SIZE
    }

    /// Finds a node identical to `candidate` in its bucket chain.
    #[must_use]
    pub fn lookup(&self, candidate: &MeExpr, exprs: &Arena<MeExpr, ExprId>) -> Option<ExprId> {
        let mut cursor = self.buckets[Self::bucket(candidate)];
        while let Some(id) = cursor {
            let expr = &exprs[id];
            if expr.is_identical(candidate) {
                return Some(id);
            }
            cursor = expr.next();
        }
        None
    }

    /// Pushes `id` at the head of its bucket chain.
    pub fn insert(&mut self, id: ExprId, exprs: &mut Arena<MeExpr, ExprId>) {
        let bucket = Self::bucket(&exprs[id]);
        exprs[id].set_next(self.buckets[bucket]);
        self.buckets[bucket] = Some(id);
        self.entries += 1;
    }

    /// Number of consed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Returns `true` if nothing was consed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Length of the longest bucket chain.
    #[must_use]
    pub fn max_chain(&self, exprs: &Arena<MeExpr, ExprId>) -> usize {
        self.buckets
            .iter()
            .map(|head| {
                let mut len = 0;
                let mut cursor = *head;
                while let Some(id) = cursor {
                    len += 1;
                    cursor = exprs[id].next();
                }
                len
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        me::MeExprKind,
        mir::{ConstValue, Opcode, PrimType},
    };

    fn constant(exprs: &mut Arena<MeExpr, ExprId>, value: i64) -> ExprId {
        exprs.alloc_with(|id| {
            MeExpr::new(
                id,
                Opcode::Constval,
                PrimType::I32,
                MeExprKind::Const(ConstValue::Int(value)),
            )
        })
    }

    #[test]
    fn test_chains_share_bucket() {
        let mut exprs = Arena::new();
        let mut table = HashConsTable::new();

        let a = constant(&mut exprs, 7);
        table.insert(a, &mut exprs);
        // Same bucket, different value
        let b = constant(&mut exprs, 7 + HASH_TABLE_SIZE as i64);
        table.insert(b, &mut exprs);
        assert_eq!(table.len(), 2);
        assert_eq!(table.max_chain(&exprs), 2);

        let probe = MeExpr::new(
            ExprId::new(99),
            Opcode::Constval,
            PrimType::I32,
            MeExprKind::Const(ConstValue::Int(7)),
        );
        assert_eq!(table.lookup(&probe, &exprs), Some(a));

        let other = MeExpr::new(
            ExprId::new(99),
            Opcode::Constval,
            PrimType::I64,
            MeExprKind::Const(ConstValue::Int(7)),
        );
        assert_eq!(table.lookup(&other, &exprs), None);
    }
}
