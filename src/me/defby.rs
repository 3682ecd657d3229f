//! What defines a versioned variable or register.

use strum::{Display, EnumIter, IntoStaticStr};

use crate::me::{ChiId, MustDefId, PhiId, StmtId};

/// The definition of a version, one per [`super::MeExprKind::Var`] or
/// [`super::MeExprKind::Reg`] expression.
///
/// Only [`super::IrMap::set_def`] changes it, so the tag, the handle and the defining node's
/// `lhs` always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeDefBy {
    /// Entry value, no definition in the function
    #[default]
    No,
    /// Direct assignment
    Stmt(StmtId),
    /// Phi at a merge point
    Phi(PhiId),
    /// May-def of a statement
    Chi(ChiId),
    /// Return value of a call
    MustDef(MustDefId),
}

/// Tag of a [`MeDefBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)]
pub enum DefKind {
    No,
    Stmt,
    Phi,
    Chi,
    MustDef,
}

impl MeDefBy {
    /// Tag of this definition.
    #[must_use]
    pub fn kind(self) -> DefKind {
        match self {
            MeDefBy::No => DefKind::No,
            MeDefBy::Stmt(_) => DefKind::Stmt,
            MeDefBy::Phi(_) => DefKind::Phi,
            MeDefBy::Chi(_) => DefKind::Chi,
            MeDefBy::MustDef(_) => DefKind::MustDef,
        }
    }

    /// Returns `true` for [`MeDefBy::No`].
    #[must_use]
    pub fn is_none(self) -> bool {
        matches!(self, MeDefBy::No)
    }

    /// Defining statement.
    #[must_use]
    pub fn as_stmt(self) -> Option<StmtId> {
        match self {
            MeDefBy::Stmt(id) => Some(id),
            _ => None,
        }
    }

    /// Defining phi.
    #[must_use]
    pub fn as_phi(self) -> Option<PhiId> {
        match self {
            MeDefBy::Phi(id) => Some(id),
            _ => None,
        }
    }

    /// Defining chi.
    #[must_use]
    pub fn as_chi(self) -> Option<ChiId> {
        match self {
            MeDefBy::Chi(id) => Some(id),
            _ => None,
        }
    }

    /// Defining must-def.
    #[must_use]
    pub fn as_must_def(self) -> Option<MustDefId> {
        match self {
            MeDefBy::MustDef(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        let def = MeDefBy::Phi(PhiId::new(3));
        assert_eq!(def.kind(), DefKind::Phi);
        assert_eq!(def.as_phi(), Some(PhiId::new(3)));
        assert_eq!(def.as_chi(), None);
        assert!(MeDefBy::default().is_none());
        assert_eq!(DefKind::MustDef.to_string(), "mustdef");
    }
}
