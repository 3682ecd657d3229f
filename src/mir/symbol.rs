//! Per-function symbol table of the input program.
//!
//! Maps every declared variable and pseudo register to a stable index. The middle end only reads
//! this table: it resolves the indices found in the statement tree and derives its own original
//! symbol table from the declarations.

use std::collections::HashMap;

use strum::Display;

use crate::mir::{PrimType, TyIdx};

index_type!(
    /// Index of a declared variable
    StIdx, "$"
);

index_type!(
    /// Index of a pseudo register
    PregIdx, "%"
);

/// Storage class of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StorageClass {
    /// Function local
    Local,
    /// Incoming parameter
    Formal,
    /// Module-level variable, visible to callees
    Global,
}

/// A declared variable.
#[derive(Debug, Clone)]
pub struct MirSymbol {
    /// Index of this symbol
    pub idx: StIdx,
    /// Source name
    pub name: String,
    /// Value type
    pub ptype: PrimType,
    /// Full type
    pub ty: TyIdx,
    /// Storage class
    pub storage: StorageClass,
    /// The address of the variable escapes (an `addrof` exists somewhere)
    pub address_taken: bool,
    /// Accesses must not be reordered or removed
    pub volatile: bool,
}

impl MirSymbol {
    /// Returns `true` if stores through pointers or calls may modify this variable.
    #[must_use]
    pub fn may_alias(&self) -> bool {
        self.storage == StorageClass::Global || self.address_taken
    }
}

/// A declared pseudo register.
#[derive(Debug, Clone, Copy)]
pub struct MirPreg {
    /// Index of this register
    pub idx: PregIdx,
    /// Value type
    pub ptype: PrimType,
}

/// Symbols and pseudo registers of one function.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<MirSymbol>,
    pregs: Vec<MirPreg>,
    by_name: HashMap<String, StIdx>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable and returns its index.
    ///
    /// Declaring a name twice returns a fresh index; name lookup resolves to the latest one.
    pub fn declare(&mut self, name: &str, ptype: PrimType, storage: StorageClass) -> StIdx {
        let idx = StIdx::new(self.symbols.len() as u32);
        self.symbols.push(MirSymbol {
            idx,
            name: name.to_string(),
            ptype,
            ty: TyIdx::new(0),
            storage,
            address_taken: false,
            volatile: false,
        });
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    /// Declares a function-local variable.
    pub fn declare_local(&mut self, name: &str, ptype: PrimType) -> StIdx {
        self.declare(name, ptype, StorageClass::Local)
    }

    /// Declares a module-level variable.
    pub fn declare_global(&mut self, name: &str, ptype: PrimType) -> StIdx {
        self.declare(name, ptype, StorageClass::Global)
    }

    /// Declares an incoming parameter.
    pub fn declare_formal(&mut self, name: &str, ptype: PrimType) -> StIdx {
        self.declare(name, ptype, StorageClass::Formal)
    }

    /// Declares a pseudo register.
    pub fn declare_preg(&mut self, ptype: PrimType) -> PregIdx {
        let idx = PregIdx::new(self.pregs.len() as u32);
        self.pregs.push(MirPreg { idx, ptype });
        idx
    }

    /// Marks a variable as having its address taken.
    ///
    /// Returns `false` if the index is not declared.
    pub fn set_address_taken(&mut self, idx: StIdx) -> bool {
        match self.symbols.get_mut(idx.index()) {
            Some(sym) => {
                sym.address_taken = true;
                true
            }
            None => false,
        }
    }

    /// Returns the variable at `idx`.
    #[must_use]
    pub fn symbol(&self, idx: StIdx) -> Option<&MirSymbol> {
        self.symbols.get(idx.index())
    }

    /// Returns the pseudo register at `idx`.
    #[must_use]
    pub fn preg(&self, idx: PregIdx) -> Option<&MirPreg> {
        self.pregs.get(idx.index())
    }

    /// Looks a variable up by source name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<StIdx> {
        self.by_name.get(name).copied()
    }

    /// All declared variables in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &MirSymbol> {
        self.symbols.iter()
    }

    /// All declared pseudo registers.
    pub fn pregs(&self) -> impl Iterator<Item = &MirPreg> {
        self.pregs.iter()
    }

    /// Number of declared variables.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut table = SymbolTable::new();
        let x = table.declare_local("x", PrimType::I32);
        let g = table.declare_global("g", PrimType::I64);
        let r = table.declare_preg(PrimType::Ptr);

        assert_eq!(table.lookup("x"), Some(x));
        assert_eq!(table.symbol(g).map(|s| s.storage), Some(StorageClass::Global));
        assert!(table.symbol(g).is_some_and(MirSymbol::may_alias));
        assert!(!table.symbol(x).is_some_and(MirSymbol::may_alias));
        assert_eq!(table.preg(r).map(|p| p.ptype), Some(PrimType::Ptr));
        assert!(table.symbol(StIdx::new(9)).is_none());
    }

    #[test]
    fn test_address_taken_aliases() {
        let mut table = SymbolTable::new();
        let x = table.declare_local("x", PrimType::I32);
        assert!(table.set_address_taken(x));
        assert!(table.symbol(x).is_some_and(MirSymbol::may_alias));
        assert!(!table.set_address_taken(StIdx::new(3)));
    }
}
