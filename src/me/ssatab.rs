//! Original and version symbol tables.
//!
//! Every variable field, pseudo register and the virtual heap location gets one
//! [`OriginalSt`]. Every SSA occurrence of an original symbol gets a [`VersionSt`]; version `0`
//! of each original symbol is the value on function entry.

use std::collections::HashMap;

use crate::{
    mir::{FieldId, PregIdx, PrimType, StIdx, SymbolTable, TyIdx},
    utils::Arena,
    Error, Result,
};

index_type!(
    /// Index of an original symbol
    OStIdx, "ost"
);

index_type!(
    /// Index of a version symbol
    VStIdx, "vst"
);

/// What an original symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OstKind {
    /// A field of a declared variable (`0` for the whole variable)
    Symbol {
        /// Variable
        st: StIdx,
        /// Field
        field_id: FieldId,
    },
    /// A pseudo register
    Preg(PregIdx),
    /// Every memory location reachable through a pointer
    Heap,
}

/// An original program location.
#[derive(Debug, Clone)]
pub struct OriginalSt {
    /// Index of this symbol
    pub idx: OStIdx,
    /// What it stands for
    pub kind: OstKind,
    /// Name used in dumps
    pub name: String,
    /// Value type
    pub ptype: PrimType,
    /// Full type
    pub ty: TyIdx,
    /// Stores through pointers and calls may modify it
    pub may_alias: bool,
    /// Accesses must not be reordered or removed
    pub volatile: bool,
    zero_version: VStIdx,
    versions: Vec<VStIdx>,
}

impl OriginalSt {
    /// Returns `true` for pseudo registers.
    #[must_use]
    pub fn is_preg(&self) -> bool {
        matches!(self.kind, OstKind::Preg(_))
    }

    /// Returns `true` for the virtual heap location.
    #[must_use]
    pub fn is_heap(&self) -> bool {
        matches!(self.kind, OstKind::Heap)
    }

    /// Version holding the value on function entry.
    #[must_use]
    pub fn zero_version(&self) -> VStIdx {
        self.zero_version
    }

    /// All versions of this symbol, zero version first.
    #[must_use]
    pub fn versions(&self) -> &[VStIdx] {
        &self.versions
    }
}

/// One SSA version of an original symbol.
#[derive(Debug, Clone, Copy)]
pub struct VersionSt {
    /// Index of this version
    pub idx: VStIdx,
    /// Versioned symbol
    pub ost: OStIdx,
    /// Version number, `0` for the entry value
    pub version: u32,
}

/// Original and version symbol tables of one function.
#[derive(Debug, Clone, Default)]
pub struct SsaTab {
    osts: Arena<OriginalSt, OStIdx>,
    vsts: Arena<VersionSt, VStIdx>,
    symbol_map: HashMap<(StIdx, FieldId), OStIdx>,
    preg_map: HashMap<PregIdx, OStIdx>,
    heap: Option<OStIdx>,
}

impl SsaTab {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the table with one whole-variable original symbol per declared variable and one
    /// per declared pseudo register.
    #[must_use]
    pub fn from_symbols(symbols: &SymbolTable) -> Self {
        let mut tab = SsaTab::new();
        for sym in symbols.symbols() {
            let idx = tab.push_ost(
                OstKind::Symbol {
                    st: sym.idx,
                    field_id: 0,
                },
                sym.name.clone(),
                sym.ptype,
                sym.ty,
                sym.may_alias(),
                sym.volatile,
            );
            tab.symbol_map.insert((sym.idx, 0), idx);
        }
        for preg in symbols.pregs() {
            let idx = tab.push_ost(
                OstKind::Preg(preg.idx),
                format!("{}", preg.idx),
                preg.ptype,
                TyIdx::new(0),
                false,
                false,
            );
            tab.preg_map.insert(preg.idx, idx);
        }
        tab
    }

    fn push_ost(
        &mut self,
        kind: OstKind,
        name: String,
        ptype: PrimType,
        ty: TyIdx,
        may_alias: bool,
        volatile: bool,
    ) -> OStIdx {
        let idx = self.osts.next_id();
        let zero = self.vsts.alloc_with(|vst| VersionSt {
            idx: vst,
            ost: idx,
            version: 0,
        });
        self.osts.alloc(OriginalSt {
            idx,
            kind,
            name,
            ptype,
            ty,
            may_alias,
            volatile,
            zero_version: zero,
            versions: vec![zero],
        })
    }

    /// Returns the original symbol of a variable field, creating it on first use.
    ///
    /// Field symbols inherit aliasing and volatility from the whole variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSymbol`] if `st` is not declared in `symbols`.
    pub fn find_or_create_symbol(
        &mut self,
        st: StIdx,
        field_id: FieldId,
        symbols: &SymbolTable,
    ) -> Result<OStIdx> {
        if let Some(&idx) = self.symbol_map.get(&(st, field_id)) {
            return Ok(idx);
        }
        let sym = symbols.symbol(st).ok_or(Error::UnknownSymbol(st))?;
        let name = if field_id == 0 {
            sym.name.clone()
        } else {
            format!("{}.{}", sym.name, field_id)
        };
        let idx = self.push_ost(
            OstKind::Symbol { st, field_id },
            name,
            sym.ptype,
            sym.ty,
            sym.may_alias(),
            sym.volatile,
        );
        self.symbol_map.insert((st, field_id), idx);
        Ok(idx)
    }

    /// Returns the original symbol of a variable field if it exists.
    #[must_use]
    pub fn find_symbol(&self, st: StIdx, field_id: FieldId) -> Option<OStIdx> {
        self.symbol_map.get(&(st, field_id)).copied()
    }

    /// Returns the original symbol of a pseudo register.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPreg`] if the register was not declared.
    pub fn find_preg(&self, preg: PregIdx) -> Result<OStIdx> {
        self.preg_map
            .get(&preg)
            .copied()
            .ok_or(Error::UnknownPreg(preg))
    }

    /// Returns the virtual heap location, creating it on first use.
    pub fn heap(&mut self) -> OStIdx {
        if let Some(heap) = self.heap {
            return heap;
        }
        let heap = self.push_ost(
            OstKind::Heap,
            "heap".to_string(),
            PrimType::Agg,
            TyIdx::new(0),
            true,
            false,
        );
        self.heap = Some(heap);
        heap
    }

    /// Returns the virtual heap location if it was created.
    #[must_use]
    pub fn heap_ost(&self) -> Option<OStIdx> {
        self.heap
    }

    /// Marks every field of `st` as possibly aliased.
    pub fn mark_address_taken(&mut self, st: StIdx) {
        for (&(sym, _), &ost) in &self.symbol_map {
            if sym == st {
                self.osts[ost].may_alias = true;
            }
        }
    }

    /// Creates the next version of `ost`.
    pub fn new_version(&mut self, ost: OStIdx) -> VStIdx {
        let version = self.osts[ost].versions.len() as u32;
        let vst = self.vsts.alloc_with(|idx| VersionSt { idx, ost, version });
        self.osts[ost].versions.push(vst);
        vst
    }

    /// Entry version of `ost`.
    #[must_use]
    pub fn zero_version(&self, ost: OStIdx) -> VStIdx {
        self.osts[ost].zero_version
    }

    /// Returns `true` if `vst` is the entry version of its symbol.
    #[must_use]
    pub fn is_zero_version(&self, vst: VStIdx) -> bool {
        self.vsts[vst].version == 0
    }

    /// Original symbol at `idx`.
    #[must_use]
    pub fn ost(&self, idx: OStIdx) -> &OriginalSt {
        &self.osts[idx]
    }

    /// Version symbol at `idx`.
    #[must_use]
    pub fn vst(&self, idx: VStIdx) -> &VersionSt {
        &self.vsts[idx]
    }

    /// Original symbol of a version.
    #[must_use]
    pub fn ost_of(&self, vst: VStIdx) -> OStIdx {
        self.vsts[vst].ost
    }

    /// Number of original symbols.
    #[must_use]
    pub fn ost_count(&self) -> usize {
        self.osts.len()
    }

    /// Number of version symbols.
    #[must_use]
    pub fn vst_count(&self) -> usize {
        self.vsts.len()
    }

    /// All original symbols.
    pub fn osts(&self) -> impl Iterator<Item = &OriginalSt> {
        self.osts.iter().map(|(_, ost)| ost)
    }

    /// Original symbols that stores through pointers and calls may modify, in index order.
    #[must_use]
    pub fn aliased_osts(&self) -> Vec<OStIdx> {
        self.osts
            .iter()
            .filter(|(_, ost)| ost.may_alias)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// `name_version`, or the raw version index with `by_index`.
    #[must_use]
    pub fn version_name(&self, vst: VStIdx, by_index: bool) -> String {
        if by_index {
            return format!("{vst}");
        }
        let version = &self.vsts[vst];
        format!("{}_{}", self.osts[version.ost].name, version.version)
    }
}
