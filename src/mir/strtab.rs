//! Interned string literals referenced by `conststr` and `conststr16`.

use std::collections::HashMap;

use widestring::{U16Str, U16String};

use crate::mir::{StrIdx, U16StrIdx};

/// Interning table for narrow and wide string literals.
///
/// Both kinds are deduplicated, so equal literals share an index and string constants with the
/// same contents are hash-consed to the same expression.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    narrow: Vec<String>,
    narrow_index: HashMap<String, StrIdx>,
    wide: Vec<U16String>,
    wide_index: HashMap<U16String, U16StrIdx>,
}

impl StringTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a narrow literal.
    pub fn intern(&mut self, value: &str) -> StrIdx {
        if let Some(&idx) = self.narrow_index.get(value) {
            return idx;
        }
        let idx = StrIdx::new(self.narrow.len() as u32);
        self.narrow.push(value.to_string());
        self.narrow_index.insert(value.to_string(), idx);
        idx
    }

    /// Interns a wide literal.
    pub fn intern_u16(&mut self, value: &U16Str) -> U16StrIdx {
        if let Some(&idx) = self.wide_index.get(value) {
            return idx;
        }
        let idx = U16StrIdx::new(self.wide.len() as u32);
        self.wide.push(value.to_owned());
        self.wide_index.insert(value.to_owned(), idx);
        idx
    }

    /// Interns a wide literal given as UTF-8.
    pub fn intern_u16_str(&mut self, value: &str) -> U16StrIdx {
        self.intern_u16(&U16String::from_str(value))
    }

    /// Returns the narrow literal at `idx`.
    #[must_use]
    pub fn get(&self, idx: StrIdx) -> Option<&str> {
        self.narrow.get(idx.index()).map(String::as_str)
    }

    /// Returns the wide literal at `idx`.
    #[must_use]
    pub fn get_u16(&self, idx: U16StrIdx) -> Option<&U16Str> {
        self.wide.get(idx.index()).map(U16String::as_ustr)
    }

    /// Lossy UTF-8 rendering of a wide literal, for dumps.
    #[must_use]
    pub fn display_u16(&self, idx: U16StrIdx) -> Option<String> {
        self.get_u16(idx).map(U16Str::to_string_lossy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_deduplicates() {
        let mut table = StringTable::new();
        let a = table.intern("hello");
        let b = table.intern("hello");
        let c = table.intern("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.get(c), Some("world"));
    }

    #[test]
    fn test_wide_literals() {
        let mut table = StringTable::new();
        let a = table.intern_u16_str("grüße");
        let b = table.intern_u16(&U16String::from_str("grüße"));
        assert_eq!(a, b);
        assert_eq!(table.display_u16(a).as_deref(), Some("grüße"));
        assert!(table.get_u16(U16StrIdx::new(5)).is_none());
    }
}
