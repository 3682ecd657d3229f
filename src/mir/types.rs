//! Primitive types, type/field/label indices and constant values of the input tree.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Primitive value type of an expression or a symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum PrimType {
    /// No value
    #[default]
    Void,
    /// Boolean
    U1,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Raw pointer
    Ptr,
    /// Managed (garbage-collected) reference
    Ref,
    /// Aggregate held in memory
    Agg,
}

impl PrimType {
    /// Returns `true` for the integer and boolean types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            PrimType::U1
                | PrimType::I8
                | PrimType::I16
                | PrimType::I32
                | PrimType::I64
                | PrimType::U8
                | PrimType::U16
                | PrimType::U32
                | PrimType::U64
        )
    }

    /// Returns `true` for `f32` and `f64`.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, PrimType::F32 | PrimType::F64)
    }

    /// Returns `true` for the pointer-like types.
    #[must_use]
    pub const fn is_address(self) -> bool {
        matches!(self, PrimType::Ptr | PrimType::Ref)
    }

    /// Size of a value of this type in bytes, `0` for `void` and aggregates.
    #[must_use]
    pub const fn size(self) -> u32 {
        match self {
            PrimType::Void | PrimType::Agg => 0,
            PrimType::U1 | PrimType::I8 | PrimType::U8 => 1,
            PrimType::I16 | PrimType::U16 => 2,
            PrimType::I32 | PrimType::U32 | PrimType::F32 => 4,
            PrimType::I64 | PrimType::U64 | PrimType::F64 | PrimType::Ptr | PrimType::Ref => 8,
        }
    }
}

index_type!(
    /// Index into the global type table
    TyIdx, "ty"
);

index_type!(
    /// Index of a function (program unit)
    PuIdx, "pu"
);

index_type!(
    /// Index of a label within a function
    LabelIdx, "@L"
);

index_type!(
    /// Index of a narrow string literal in the [`super::StringTable`]
    StrIdx, "str"
);

index_type!(
    /// Index of a wide string literal in the [`super::StringTable`]
    U16StrIdx, "wstr"
);

/// Field of an aggregate, `0` denotes the whole object.
pub type FieldId = i32;

/// Source position attached to every statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SrcPosition {
    /// Index of the source file
    pub file: u32,
    /// 1-based line, `0` if unknown
    pub line: u32,
    /// 1-based column, `0` if unknown
    pub column: u16,
}

impl SrcPosition {
    /// Creates a source position.
    #[must_use]
    pub const fn new(file: u32, line: u32, column: u16) -> Self {
        SrcPosition { file, line, column }
    }
}

impl fmt::Display for SrcPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A constant operand.
///
/// Floating point values compare and hash by their bit pattern, so `NaN` constants with the same
/// payload are considered equal and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Copy)]
pub enum ConstValue {
    /// Integer constant
    Int(i64),
    /// Single precision constant
    Float(f32),
    /// Double precision constant
    Double(f64),
    /// Address of a label
    Label(LabelIdx),
}

impl ConstValue {
    /// Returns `true` if the constant is a numeric zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match *self {
            ConstValue::Int(v) => v == 0,
            ConstValue::Float(v) => v == 0.0,
            ConstValue::Double(v) => v == 0.0,
            ConstValue::Label(_) => false,
        }
    }

    /// Returns the integer value, if this is an integer constant.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match *self {
            ConstValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Truncated integer view used for hashing.
    #[must_use]
    pub fn hash_bits(&self) -> u32 {
        match *self {
            ConstValue::Int(v) => v as u32,
            ConstValue::Float(v) => v.to_bits(),
            ConstValue::Double(v) => {
                let bits = v.to_bits();
                (bits ^ (bits >> 32)) as u32
            }
            ConstValue::Label(l) => l.raw(),
        }
    }

    fn key(&self) -> (u8, u64) {
        match *self {
            ConstValue::Int(v) => (0, v as u64),
            ConstValue::Float(v) => (1, u64::from(v.to_bits())),
            ConstValue::Double(v) => (2, v.to_bits()),
            ConstValue::Label(l) => (3, u64::from(l.raw())),
        }
    }
}

impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ConstValue {}

impl Hash for ConstValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v}f"),
            ConstValue::Double(v) => write!(f, "{v}"),
            ConstValue::Label(l) => write!(f, "{l}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_constants_compare_by_bits() {
        assert_eq!(ConstValue::Double(1.5), ConstValue::Double(1.5));
        assert_ne!(ConstValue::Double(0.0), ConstValue::Double(-0.0));
        assert_ne!(ConstValue::Int(1), ConstValue::Double(1.0));
        assert_eq!(ConstValue::Double(f64::NAN), ConstValue::Double(f64::NAN));
    }

    #[test]
    fn test_prim_type_parse() {
        assert_eq!("i32".parse::<PrimType>().unwrap(), PrimType::I32);
        assert_eq!(PrimType::Ref.to_string(), "ref");
        assert!(PrimType::U1.is_integer());
        assert!(PrimType::Ptr.is_address());
        assert_eq!(PrimType::F64.size(), 8);
    }
}
