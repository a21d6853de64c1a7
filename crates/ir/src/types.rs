//! This module contains IR types definitions.
use std::fmt;

/// Width in bits of pointer-sized integers on every supported target.
pub const POINTER_BITS: u32 = 64;

/// IR types definition.
///
/// Integer types carry their signedness, so arithmetic, comparison and
/// division instructions take their signed or unsigned meaning from the type
/// of their operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    I1,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    #[default]
    Unit,
}

impl Type {
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::Unit)
    }

    /// Returns `true` for the boolean type `i1`.
    pub fn is_bool(self) -> bool {
        matches!(self, Self::I1)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::Isize
        )
    }

    /// Returns the bit width of an integral type, `None` for `unit`.
    pub fn bits(self) -> Option<u32> {
        let bits = match self {
            Self::I1 => 1,
            Self::I8 | Self::U8 => 8,
            Self::I16 | Self::U16 => 16,
            Self::I32 | Self::U32 => 32,
            Self::I64 | Self::U64 => 64,
            Self::Isize | Self::Usize => POINTER_BITS,
            Self::Unit => return None,
        };
        Some(bits)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::I1 => "i1",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::Unit => "unit",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
