//! This module contains IR value definition.
use std::fmt;

use cranelift_entity::entity_impl;

use super::{InstId, Type};

/// An opaque reference to [`Value`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
pub struct ValueId(pub u32);
entity_impl!(ValueId, "v");

/// An value data definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The value is defined by an instruction.
    Inst { inst: InstId, ty: Type },

    /// The value is a function argument.
    Arg { ty: Type, idx: usize },

    /// The value is immediate value.
    Immediate { imm: Immediate, ty: Type },
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Self::Inst { ty, .. } | Self::Arg { ty, .. } | Self::Immediate { ty, .. } => *ty,
        }
    }
}

/// A constant of an integral type.
///
/// Arithmetic on immediates is two's-complement and wraps at the width of the
/// type, which is the natural arithmetic of the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Immediate {
    I1(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(u64),
}

impl Immediate {
    pub fn ty(&self) -> Type {
        match self {
            Self::I1(..) => Type::I1,
            Self::I8(..) => Type::I8,
            Self::I16(..) => Type::I16,
            Self::I32(..) => Type::I32,
            Self::I64(..) => Type::I64,
            Self::Isize(..) => Type::Isize,
            Self::U8(..) => Type::U8,
            Self::U16(..) => Type::U16,
            Self::U32(..) => Type::U32,
            Self::U64(..) => Type::U64,
            Self::Usize(..) => Type::Usize,
        }
    }

    /// Makes an immediate of `ty` from `value`, keeping only the low bits
    /// that fit in `ty`.
    ///
    /// # Panics
    /// Panics if `ty` is `unit`.
    pub fn from_i128(value: i128, ty: Type) -> Self {
        match ty {
            Type::I1 => Self::I1(value & 1 != 0),
            Type::I8 => Self::I8(value as i8),
            Type::I16 => Self::I16(value as i16),
            Type::I32 => Self::I32(value as i32),
            Type::I64 => Self::I64(value as i64),
            Type::Isize => Self::Isize(value as i64),
            Type::U8 => Self::U8(value as u8),
            Type::U16 => Self::U16(value as u16),
            Type::U32 => Self::U32(value as u32),
            Type::U64 => Self::U64(value as u64),
            Type::Usize => Self::Usize(value as u64),
            Type::Unit => panic!("`unit` has no immediate representation"),
        }
    }

    /// Returns the mathematical value of the immediate, interpreted with the
    /// signedness of its type.
    pub fn as_i128(self) -> i128 {
        match self {
            Self::I1(v) => v as i128,
            Self::I8(v) => v as i128,
            Self::I16(v) => v as i128,
            Self::I32(v) => v as i128,
            Self::I64(v) | Self::Isize(v) => v as i128,
            Self::U8(v) => v as i128,
            Self::U16(v) => v as i128,
            Self::U32(v) => v as i128,
            Self::U64(v) | Self::Usize(v) => v as i128,
        }
    }

    pub fn is_zero(self) -> bool {
        self.as_i128() == 0
    }

    pub fn wrapping_add(self, rhs: Self) -> Self {
        self.apply_binop(rhs, i128::wrapping_add)
    }

    pub fn wrapping_sub(self, rhs: Self) -> Self {
        self.apply_binop(rhs, i128::wrapping_sub)
    }

    pub fn wrapping_mul(self, rhs: Self) -> Self {
        self.apply_binop(rhs, i128::wrapping_mul)
    }

    /// Returns `None` if `rhs` is zero.
    ///
    /// Signed `MIN / -1` wraps to `MIN`.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(self.apply_binop(rhs, |lhs, rhs| lhs / rhs))
    }

    /// Returns `None` if `rhs` is zero.
    pub fn checked_rem(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(self.apply_binop(rhs, |lhs, rhs| lhs % rhs))
    }

    pub fn and(self, rhs: Self) -> Self {
        self.apply_binop(rhs, |lhs, rhs| lhs & rhs)
    }

    pub fn or(self, rhs: Self) -> Self {
        self.apply_binop(rhs, |lhs, rhs| lhs | rhs)
    }

    pub fn xor(self, rhs: Self) -> Self {
        self.apply_binop(rhs, |lhs, rhs| lhs ^ rhs)
    }

    pub fn not(self) -> Self {
        Self::from_i128(!self.as_i128(), self.ty())
    }

    pub fn wrapping_neg(self) -> Self {
        Self::from_i128(self.as_i128().wrapping_neg(), self.ty())
    }

    pub fn eq(self, rhs: Self) -> Self {
        self.apply_cmp(rhs, |lhs, rhs| lhs == rhs)
    }

    pub fn ne(self, rhs: Self) -> Self {
        self.apply_cmp(rhs, |lhs, rhs| lhs != rhs)
    }

    pub fn lt(self, rhs: Self) -> Self {
        self.apply_cmp(rhs, |lhs, rhs| lhs < rhs)
    }

    pub fn gt(self, rhs: Self) -> Self {
        self.apply_cmp(rhs, |lhs, rhs| lhs > rhs)
    }

    pub fn le(self, rhs: Self) -> Self {
        self.apply_cmp(rhs, |lhs, rhs| lhs <= rhs)
    }

    pub fn ge(self, rhs: Self) -> Self {
        self.apply_cmp(rhs, |lhs, rhs| lhs >= rhs)
    }

    /// Sign-extends the bit pattern of the immediate to `ty`.
    pub fn sext(self, ty: Type) -> Self {
        let bits = self.bits();
        let shift = 128 - bits;
        Self::from_i128((self.as_i128() << shift) >> shift, ty)
    }

    /// Zero-extends the bit pattern of the immediate to `ty`.
    pub fn zext(self, ty: Type) -> Self {
        let mask = (1i128 << self.bits()) - 1;
        Self::from_i128(self.as_i128() & mask, ty)
    }

    pub fn trunc(self, ty: Type) -> Self {
        Self::from_i128(self.as_i128(), ty)
    }

    fn bits(self) -> u32 {
        // Immediates are never of `unit` type.
        self.ty().bits().unwrap_or(0)
    }

    fn apply_binop<F>(self, rhs: Self, f: F) -> Self
    where
        F: FnOnce(i128, i128) -> i128,
    {
        debug_assert_eq!(self.ty(), rhs.ty());
        Self::from_i128(f(self.as_i128(), rhs.as_i128()), self.ty())
    }

    fn apply_cmp<F>(self, rhs: Self, f: F) -> Self
    where
        F: FnOnce(i128, i128) -> bool,
    {
        debug_assert_eq!(self.ty(), rhs.ty());
        Self::I1(f(self.as_i128(), rhs.as_i128()))
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::I1(v) => write!(f, "{}", *v as u8),
            _ => write!(f, "{}", self.as_i128()),
        }
    }
}

macro_rules! imm_from_primary {
    ($prim_ty:ty, $immediate_variant:expr) => {
        impl From<$prim_ty> for Immediate {
            fn from(imm: $prim_ty) -> Self {
                $immediate_variant(imm)
            }
        }
    };
}

imm_from_primary!(bool, Immediate::I1);
imm_from_primary!(i8, Immediate::I8);
imm_from_primary!(i16, Immediate::I16);
imm_from_primary!(i32, Immediate::I32);
imm_from_primary!(i64, Immediate::I64);
imm_from_primary!(u8, Immediate::U8);
imm_from_primary!(u16, Immediate::U16);
imm_from_primary!(u32, Immediate::U32);
imm_from_primary!(u64, Immediate::U64);
