//! Decides which arithmetic instructions are instrumented.
use std::fmt;

use ir::{BinaryOp, DataFlowGraph, Immediate, InstData, InstId, OverflowCheck, Type, ValueId};

use crate::error::MalformedInst;

/// Width of an instrumented signed integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
}

impl IntWidth {
    pub const ALL: [Self; 3] = [Self::W8, Self::W16, Self::W32];

    /// Returns the width of a signed `i8`, `i16` or `i32`. Every other type,
    /// including `i64` and pointer-sized integers, is never instrumented.
    pub fn from_type(ty: Type) -> Option<Self> {
        match ty {
            Type::I8 => Some(Self::W8),
            Type::I16 => Some(Self::W16),
            Type::I32 => Some(Self::W32),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
        }
    }

    pub fn min(self) -> i64 {
        -(1i64 << (self.bits() - 1))
    }

    pub fn max(self) -> i64 {
        (1i64 << (self.bits() - 1)) - 1
    }

    /// The signed IR type of this width.
    pub fn ty(self) -> Type {
        match self {
            Self::W8 => Type::I8,
            Self::W16 => Type::I16,
            Self::W32 => Type::I32,
        }
    }

    /// The signed IR type of doubled width, wide enough to hold the exact
    /// product of two values of this width.
    pub fn widened(self) -> Type {
        match self {
            Self::W8 => Type::I16,
            Self::W16 => Type::I32,
            Self::W32 => Type::I64,
        }
    }

    /// Makes an immediate of this width. `value` is truncated to fit.
    pub fn imm(self, value: i64) -> Immediate {
        Immediate::from_i128(value.into(), self.ty())
    }

    pub fn contains(self, value: i128) -> bool {
        (i128::from(self.min())..=i128::from(self.max())).contains(&value)
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "i{}", self.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub const ALL: [Self; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    pub fn from_binary(code: BinaryOp) -> Option<Self> {
        match code {
            BinaryOp::Add => Some(Self::Add),
            BinaryOp::Sub => Some(Self::Sub),
            BinaryOp::Mul => Some(Self::Mul),
            BinaryOp::Div => Some(Self::Div),
            _ => None,
        }
    }

    pub fn as_binary(self) -> BinaryOp {
        match self {
            Self::Add => BinaryOp::Add,
            Self::Sub => BinaryOp::Sub,
            Self::Mul => BinaryOp::Mul,
            Self::Div => BinaryOp::Div,
        }
    }

    /// Computes the exact mathematical result. Division truncates toward
    /// zero; `None` means division by zero.
    pub fn exact(self, lhs: i128, rhs: i128) -> Option<i128> {
        match self {
            Self::Add => Some(lhs + rhs),
            Self::Sub => Some(lhs - rhs),
            Self::Mul => Some(lhs * rhs),
            Self::Div => (rhs != 0).then(|| lhs / rhs),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.as_binary(), f)
    }
}

/// A signed arithmetic instruction selected for instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOperation {
    pub inst: InstId,
    pub op: ArithOp,
    pub width: IntWidth,
    pub lhs: ValueId,
    pub rhs: ValueId,
}

/// Classifies `inst`.
///
/// Returns `Ok(None)` for anything that is left alone: non-arithmetic
/// instructions, `rem`, unsigned or 64-bit operands, and instructions whose
/// overflow decision has already been made. An `add`, `sub`, `mul` or `div`
/// that doesn't type check is an error.
pub fn classify(
    dfg: &DataFlowGraph,
    inst: InstId,
) -> Result<Option<ArithmeticOperation>, MalformedInst> {
    let InstData::Binary { code, args } = dfg.inst(inst) else {
        return Ok(None);
    };
    let Some(op) = ArithOp::from_binary(*code) else {
        return Ok(None);
    };
    if dfg.overflow_check(inst) != OverflowCheck::Unchecked {
        return Ok(None);
    }

    let [lhs, rhs] = *args;
    let (lhs_ty, rhs_ty) = (dfg.value_ty(lhs), dfg.value_ty(rhs));
    if lhs_ty != rhs_ty {
        return Err(MalformedInst::OperandTypeMismatch {
            lhs: lhs_ty,
            rhs: rhs_ty,
        });
    }
    if !lhs_ty.is_integral() || lhs_ty.is_bool() {
        return Err(MalformedInst::NonIntegerOperand(lhs_ty));
    }
    if let Some(result) = dfg.inst_result(inst) {
        let result_ty = dfg.value_ty(result);
        if result_ty != lhs_ty {
            return Err(MalformedInst::ResultTypeMismatch {
                operand: lhs_ty,
                result: result_ty,
            });
        }
    }

    Ok(IntWidth::from_type(lhs_ty).map(|width| ArithmeticOperation {
        inst,
        op,
        width,
        lhs,
        rhs,
    }))
}

/// Returns `true` if `inst` is a well-formed signed arithmetic instruction
/// that should be guarded.
pub fn qualifies(dfg: &DataFlowGraph, inst: InstId) -> bool {
    matches!(classify(dfg, inst), Ok(Some(_)))
}
