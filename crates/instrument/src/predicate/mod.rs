//! Overflow conditions as pure boolean expression trees.
//!
//! A [`Predicate`] reads only the two operand values and constants derived
//! from the operand width. It can be evaluated directly, which is how the
//! formulas are checked against exact arithmetic, or lowered into IR in
//! front of the guarded instruction.
use std::fmt;

use ir::{func_cursor::FuncCursor, BinaryOp, Function, Immediate, Type, ValueId};

use crate::classify::{ArithOp, IntWidth};

mod build;
mod lower;

/// How a multiplication overflow is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MulStrategy {
    /// Computes the exact product at doubled width and range checks it.
    #[default]
    Widen,

    /// Stays at the operand width and checks that dividing the wrapped
    /// product by one operand gives back the other.
    BackDivision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    pub fn as_binary(self) -> BinaryOp {
        match self {
            Self::Eq => BinaryOp::Eq,
            Self::Ne => BinaryOp::Ne,
            Self::Lt => BinaryOp::Lt,
            Self::Gt => BinaryOp::Gt,
            Self::Le => BinaryOp::Le,
            Self::Ge => BinaryOp::Ge,
        }
    }

    fn apply(self, lhs: Immediate, rhs: Immediate) -> bool {
        debug_assert_eq!(lhs.ty(), rhs.ty());
        let (lhs, rhs) = (lhs.as_i128(), rhs.as_i128());
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// A typed integer expression over the operands. Arithmetic wraps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Lhs,
    Rhs,
    Const(Immediate),
    Add(Box<Term>, Box<Term>),
    Sub(Box<Term>, Box<Term>),
    Mul(Box<Term>, Box<Term>),
    /// Signed division. The divisor must never be zero; wrap it in
    /// [`Term::NonZero`] if it can be.
    Div(Box<Term>, Box<Term>),
    Sext(Box<Term>, Type),
    /// The value itself, or one if it is zero.
    NonZero(Box<Term>),
}

impl Term {
    /// Returns the type of the term when both operands are of `operand_ty`.
    pub fn ty(&self, operand_ty: Type) -> Type {
        match self {
            Self::Lhs | Self::Rhs => operand_ty,
            Self::Const(imm) => imm.ty(),
            Self::Add(lhs, _) | Self::Sub(lhs, _) | Self::Mul(lhs, _) | Self::Div(lhs, _) => {
                lhs.ty(operand_ty)
            }
            Self::Sext(_, ty) => *ty,
            Self::NonZero(term) => term.ty(operand_ty),
        }
    }

    fn eval(&self, lhs: Immediate, rhs: Immediate) -> Immediate {
        match self {
            Self::Lhs => lhs,
            Self::Rhs => rhs,
            Self::Const(imm) => *imm,
            Self::Add(a, b) => a.eval(lhs, rhs).wrapping_add(b.eval(lhs, rhs)),
            Self::Sub(a, b) => a.eval(lhs, rhs).wrapping_sub(b.eval(lhs, rhs)),
            Self::Mul(a, b) => a.eval(lhs, rhs).wrapping_mul(b.eval(lhs, rhs)),
            Self::Div(a, b) => match a.eval(lhs, rhs).checked_div(b.eval(lhs, rhs)) {
                Some(quot) => quot,
                None => panic!("`{self}` divides by zero"),
            },
            Self::Sext(term, ty) => term.eval(lhs, rhs).sext(*ty),
            Self::NonZero(term) => {
                let value = term.eval(lhs, rhs);
                if value.is_zero() {
                    Immediate::from_i128(1, value.ty())
                } else {
                    value
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Lhs => f.write_str("lhs"),
            Self::Rhs => f.write_str("rhs"),
            Self::Const(imm) => write!(f, "{imm}.{}", imm.ty()),
            Self::Add(a, b) => write!(f, "(add {a} {b})"),
            Self::Sub(a, b) => write!(f, "(sub {a} {b})"),
            Self::Mul(a, b) => write!(f, "(mul {a} {b})"),
            Self::Div(a, b) => write!(f, "(div {a} {b})"),
            Self::Sext(term, ty) => write!(f, "(sext {term} {ty})"),
            Self::NonZero(term) => write!(f, "(nonzero {term})"),
        }
    }
}

/// A boolean condition over [`Term`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cond {
    Cmp(CmpOp, Term, Term),
    And(Vec<Cond>),
    Or(Vec<Cond>),
}

impl Cond {
    /// Every sub-condition is evaluated, as in the lowered form.
    fn eval(&self, lhs: Immediate, rhs: Immediate) -> bool {
        match self {
            Self::Cmp(op, a, b) => op.apply(a.eval(lhs, rhs), b.eval(lhs, rhs)),
            Self::And(conds) => conds
                .iter()
                .fold(true, |acc, cond| cond.eval(lhs, rhs) & acc),
            Self::Or(conds) => conds
                .iter()
                .fold(false, |acc, cond| cond.eval(lhs, rhs) | acc),
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (name, conds) = match self {
            Self::Cmp(op, a, b) => return write!(f, "({} {a} {b})", op.as_binary()),
            Self::And(conds) => ("and", conds),
            Self::Or(conds) => ("or", conds),
        };

        write!(f, "({name}")?;
        for cond in conds {
            write!(f, " {cond}")?;
        }
        f.write_str(")")
    }
}

/// The overflow condition of one (operation, width) pair. True exactly when
/// the operation's mathematical result isn't representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    op: ArithOp,
    width: IntWidth,
    cond: Cond,
}

impl Predicate {
    pub fn new(op: ArithOp, width: IntWidth, mul_strategy: MulStrategy) -> Self {
        Self {
            op,
            width,
            cond: build::overflow_cond(op, width, mul_strategy),
        }
    }

    pub fn op(&self) -> ArithOp {
        self.op
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }

    pub fn cond(&self) -> &Cond {
        &self.cond
    }

    /// Evaluates the predicate for the given operand values, which are
    /// truncated to the predicate width.
    pub fn eval(&self, lhs: i64, rhs: i64) -> bool {
        self.cond.eval(self.width.imm(lhs), self.width.imm(rhs))
    }

    /// Emits the predicate at `cursor` and returns the `i1` result.
    ///
    /// The emitted code has no branches and can't fault. Emitted arithmetic
    /// is marked as wrapping so that it is never guarded itself.
    pub fn lower<C: FuncCursor>(
        &self,
        func: &mut Function,
        cursor: &mut C,
        lhs: ValueId,
        rhs: ValueId,
    ) -> ValueId {
        lower::Lowerer::new(func, cursor, self.width.ty(), lhs, rhs).cond(&self.cond)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}: {}", self.op, self.width, self.cond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let pred = Predicate::new(ArithOp::Div, IntWidth::W16, MulStrategy::default());
        assert_eq!(
            pred.to_string(),
            "div.i16: (and (eq rhs -1.i16) (eq lhs -32768.i16))"
        );
    }

    #[test]
    fn nonzero_substitutes_one() {
        let term = Term::NonZero(Box::new(Term::Rhs));
        let zero = Immediate::I8(0);
        assert_eq!(term.eval(zero, zero), Immediate::I8(1));
        assert_eq!(term.eval(zero, Immediate::I8(-3)), Immediate::I8(-3));
        assert_eq!(term.ty(Type::I8), Type::I8);
        assert_eq!(Term::Sext(Box::new(Term::Lhs), Type::I16).ty(Type::I8), Type::I16);
    }

    #[test]
    fn add_boundaries() {
        let pred = Predicate::new(ArithOp::Add, IntWidth::W8, MulStrategy::default());
        assert!(pred.eval(127, 1));
        assert!(pred.eval(-128, -1));
        assert!(!pred.eval(10, 20));
        assert!(!pred.eval(127, 0));
        assert!(!pred.eval(-128, 127));
    }

    #[test]
    fn sub_with_min_rhs() {
        let pred = Predicate::new(ArithOp::Sub, IntWidth::W8, MulStrategy::default());
        assert!(pred.eval(0, -128));
        assert!(!pred.eval(-1, -128));
        assert!(pred.eval(-128, 1));
        assert!(!pred.eval(-128, 0));
    }

    #[test]
    fn mul_min_times_minus_one() {
        for strategy in [MulStrategy::Widen, MulStrategy::BackDivision] {
            for width in IntWidth::ALL {
                let pred = Predicate::new(ArithOp::Mul, width, strategy);
                assert!(pred.eval(width.min(), -1), "{pred}");
                assert!(pred.eval(-1, width.min()), "{pred}");
                assert!(!pred.eval(width.min(), 1), "{pred}");
                assert!(!pred.eval(width.min(), 0), "{pred}");
                assert!(!pred.eval(0, width.min()), "{pred}");
            }
        }
    }

    #[test]
    fn div_by_zero_is_not_overflow() {
        for width in IntWidth::ALL {
            let pred = Predicate::new(ArithOp::Div, width, MulStrategy::default());
            assert!(!pred.eval(width.min(), 0));
            assert!(pred.eval(width.min(), -1));
            assert!(!pred.eval(width.min() + 1, -1));
        }
    }
}
