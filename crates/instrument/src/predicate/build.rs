use super::{CmpOp, Cond, MulStrategy, Term};
use crate::classify::{ArithOp, IntWidth};

pub(super) fn overflow_cond(op: ArithOp, width: IntWidth, mul_strategy: MulStrategy) -> Cond {
    match (op, mul_strategy) {
        (ArithOp::Add, _) => add(width),
        (ArithOp::Sub, _) => sub(width),
        (ArithOp::Mul, MulStrategy::Widen) => mul_widen(width),
        (ArithOp::Mul, MulStrategy::BackDivision) => mul_back_division(width),
        (ArithOp::Div, _) => div(width),
    }
}

/// `(rhs >= 0 && lhs > MAX - rhs) || (rhs < 0 && lhs < MIN - rhs)`
fn add(width: IntWidth) -> Cond {
    Cond::Or(vec![
        Cond::And(vec![
            cmp(CmpOp::Ge, Term::Rhs, konst(width, 0)),
            cmp(CmpOp::Gt, Term::Lhs, sub_term(konst(width, width.max()), Term::Rhs)),
        ]),
        Cond::And(vec![
            cmp(CmpOp::Lt, Term::Rhs, konst(width, 0)),
            cmp(CmpOp::Lt, Term::Lhs, sub_term(konst(width, width.min()), Term::Rhs)),
        ]),
    ])
}

/// `(rhs <= 0 && lhs > MAX + rhs) || (rhs > 0 && lhs < MIN + rhs)`
///
/// `rhs` is never negated, so `rhs = MIN` needs no special case.
fn sub(width: IntWidth) -> Cond {
    Cond::Or(vec![
        Cond::And(vec![
            cmp(CmpOp::Le, Term::Rhs, konst(width, 0)),
            cmp(CmpOp::Gt, Term::Lhs, add_term(konst(width, width.max()), Term::Rhs)),
        ]),
        Cond::And(vec![
            cmp(CmpOp::Gt, Term::Rhs, konst(width, 0)),
            cmp(CmpOp::Lt, Term::Lhs, add_term(konst(width, width.min()), Term::Rhs)),
        ]),
    ])
}

/// `lhs != 0 && rhs != 0 && (p > MAX || p < MIN)` where `p` is the product at
/// doubled width.
fn mul_widen(width: IntWidth) -> Cond {
    let wide = width.widened();
    let product = Term::Mul(
        Box::new(Term::Sext(Box::new(Term::Lhs), wide)),
        Box::new(Term::Sext(Box::new(Term::Rhs), wide)),
    );
    let wide_const = |value: i64| Term::Const(ir::Immediate::from_i128(value.into(), wide));

    Cond::And(vec![
        cmp(CmpOp::Ne, Term::Lhs, konst(width, 0)),
        cmp(CmpOp::Ne, Term::Rhs, konst(width, 0)),
        Cond::Or(vec![
            cmp(CmpOp::Gt, product.clone(), wide_const(width.max())),
            cmp(CmpOp::Lt, product, wide_const(width.min())),
        ]),
    ])
}

/// `lhs != 0 && rhs != 0 && ((lhs = MIN && rhs = -1) || (rhs = MIN && lhs = -1)
/// || (lhs * rhs) / rhs != lhs)`
///
/// The wrapped product divided by `rhs` gives back `lhs` exactly when the
/// product fits, except for `MIN * -1` whose quotient wraps back to `MIN`.
fn mul_back_division(width: IntWidth) -> Cond {
    let quot = Term::Div(
        Box::new(Term::Mul(Box::new(Term::Lhs), Box::new(Term::Rhs))),
        Box::new(Term::NonZero(Box::new(Term::Rhs))),
    );

    Cond::And(vec![
        cmp(CmpOp::Ne, Term::Lhs, konst(width, 0)),
        cmp(CmpOp::Ne, Term::Rhs, konst(width, 0)),
        Cond::Or(vec![
            Cond::And(vec![
                cmp(CmpOp::Eq, Term::Lhs, konst(width, width.min())),
                cmp(CmpOp::Eq, Term::Rhs, konst(width, -1)),
            ]),
            Cond::And(vec![
                cmp(CmpOp::Eq, Term::Rhs, konst(width, width.min())),
                cmp(CmpOp::Eq, Term::Lhs, konst(width, -1)),
            ]),
            cmp(CmpOp::Ne, quot, Term::Lhs),
        ]),
    ])
}

/// `rhs = -1 && lhs = MIN`. A zero divisor is left to the division itself.
fn div(width: IntWidth) -> Cond {
    Cond::And(vec![
        cmp(CmpOp::Eq, Term::Rhs, konst(width, -1)),
        cmp(CmpOp::Eq, Term::Lhs, konst(width, width.min())),
    ])
}

fn cmp(op: CmpOp, lhs: Term, rhs: Term) -> Cond {
    Cond::Cmp(op, lhs, rhs)
}

fn konst(width: IntWidth, value: i64) -> Term {
    Term::Const(width.imm(value))
}

fn add_term(lhs: Term, rhs: Term) -> Term {
    Term::Add(Box::new(lhs), Box::new(rhs))
}

fn sub_term(lhs: Term, rhs: Term) -> Term {
    Term::Sub(Box::new(lhs), Box::new(rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;

    /// Checks `op` at `width` against exact arithmetic for every operand pair
    /// yielded by `pairs`.
    fn check(
        op: ArithOp,
        width: IntWidth,
        strategy: MulStrategy,
        pairs: impl Iterator<Item = (i64, i64)>,
    ) {
        let pred = Predicate::new(op, width, strategy);
        for (lhs, rhs) in pairs {
            let expected = match op.exact(lhs.into(), rhs.into()) {
                Some(result) => !width.contains(result),
                None => false,
            };
            assert_eq!(pred.eval(lhs, rhs), expected, "{pred} at ({lhs}, {rhs})");
        }
    }

    fn all_i8_pairs() -> impl Iterator<Item = (i64, i64)> {
        (-128..=127).flat_map(|lhs| (-128..=127).map(move |rhs| (lhs, rhs)))
    }

    #[test]
    fn exhaustive_i8() {
        for op in ArithOp::ALL {
            check(op, IntWidth::W8, MulStrategy::Widen, all_i8_pairs());
        }
        check(ArithOp::Mul, IntWidth::W8, MulStrategy::BackDivision, all_i8_pairs());
    }

    #[test]
    fn widen_ignores_operand_sign_of_zero() {
        let pred = Predicate::new(ArithOp::Mul, IntWidth::W32, MulStrategy::Widen);
        assert!(!pred.eval(0, i32::MIN.into()));
        assert!(pred.eval(2, i32::MAX.into()));
        assert!(!pred.eval(-1, i32::MAX.into()));
        assert!(pred.eval(65536, 32768));
        assert!(!pred.eval(65536, -32768));
    }
}
