//! Instrumented arithmetic checked against exact arithmetic over the whole
//! `i8` domain, a dense slice of `i16`, and sampled `i32` operands. The
//! `i16` multiplication predicates are also checked over every operand pair.
mod common;

use common::*;
use intguard_instrument::{
    predicate::{CmpOp, Cond, Term},
    ArithOp, GuardConfig, IntWidth, MulStrategy, Predicate,
};
use ir::Type;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

fn config(mul_strategy: MulStrategy) -> GuardConfig {
    GuardConfig {
        mul_strategy,
        ..GuardConfig::default()
    }
}

fn full_range(width: IntWidth) -> impl Iterator<Item = (i64, i64)> {
    let (min, max) = (width.min(), width.max());
    (min..=max).flat_map(move |lhs| (min..=max).map(move |rhs| (lhs, rhs)))
}

/// Every `step`th value of `width`, plus the boundary values.
fn strided(width: IntWidth, step: usize) -> Vec<i64> {
    let mut values: Vec<_> = (width.min()..=width.max()).step_by(step).collect();
    values.extend(boundary_values(width));
    values.sort_unstable();
    values.dedup();
    values
}

fn pairs(values: &[i64]) -> impl Iterator<Item = (i64, i64)> + '_ {
    values
        .iter()
        .flat_map(move |&lhs| values.iter().map(move |&rhs| (lhs, rhs)))
}

#[test]
fn i8_every_operand_pair() {
    for op in ArithOp::ALL {
        Harness::new(op, IntWidth::W8, GuardConfig::default()).check_all(full_range(IntWidth::W8));
    }
}

#[test]
fn i8_mul_back_division() {
    Harness::new(ArithOp::Mul, IntWidth::W8, config(MulStrategy::BackDivision))
        .check_all(full_range(IntWidth::W8));
}

#[test]
fn i16_strided() {
    let values = strided(IntWidth::W16, 257);
    for op in ArithOp::ALL {
        Harness::new(op, IntWidth::W16, GuardConfig::default()).check_all(pairs(&values));
    }
    Harness::new(ArithOp::Mul, IntWidth::W16, config(MulStrategy::BackDivision))
        .check_all(pairs(&values));
}

type TermFn = Box<dyn Fn(i64, i64) -> i64 + Sync>;
type CondFn = Box<dyn Fn(i64, i64) -> bool + Sync>;

fn wrap(value: i64, bits: u32) -> i64 {
    let shift = 64 - bits;
    (value << shift) >> shift
}

/// Flattens `term` into closures over plain `i64`s, wrapping every result
/// to the term's width.
fn compile_term(term: &Term, operand_ty: Type) -> TermFn {
    let bits = term.ty(operand_ty).bits().unwrap();
    let binary = |a: &Term, b: &Term, f: fn(i64, i64) -> i64| -> TermFn {
        let (a, b) = (compile_term(a, operand_ty), compile_term(b, operand_ty));
        Box::new(move |l: i64, r: i64| wrap(f(a(l, r), b(l, r)), bits))
    };
    match term {
        Term::Lhs => Box::new(|l: i64, _: i64| l),
        Term::Rhs => Box::new(|_: i64, r: i64| r),
        Term::Const(imm) => {
            let value = imm.as_i128() as i64;
            Box::new(move |_: i64, _: i64| value)
        }
        Term::Add(a, b) => binary(a, b, i64::wrapping_add),
        Term::Sub(a, b) => binary(a, b, i64::wrapping_sub),
        Term::Mul(a, b) => binary(a, b, i64::wrapping_mul),
        Term::Div(a, b) => binary(a, b, i64::wrapping_div),
        Term::Sext(term, _) => compile_term(term, operand_ty),
        Term::NonZero(term) => {
            let term = compile_term(term, operand_ty);
            Box::new(move |l: i64, r: i64| match term(l, r) {
                0 => 1,
                value => value,
            })
        }
    }
}

fn compile(cond: &Cond, operand_ty: Type) -> CondFn {
    match cond {
        Cond::Cmp(op, a, b) => {
            let (a, b) = (compile_term(a, operand_ty), compile_term(b, operand_ty));
            let cmp: fn(i64, i64) -> bool = match op {
                CmpOp::Eq => |a, b| a == b,
                CmpOp::Ne => |a, b| a != b,
                CmpOp::Lt => |a, b| a < b,
                CmpOp::Gt => |a, b| a > b,
                CmpOp::Le => |a, b| a <= b,
                CmpOp::Ge => |a, b| a >= b,
            };
            Box::new(move |l: i64, r: i64| cmp(a(l, r), b(l, r)))
        }
        Cond::And(conds) => {
            let conds: Vec<_> = conds.iter().map(|c| compile(c, operand_ty)).collect();
            Box::new(move |l: i64, r: i64| conds.iter().all(|c| c(l, r)))
        }
        Cond::Or(conds) => {
            let conds: Vec<_> = conds.iter().map(|c| compile(c, operand_ty)).collect();
            Box::new(move |l: i64, r: i64| conds.iter().any(|c| c(l, r)))
        }
    }
}

/// Checks the predicate of `op` over all 2^32 operand pairs of `i16`.
fn i16_exhaustive(op: ArithOp, strategy: MulStrategy) {
    let width = IntWidth::W16;
    let predicate = Predicate::new(op, width, strategy);
    let eval = compile(predicate.cond(), width.ty());

    // The flattened form must agree with the predicate's own evaluator.
    for (lhs, rhs) in pairs(&strided(width, 251)) {
        assert_eq!(eval(lhs, rhs), predicate.eval(lhs, rhs), "{predicate} at {lhs} {rhs}");
    }

    (width.min()..=width.max()).into_par_iter().for_each(|lhs| {
        for rhs in width.min()..=width.max() {
            let overflows = matches!(Outcome::expected(op, width, lhs, rhs), Outcome::Overflow);
            assert_eq!(eval(lhs, rhs), overflows, "{predicate} at {lhs} {rhs}");
        }
    });
}

#[test]
fn i16_mul_every_operand_pair() {
    i16_exhaustive(ArithOp::Mul, MulStrategy::Widen);
}

#[test]
fn i16_mul_back_division_every_operand_pair() {
    i16_exhaustive(ArithOp::Mul, MulStrategy::BackDivision);
}

#[test]
#[ignore = "2^32 pairs per operation, run with --ignored"]
fn i16_add_sub_div_every_operand_pair() {
    for op in [ArithOp::Add, ArithOp::Sub, ArithOp::Div] {
        i16_exhaustive(op, MulStrategy::default());
    }
}

/// Operand generator biased toward the bounds of `width`, where the
/// interesting cases live.
fn sample(rng: &mut StdRng, width: IntWidth) -> i64 {
    let (min, max) = (width.min(), width.max());
    match rng.gen_range(0..4) {
        0 => rng.gen_range(min..=max),
        1 => {
            let edge = if rng.gen_bool(0.5) { min } else { max };
            edge - edge.signum() * rng.gen_range(0..64)
        }
        2 => rng.gen_range(-64..=64),
        _ => {
            // Around the square root of the bound, where products cross it.
            let root = 46341 * if rng.gen_bool(0.5) { 1 } else { -1 };
            root + rng.gen_range(-64..=64)
        }
    }
}

#[test]
fn i32_sampled() {
    let mut rng = StdRng::seed_from_u64(0x1d_b0a7);
    let width = IntWidth::W32;
    let values = boundary_values(width);

    for op in ArithOp::ALL {
        let harness = Harness::new(op, width, GuardConfig::default());
        let samples: Vec<_> = (0..20_000)
            .map(|_| (sample(&mut rng, width), sample(&mut rng, width)))
            .collect();
        harness.check_all(samples);
        harness.check_all(pairs(&values));
    }

    let harness = Harness::new(ArithOp::Mul, width, config(MulStrategy::BackDivision));
    let samples: Vec<_> = (0..20_000)
        .map(|_| (sample(&mut rng, width), sample(&mut rng, width)))
        .collect();
    harness.check_all(samples);
    harness.check_all(pairs(&values));
}
