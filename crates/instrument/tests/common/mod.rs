#![allow(dead_code)]

use intguard_instrument::{
    ArithOp, ExemptionSet, GuardConfig, IntWidth, ModuleStats, OverflowGuard, OVERFLOW_MESSAGE,
};
use interpreter::{EvalValue, Fault, Machine};
use ir::{
    builder::{test_util::*, ModuleBuilder},
    FuncRef, InstData, Module,
};
use verifier::{verify_module, VerifierConfig};

/// How a single arithmetic operation ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Value(i128),
    Overflow,
    DivideByZero,
}

impl Outcome {
    /// The outcome the instrumented program must produce.
    pub fn expected(op: ArithOp, width: IntWidth, lhs: i64, rhs: i64) -> Self {
        match op.exact(lhs.into(), rhs.into()) {
            None => Self::DivideByZero,
            Some(value) if width.contains(value) => Self::Value(value),
            Some(_) => Self::Overflow,
        }
    }

    /// The outcome of a program left uninstrumented: wrapping arithmetic.
    pub fn wrapped(op: ArithOp, width: IntWidth, lhs: i64, rhs: i64) -> Self {
        match op.exact(lhs.into(), rhs.into()) {
            None => Self::DivideByZero,
            Some(value) => {
                let bits = width.bits();
                let shift = 128 - bits;
                Self::Value((value << shift) >> shift)
            }
        }
    }
}

/// `%op(lhs, rhs) -> width` computing `lhs <op> rhs` in `package`.
pub fn single_op(package: &str, op: ArithOp, width: IntWidth) -> (Module, FuncRef) {
    let ty = width.ty();
    let mut mb = ModuleBuilder::new(package);
    let mut builder = test_func_builder(&mut mb, "op", &[ty, ty], ty);
    let func_ref = builder.func_ref();
    let b0 = builder.append_block();
    builder.switch_to_block(b0);
    let (lhs, rhs) = (builder.args()[0], builder.args()[1]);
    let res = builder.insert_inst_with_result(InstData::binary(op.as_binary(), lhs, rhs));
    builder.ret(Some(res));
    builder.finish();
    (mb.build(), func_ref)
}

/// Instruments `module` with the standard exemptions and checks that the
/// result is well formed.
pub fn instrument(module: &mut Module, config: GuardConfig) -> ModuleStats {
    instrument_with(module, ExemptionSet::standard(), config)
}

pub fn instrument_with(
    module: &mut Module,
    exemptions: &ExemptionSet,
    config: GuardConfig,
) -> ModuleStats {
    let stats = OverflowGuard::new(exemptions, config)
        .run_on_module(module)
        .unwrap();
    let report = verify_module(module, &VerifierConfig::default());
    assert!(report.is_ok(), "{report}\n{}", dump_module(module));
    stats
}

pub fn run(
    machine: &mut Machine<'_>,
    func: FuncRef,
    width: IntWidth,
    lhs: i64,
    rhs: i64,
) -> Result<i128, Fault> {
    let args = vec![
        EvalValue::Imm(width.imm(lhs)),
        EvalValue::Imm(width.imm(rhs)),
    ];
    match machine.run(func, args)? {
        EvalValue::Imm(imm) => Ok(imm.as_i128()),
        EvalValue::Undef => panic!("`%op` returned an undefined value"),
    }
}

pub fn outcome(result: Result<i128, Fault>) -> Outcome {
    match result {
        Ok(value) => Outcome::Value(value),
        Err(Fault::DivideByZero) => Outcome::DivideByZero,
        Err(Fault::Panic { message, .. }) if message == OVERFLOW_MESSAGE => Outcome::Overflow,
        Err(fault) => panic!("unexpected fault: {fault}"),
    }
}

/// An instrumented single-operation program.
pub struct Harness {
    pub op: ArithOp,
    pub width: IntWidth,
    pub module: Module,
    pub func: FuncRef,
}

impl Harness {
    pub fn new(op: ArithOp, width: IntWidth, config: GuardConfig) -> Self {
        let (mut module, func) = single_op("app/calc", op, width);
        let stats = instrument(&mut module, config);
        assert_eq!(stats.instrumented, 1);
        Self {
            op,
            width,
            module,
            func,
        }
    }

    /// Runs every pair and asserts the expected outcome.
    pub fn check_all(&self, pairs: impl IntoIterator<Item = (i64, i64)>) {
        let mut machine = Machine::new(&self.module);
        for (lhs, rhs) in pairs {
            let got = outcome(run(&mut machine, self.func, self.width, lhs, rhs));
            let expected = Outcome::expected(self.op, self.width, lhs, rhs);
            assert_eq!(
                got, expected,
                "{} {lhs} {rhs} over {}",
                self.op, self.width
            );
        }
    }
}

/// Values near the interesting points of `width`: zero, one, minus one and
/// both bounds.
pub fn boundary_values(width: IntWidth) -> Vec<i64> {
    let (min, max) = (width.min(), width.max());
    let mut values = vec![0, 1, -1, 2, -2];
    for delta in 0..4 {
        values.push(min + delta);
        values.push(max - delta);
        values.push(min / 2 + delta - 1);
        values.push(max / 2 + delta - 1);
    }
    values.sort_unstable();
    values.dedup();
    values
}
