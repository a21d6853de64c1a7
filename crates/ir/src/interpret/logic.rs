use super::{EvalValue, State};
use crate::{inst::BinaryOp, ValueId};

pub(super) fn not(arg: ValueId, state: &mut dyn State) -> EvalValue {
    let value = state.lookup_val(arg);
    value.with_imm(|value| value.not())
}

pub(super) fn binary(
    code: BinaryOp,
    lhs: ValueId,
    rhs: ValueId,
    state: &mut dyn State,
) -> EvalValue {
    let lhs = state.lookup_val(lhs);
    let rhs = state.lookup_val(rhs);

    EvalValue::zip_with_imm(lhs, rhs, |lhs, rhs| match code {
        BinaryOp::And => lhs.and(rhs),
        BinaryOp::Or => lhs.or(rhs),
        BinaryOp::Xor => lhs.xor(rhs),
        _ => unreachable!("`{code}` is not a logical operation"),
    })
}
