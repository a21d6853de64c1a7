use super::{EvalValue, State};
use crate::{inst::BinaryOp, ValueId};

/// Evaluates comparisons. Signedness follows the operand type.
pub(super) fn binary(
    code: BinaryOp,
    lhs: ValueId,
    rhs: ValueId,
    state: &mut dyn State,
) -> EvalValue {
    let lhs = state.lookup_val(lhs);
    let rhs = state.lookup_val(rhs);

    EvalValue::zip_with_imm(lhs, rhs, |lhs, rhs| match code {
        BinaryOp::Eq => lhs.eq(rhs),
        BinaryOp::Ne => lhs.ne(rhs),
        BinaryOp::Lt => lhs.lt(rhs),
        BinaryOp::Gt => lhs.gt(rhs),
        BinaryOp::Le => lhs.le(rhs),
        BinaryOp::Ge => lhs.ge(rhs),
        _ => unreachable!("`{code}` is not a comparison"),
    })
}
