use super::{Action, EvalValue, State, Trap};
use crate::{inst::BinaryOp, ValueId};

pub(super) fn neg(arg: ValueId, state: &mut dyn State) -> EvalValue {
    let value = state.lookup_val(arg);
    value.with_imm(|value| value.wrapping_neg())
}

/// Evaluates `add`, `sub`, `mul`, `div` and `rem`.
///
/// Arithmetic wraps at the operand width. A zero divisor traps.
pub(super) fn binary(
    code: BinaryOp,
    lhs: ValueId,
    rhs: ValueId,
    state: &mut dyn State,
) -> EvalValue {
    let lhs = state.lookup_val(lhs);
    let rhs = state.lookup_val(rhs);

    match code {
        BinaryOp::Add => EvalValue::zip_with_imm(lhs, rhs, |lhs, rhs| lhs.wrapping_add(rhs)),
        BinaryOp::Sub => EvalValue::zip_with_imm(lhs, rhs, |lhs, rhs| lhs.wrapping_sub(rhs)),
        BinaryOp::Mul => EvalValue::zip_with_imm(lhs, rhs, |lhs, rhs| lhs.wrapping_mul(rhs)),
        BinaryOp::Div | BinaryOp::Rem => {
            let (Some(lhs), Some(rhs)) = (lhs.as_imm(), rhs.as_imm()) else {
                return EvalValue::Undef;
            };
            let result = if code == BinaryOp::Div {
                lhs.checked_div(rhs)
            } else {
                lhs.checked_rem(rhs)
            };

            match result {
                Some(result) => result.into(),
                None => {
                    state.set_action(Action::Trap(Trap::DivideByZero));
                    EvalValue::Undef
                }
            }
        }
        _ => unreachable!("`{code}` is not an arithmetic operation"),
    }
}
