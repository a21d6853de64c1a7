use super::{EvalValue, State};
use crate::{inst::CastOp, Type, ValueId};

pub(super) fn cast(code: CastOp, arg: ValueId, ty: Type, state: &mut dyn State) -> EvalValue {
    let value = state.lookup_val(arg);

    value.with_imm(|value| match code {
        CastOp::Sext => value.sext(ty),
        CastOp::Zext => value.zext(ty),
        CastOp::Trunc => value.trunc(ty),
    })
}
