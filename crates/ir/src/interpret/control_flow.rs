use super::{Action, EvalValue, State, Trap};
use crate::{module::FuncRef, BlockId, ValueId};

pub(super) fn jump(dest: BlockId, state: &mut dyn State) -> EvalValue {
    state.set_action(Action::JumpTo(dest));
    EvalValue::Undef
}

pub(super) fn br(cond: ValueId, dests: &[BlockId; 2], state: &mut dyn State) -> EvalValue {
    let Some(cond) = state.lookup_val(cond).as_imm() else {
        state.set_action(Action::FallThrough);
        return EvalValue::Undef;
    };

    let dest = if cond.is_zero() { dests[1] } else { dests[0] };
    state.set_action(Action::JumpTo(dest));
    EvalValue::Undef
}

pub(super) fn call(func: FuncRef, args: &[ValueId], state: &mut dyn State) -> EvalValue {
    let args = args.iter().map(|arg| state.lookup_val(*arg)).collect();
    state.call_func(func, args)
}

pub(super) fn ret(arg: Option<ValueId>, state: &mut dyn State) -> EvalValue {
    let ret_val = match arg {
        Some(arg) => state.lookup_val(arg),
        None => EvalValue::Undef,
    };

    state.set_action(Action::Return(ret_val));
    EvalValue::Undef
}

pub(super) fn unreachable(state: &mut dyn State) -> EvalValue {
    state.set_action(Action::Trap(Trap::Unreachable));
    EvalValue::Undef
}

pub(super) fn phi(values: &[ValueId], blocks: &[BlockId], state: &mut dyn State) -> EvalValue {
    let Some(prev_block) = state.prev_block() else {
        return EvalValue::Undef;
    };

    for (value, block) in values.iter().zip(blocks) {
        if prev_block == *block {
            return state.lookup_val(*value);
        }
    }

    EvalValue::Undef
}
