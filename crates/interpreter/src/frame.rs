use cranelift_entity::SecondaryMap;
use ir::{interpret::EvalValue, BlockId, FuncRef, Function, ValueId};

pub(crate) struct Frame {
    pub(crate) func: FuncRef,
    locals: SecondaryMap<ValueId, EvalValue>,
    pub(crate) prev_block: Option<BlockId>,
}

impl Frame {
    pub(crate) fn new(func_ref: FuncRef, func: &Function, args: Vec<EvalValue>) -> Self {
        debug_assert_eq!(func.arg_values.len(), args.len());

        let mut frame = Self {
            func: func_ref,
            locals: SecondaryMap::default(),
            prev_block: None,
        };

        for (arg_val, arg_e_val) in func.arg_values.iter().zip(args) {
            frame.map_val(*arg_val, arg_e_val);
        }

        frame
    }

    pub(crate) fn map_val(&mut self, value: ValueId, e_val: EvalValue) {
        self.locals[value] = e_val;
    }

    pub(crate) fn load(&self, value: ValueId) -> EvalValue {
        self.locals[value]
    }
}
