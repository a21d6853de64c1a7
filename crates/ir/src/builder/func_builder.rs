use super::ModuleBuilder;
use crate::{
    func_cursor::{CursorLocation, FuncCursor},
    inst::{BinaryOp, CastOp, InstData, UnaryOp},
    module::FuncRef,
    BlockId, Function, Immediate, InstId, OverflowCheck, Type, ValueId,
};

pub struct FunctionBuilder<'a, C> {
    module_builder: &'a mut ModuleBuilder,
    pub func: Function,
    func_ref: FuncRef,
    pub cursor: C,
}

macro_rules! impl_unary_inst {
    ($name:ident, $code:path) => {
        pub fn $name(&mut self, arg: ValueId) -> ValueId {
            self.insert_inst_with_result(InstData::unary($code, arg))
        }
    };
}

macro_rules! impl_binary_inst {
    ($name:ident, $code:path) => {
        pub fn $name(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
            self.insert_inst_with_result(InstData::binary($code, lhs, rhs))
        }
    };
}

macro_rules! impl_cast_inst {
    ($name:ident, $code:path) => {
        pub fn $name(&mut self, arg: ValueId, ty: Type) -> ValueId {
            self.insert_inst_with_result(InstData::cast($code, arg, ty))
        }
    };
}

impl<'a, C> FunctionBuilder<'a, C>
where
    C: FuncCursor,
{
    pub fn new(module_builder: &'a mut ModuleBuilder, func_ref: FuncRef, cursor: C) -> Self {
        let func = Function::new(module_builder.sig(func_ref));
        Self {
            module_builder,
            func,
            func_ref,
            cursor,
        }
    }

    /// Stores the built body into the module.
    pub fn finish(self) {
        let Self {
            module_builder,
            func,
            func_ref,
            ..
        } = self;

        module_builder.module_mut().funcs[func_ref] = func;
    }

    pub fn func_ref(&self) -> FuncRef {
        self.func_ref
    }

    pub fn args(&self) -> &[ValueId] {
        &self.func.arg_values
    }

    pub fn append_block(&mut self) -> BlockId {
        let block = self.cursor.make_block(&mut self.func);
        self.cursor.append_block(&mut self.func, block);
        block
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.cursor.set_location(CursorLocation::BlockBottom(block));
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        self.func.dfg.make_imm_value(imm)
    }

    impl_unary_inst!(not, UnaryOp::Not);
    impl_unary_inst!(neg, UnaryOp::Neg);

    impl_binary_inst!(add, BinaryOp::Add);
    impl_binary_inst!(sub, BinaryOp::Sub);
    impl_binary_inst!(mul, BinaryOp::Mul);
    impl_binary_inst!(div, BinaryOp::Div);
    impl_binary_inst!(rem, BinaryOp::Rem);
    impl_binary_inst!(eq, BinaryOp::Eq);
    impl_binary_inst!(ne, BinaryOp::Ne);
    impl_binary_inst!(lt, BinaryOp::Lt);
    impl_binary_inst!(gt, BinaryOp::Gt);
    impl_binary_inst!(le, BinaryOp::Le);
    impl_binary_inst!(ge, BinaryOp::Ge);
    impl_binary_inst!(and, BinaryOp::And);
    impl_binary_inst!(or, BinaryOp::Or);
    impl_binary_inst!(xor, BinaryOp::Xor);

    impl_cast_inst!(sext, CastOp::Sext);
    impl_cast_inst!(zext, CastOp::Zext);
    impl_cast_inst!(trunc, CastOp::Trunc);

    pub fn jump(&mut self, dest: BlockId) {
        self.insert_inst(InstData::jump(dest));
    }

    pub fn br(&mut self, cond: ValueId, then: BlockId, else_: BlockId) {
        self.insert_inst(InstData::br(cond, then, else_));
    }

    pub fn ret(&mut self, arg: Option<ValueId>) {
        self.insert_inst(InstData::ret(arg));
    }

    pub fn unreachable(&mut self) {
        self.insert_inst(InstData::Unreachable);
    }

    /// Calls `callee`; returns `None` if the callee returns `unit`.
    pub fn call(&mut self, callee: FuncRef, args: &[ValueId]) -> Option<ValueId> {
        let ret_ty = self.module_builder.sig(callee).ret_ty();
        let inst = self.insert_inst(InstData::call(callee, args, ret_ty));
        self.cursor.make_result(&mut self.func, inst)
    }

    pub fn phi(&mut self, ty: Type, args: &[(ValueId, BlockId)]) -> ValueId {
        let phi = self.insert_inst_with_result(InstData::phi(ty));
        for &(value, block) in args {
            self.append_phi_arg(phi, value, block);
        }
        phi
    }

    pub fn append_phi_arg(&mut self, phi_res: ValueId, value: ValueId, block: BlockId) {
        let Some(phi_inst) = self.func.dfg.value_inst(phi_res) else {
            panic!("`{phi_res}` should be a result of phi inst");
        };
        self.func.dfg.append_phi_arg(phi_inst, value, block);
    }

    /// Sets the overflow check state of the instruction defining `value`.
    pub fn set_overflow_check(&mut self, value: ValueId, check: OverflowCheck) {
        let Some(inst) = self.func.dfg.value_inst(value) else {
            panic!("`{value}` is not defined by an instruction");
        };
        self.func.dfg.set_overflow_check(inst, check);
    }

    /// Inserts an instruction at the current position without making a
    /// result value.
    pub fn insert_inst(&mut self, data: InstData) -> InstId {
        self.cursor.insert_inst_data(&mut self.func, data)
    }

    /// Inserts an instruction at the current position and returns its result.
    ///
    /// # Panics
    /// Panics if the instruction has no result.
    pub fn insert_inst_with_result(&mut self, data: InstData) -> ValueId {
        let inst = self.insert_inst(data);
        match self.cursor.make_result(&mut self.func, inst) {
            Some(result) => result,
            None => panic!("`{inst}` doesn't have a result"),
        }
    }
}
