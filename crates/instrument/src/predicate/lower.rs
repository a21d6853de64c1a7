use ir::{
    func_cursor::FuncCursor, BinaryOp, CastOp, Function, Immediate, InstData, OverflowCheck, Type,
    ValueId,
};
use rustc_hash::FxHashMap;

use super::{Cond, Term};

/// Emits a predicate tree as straight-line IR at a cursor.
///
/// Structurally equal terms are emitted once.
pub(super) struct Lowerer<'a, C> {
    func: &'a mut Function,
    cursor: &'a mut C,
    operand_ty: Type,
    lhs: ValueId,
    rhs: ValueId,
    lowered: FxHashMap<Term, ValueId>,
}

impl<'a, C> Lowerer<'a, C>
where
    C: FuncCursor,
{
    pub(super) fn new(
        func: &'a mut Function,
        cursor: &'a mut C,
        operand_ty: Type,
        lhs: ValueId,
        rhs: ValueId,
    ) -> Self {
        Self {
            func,
            cursor,
            operand_ty,
            lhs,
            rhs,
            lowered: FxHashMap::default(),
        }
    }

    pub(super) fn cond(&mut self, cond: &Cond) -> ValueId {
        match cond {
            Cond::Cmp(op, a, b) => {
                let (a, b) = (self.term(a), self.term(b));
                self.emit(InstData::binary(op.as_binary(), a, b))
            }
            Cond::And(conds) => self.fold(conds, BinaryOp::And, true),
            Cond::Or(conds) => self.fold(conds, BinaryOp::Or, false),
        }
    }

    fn fold(&mut self, conds: &[Cond], code: BinaryOp, identity: bool) -> ValueId {
        let Some((first, rest)) = conds.split_first() else {
            return self.func.dfg.make_imm_value(identity);
        };

        let mut acc = self.cond(first);
        for cond in rest {
            let value = self.cond(cond);
            acc = self.emit(InstData::binary(code, acc, value));
        }
        acc
    }

    fn term(&mut self, term: &Term) -> ValueId {
        if let Some(&value) = self.lowered.get(term) {
            return value;
        }

        let value = match term {
            Term::Lhs => self.lhs,
            Term::Rhs => self.rhs,
            Term::Const(imm) => self.func.dfg.make_imm_value(*imm),
            Term::Add(a, b) => self.arith(BinaryOp::Add, a, b),
            Term::Sub(a, b) => self.arith(BinaryOp::Sub, a, b),
            Term::Mul(a, b) => self.arith(BinaryOp::Mul, a, b),
            Term::Div(a, b) => self.arith(BinaryOp::Div, a, b),
            Term::Sext(arg, ty) => {
                let arg = self.term(arg);
                self.emit(InstData::cast(CastOp::Sext, arg, *ty))
            }
            Term::NonZero(arg) => {
                // `d | zext(d == 0)`
                let ty = arg.ty(self.operand_ty);
                let arg = self.term(arg);
                let zero = self.func.dfg.make_imm_value(Immediate::from_i128(0, ty));
                let is_zero = self.emit(InstData::binary(BinaryOp::Eq, arg, zero));
                let bit = self.emit(InstData::cast(CastOp::Zext, is_zero, ty));
                self.emit(InstData::binary(BinaryOp::Or, arg, bit))
            }
        };

        self.lowered.insert(term.clone(), value);
        value
    }

    fn arith(&mut self, code: BinaryOp, a: &Term, b: &Term) -> ValueId {
        let (a, b) = (self.term(a), self.term(b));
        let value = self.emit(InstData::binary(code, a, b));
        if let Some(inst) = self.func.dfg.value_inst(value) {
            self.func.dfg.set_overflow_check(inst, OverflowCheck::Wrapping);
        }
        value
    }

    fn emit(&mut self, data: InstData) -> ValueId {
        let inst = self.cursor.insert_inst_data(self.func, data);
        match self.cursor.make_result(self.func, inst) {
            Some(value) => value,
            None => panic!("`{inst}` doesn't have a result"),
        }
    }
}
