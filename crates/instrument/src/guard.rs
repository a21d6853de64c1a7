//! Rewrites an arithmetic instruction into a guarded one.
use ir::{
    func_cursor::{CursorLocation, FuncCursor, InstInserter},
    BlockId, FuncRef, Function, InstData, InstId, Linkage, Module, OverflowCheck, Signature, Type,
    ValueId,
};

use crate::{classify::ArithmeticOperation, predicate::Predicate};

pub use ir::runtime::{OVERFLOW_MESSAGE, PANIC_OVERFLOW};

/// Declares the panic trigger in `module`, or returns the existing
/// declaration.
pub fn declare_panic_fn(module: &mut Module) -> FuncRef {
    module.declare_function(Signature::new(
        PANIC_OVERFLOW,
        Linkage::External,
        &[],
        Type::Unit,
    ))
}

/// Blocks and values making up a guarded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardedInst {
    /// The original instruction, now marked as guarded.
    pub inst: InstId,

    /// Ends with the predicate and `br cond fault cont`.
    pub check: BlockId,

    /// `call %runtime.panicoverflow; unreachable;`
    pub fault: BlockId,

    /// Starts with the original instruction.
    pub cont: BlockId,

    /// The lowered predicate.
    pub cond: ValueId,
}

/// Guards `op` with `predicate`.
///
/// The block holding `op.inst` is split right before it. The predicate is
/// computed from the operand values at the end of the first half, which
/// branches to a fault block when it holds and falls into the original
/// instruction otherwise. The instruction keeps its id and its result value,
/// so every user stays valid.
pub fn insert_guard(
    func: &mut Function,
    op: &ArithmeticOperation,
    predicate: &Predicate,
    panic_fn: FuncRef,
) -> GuardedInst {
    debug_assert_eq!((predicate.op(), predicate.width()), (op.op, op.width));

    let check = func.layout.inst_block(op.inst);
    let cont = func.split_block_at(op.inst);

    let mut cursor = InstInserter::at_location(CursorLocation::BlockBottom(check));
    let cond = predicate.lower(func, &mut cursor, op.lhs, op.rhs);

    let fault = cursor.make_block(func);
    cursor.insert_block(func, fault);
    cursor.insert_inst_data(func, InstData::br(cond, fault, cont));

    cursor.set_location(CursorLocation::BlockBottom(fault));
    cursor.insert_inst_data(func, InstData::call(panic_fn, &[], Type::Unit));
    cursor.insert_inst_data(func, InstData::Unreachable);

    func.dfg.set_overflow_check(op.inst, OverflowCheck::Guarded);

    GuardedInst {
        inst: op.inst,
        check,
        fault,
        cont,
        cond,
    }
}
