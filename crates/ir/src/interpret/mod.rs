//! Per-instruction evaluation semantics shared by IR executors.
use std::fmt;

use crate::{
    inst::{InstData, UnaryOp},
    module::FuncRef,
    BlockId, Immediate, ValueId,
};

mod arith;
mod cast;
mod cmp;
mod control_flow;
mod logic;

pub trait Interpret {
    fn interpret(&self, state: &mut dyn State) -> EvalValue;
}

impl Interpret for InstData {
    fn interpret(&self, state: &mut dyn State) -> EvalValue {
        match self {
            Self::Unary {
                code: UnaryOp::Neg,
                args,
            } => arith::neg(args[0], state),
            Self::Unary {
                code: UnaryOp::Not,
                args,
            } => logic::not(args[0], state),
            Self::Binary { code, args } if code.is_arith() => {
                arith::binary(*code, args[0], args[1], state)
            }
            Self::Binary { code, args } if code.is_cmp() => {
                cmp::binary(*code, args[0], args[1], state)
            }
            Self::Binary { code, args } => logic::binary(*code, args[0], args[1], state),
            Self::Cast { code, args, ty } => cast::cast(*code, args[0], *ty, state),
            Self::Jump { dests } => control_flow::jump(dests[0], state),
            Self::Br { args, dests } => control_flow::br(args[0], dests, state),
            Self::Call { func, args, .. } => control_flow::call(*func, args, state),
            Self::Return { args } => control_flow::ret(*args, state),
            Self::Unreachable => control_flow::unreachable(state),
            Self::Phi { values, blocks, .. } => control_flow::phi(values, blocks, state),
        }
    }
}

pub trait State {
    /// Retrieves the evaluated value associated with the given `ValueId`.
    ///
    /// NOTE: If the value cannot be found or is uninitialized, this method is
    /// allowed to return an undefined (`Undef`) value. A state needs to decide
    /// how to deal with the situation (e.g., report an error).
    fn lookup_val(&mut self, value: ValueId) -> EvalValue;

    /// Calls `func`. If the callee traps, the state records why and sets
    /// [`Action::Trap`] with [`Trap::Unwind`].
    fn call_func(&mut self, func: FuncRef, args: Vec<EvalValue>) -> EvalValue;

    fn set_action(&mut self, action: Action);

    /// Returns the basic block that was executed immediately before
    /// the current block, if any.
    fn prev_block(&mut self) -> Option<BlockId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    JumpTo(BlockId),
    /// Indicate that branching instruction can't properly decide next
    /// destination, e.g. the condition of `br` is undefined.
    FallThrough,
    Return(EvalValue),
    /// Execution can't continue past the current instruction.
    Trap(Trap),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// Integer division or remainder by zero.
    DivideByZero,
    /// Control reached `unreachable`.
    Unreachable,
    /// A callee trapped; the state holds the details.
    Unwind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvalValue {
    Imm(Immediate),
    #[default]
    Undef,
}

impl EvalValue {
    pub fn with_imm<F, R>(self, f: F) -> Self
    where
        F: FnOnce(Immediate) -> R,
        R: Into<Self>,
    {
        match self {
            EvalValue::Imm(value) => f(value).into(),
            EvalValue::Undef => EvalValue::Undef,
        }
    }

    pub fn zip_with_imm<F, R>(lhs: Self, rhs: Self, f: F) -> Self
    where
        F: FnOnce(Immediate, Immediate) -> R,
        R: Into<Self>,
    {
        match (lhs, rhs) {
            (EvalValue::Imm(l), EvalValue::Imm(r)) => f(l, r).into(),
            _ => EvalValue::Undef,
        }
    }

    pub fn as_imm(&self) -> Option<Immediate> {
        match self {
            Self::Imm(imm) => Some(*imm),
            _ => None,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Self::Undef)
    }
}

impl fmt::Display for EvalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imm(imm) => write!(f, "{imm}"),
            Self::Undef => write!(f, "undef"),
        }
    }
}

impl From<Immediate> for EvalValue {
    fn from(imm: Immediate) -> Self {
        Self::Imm(imm)
    }
}
