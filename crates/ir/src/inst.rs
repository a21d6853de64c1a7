//! This module contains IR instructions definitions.
use std::fmt;

use cranelift_entity::entity_impl;
use smallvec::SmallVec;

use super::{BlockId, DataFlowGraph, FuncRef, Type, ValueId};

/// An opaque reference to [`InstData`]
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct InstId(pub u32);
entity_impl!(InstId, "inst");

/// An instruction data definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstData {
    /// Unary instructions.
    Unary { code: UnaryOp, args: [ValueId; 1] },

    /// Binary instructions.
    Binary { code: BinaryOp, args: [ValueId; 2] },

    /// Cast operations.
    Cast {
        code: CastOp,
        args: [ValueId; 1],
        ty: Type,
    },

    /// Unconditional jump instruction.
    Jump { dests: [BlockId; 1] },

    /// Conditional jump instruction. Jumps to `dests[0]` if the condition is
    /// true, otherwise to `dests[1]`.
    Br {
        args: [ValueId; 1],
        dests: [BlockId; 2],
    },

    /// Function call.
    Call {
        func: FuncRef,
        args: SmallVec<[ValueId; 8]>,
        ret_ty: Type,
    },

    /// Return.
    Return { args: Option<ValueId> },

    /// Marks a point control never reaches.
    Unreachable,

    /// Phi funcion.
    Phi {
        values: SmallVec<[ValueId; 8]>,
        blocks: SmallVec<[BlockId; 8]>,
        ty: Type,
    },
}

impl InstData {
    pub fn unary(code: UnaryOp, arg: ValueId) -> Self {
        Self::Unary { code, args: [arg] }
    }

    pub fn binary(code: BinaryOp, lhs: ValueId, rhs: ValueId) -> Self {
        Self::Binary {
            code,
            args: [lhs, rhs],
        }
    }

    pub fn cast(code: CastOp, arg: ValueId, ty: Type) -> Self {
        Self::Cast {
            code,
            args: [arg],
            ty,
        }
    }

    pub fn jump(dest: BlockId) -> Self {
        Self::Jump { dests: [dest] }
    }

    pub fn br(cond: ValueId, then: BlockId, else_: BlockId) -> Self {
        Self::Br {
            args: [cond],
            dests: [then, else_],
        }
    }

    pub fn call(func: FuncRef, args: &[ValueId], ret_ty: Type) -> Self {
        Self::Call {
            func,
            args: args.into(),
            ret_ty,
        }
    }

    pub fn ret(arg: Option<ValueId>) -> Self {
        Self::Return { args: arg }
    }

    pub fn phi(ty: Type) -> Self {
        Self::Phi {
            values: SmallVec::new(),
            blocks: SmallVec::new(),
            ty,
        }
    }

    /// Returns the type of the value `self` defines, or `None` for
    /// instructions without a result.
    pub fn result_type(&self, dfg: &DataFlowGraph) -> Option<Type> {
        match self {
            Self::Unary { args, .. } => Some(dfg.value_ty(args[0])),
            Self::Binary { code, args } => Some(code.result_type(dfg, args)),
            Self::Cast { ty, .. } | Self::Phi { ty, .. } => Some(*ty),
            Self::Call { ret_ty, .. } => (*ret_ty != Type::Unit).then_some(*ret_ty),
            Self::Jump { .. } | Self::Br { .. } | Self::Return { .. } | Self::Unreachable => None,
        }
    }

    pub fn analyze_branch(&self) -> BranchInfo<'_> {
        match self {
            Self::Jump { dests } => BranchInfo::Jump { dest: dests[0] },

            Self::Br { args, dests } => BranchInfo::Br {
                cond: args[0],
                dests,
            },

            _ => BranchInfo::NotBranch,
        }
    }

    pub fn rewrite_branch_dest(&mut self, from: BlockId, to: BlockId) {
        match self {
            Self::Jump { dests } => {
                if dests[0] == from {
                    dests[0] = to
                }
            }

            Self::Br { dests, .. } => {
                for block in dests.iter_mut() {
                    if *block == from {
                        *block = to;
                    }
                }
            }

            _ => {}
        }
    }

    pub fn args(&self) -> &[ValueId] {
        match self {
            Self::Binary { args, .. } => args,
            Self::Unary { args, .. } | Self::Cast { args, .. } | Self::Br { args, .. } => args,
            Self::Call { args, .. } | Self::Phi { values: args, .. } => args,
            Self::Return { args } => args.as_slice(),
            Self::Jump { .. } | Self::Unreachable => &[],
        }
    }

    pub fn append_phi_arg(&mut self, value: ValueId, block: BlockId) {
        match self {
            Self::Phi { values, blocks, .. } => {
                values.push(value);
                blocks.push(block)
            }
            _ => panic!("Expects `InstData::phi` but got `{:?}`", self),
        }
    }

    /// Rewrites every incoming edge from `from` so that it comes from `to`.
    pub fn rewrite_phi_block(&mut self, from: BlockId, to: BlockId) {
        if let Self::Phi { blocks, .. } = self {
            for block in blocks.iter_mut() {
                if *block == from {
                    *block = to;
                }
            }
        }
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, Self::Phi { .. })
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Jump { .. } | Self::Br { .. } | Self::Return { .. } | Self::Unreachable
        )
    }
}

/// Unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Neg => "neg",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary operations.
///
/// Division and comparisons take their signedness from the operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn is_arith(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Rem
        )
    }

    pub fn is_cmp(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Gt | Self::Le | Self::Ge
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Rem => "rem",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Ge => "ge",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }

    fn result_type(self, dfg: &DataFlowGraph, args: &[ValueId; 2]) -> Type {
        if self.is_cmp() {
            Type::I1
        } else {
            dfg.value_ty(args[0])
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOp {
    Sext,
    Zext,
    Trunc,
}

impl CastOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sext => "sext",
            Self::Zext => "zext",
            Self::Trunc => "trunc",
        }
    }
}

impl fmt::Display for CastOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy)]
pub enum BranchInfo<'a> {
    NotBranch,

    /// Unconditional jump
    Jump { dest: BlockId },

    /// Conditional jump.
    Br {
        cond: ValueId,
        dests: &'a [BlockId],
    },
}

impl<'a> BranchInfo<'a> {
    pub fn iter_dests(self) -> BranchDestIter<'a> {
        BranchDestIter {
            branch_info: self,
            idx: 0,
        }
    }

    pub fn dests_num(self) -> usize {
        match self {
            Self::NotBranch => 0,
            Self::Jump { .. } => 1,
            Self::Br { dests, .. } => dests.len(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct BranchDestIter<'a> {
    branch_info: BranchInfo<'a>,
    idx: usize,
}

impl Iterator for BranchDestIter<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<Self::Item> {
        let dest = match self.branch_info {
            BranchInfo::Jump { dest } if self.idx == 0 => dest,
            BranchInfo::Br { dests, .. } => *dests.get(self.idx)?,
            _ => return None,
        };
        self.idx += 1;
        Some(dest)
    }
}
