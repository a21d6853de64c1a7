//! This module contains IR data flow graph.
use std::{collections::BTreeSet, fmt};

use cranelift_entity::{entity_impl, packed_option::PackedOption, PrimaryMap, SecondaryMap};
use rustc_hash::FxHashMap;

use super::{inst::BranchInfo, Immediate, InstData, InstId, Type, Value, ValueId};

/// Overflow checking state of an arithmetic instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverflowCheck {
    /// No decision has been made about the instruction.
    #[default]
    Unchecked,

    /// The instruction is protected by an overflow guard.
    Guarded,

    /// The instruction deliberately wraps on overflow and must never be
    /// guarded.
    Wrapping,
}

impl OverflowCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::Guarded => "guarded",
            Self::Wrapping => "wrapping",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DataFlowGraph {
    #[doc(hidden)]
    pub blocks: PrimaryMap<BlockId, Block>,
    #[doc(hidden)]
    pub values: PrimaryMap<ValueId, Value>,
    insts: PrimaryMap<InstId, InstData>,
    inst_results: SecondaryMap<InstId, PackedOption<ValueId>>,
    overflow_checks: SecondaryMap<InstId, OverflowCheck>,
    immediates: FxHashMap<Immediate, ValueId>,
    users: SecondaryMap<ValueId, BTreeSet<InstId>>,
}

impl DataFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_block(&mut self) -> BlockId {
        self.blocks.push(Block::new())
    }

    pub fn make_value(&mut self, value: Value) -> ValueId {
        self.values.push(value)
    }

    pub fn make_inst(&mut self, inst: InstData) -> InstId {
        let inst_id = self.insts.push(inst);
        self.attach_user(inst_id);
        inst_id
    }

    pub fn make_imm_value<Imm>(&mut self, imm: Imm) -> ValueId
    where
        Imm: Into<Immediate>,
    {
        let imm: Immediate = imm.into();
        if let Some(&value) = self.immediates.get(&imm) {
            return value;
        }

        let ty = imm.ty();
        let value = self.make_value(Value::Immediate { imm, ty });
        self.immediates.insert(imm, value);
        value
    }

    pub fn make_arg_value(&mut self, ty: Type, idx: usize) -> ValueId {
        self.make_value(Value::Arg { ty, idx })
    }

    /// Makes the result value of `inst`, if the instruction produces one.
    pub fn make_result(&self, inst_id: InstId) -> Option<Value> {
        let ty = self.insts[inst_id].result_type(self)?;
        Some(Value::Inst { inst: inst_id, ty })
    }

    pub fn attach_result(&mut self, inst_id: InstId, value_id: ValueId) {
        debug_assert!(self.inst_results[inst_id].is_none());
        self.inst_results[inst_id] = value_id.into();
    }

    pub fn inst(&self, inst_id: InstId) -> &InstData {
        &self.insts[inst_id]
    }

    pub fn value(&self, value_id: ValueId) -> &Value {
        &self.values[value_id]
    }

    pub fn value_ty(&self, value_id: ValueId) -> Type {
        self.values[value_id].ty()
    }

    pub fn value_imm(&self, value_id: ValueId) -> Option<Immediate> {
        match self.values[value_id] {
            Value::Immediate { imm, .. } => Some(imm),
            _ => None,
        }
    }

    pub fn value_inst(&self, value_id: ValueId) -> Option<InstId> {
        match self.values[value_id] {
            Value::Inst { inst, .. } => Some(inst),
            _ => None,
        }
    }

    pub fn attach_user(&mut self, inst_id: InstId) {
        for &value in self.insts[inst_id].args() {
            self.users[value].insert(inst_id);
        }
    }

    pub fn untrack_inst(&mut self, inst_id: InstId) {
        for &value in self.insts[inst_id].args() {
            self.users[value].remove(&inst_id);
        }
    }

    /// Returns the all instructions that use the `value_id`.
    pub fn users(&self, value_id: ValueId) -> impl Iterator<Item = &InstId> {
        self.users[value_id].iter()
    }

    /// Returns the number of instructions that use the `value_id`.
    pub fn users_num(&self, value_id: ValueId) -> usize {
        self.users[value_id].len()
    }

    pub fn inst_result(&self, inst_id: InstId) -> Option<ValueId> {
        self.inst_results[inst_id].expand()
    }

    pub fn branch_info(&self, inst_id: InstId) -> BranchInfo<'_> {
        self.insts[inst_id].analyze_branch()
    }

    pub fn is_terminator(&self, inst_id: InstId) -> bool {
        self.insts[inst_id].is_terminator()
    }

    pub fn is_phi(&self, inst_id: InstId) -> bool {
        self.insts[inst_id].is_phi()
    }

    pub fn append_phi_arg(&mut self, inst_id: InstId, value: ValueId, block: BlockId) {
        self.insts[inst_id].append_phi_arg(value, block);
        self.users[value].insert(inst_id);
    }

    pub fn rewrite_phi_block(&mut self, inst_id: InstId, from: BlockId, to: BlockId) {
        self.insts[inst_id].rewrite_phi_block(from, to);
    }

    pub fn rewrite_branch_dest(&mut self, inst_id: InstId, from: BlockId, to: BlockId) {
        self.insts[inst_id].rewrite_branch_dest(from, to);
    }

    pub fn overflow_check(&self, inst_id: InstId) -> OverflowCheck {
        self.overflow_checks[inst_id]
    }

    pub fn set_overflow_check(&mut self, inst_id: InstId, check: OverflowCheck) {
        self.overflow_checks[inst_id] = check;
    }
}

/// An opaque reference to [`Block`]
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);
entity_impl!(BlockId, "block");

/// A block data definition.
/// A Block data doesn't hold any information for layout of a program. It is managed by
/// [`super::layout::Layout`].
#[derive(Debug, Clone, Default)]
pub struct Block {}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for OverflowCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
