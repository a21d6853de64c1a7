use smallvec::SmallVec;

use super::{BlockId, DataFlowGraph, InstId, Layout, Linkage, Type, ValueId};

#[derive(Debug, Clone)]
pub struct Function {
    /// Signature of the function.
    pub sig: Signature,
    pub arg_values: SmallVec<[ValueId; 8]>,
    pub dfg: DataFlowGraph,
    pub layout: Layout,
}

impl Function {
    pub fn new(sig: &Signature) -> Self {
        let mut dfg = DataFlowGraph::new();
        let arg_values = sig
            .args()
            .iter()
            .enumerate()
            .map(|(idx, arg_ty)| dfg.make_arg_value(*arg_ty, idx))
            .collect();

        Self {
            sig: sig.clone(),
            arg_values,
            dfg,
            layout: Layout::default(),
        }
    }

    /// Returns `true` if the function has at least one inserted block.
    pub fn has_body(&self) -> bool {
        self.layout.entry_block().is_some()
    }

    /// Splits the block containing `inst` right before it.
    ///
    /// `inst` and every instruction after it move into a fresh block placed
    /// right after the original one; the original block keeps the preceding
    /// instructions and is left without a terminator. Phi instructions in the
    /// successors of the moved terminator are rewritten so that their incoming
    /// edges name the new block.
    ///
    /// Returns the new block.
    pub fn split_block_at(&mut self, inst: InstId) -> BlockId {
        debug_assert!(!self.dfg.is_phi(inst), "can't split a block at a phi");

        let block = self.layout.inst_block(inst);
        let new_block = self.dfg.make_block();
        self.layout.split_block_at(inst, new_block);

        let Some(term) = self.layout.last_inst_of(new_block) else {
            return new_block;
        };
        let succs: SmallVec<[BlockId; 2]> = self.dfg.branch_info(term).iter_dests().collect();
        for succ in succs {
            let phis: SmallVec<[InstId; 4]> = self
                .layout
                .iter_inst(succ)
                .take_while(|inst| self.dfg.is_phi(*inst))
                .collect();
            for phi in phis {
                self.dfg.rewrite_phi_block(phi, block, new_block);
            }
        }

        new_block
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Name of the function.
    name: String,

    /// Linkage of the function.
    linkage: Linkage,

    args: SmallVec<[Type; 8]>,
    ret_ty: Type,
}

impl Signature {
    pub fn new(name: &str, linkage: Linkage, args: &[Type], ret_ty: Type) -> Self {
        Self {
            name: name.to_string(),
            linkage,
            args: args.into(),
            ret_ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    pub fn args(&self) -> &[Type] {
        &self.args
    }

    pub fn ret_ty(&self) -> Type {
        self.ret_ty
    }
}
