//! This module contains function layout information including block order and
//! instruction order.
use cranelift_entity::SecondaryMap;

use super::{BlockId, InstId};

#[derive(Debug, Clone, Default)]
pub struct Layout {
    blocks: SecondaryMap<BlockId, BlockNode>,
    insts: SecondaryMap<InstId, InstNode>,
    entry_block: Option<BlockId>,
    last_block: Option<BlockId>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.entry_block
    }

    pub fn last_block(&self) -> Option<BlockId> {
        self.last_block
    }

    pub fn is_block_empty(&self, block: BlockId) -> bool {
        self.first_inst_of(block).is_none()
    }

    pub fn prev_block_of(&self, block: BlockId) -> Option<BlockId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].prev
    }

    pub fn next_block_of(&self, block: BlockId) -> Option<BlockId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].next
    }

    pub fn is_block_inserted(&self, block: BlockId) -> bool {
        self.blocks[block].inserted
    }

    pub fn first_inst_of(&self, block: BlockId) -> Option<InstId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].first_inst
    }

    pub fn last_inst_of(&self, block: BlockId) -> Option<InstId> {
        debug_assert!(self.is_block_inserted(block));
        self.blocks[block].last_inst
    }

    pub fn prev_inst_of(&self, inst: InstId) -> Option<InstId> {
        debug_assert!(self.is_inst_inserted(inst));
        self.insts[inst].prev
    }

    pub fn next_inst_of(&self, inst: InstId) -> Option<InstId> {
        debug_assert!(self.is_inst_inserted(inst));
        self.insts[inst].next
    }

    /// Returns the block containing `inst`.
    ///
    /// # Panics
    /// Panics if `inst` is not inserted.
    pub fn inst_block(&self, inst: InstId) -> BlockId {
        match self.insts[inst].block {
            Some(block) => block,
            None => panic!("{inst} is not inserted in the layout"),
        }
    }

    pub fn is_inst_inserted(&self, inst: InstId) -> bool {
        self.insts[inst].block.is_some()
    }

    pub fn iter_block(&self) -> impl Iterator<Item = BlockId> + '_ {
        Iter {
            next: self.entry_block,
            step: move |block: BlockId| self.blocks[block].next,
        }
    }

    pub fn iter_inst(&self, block: BlockId) -> impl Iterator<Item = InstId> + '_ {
        debug_assert!(self.is_block_inserted(block));
        Iter {
            next: self.blocks[block].first_inst,
            step: move |inst: InstId| self.insts[inst].next,
        }
    }

    pub fn append_block(&mut self, block: BlockId) {
        match self.last_block {
            Some(last) => self.insert_block_after(block, last),
            None => {
                debug_assert!(!self.is_block_inserted(block));
                self.blocks[block] = BlockNode::inserted();
                self.entry_block = Some(block);
                self.last_block = Some(block);
            }
        }
    }

    pub fn insert_block_before(&mut self, block: BlockId, before: BlockId) {
        debug_assert!(self.is_block_inserted(before));
        debug_assert!(!self.is_block_inserted(block));

        let mut node = BlockNode::inserted();
        match self.blocks[before].prev {
            Some(prev) => {
                node.prev = Some(prev);
                self.blocks[prev].next = Some(block);
            }
            None => self.entry_block = Some(block),
        }

        node.next = Some(before);
        self.blocks[before].prev = Some(block);
        self.blocks[block] = node;
    }

    pub fn insert_block_after(&mut self, block: BlockId, after: BlockId) {
        debug_assert!(self.is_block_inserted(after));
        debug_assert!(!self.is_block_inserted(block));

        let mut node = BlockNode::inserted();
        match self.blocks[after].next {
            Some(next) => {
                node.next = Some(next);
                self.blocks[next].prev = Some(block);
            }
            None => self.last_block = Some(block),
        }

        node.prev = Some(after);
        self.blocks[after].next = Some(block);
        self.blocks[block] = node;
    }

    /// Removes `block` from the layout. The block must be empty.
    pub fn remove_block(&mut self, block: BlockId) {
        debug_assert!(self.is_block_inserted(block));
        debug_assert!(self.is_block_empty(block));

        let BlockNode { prev, next, .. } = self.blocks[block];
        match prev {
            Some(prev) => self.blocks[prev].next = next,
            None => self.entry_block = next,
        }
        match next {
            Some(next) => self.blocks[next].prev = prev,
            None => self.last_block = prev,
        }

        self.blocks[block] = BlockNode::default();
    }

    pub fn append_inst(&mut self, inst: InstId, block: BlockId) {
        debug_assert!(self.is_block_inserted(block));
        debug_assert!(!self.is_inst_inserted(inst));

        let mut node = InstNode::with_block(block);
        match self.blocks[block].last_inst {
            Some(last) => {
                node.prev = Some(last);
                self.insts[last].next = Some(inst);
            }
            None => self.blocks[block].first_inst = Some(inst),
        }

        self.blocks[block].last_inst = Some(inst);
        self.insts[inst] = node;
    }

    pub fn prepend_inst(&mut self, inst: InstId, block: BlockId) {
        match self.blocks[block].first_inst {
            Some(first) => self.insert_inst_before(inst, first),
            None => self.append_inst(inst, block),
        }
    }

    pub fn insert_inst_before(&mut self, inst: InstId, before: InstId) {
        debug_assert!(!self.is_inst_inserted(inst));

        let block = self.inst_block(before);
        let mut node = InstNode::with_block(block);
        match self.insts[before].prev {
            Some(prev) => {
                node.prev = Some(prev);
                self.insts[prev].next = Some(inst);
            }
            None => self.blocks[block].first_inst = Some(inst),
        }

        node.next = Some(before);
        self.insts[before].prev = Some(inst);
        self.insts[inst] = node;
    }

    pub fn insert_inst_after(&mut self, inst: InstId, after: InstId) {
        debug_assert!(!self.is_inst_inserted(inst));

        let block = self.inst_block(after);
        let mut node = InstNode::with_block(block);
        match self.insts[after].next {
            Some(next) => {
                node.next = Some(next);
                self.insts[next].prev = Some(inst);
            }
            None => self.blocks[block].last_inst = Some(inst),
        }

        node.prev = Some(after);
        self.insts[after].next = Some(inst);
        self.insts[inst] = node;
    }

    /// Remove instruction from the layout.
    pub fn remove_inst(&mut self, inst: InstId) {
        let block = self.inst_block(inst);
        let InstNode { prev, next, .. } = self.insts[inst];
        match prev {
            Some(prev) => self.insts[prev].next = next,
            None => self.blocks[block].first_inst = next,
        }
        match next {
            Some(next) => self.insts[next].prev = prev,
            None => self.blocks[block].last_inst = prev,
        }

        self.insts[inst] = InstNode::default();
    }

    /// Moves `inst` and every instruction following it in its block into
    /// `new_block`, which is inserted right after the original block.
    ///
    /// The original block keeps the instructions preceding `inst` and may
    /// become empty.
    pub fn split_block_at(&mut self, inst: InstId, new_block: BlockId) {
        let block = self.inst_block(inst);
        self.insert_block_after(new_block, block);

        let head_last = self.insts[inst].prev;
        let tail_last = self.blocks[block].last_inst;
        match head_last {
            Some(prev) => self.insts[prev].next = None,
            None => self.blocks[block].first_inst = None,
        }
        self.blocks[block].last_inst = head_last;
        self.insts[inst].prev = None;

        let new_node = &mut self.blocks[new_block];
        new_node.first_inst = Some(inst);
        new_node.last_inst = tail_last;

        let mut next = Some(inst);
        while let Some(moved) = next {
            self.insts[moved].block = Some(new_block);
            next = self.insts[moved].next;
        }
    }
}

struct Iter<K, F> {
    next: Option<K>,
    step: F,
}

impl<K, F> Iterator for Iter<K, F>
where
    K: Copy,
    F: Fn(K) -> Option<K>,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let next = self.next?;
        self.next = (self.step)(next);
        Some(next)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
struct BlockNode {
    inserted: bool,
    prev: Option<BlockId>,
    next: Option<BlockId>,
    first_inst: Option<InstId>,
    last_inst: Option<InstId>,
}

impl BlockNode {
    fn inserted() -> Self {
        Self {
            inserted: true,
            ..Self::default()
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
struct InstNode {
    /// An block in which the inst exists.
    block: Option<BlockId>,
    prev: Option<InstId>,
    next: Option<InstId>,
}

impl InstNode {
    fn with_block(block: BlockId) -> Self {
        Self {
            block: Some(block),
            prev: None,
            next: None,
        }
    }
}
