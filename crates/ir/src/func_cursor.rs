use super::{BlockId, Function, InstData, InstId, ValueId};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorLocation {
    At(InstId),
    BlockTop(BlockId),
    BlockBottom(BlockId),
    #[default]
    NoWhere,
}

pub trait FuncCursor {
    fn at_location(loc: CursorLocation) -> Self;
    fn set_location(&mut self, loc: CursorLocation);
    fn loc(&self) -> CursorLocation;

    fn set_to_entry(&mut self, func: &Function) {
        let loc = match func.layout.entry_block() {
            Some(entry) => CursorLocation::BlockTop(entry),
            None => CursorLocation::NoWhere,
        };
        self.set_location(loc);
    }

    /// Inserts `inst` at the cursor and moves the cursor onto it, so that
    /// successive insertions keep program order.
    fn insert_inst(&mut self, func: &mut Function, inst: InstId) {
        match self.loc() {
            CursorLocation::At(at) => func.layout.insert_inst_after(inst, at),
            CursorLocation::BlockTop(block) => func.layout.prepend_inst(inst, block),
            CursorLocation::BlockBottom(block) => func.layout.append_inst(inst, block),
            CursorLocation::NoWhere => panic!("cursor loc points to `NoWhere`"),
        }
        if !matches!(self.loc(), CursorLocation::BlockBottom(..)) {
            self.set_location(CursorLocation::At(inst));
        }
    }

    fn append_inst(&mut self, func: &mut Function, inst: InstId) {
        let current_block = self.expect_block(func);
        func.layout.append_inst(inst, current_block);
    }

    fn insert_inst_data(&mut self, func: &mut Function, data: InstData) -> InstId {
        let inst = func.dfg.make_inst(data);
        self.insert_inst(func, inst);
        inst
    }

    fn append_inst_data(&mut self, func: &mut Function, data: InstData) -> InstId {
        let inst = func.dfg.make_inst(data);
        self.append_inst(func, inst);
        inst
    }

    /// Makes the result value of `inst` and attaches it.
    fn make_result(&mut self, func: &mut Function, inst: InstId) -> Option<ValueId> {
        let value_data = func.dfg.make_result(inst)?;
        let value = func.dfg.make_value(value_data);
        func.dfg.attach_result(inst, value);
        Some(value)
    }

    fn remove_inst(&mut self, func: &mut Function) {
        let inst = self.expect_inst();
        let next_loc = self.next_loc(func);

        func.dfg.untrack_inst(inst);
        func.layout.remove_inst(inst);

        self.set_location(next_loc);
    }

    fn make_block(&mut self, func: &mut Function) -> BlockId {
        func.dfg.make_block()
    }

    fn inst(&self) -> Option<InstId> {
        match self.loc() {
            CursorLocation::At(inst) => Some(inst),
            _ => None,
        }
    }

    fn expect_inst(&self) -> InstId {
        match self.inst() {
            Some(inst) => inst,
            None => panic!("current cursor location doesn't point to inst"),
        }
    }

    fn block(&self, func: &Function) -> Option<BlockId> {
        match self.loc() {
            CursorLocation::At(inst) => Some(func.layout.inst_block(inst)),
            CursorLocation::BlockTop(block) | CursorLocation::BlockBottom(block) => Some(block),
            CursorLocation::NoWhere => None,
        }
    }

    fn expect_block(&self, func: &Function) -> BlockId {
        match self.block(func) {
            Some(block) => block,
            None => panic!("cursor loc points to `NoWhere`"),
        }
    }

    /// Inserts `block` right after the current block.
    fn insert_block(&mut self, func: &mut Function, block: BlockId) {
        let current = self.expect_block(func);
        func.layout.insert_block_after(block, current)
    }

    fn append_block(&mut self, func: &mut Function, block: BlockId) {
        func.layout.append_block(block);
    }

    fn next_loc(&self, func: &Function) -> CursorLocation {
        match self.loc() {
            CursorLocation::At(inst) => func.layout.next_inst_of(inst).map_or_else(
                || CursorLocation::BlockBottom(func.layout.inst_block(inst)),
                CursorLocation::At,
            ),
            CursorLocation::BlockTop(block) => func
                .layout
                .first_inst_of(block)
                .map_or(CursorLocation::BlockBottom(block), CursorLocation::At),
            CursorLocation::BlockBottom(block) => func
                .layout
                .next_block_of(block)
                .map_or(CursorLocation::NoWhere, CursorLocation::BlockTop),
            CursorLocation::NoWhere => CursorLocation::NoWhere,
        }
    }

    fn prev_loc(&self, func: &Function) -> CursorLocation {
        match self.loc() {
            CursorLocation::At(inst) => func.layout.prev_inst_of(inst).map_or_else(
                || CursorLocation::BlockTop(func.layout.inst_block(inst)),
                CursorLocation::At,
            ),
            CursorLocation::BlockTop(block) => func
                .layout
                .prev_block_of(block)
                .map_or(CursorLocation::NoWhere, CursorLocation::BlockBottom),
            CursorLocation::BlockBottom(block) => func
                .layout
                .last_inst_of(block)
                .map_or(CursorLocation::BlockTop(block), CursorLocation::At),
            CursorLocation::NoWhere => CursorLocation::NoWhere,
        }
    }

    fn proceed(&mut self, func: &Function) {
        self.set_location(self.next_loc(func));
    }

    fn back(&mut self, func: &Function) {
        self.set_location(self.prev_loc(func));
    }
}

#[derive(Debug)]
pub struct InstInserter {
    loc: CursorLocation,
}

impl FuncCursor for InstInserter {
    fn at_location(loc: CursorLocation) -> Self {
        Self { loc }
    }

    fn set_location(&mut self, loc: CursorLocation) {
        self.loc = loc;
    }

    fn loc(&self) -> CursorLocation {
        self.loc
    }
}
