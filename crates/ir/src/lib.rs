pub mod builder;
pub mod cfg;
pub mod dfg;
pub mod func_cursor;
pub mod function;
pub mod inst;
pub mod interpret;
pub mod ir_writer;
pub mod layout;
pub mod linkage;
pub mod module;
pub mod runtime;
pub mod types;
pub mod value;

pub use cfg::ControlFlowGraph;
pub use dfg::{Block, BlockId, DataFlowGraph, OverflowCheck};
pub use function::{Function, Signature};
pub use inst::{BinaryOp, CastOp, InstData, InstId, UnaryOp};
pub use layout::Layout;
pub use linkage::Linkage;
pub use module::{FuncRef, Module, PackagePath};
pub use types::Type;
pub use value::{Immediate, Value, ValueId};

pub mod prelude {
    pub use crate::{
        builder::{FunctionBuilder, ModuleBuilder},
        func_cursor::{CursorLocation, FuncCursor, InstInserter},
    };
}
