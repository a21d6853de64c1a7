//! Executes IR modules.
//!
//! The interpreter stands in for the backend and the runtime: it runs a
//! function to completion and reports faults the way a compiled program
//! would terminate.
mod fault;
mod frame;
mod machine;

pub use fault::Fault;
pub use ir::interpret::EvalValue;
pub use machine::{ExternalFn, Machine};
