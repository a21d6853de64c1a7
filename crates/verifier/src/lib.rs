//! Structural and type checks for intguard IR.
//!
//! Every module the overflow pass produces is run through [`verify_module`]
//! in the pass's tests.
mod report;
mod verify;

pub use report::{Finding, Report, Rule, Site};
pub use verify::{verify_function, verify_module, VerifierConfig};
