//! Signed integer overflow instrumentation.
//!
//! `add`, `sub`, `mul` and `div` on `i8`, `i16` and `i32` are rewritten so
//! that a result that doesn't fit in the operand width faults with
//! [`OVERFLOW_MESSAGE`] instead of wrapping. Packages listed in an
//! [`ExemptionSet`] are left alone.
pub mod classify;
pub mod config;
pub mod driver;
pub mod error;
pub mod exemption;
pub mod guard;
pub mod predicate;

pub use classify::{classify, qualifies, ArithOp, ArithmeticOperation, IntWidth};
pub use config::GuardConfig;
pub use driver::{FuncStats, ModuleStats, OverflowGuard};
pub use error::{ConfigError, InstrumentError, MalformedInst};
pub use exemption::{ExemptionPattern, ExemptionSet, ExemptionSetBuilder};
pub use guard::{declare_panic_fn, insert_guard, GuardedInst, OVERFLOW_MESSAGE, PANIC_OVERFLOW};
pub use predicate::{MulStrategy, Predicate};
