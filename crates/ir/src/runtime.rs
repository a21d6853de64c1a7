//! Runtime entry points that instrumented code calls into.

/// Symbol of the runtime function that raises the overflow fault.
///
/// It takes no arguments, returns nothing and never returns normally: the
/// runtime faults with [`OVERFLOW_MESSAGE`].
pub const PANIC_OVERFLOW: &str = "runtime.panicoverflow";

/// The message the overflow fault carries.
pub const OVERFLOW_MESSAGE: &str = "integer overflow";
