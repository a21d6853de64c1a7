use crate::predicate::MulStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// How multiplication overflow is detected.
    pub mul_strategy: MulStrategy,

    /// Instruments the function bodies of a module in parallel.
    pub parallel: bool,
}

impl GuardConfig {
    /// Instruments one function at a time. Useful when the caller already
    /// parallelizes over modules.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            mul_strategy: MulStrategy::Widen,
            parallel: true,
        }
    }
}
