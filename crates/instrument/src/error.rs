use ir::{InstId, Type};
use thiserror::Error;

/// Errors surfaced by the overflow guard to the caller's diagnostic path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    /// An arithmetic instruction is outside the domain the pass understands.
    /// This is a defect of the stage that produced the IR.
    #[error("malformed arithmetic `{inst}` in `%{func}`: {reason}")]
    Malformed {
        func: String,
        inst: InstId,
        #[source]
        reason: MalformedInst,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedInst {
    #[error("operand types disagree: `{lhs}` and `{rhs}`")]
    OperandTypeMismatch { lhs: Type, rhs: Type },

    #[error("result type `{result}` differs from operand type `{operand}`")]
    ResultTypeMismatch { operand: Type, result: Type },

    #[error("operand type `{0}` is not an integer")]
    NonIntegerOperand(Type),
}

/// Errors in the exemption configuration surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("empty exemption pattern")]
    EmptyPattern,

    #[error("invalid exemption pattern `{pattern}`: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },
}
