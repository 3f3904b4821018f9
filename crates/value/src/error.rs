use crate::LogicalType;

/// Error is the failure taxonomy of the value model: type mismatches in
/// arithmetic/comparison, and the value-serialization failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("type mismatch: cannot apply operation to {left:?} and {right:?}")]
    TypeMismatch {
        left: LogicalType,
        right: LogicalType,
    },

    #[error("value of type {0:?} cannot be ordered")]
    Unorderable(LogicalType),

    #[error("integer division by zero")]
    DivisionByZero,

    #[error("POINTER values are not serializable")]
    Unserializable,

    #[error("truncated value payload: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("unknown type tag {0}")]
    UnknownTypeTag(u8),

    #[error("decimal width {width} must be >= scale {scale}")]
    InvalidDecimal { width: u8, scale: u8 },

    #[error("cannot cast {from:?} to {to:?}")]
    InvalidCast { from: LogicalType, to: LogicalType },
}

pub type Result<T> = std::result::Result<T, Error>;
