/// Error is the expression layer's failure taxonomy: unbound parameters,
/// fields that can't be written back to a document, a regex that fails to
/// compile, plus passthroughs from the layers this crate sits on top of.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parameter {0} is not bound")]
    UnboundParameter(usize),

    #[error("column {0} not found")]
    NoSuchColumn(String),

    #[error("document location {0} is not writable")]
    UnwritablePath(String),

    #[error("operand is not comparable as a string: {0}")]
    InvalidOperand(String),

    #[error("regex {0:?} failed to compile: {1}")]
    InvalidRegex(String, String),

    #[error(transparent)]
    Value(#[from] value::Error),

    #[error(transparent)]
    Vector(#[from] vector::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
