/// Error is the dynamic schema layer's failure taxonomy: limits hit while
/// walking a document's trie, a type conflict observed while evolving the
/// table, plus passthroughs from the layers this crate sits on top of.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} at {path}")]
    SchemaLimitExceeded { kind: &'static str, path: String },

    #[error("type conflict at {path}: existing {existing:?}, inferred {inferred:?}")]
    TypeConflict {
        path: String,
        existing: value::TypeFamily,
        inferred: value::TypeFamily,
    },

    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error(transparent)]
    Vector(#[from] vector::Error),

    #[error(transparent)]
    Value(#[from] value::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
