/// Error is the columnar storage layer's failure taxonomy. Callers that
/// observe an append failure are responsible for calling `revert_append`
/// to roll back any partially-written row-group.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("column {0} does not exist")]
    NoSuchColumn(usize),

    #[error("row id {0} is out of range")]
    RowOutOfRange(u64),

    #[error("append chunk cardinality {chunk} does not match expected column count {columns}")]
    ColumnCountMismatch { chunk: usize, columns: usize },

    #[error("storage append failed: {0}")]
    AppendFailed(String),

    #[error(transparent)]
    Vector(#[from] vector::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
