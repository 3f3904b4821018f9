/// Error is the vector/data-chunk layer's failure taxonomy: shape mismatches
/// that the chunk/vector contract forbids (column-count mismatch on append,
/// overflow of a fixed-capacity chunk without a resize) plus a passthrough
/// for the value model's own errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("column counts do not match: {left} vs {right}")]
    ColumnCountMismatch { left: usize, right: usize },

    #[error("cannot append {extra} rows to a chunk of capacity {capacity} without resizing")]
    CapacityExceeded { extra: usize, capacity: usize },

    #[error("index {index} out of bounds for cardinality {cardinality}")]
    OutOfBounds { index: usize, cardinality: usize },

    #[error(transparent)]
    Value(#[from] value::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
