//! The vectorized data-flow layer: validity bitmaps, the `Vector` column
//! buffer (flat/constant/dictionary/sequence), and the `DataChunk` that
//! carries aligned columns between operators.

mod bitmap;
mod chunk;
mod error;
mod selection;
mod vector;

pub use bitmap::ValidityBitmap;
pub use chunk::{DataChunk, DEFAULT_VECTOR_CAPACITY};
pub use error::{Error, Result};
pub use selection::SelectionVector;
pub use vector::{UnifiedVectorFormat, Vector, VectorType};
