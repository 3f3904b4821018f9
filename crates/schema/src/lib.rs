//! The dynamic schema layer: path extraction over a document's trie,
//! SQL-safe column-name encoding, and the `TableStorage` that evolves a
//! columnar table's schema one batch at a time.

mod error;
mod extract;
mod table;

pub use error::{Error, Result};
pub use extract::{decode_column_name, extract_paths, join_array, join_path, ExtractConfig, ExtractedPath};
pub use table::{ColumnInfo, TableStorage};
