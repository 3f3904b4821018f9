//! The columnar storage layer: column segments, row-groups, and the
//! `DataTable` that ties them into an append/scan/update/delete engine
//! with copy-on-evolve schema extension.

mod column;
mod error;
mod row_group;
mod table;

pub use column::{ColumnAppendSnapshot, ColumnDefinition, ColumnState, ColumnStore, SEGMENT_CAPACITY};
pub use error::{Error, Result};
pub use row_group::{DeleteVector, RowGroup, RowGroupAppendSnapshot, UpdateLayer};
pub use table::{DataTable, ScanState, TableAppendState, ROW_GROUP_CAPACITY};

/// CollectionOptions selects how a collection's documents are physically
/// stored: kept as opaque documents, projected onto a dynamic columnar
/// table, or stored purely column-wise with no document fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Documents,
    DocumentTable,
    Columns,
}

#[derive(Debug, Clone)]
pub struct CollectionOptions {
    pub storage: StorageKind,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        CollectionOptions {
            storage: StorageKind::DocumentTable,
        }
    }
}
