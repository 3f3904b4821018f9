use crate::column::{ColumnAppendSnapshot, ColumnDefinition, ColumnStore};
use std::collections::HashMap;
use value::Value;
use vector::ValidityBitmap;

/// DeleteVector tombstones rows within a row-group without physically
/// removing their storage.
#[derive(Debug, Clone, Default)]
pub struct DeleteVector {
    tombstoned: HashMap<usize, ()>,
}

impl DeleteVector {
    pub fn new() -> Self {
        DeleteVector::default()
    }

    pub fn delete(&mut self, row: usize) {
        self.tombstoned.insert(row, ());
    }

    pub fn is_deleted(&self, row: usize) -> bool {
        self.tombstoned.contains_key(&row)
    }

    pub fn count(&self) -> usize {
        self.tombstoned.len()
    }
}

/// UpdateLayer is an in-memory overlay of `row_id → new_value` for one
/// column, applied after a segment read.
#[derive(Debug, Clone, Default)]
pub struct UpdateLayer {
    overlay: HashMap<usize, Option<Value>>,
}

impl UpdateLayer {
    pub fn new() -> Self {
        UpdateLayer::default()
    }

    pub fn set(&mut self, row: usize, value: Option<Value>) {
        self.overlay.insert(row, value);
    }

    pub fn get(&self, row: usize) -> Option<&Option<Value>> {
        self.overlay.get(&row)
    }

    pub fn clear_row(&mut self, row: usize) {
        self.overlay.remove(&row);
    }
}

/// A snapshot of a row-group's append-in-progress state, used by
/// `DataTable::revert_append`.
pub struct RowGroupAppendSnapshot {
    column_snapshots: Vec<ColumnAppendSnapshot>,
    prior_row_count: usize,
}

/// RowGroup is a bounded collection of columns sharing one cardinality.
/// Columns are appended in lock-step; deletes and updates are kept as
/// overlays so `revert_append` only has to roll back appends.
#[derive(Debug, Clone)]
pub struct RowGroup {
    columns: Vec<ColumnStore>,
    row_count: usize,
    deletes: DeleteVector,
    update_layers: Vec<UpdateLayer>,
}

impl RowGroup {
    pub fn new(defs: &[ColumnDefinition]) -> Self {
        RowGroup {
            columns: defs.iter().map(|d| ColumnStore::new(d.ty.clone())).collect(),
            row_count: 0,
            deletes: DeleteVector::new(),
            update_layers: defs.iter().map(|_| UpdateLayer::new()).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_full(&self, capacity: usize) -> bool {
        self.row_count >= capacity
    }

    pub fn initialize_append(&mut self) -> RowGroupAppendSnapshot {
        RowGroupAppendSnapshot {
            column_snapshots: self.columns.iter_mut().map(|c| c.initialize_append()).collect(),
            prior_row_count: self.row_count,
        }
    }

    /// Appends one row per column; `rows[col][r]` is the value for column
    /// `col`, row `r` of this batch. Every column must receive the same
    /// number of rows so the row-group stays rectangular.
    pub fn append(&mut self, rows: &[Vec<Option<Value>>]) {
        debug_assert_eq!(rows.len(), self.columns.len());
        let added = rows.first().map(|r| r.len()).unwrap_or(0);
        for (col, values) in self.columns.iter_mut().zip(rows.iter()) {
            col.append(values);
        }
        self.row_count += added;
    }

    pub fn finalize_append(&mut self) {
        for col in &mut self.columns {
            col.finalize_append();
        }
    }

    pub fn revert_append(&mut self, snapshot: RowGroupAppendSnapshot) {
        for (col, snap) in self.columns.iter_mut().zip(snapshot.column_snapshots.into_iter()) {
            col.revert_append(snap);
        }
        self.row_count = snapshot.prior_row_count;
    }

    /// Adds a new column backfilled with `default` across every existing
    /// row — the schema-evolution copy-on-extend step.
    pub fn add_column(&mut self, def: &ColumnDefinition) {
        self.columns.push(ColumnStore::backfill(&def.ty, &def.default_value, self.row_count));
        self.update_layers.push(UpdateLayer::new());
    }

    pub fn get(&self, col: usize, row: usize) -> Option<Value> {
        if let Some(overlay) = self.update_layers[col].get(row) {
            return overlay.clone();
        }
        self.columns[col].get(row).cloned()
    }

    pub fn set_committed(&mut self, col: usize, row: usize, value: Option<Value>) {
        self.columns[col].set(row, value);
    }

    /// Update writes into the in-memory overlay; it never touches the
    /// sealed segment directly.
    pub fn update(&mut self, col: usize, row: usize, value: Option<Value>) {
        self.update_layers[col].set(row, value);
    }

    pub fn delete(&mut self, row: usize) {
        self.deletes.delete(row);
    }

    pub fn is_deleted(&self, row: usize) -> bool {
        self.deletes.is_deleted(row)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.count()
    }

    pub fn validity_for(&self, col: usize) -> ValidityBitmap {
        let mut bitmap = ValidityBitmap::new_all_valid(self.row_count);
        for row in 0..self.row_count {
            bitmap.set_valid(row, self.get(col, row).is_some());
        }
        bitmap
    }
}
