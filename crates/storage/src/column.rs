use value::{ComplexLogicalType, Value};

/// A row-group's column segments are bounded runs of rows; a new segment
/// opens once the current one fills, so a single column never needs one
/// contiguous reallocation for its whole lifetime.
pub const SEGMENT_CAPACITY: usize = vector::DEFAULT_VECTOR_CAPACITY;

/// ColumnDefinition is the static part of a column: its name (alias), its
/// logical type, and the default value used to backfill it on schema
/// evolution.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub name: String,
    pub ty: ComplexLogicalType,
    pub default_value: Value,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, ty: ComplexLogicalType) -> Self {
        let name = name.into();
        let default_value = Value::default_for(&ty);
        ColumnDefinition { name, ty, default_value }
    }

    pub fn with_default(name: impl Into<String>, ty: ComplexLogicalType, default_value: Value) -> Self {
        ColumnDefinition {
            name: name.into(),
            ty,
            default_value,
        }
    }
}

/// ColumnState is the append-lifecycle state machine:
/// `INITIAL → APPENDING → SEALED`, with `revert_append` rolling back to a
/// snapshot captured when appending began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
    Initial,
    Appending,
    Sealed,
}

/// A snapshot of a column's length, captured by `initialize_append` and
/// consumed by `revert_append` on failure.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAppendSnapshot {
    row_count: usize,
}

/// ColumnStore is one column's data within a single row-group: a sequence
/// of bounded, immutable-once-sealed segments plus a parallel validity
/// bitmap per segment.
#[derive(Debug, Clone)]
pub struct ColumnStore {
    ty: ComplexLogicalType,
    segments: Vec<Vec<Option<Value>>>,
    state: ColumnState,
}

impl ColumnStore {
    pub fn new(ty: ComplexLogicalType) -> Self {
        ColumnStore {
            ty,
            segments: Vec::new(),
            state: ColumnState::Initial,
        }
    }

    pub fn type_(&self) -> &ComplexLogicalType {
        &self.ty
    }

    pub fn row_count(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    pub fn initialize_append(&mut self) -> ColumnAppendSnapshot {
        self.state = ColumnState::Appending;
        ColumnAppendSnapshot {
            row_count: self.row_count(),
        }
    }

    /// Appends `values` (each `None` is a null), spilling into fresh
    /// segments once the current one reaches `SEGMENT_CAPACITY`.
    pub fn append(&mut self, values: &[Option<Value>]) {
        let mut remaining = values;
        loop {
            if remaining.is_empty() {
                break;
            }
            if self.segments.last().map(|s| s.len()).unwrap_or(usize::MAX) >= SEGMENT_CAPACITY {
                self.segments.push(Vec::with_capacity(SEGMENT_CAPACITY));
            }
            let seg = self.segments.last_mut().unwrap();
            let space = SEGMENT_CAPACITY - seg.len();
            let take = space.min(remaining.len());
            seg.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
        }
    }

    pub fn finalize_append(&mut self) {
        self.state = ColumnState::Sealed;
    }

    /// Truncates segments back to the row count captured by
    /// `initialize_append`, dropping any segments emptied in the process.
    pub fn revert_append(&mut self, snapshot: ColumnAppendSnapshot) {
        let mut to_drop = self.row_count().saturating_sub(snapshot.row_count);
        while to_drop > 0 {
            let Some(seg) = self.segments.last_mut() else { break };
            if seg.len() <= to_drop {
                to_drop -= seg.len();
                self.segments.pop();
            } else {
                let new_len = seg.len() - to_drop;
                seg.truncate(new_len);
                to_drop = 0;
            }
        }
        self.state = ColumnState::Sealed;
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        let mut remaining = row;
        for seg in &self.segments {
            if remaining < seg.len() {
                return seg[remaining].as_ref();
            }
            remaining -= seg.len();
        }
        None
    }

    pub fn set(&mut self, row: usize, value: Option<Value>) {
        let mut remaining = row;
        for seg in &mut self.segments {
            if remaining < seg.len() {
                seg[remaining] = value;
                return;
            }
            remaining -= seg.len();
        }
    }

    pub fn state(&self) -> ColumnState {
        self.state
    }

    /// Backfills `count` rows with `default`, used when a row-group that
    /// predates a schema evolution gains the new column.
    pub fn backfill(ty: &ComplexLogicalType, default: &Value, count: usize) -> ColumnStore {
        let mut store = ColumnStore::new(ty.clone());
        let fill = if default.is_null() { None } else { Some(default.clone()) };
        store.append(&vec![fill; count]);
        store.finalize_append();
        store
    }
}
