use crate::column::ColumnDefinition;
use crate::error::{Error, Result};
use crate::row_group::{RowGroup, RowGroupAppendSnapshot};
use value::{ComplexLogicalType, Value};
use vector::DataChunk;

/// Row-groups cap out at this many committed rows before a fresh one opens.
pub const ROW_GROUP_CAPACITY: usize = vector::DEFAULT_VECTOR_CAPACITY * 8;

/// DataTable is the ordered list of column definitions plus the ordered
/// list of row-groups. Schema evolution produces a *new* table that
/// shares the parent's row-groups by extending each with a backfilled
/// column — the parent is consumed.
#[derive(Debug, Clone)]
pub struct DataTable {
    columns: Vec<ColumnDefinition>,
    row_groups: Vec<RowGroup>,
}

impl DataTable {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        DataTable {
            columns,
            row_groups: Vec::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn types(&self) -> Vec<ComplexLogicalType> {
        self.columns.iter().map(|c| c.ty.clone().with_alias(c.name.clone())).collect()
    }

    /// Total physical row count across every row-group, equal to the sum
    /// of each row-group's committed row count.
    pub fn row_count(&self) -> usize {
        self.row_groups.iter().map(|g| g.row_count()).sum()
    }

    /// Row count excluding tombstoned rows — what a SELECT actually sees.
    pub fn live_row_count(&self) -> usize {
        self.row_groups.iter().map(|g| g.row_count() - g.delete_count()).sum()
    }

    pub fn row_group_count(&self) -> usize {
        self.row_groups.len()
    }

    /// Consumes `self` and produces a new table with `new_columns` appended
    /// and every existing row-group backfilled with each column's default
    /// value — one evolution pass per batch, per the amortization note in
    /// the schema-extension design (rather than one new table per column).
    pub fn evolve(mut self, new_columns: &[ColumnDefinition]) -> DataTable {
        if new_columns.is_empty() {
            return self;
        }
        for def in new_columns {
            for group in &mut self.row_groups {
                group.add_column(def);
            }
        }
        self.columns.extend(new_columns.iter().cloned());
        self
    }

    pub fn initialize_append(&mut self) -> TableAppendState {
        TableAppendState {
            touched: Vec::new(),
        }
    }

    /// Appends `chunk`'s rows, opening new row-groups as existing ones
    /// fill. Column values are read positionally — `chunk`'s column order
    /// must match `self.columns`.
    pub fn append(&mut self, state: &mut TableAppendState, chunk: &DataChunk) -> Result<()> {
        if chunk.column_count() != self.columns.len() {
            return Err(Error::ColumnCountMismatch {
                chunk: chunk.column_count(),
                columns: self.columns.len(),
            });
        }
        let mut row = 0;
        let total = chunk.cardinality();
        while row < total {
            let (group_idx, existed_before) = self.current_append_group();
            let group = &mut self.row_groups[group_idx];
            let space = ROW_GROUP_CAPACITY - group.row_count();
            let take = space.min(total - row);
            if !state.touched.iter().any(|t| t.group_idx == group_idx) {
                let snapshot = group.initialize_append();
                state.touched.push(TouchedGroup {
                    group_idx,
                    existed_before,
                    snapshot: Some(snapshot),
                });
            }
            let mut rows: Vec<Vec<Option<Value>>> = Vec::with_capacity(self.columns.len());
            for col in 0..self.columns.len() {
                let mut values = Vec::with_capacity(take);
                for r in row..row + take {
                    let v = chunk.value(col, r);
                    values.push(if v.is_null() { None } else { Some(v) });
                }
                rows.push(values);
            }
            group.append(&rows);
            row += take;
        }
        Ok(())
    }

    fn current_append_group(&mut self) -> (usize, bool) {
        if let Some(last) = self.row_groups.last() {
            if !last.is_full(ROW_GROUP_CAPACITY) {
                return (self.row_groups.len() - 1, true);
            }
        }
        self.row_groups.push(RowGroup::new(&self.columns));
        (self.row_groups.len() - 1, false)
    }

    pub fn finalize_append(&mut self, state: TableAppendState) {
        for touched in state.touched {
            self.row_groups[touched.group_idx].finalize_append();
        }
    }

    /// Rolls back every row-group touched by this append, dropping
    /// row-groups that this append created from scratch.
    pub fn revert_append(&mut self, mut state: TableAppendState) {
        tracing::warn!(touched_groups = state.touched.len(), "reverting append");
        state.touched.sort_by_key(|t| t.group_idx);
        for touched in state.touched.into_iter().rev() {
            if touched.existed_before {
                if let Some(snapshot) = touched.snapshot {
                    self.row_groups[touched.group_idx].revert_append(snapshot);
                }
            } else {
                self.row_groups.remove(touched.group_idx);
            }
        }
    }

    pub fn initialize_scan(&self, column_ids: Vec<usize>) -> ScanState {
        ScanState {
            column_ids,
            group_idx: 0,
            row_in_group: 0,
        }
    }

    pub fn initialize_scan_with_offset(&self, column_ids: Vec<usize>, row_idx: usize) -> ScanState {
        let mut remaining = row_idx;
        for (i, group) in self.row_groups.iter().enumerate() {
            if remaining < group.row_count() {
                return ScanState {
                    column_ids,
                    group_idx: i,
                    row_in_group: remaining,
                };
            }
            remaining -= group.row_count();
        }
        ScanState {
            column_ids,
            group_idx: self.row_groups.len(),
            row_in_group: 0,
        }
    }

    /// Fills `chunk` with up to its capacity of rows, projecting only
    /// `state.column_ids` and skipping tombstoned rows. Returns the number
    /// of rows filled; `0` means the scan is exhausted.
    pub fn scan(&self, chunk: &mut DataChunk, state: &mut ScanState) -> usize {
        chunk.reset();
        let capacity = chunk.capacity();
        let mut filled = 0;
        while filled < capacity && state.group_idx < self.row_groups.len() {
            let group = &self.row_groups[state.group_idx];
            if state.row_in_group >= group.row_count() {
                state.group_idx += 1;
                state.row_in_group = 0;
                continue;
            }
            if group.is_deleted(state.row_in_group) {
                state.row_in_group += 1;
                continue;
            }
            for (out_col, &src_col) in state.column_ids.iter().enumerate() {
                let v = group.get(src_col, state.row_in_group).unwrap_or_else(Value::null);
                chunk.set_value(out_col, filled, v);
            }
            filled += 1;
            state.row_in_group += 1;
        }
        chunk.set_cardinality(filled);
        filled
    }

    /// Like `scan`, but also records each filled row's global row index in
    /// `ids` — the piece `UPDATE`/`DELETE` need to turn a matched chunk row
    /// back into the `update`/`delete` call that addresses it.
    pub fn scan_with_row_ids(&self, chunk: &mut DataChunk, ids: &mut Vec<usize>, state: &mut ScanState) -> usize {
        chunk.reset();
        ids.clear();
        let capacity = chunk.capacity();
        let mut filled = 0;
        while filled < capacity && state.group_idx < self.row_groups.len() {
            let group = &self.row_groups[state.group_idx];
            if state.row_in_group >= group.row_count() {
                state.group_idx += 1;
                state.row_in_group = 0;
                continue;
            }
            if group.is_deleted(state.row_in_group) {
                state.row_in_group += 1;
                continue;
            }
            let global_row = self.row_groups[..state.group_idx].iter().map(|g| g.row_count()).sum::<usize>()
                + state.row_in_group;
            for (out_col, &src_col) in state.column_ids.iter().enumerate() {
                let v = group.get(src_col, state.row_in_group).unwrap_or_else(Value::null);
                chunk.set_value(out_col, filled, v);
            }
            ids.push(global_row);
            filled += 1;
            state.row_in_group += 1;
        }
        chunk.set_cardinality(filled);
        filled
    }

    pub fn update(&mut self, global_row: usize, col: usize, value: Option<Value>) -> Result<()> {
        let (group_idx, local_row) = self.locate(global_row)?;
        self.row_groups[group_idx].update(col, local_row, value);
        Ok(())
    }

    pub fn delete(&mut self, global_row: usize) -> Result<()> {
        let (group_idx, local_row) = self.locate(global_row)?;
        self.row_groups[group_idx].delete(local_row);
        Ok(())
    }

    pub fn get(&self, global_row: usize, col: usize) -> Result<Option<Value>> {
        let (group_idx, local_row) = self.locate(global_row)?;
        Ok(self.row_groups[group_idx].get(col, local_row))
    }

    fn locate(&self, global_row: usize) -> Result<(usize, usize)> {
        let mut remaining = global_row;
        for (i, group) in self.row_groups.iter().enumerate() {
            if remaining < group.row_count() {
                return Ok((i, remaining));
            }
            remaining -= group.row_count();
        }
        Err(Error::RowOutOfRange(global_row as u64))
    }
}

struct TouchedGroup {
    group_idx: usize,
    existed_before: bool,
    snapshot: Option<RowGroupAppendSnapshot>,
}

/// TableAppendState accumulates the per-row-group snapshots needed to
/// finalize or revert one `append` call.
pub struct TableAppendState {
    touched: Vec<TouchedGroup>,
}

/// ScanState tracks per-scan position: which row-group/row we're at and
/// which columns are projected.
pub struct ScanState {
    column_ids: Vec<usize>,
    group_idx: usize,
    row_in_group: usize,
}

#[cfg(test)]
mod test {
    use super::*;
    use value::LogicalType;

    fn int_col(name: &str) -> ColumnDefinition {
        ColumnDefinition::new(name, ComplexLogicalType::new(LogicalType::Integer))
    }

    fn chunk_of(values: &[i32]) -> DataChunk {
        let mut chunk = DataChunk::new(&[ComplexLogicalType::new(LogicalType::Integer)], values.len().max(1));
        chunk.set_cardinality(values.len());
        for (i, v) in values.iter().enumerate() {
            chunk.set_value(0, i, Value::from_i32(*v));
        }
        chunk
    }

    #[test]
    fn append_then_scan_roundtrips() {
        let mut table = DataTable::new(vec![int_col("x")]);
        let mut state = table.initialize_append();
        table.append(&mut state, &chunk_of(&[1, 2, 3])).unwrap();
        table.finalize_append(state);
        assert_eq!(table.row_count(), 3);

        let mut scan_state = table.initialize_scan(vec![0]);
        let mut out = DataChunk::new(&[ComplexLogicalType::new(LogicalType::Integer)], 16);
        let n = table.scan(&mut out, &mut scan_state);
        assert_eq!(n, 3);
        assert_eq!(out.value(0, 0).as_i64(), Some(1));
        assert_eq!(out.value(0, 2).as_i64(), Some(3));
    }

    #[test]
    fn revert_append_drops_new_rows() {
        let mut table = DataTable::new(vec![int_col("x")]);
        let mut state = table.initialize_append();
        table.append(&mut state, &chunk_of(&[1, 2])).unwrap();
        table.revert_append(state);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn evolve_backfills_existing_rows() {
        let mut table = DataTable::new(vec![int_col("x")]);
        let mut state = table.initialize_append();
        table.append(&mut state, &chunk_of(&[1, 2])).unwrap();
        table.finalize_append(state);

        let new_col = ColumnDefinition::with_default(
            "y",
            ComplexLogicalType::new(LogicalType::Integer),
            Value::from_i32(0),
        );
        let table = table.evolve(&[new_col]);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.get(0, 1).unwrap().unwrap().as_i64(), Some(0));
        assert_eq!(table.get(1, 1).unwrap().unwrap().as_i64(), Some(0));
    }

    #[test]
    fn delete_tombstones_without_shrinking_row_count() {
        let mut table = DataTable::new(vec![int_col("x")]);
        let mut state = table.initialize_append();
        table.append(&mut state, &chunk_of(&[1, 2, 3])).unwrap();
        table.finalize_append(state);

        table.delete(1).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.live_row_count(), 2);
    }

    #[test]
    fn update_is_visible_through_overlay() {
        let mut table = DataTable::new(vec![int_col("x")]);
        let mut state = table.initialize_append();
        table.append(&mut state, &chunk_of(&[1, 2])).unwrap();
        table.finalize_append(state);

        table.update(0, 0, Some(Value::from_i32(99))).unwrap();
        assert_eq!(table.get(0, 0).unwrap().unwrap().as_i64(), Some(99));
    }

    #[test]
    fn scan_with_row_ids_skips_tombstones_but_keeps_global_indices() {
        let mut table = DataTable::new(vec![int_col("x")]);
        let mut state = table.initialize_append();
        table.append(&mut state, &chunk_of(&[1, 2, 3])).unwrap();
        table.finalize_append(state);
        table.delete(1).unwrap();

        let mut scan_state = table.initialize_scan(vec![0]);
        let mut out = DataChunk::new(&[ComplexLogicalType::new(LogicalType::Integer)], 16);
        let mut ids = Vec::new();
        let n = table.scan_with_row_ids(&mut out, &mut ids, &mut scan_state);
        assert_eq!(n, 2);
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(out.value(0, 0).as_i64(), Some(1));
        assert_eq!(out.value(0, 1).as_i64(), Some(3));
    }

    #[test]
    fn spans_multiple_row_groups_when_capacity_exceeded() {
        let mut table = DataTable::new(vec![int_col("x")]);
        let big: Vec<i32> = (0..(ROW_GROUP_CAPACITY as i32 + 5)).collect();
        let mut state = table.initialize_append();
        table.append(&mut state, &chunk_of(&big)).unwrap();
        table.finalize_append(state);
        assert_eq!(table.row_group_count(), 2);
        assert_eq!(table.row_count(), big.len());
    }
}
