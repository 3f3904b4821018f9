use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use std::cell::RefCell;
use std::rc::Rc;
use storage::ScanState;
use value::ComplexLogicalType;
use vector::DataChunk;

/// FullScan is the projection-aware leaf scan over a `DataTable`: it reads
/// only `column_ids`, skips tombstoned rows, and streams one
/// default-capacity chunk per call until the table is exhausted.
pub struct FullScan {
    table: Rc<RefCell<storage::DataTable>>,
    column_ids: Vec<usize>,
    types: Vec<ComplexLogicalType>,
    scan_state: Option<ScanState>,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl FullScan {
    pub fn new(table: Rc<RefCell<storage::DataTable>>, column_ids: Vec<usize>) -> Self {
        let types = {
            let t = table.borrow();
            let all = t.types();
            column_ids.iter().map(|&i| all[i].clone()).collect()
        };
        FullScan { table, column_ids, types, scan_state: None, state: OperatorState::Created, output: None }
    }
}

impl Operator for FullScan {
    fn on_execute(&mut self, _ctx: &mut PipelineContext) -> Result<OperatorState> {
        let table = self.table.borrow();
        let state = self.scan_state.get_or_insert_with(|| table.initialize_scan(self.column_ids.clone()));
        let mut chunk = DataChunk::with_default_capacity(&self.types);
        let filled = table.scan(&mut chunk, state);
        self.output = Some(OperatorOutput::Chunk(chunk));
        self.state = if filled == 0 { OperatorState::Executed } else { OperatorState::Running };
        Ok(self.state)
    }

    fn state(&self) -> OperatorState {
        self.state
    }

    fn output(&self) -> Option<&OperatorOutput> {
        self.output.as_ref()
    }

    fn take_output(&mut self) -> Option<OperatorOutput> {
        self.output.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expr::ParamStorage;
    use storage::ColumnDefinition;
    use value::{LogicalType, Value};

    fn seeded_table() -> Rc<RefCell<storage::DataTable>> {
        let mut table =
            storage::DataTable::new(vec![ColumnDefinition::new("n", ComplexLogicalType::new(LogicalType::Integer))]);
        let mut state = table.initialize_append();
        let mut chunk = DataChunk::new(&[ComplexLogicalType::new(LogicalType::Integer)], 3);
        chunk.set_cardinality(3);
        chunk.set_value(0, 0, Value::from_i32(1));
        chunk.set_value(0, 1, Value::from_i32(2));
        chunk.set_value(0, 2, Value::from_i32(3));
        table.append(&mut state, &chunk).unwrap();
        table.finalize_append(state);
        Rc::new(RefCell::new(table))
    }

    #[test]
    fn scans_every_row_of_the_table() {
        let table = seeded_table();
        let mut op = FullScan::new(table, vec![0]);
        let mut ctx = PipelineContext::new(1, ParamStorage::default());
        let state = op.on_execute(&mut ctx).unwrap();
        assert_eq!(state, OperatorState::Executed);
        let out = op.take_output().unwrap().into_chunk().unwrap();
        assert_eq!(out.cardinality(), 3);
    }
}
