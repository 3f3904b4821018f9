use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use expr::CompareNode;
use std::cell::RefCell;
use std::rc::Rc;
use storage::ScanState;
use value::ComplexLogicalType;
use vector::DataChunk;

/// Delete scans the backing table batch by batch, tombstoning every row
/// that satisfies `predicate`. Produces no rows downstream; `deleted_count`
/// reports how many rows it tombstoned.
pub struct Delete {
    table: Rc<RefCell<storage::DataTable>>,
    predicate: CompareNode,
    column_ids: Vec<usize>,
    types: Vec<ComplexLogicalType>,
    scan_state: Option<ScanState>,
    deleted: usize,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl Delete {
    pub fn new(table: Rc<RefCell<storage::DataTable>>, predicate: CompareNode, column_ids: Vec<usize>) -> Self {
        let types = {
            let t = table.borrow();
            let all = t.types();
            column_ids.iter().map(|&i| all[i].clone()).collect()
        };
        Delete {
            table,
            predicate,
            column_ids,
            types,
            scan_state: None,
            deleted: 0,
            state: OperatorState::Created,
            output: None,
        }
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted
    }
}

impl Operator for Delete {
    fn on_execute(&mut self, ctx: &mut PipelineContext) -> Result<OperatorState> {
        let mut table = self.table.borrow_mut();
        let state = self.scan_state.get_or_insert_with(|| table.initialize_scan(self.column_ids.clone()));
        let mut chunk = DataChunk::with_default_capacity(&self.types);
        let mut ids = Vec::new();
        let filled = table.scan_with_row_ids(&mut chunk, &mut ids, state);

        for (row, &global_row) in ids.iter().enumerate() {
            if self.predicate.check_chunk(&chunk, &chunk, row, row, &ctx.params)? {
                table.delete(global_row)?;
                self.deleted += 1;
            }
        }

        self.output = Some(OperatorOutput::Chunk(DataChunk::new(&[], 0)));
        self.state = if filled == 0 { OperatorState::Executed } else { OperatorState::Running };
        if self.state == OperatorState::Executed {
            tracing::info!(deleted = self.deleted, "delete operator finished");
        }
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
