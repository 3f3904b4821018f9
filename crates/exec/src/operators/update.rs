use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use expr::{CompareNode, UpdateNode};
use std::cell::RefCell;
use std::rc::Rc;
use storage::ScanState;
use value::ComplexLogicalType;
use vector::DataChunk;

/// Update scans the backing table batch by batch; for every row that
/// satisfies `predicate` (or every row, if there is none), it runs each of
/// `assignments` against a one-row snapshot of that row and writes the
/// results back through `DataTable::update`'s overlay.
pub struct Update {
    table: Rc<RefCell<storage::DataTable>>,
    predicate: Option<CompareNode>,
    assignments: Vec<UpdateNode>,
    column_ids: Vec<usize>,
    types: Vec<ComplexLogicalType>,
    scan_state: Option<ScanState>,
    updated: usize,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl Update {
    pub fn new(
        table: Rc<RefCell<storage::DataTable>>,
        predicate: Option<CompareNode>,
        assignments: Vec<UpdateNode>,
        column_ids: Vec<usize>,
    ) -> Self {
        let types = {
            let t = table.borrow();
            let all = t.types();
            column_ids.iter().map(|&i| all[i].clone()).collect()
        };
        Update {
            table,
            predicate,
            assignments,
            column_ids,
            types,
            scan_state: None,
            updated: 0,
            state: OperatorState::Created,
            output: None,
        }
    }

    pub fn updated_count(&self) -> usize {
        self.updated
    }
}

impl Operator for Update {
    fn on_execute(&mut self, ctx: &mut PipelineContext) -> Result<OperatorState> {
        let mut table = self.table.borrow_mut();
        let state = self.scan_state.get_or_insert_with(|| table.initialize_scan(self.column_ids.clone()));
        let mut chunk = DataChunk::with_default_capacity(&self.types);
        let mut ids = Vec::new();
        let filled = table.scan_with_row_ids(&mut chunk, &mut ids, state);

        for (row, &global_row) in ids.iter().enumerate() {
            let matches = match &mut self.predicate {
                Some(p) => p.check_chunk(&chunk, &chunk, row, row, &ctx.params)?,
                None => true,
            };
            if !matches {
                continue;
            }

            let mut original_row = DataChunk::new(&self.types, 1);
            original_row.set_cardinality(1);
            for col in 0..self.types.len() {
                original_row.set_value(col, 0, chunk.value(col, row));
            }

            for assignment in &mut self.assignments {
                assignment.execute_chunk(&mut chunk, &original_row, row, 0, &ctx.params)?;
            }

            for (out_col, &src_col) in self.column_ids.iter().enumerate() {
                table.update(global_row, src_col, Some(chunk.value(out_col, row)))?;
            }
            self.updated += 1;
        }

        self.output = Some(OperatorOutput::Chunk(DataChunk::new(&[], 0)));
        self.state = if filled == 0 { OperatorState::Executed } else { OperatorState::Running };
        if self.state == OperatorState::Executed {
            tracing::info!(updated = self.updated, "update operator finished");
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

#[cfg(test)]
mod tests {
    use super::*;
    use expr::{CalcOp, CompareOp, Operand, ParamStorage, Side, UpdateExprKind};
    use storage::ColumnDefinition;
    use value::{LogicalType, Value};

    fn seeded_table() -> Rc<RefCell<storage::DataTable>> {
        let mut table = storage::DataTable::new(vec![
            ColumnDefinition::new("rating", ComplexLogicalType::new(LogicalType::Bigint)),
            ColumnDefinition::new("flag", ComplexLogicalType::new(LogicalType::Boolean)),
        ]);
        let mut state = table.initialize_append();
        let mut chunk = DataChunk::new(
            &[
                ComplexLogicalType::new(LogicalType::Bigint),
                ComplexLogicalType::new(LogicalType::Boolean),
            ],
            2,
        );
        chunk.set_cardinality(2);
        chunk.set_value(0, 0, Value::from_i64(5));
        chunk.set_value(1, 0, Value::from_bool(true));
        chunk.set_value(0, 1, Value::from_i64(3));
        chunk.set_value(1, 1, Value::from_bool(false));
        table.append(&mut state, &chunk).unwrap();
        table.finalize_append(state);
        Rc::new(RefCell::new(table))
    }

    #[test]
    fn update_rating_plus_two_where_flag_is_true() {
        let table = seeded_table();
        let predicate = CompareNode::leaf(CompareOp::Eq, "flag", Operand::Param(0));
        let assignment = UpdateNode::with_children(
            UpdateExprKind::Set { key: "rating".into() },
            UpdateNode::with_children(
                UpdateExprKind::Calc { op: CalcOp::Sum },
                UpdateNode::leaf(UpdateExprKind::GetDocField { key: "rating".into(), side: Side::Undefined }),
                Some(UpdateNode::leaf(UpdateExprKind::GetParam { id: 1 })),
            ),
            None,
        );
        let mut update = Update::new(table.clone(), Some(predicate), vec![assignment], vec![0, 1]);
        let mut ctx = PipelineContext::new(1, ParamStorage::new(vec![Value::from_bool(true), Value::from_i64(2)]));

        loop {
            if update.on_execute(&mut ctx).unwrap() == OperatorState::Executed {
                break;
            }
        }
        assert_eq!(update.updated_count(), 1);
        assert_eq!(table.borrow().get(0, 0).unwrap().unwrap().as_i64(), Some(7));
        assert_eq!(table.borrow().get(1, 0).unwrap().unwrap().as_i64(), Some(3));
    }
}
