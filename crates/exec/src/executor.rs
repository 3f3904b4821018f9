use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use vector::DataChunk;

/// Executor drives a physical plan to completion.
///
/// The original engine keeps an explicit stack of suspended sub-plans so a
/// single native call stack can survive an operator suspending mid-page
/// fault on disk-backed data. Nothing in this crate's scope ever suspends
/// that way — there is no disk/WAL collaborator to wait on — so ordinary
/// recursive pull through the `Operator` tree (each operator calling its
/// children's `on_execute` directly, as `Filter`/`ColumnarGroup`/
/// `OperatorJoin` already do) is the idiomatic choice here, the same one
/// in-memory engines like DataFusion make. `OperatorState::Suspended`
/// stays part of the contract regardless, so a future disk-backed operator
/// could reintroduce real suspension without changing the trait.
pub struct Executor;

impl Executor {
    /// Drives `root` until it reports `Executed` and returns its final
    /// output. Used for statements with a single terminal result: INSERT,
    /// UPDATE, DELETE, and aggregate queries whose root operator already
    /// materializes everything before returning.
    pub fn execute(root: &mut dyn Operator, ctx: &mut PipelineContext) -> Result<OperatorOutput> {
        tracing::info!("pipeline step starting");
        loop {
            let state = root.on_execute(ctx)?;
            if state == OperatorState::Executed {
                tracing::info!("pipeline step finished");
                return Ok(root.take_output().unwrap_or(OperatorOutput::Chunk(DataChunk::new(&[], 0))));
            }
        }
    }

    /// Drives `root` until it reports `Executed`, accumulating every
    /// intermediate chunk it hands back along the way. Used for plain
    /// streaming SELECTs, where a leaf scan like `FullScan` returns one
    /// capacity-sized chunk per call rather than materializing the whole
    /// table at once.
    pub fn execute_collecting(root: &mut dyn Operator, ctx: &mut PipelineContext) -> Result<OperatorOutput> {
        tracing::info!("pipeline step starting (collecting)");
        let mut combined: Option<DataChunk> = None;
        loop {
            let state = root.on_execute(ctx)?;
            match root.take_output() {
                Some(OperatorOutput::Documents(docs)) => return Ok(OperatorOutput::Documents(docs)),
                Some(OperatorOutput::Chunk(chunk)) if chunk.cardinality() > 0 => {
                    combined = Some(match combined.take() {
                        None => chunk,
                        Some(mut acc) => {
                            acc.append(&chunk, true)?;
                            acc
                        }
                    });
                }
                _ => {}
            }
            if state == OperatorState::Executed {
                tracing::info!("pipeline step finished (collecting)");
                return Ok(OperatorOutput::Chunk(combined.unwrap_or_else(|| DataChunk::new(&[], 0))));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::{Aggregation, Filter, FullScan, RawData};
    use expr::{AggregateExpr, AggregateKind, CompareOp, Operand, ParamStorage};
    use std::cell::RefCell;
    use std::rc::Rc;
    use storage::ColumnDefinition;
    use value::{ComplexLogicalType, LogicalType, Value};
    use vector::DataChunk;

    fn seeded_table() -> Rc<RefCell<storage::DataTable>> {
        let mut table = storage::DataTable::new(vec![ColumnDefinition::new(
            "rating",
            ComplexLogicalType::new(LogicalType::Bigint),
        )]);
        let mut state = table.initialize_append();
        let mut chunk = DataChunk::new(&[ComplexLogicalType::new(LogicalType::Bigint)], 3);
        chunk.set_cardinality(3);
        chunk.set_value(0, 0, Value::from_i64(1));
        chunk.set_value(0, 1, Value::from_i64(5));
        chunk.set_value(0, 2, Value::from_i64(9));
        table.append(&mut state, &chunk).unwrap();
        table.finalize_append(state);
        Rc::new(RefCell::new(table))
    }

    #[test]
    fn runs_scan_filter_aggregate_pipeline_end_to_end() {
        let table = seeded_table();
        let scan = Box::new(FullScan::new(table, vec![0]));
        let predicate = expr::CompareNode::leaf(CompareOp::Gte, "rating", Operand::Param(0));
        let filter = Box::new(Filter::new(scan, predicate));
        let aggregates = vec![AggregateExpr::new(AggregateKind::CountStar, None, "n")];
        let mut aggregation = Aggregation::new(filter, aggregates);
        let mut ctx = PipelineContext::new(1, ParamStorage::new(vec![Value::from_i64(5)]));

        let out = Executor::execute(&mut aggregation, &mut ctx).unwrap();
        let chunk = out.into_chunk().unwrap();
        assert_eq!(chunk.cardinality(), 1);
        assert_eq!(chunk.value(0, 0).as_i64(), Some(2));
    }

    #[test]
    fn collecting_concatenates_every_streamed_chunk() {
        let types = vec![ComplexLogicalType::new(LogicalType::Bigint).with_alias("rating")];
        let mut chunk = DataChunk::new(&types, 3);
        chunk.set_cardinality(3);
        chunk.set_value(0, 0, Value::from_i64(1));
        chunk.set_value(0, 1, Value::from_i64(2));
        chunk.set_value(0, 2, Value::from_i64(3));
        let mut raw = RawData::new(chunk);
        let mut ctx = PipelineContext::new(1, ParamStorage::default());

        let out = Executor::execute_collecting(&mut raw, &mut ctx).unwrap();
        assert_eq!(out.into_chunk().unwrap().cardinality(), 3);
    }
}
