use crate::error::Result;
use crate::operators::group::ColumnarGroup;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use expr::AggregateExpr;

/// Aggregation is the whole-relation counterpart of `ColumnarGroup`: a
/// query with aggregate functions and no `GROUP BY` clause reduces every
/// row of its child to a single output row. It reuses `ColumnarGroup`'s
/// algorithm with an empty key list rather than duplicating it, the same
/// way the source's `build_group_ids` has its own no-keys branch for
/// exactly this case.
pub struct Aggregation {
    inner: ColumnarGroup,
}

impl Aggregation {
    pub fn new(child: Box<dyn Operator>, aggregates: Vec<AggregateExpr>) -> Self {
        Aggregation { inner: ColumnarGroup::new(child, Vec::new(), aggregates) }
    }
}

impl Operator for Aggregation {
    fn on_execute(&mut self, ctx: &mut PipelineContext) -> Result<OperatorState> {
        self.inner.on_execute(ctx)
    }

    fn state(&self) -> OperatorState {
        self.inner.state()
    }

    fn output(&self) -> Option<&OperatorOutput> {
        self.inner.output()
    }

    fn take_output(&mut self) -> Option<OperatorOutput> {
        self.inner.take_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::RawData;
    use expr::{AggregateKind, ParamStorage};
    use value::{ComplexLogicalType, LogicalType, Value};
    use vector::DataChunk;

    #[test]
    fn aggregates_the_whole_relation_into_one_row() {
        let types = vec![ComplexLogicalType::new(LogicalType::Bigint).with_alias("rating")];
        let mut chunk = DataChunk::new(&types, 3);
        chunk.set_cardinality(3);
        chunk.set_value(0, 0, Value::from_i64(1));
        chunk.set_value(0, 1, Value::from_i64(2));
        chunk.set_value(0, 2, Value::from_i64(3));

        let child = Box::new(RawData::new(chunk));
        let aggregates = vec![AggregateExpr::new(AggregateKind::Avg, Some("rating".into()), "avg_rating")];
        let mut agg = Aggregation::new(child, aggregates);
        let mut ctx = PipelineContext::new(1, ParamStorage::default());

        agg.on_execute(&mut ctx).unwrap();
        let out = agg.take_output().unwrap().into_chunk().unwrap();
        assert_eq!(out.cardinality(), 1);
        assert_eq!(out.value(0, 0).as_f64(), Some(2.0));
    }
}
