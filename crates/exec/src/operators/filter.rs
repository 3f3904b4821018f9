use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use expr::CompareNode;
use vector::{DataChunk, SelectionVector};

/// Filter keeps only the rows of its child's output that satisfy
/// `predicate`, via a dictionary selection over the child's chunk
/// (grounded on `simple_predicate.cpp`'s per-row `check` loop).
pub struct Filter {
    child: Box<dyn Operator>,
    predicate: CompareNode,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl Filter {
    pub fn new(child: Box<dyn Operator>, predicate: CompareNode) -> Self {
        Filter { child, predicate, state: OperatorState::Created, output: None }
    }
}

impl Operator for Filter {
    fn on_execute(&mut self, ctx: &mut PipelineContext) -> Result<OperatorState> {
        let child_state = self.child.on_execute(ctx)?;
        let chunk = match self.child.take_output().and_then(OperatorOutput::into_chunk) {
            Some(c) => c,
            None => {
                self.output = Some(OperatorOutput::Chunk(DataChunk::new(&[], 0)));
                self.state = OperatorState::Executed;
                return Ok(self.state);
            }
        };

        let mut matched = Vec::new();
        for row in 0..chunk.cardinality() {
            if self.predicate.check_chunk(&chunk, &chunk, row, row, &ctx.params)? {
                matched.push(row as u32);
            }
        }
        let mut filtered = chunk;
        let count = matched.len();
        filtered.slice(&SelectionVector::from_indices(matched), count);

        self.output = Some(OperatorOutput::Chunk(filtered));
        self.state = if child_state == OperatorState::Executed { OperatorState::Executed } else { OperatorState::Running };
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
    use crate::operators::RawData;
    use expr::{CompareOp, Operand, ParamStorage};
    use value::{ComplexLogicalType, LogicalType, Value};

    #[test]
    fn keeps_only_matching_rows() {
        let types = vec![ComplexLogicalType::new(LogicalType::Bigint).with_alias("rating")];
        let mut chunk = DataChunk::new(&types, 3);
        chunk.set_cardinality(3);
        chunk.set_value(0, 0, Value::from_i64(1));
        chunk.set_value(0, 1, Value::from_i64(5));
        chunk.set_value(0, 2, Value::from_i64(9));

        let child = Box::new(RawData::new(chunk));
        let predicate = CompareNode::leaf(CompareOp::Gte, "rating", Operand::Param(0));
        let mut filter = Filter::new(child, predicate);
        let mut ctx = PipelineContext::new(1, ParamStorage::new(vec![Value::from_i64(5)]));

        filter.on_execute(&mut ctx).unwrap();
        let out = filter.take_output().unwrap().into_chunk().unwrap();
        assert_eq!(out.cardinality(), 2);
        assert_eq!(out.value(0, 0).as_i64(), Some(5));
        assert_eq!(out.value(0, 1).as_i64(), Some(9));
    }
}
