use crate::error::{Error, Result};
use crate::operators::drain_all;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use std::collections::HashMap;
use vector::DataChunk;

/// OperatorJoin is a minimal hash-join on equality between one column from
/// each side: materializes both children, builds a hash table over the
/// right side keyed by `Value::to_group_key`, then probes every left row.
/// The original engine compiles a join per physical-type pair; this
/// crate's generic `Value` already hides that dispatch, so one
/// implementation covers every type combination (documented as a
/// deliberate simplification, not a missing feature).
pub struct OperatorJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    left_key: String,
    right_key: String,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl OperatorJoin {
    pub fn new(
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        left_key: impl Into<String>,
        right_key: impl Into<String>,
    ) -> Self {
        OperatorJoin {
            left,
            right,
            left_key: left_key.into(),
            right_key: right_key.into(),
            state: OperatorState::Created,
            output: None,
        }
    }
}

impl Operator for OperatorJoin {
    fn on_execute(&mut self, ctx: &mut PipelineContext) -> Result<OperatorState> {
        let left_chunk = drain_all(&mut *self.left, ctx)?;
        let right_chunk = drain_all(&mut *self.right, ctx)?;
        let result = hash_join(&left_chunk, &right_chunk, &self.left_key, &self.right_key)?;
        self.output = Some(OperatorOutput::Chunk(result));
        self.state = OperatorState::Executed;
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

fn hash_join(left: &DataChunk, right: &DataChunk, left_key: &str, right_key: &str) -> Result<DataChunk> {
    let lk = left
        .column_index(left_key)
        .ok_or_else(|| Error::CreatePhysicalPlanError(format!("unknown join key {left_key}")))?;
    let rk = right
        .column_index(right_key)
        .ok_or_else(|| Error::CreatePhysicalPlanError(format!("unknown join key {right_key}")))?;

    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
    for row in 0..right.cardinality() {
        let v = right.value(rk, row);
        if v.is_null() {
            continue;
        }
        buckets.entry(v.to_group_key()).or_default().push(row);
    }

    let mut pairs = Vec::new();
    for lrow in 0..left.cardinality() {
        let v = left.value(lk, lrow);
        if v.is_null() {
            continue;
        }
        if let Some(rrows) = buckets.get(&v.to_group_key()) {
            pairs.extend(rrows.iter().map(|&rrow| (lrow, rrow)));
        }
    }

    let mut out_types = left.types();
    out_types.extend(right.types());
    let mut out = DataChunk::new(&out_types, pairs.len().max(1));
    out.set_cardinality(pairs.len());
    for (i, (lrow, rrow)) in pairs.iter().enumerate() {
        for col in 0..left.column_count() {
            out.set_value(col, i, left.value(col, *lrow));
        }
        for col in 0..right.column_count() {
            out.set_value(left.column_count() + col, i, right.value(col, *rrow));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::RawData;
    use expr::ParamStorage;
    use value::{ComplexLogicalType, LogicalType, Value};

    #[test]
    fn joins_on_matching_keys() {
        let left_types = vec![
            ComplexLogicalType::new(LogicalType::StringLiteral).with_alias("author_did"),
            ComplexLogicalType::new(LogicalType::StringLiteral).with_alias("text"),
        ];
        let mut left_chunk = DataChunk::new(&left_types, 2);
        left_chunk.set_cardinality(2);
        left_chunk.set_value(0, 0, Value::from_string("did:a".into()));
        left_chunk.set_value(1, 0, Value::from_string("hello".into()));
        left_chunk.set_value(0, 1, Value::from_string("did:b".into()));
        left_chunk.set_value(1, 1, Value::from_string("world".into()));

        let right_types = vec![
            ComplexLogicalType::new(LogicalType::StringLiteral).with_alias("did"),
            ComplexLogicalType::new(LogicalType::StringLiteral).with_alias("handle"),
        ];
        let mut right_chunk = DataChunk::new(&right_types, 1);
        right_chunk.set_cardinality(1);
        right_chunk.set_value(0, 0, Value::from_string("did:a".into()));
        right_chunk.set_value(1, 0, Value::from_string("ada".into()));

        let mut join = OperatorJoin::new(
            Box::new(RawData::new(left_chunk)),
            Box::new(RawData::new(right_chunk)),
            "author_did",
            "did",
        );
        let mut ctx = PipelineContext::new(1, ParamStorage::default());
        join.on_execute(&mut ctx).unwrap();
        let out = join.take_output().unwrap().into_chunk().unwrap();
        assert_eq!(out.cardinality(), 1);
        assert_eq!(out.value(3, 0).as_str(), Some("ada"));
    }
}
