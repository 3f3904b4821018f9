use crate::error::{Error, Result};
use crate::operators::drain_all;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use expr::{AggregateExpr, AggregateKind};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use value::{ComplexLogicalType, LogicalType, Value};
use vector::DataChunk;

/// ColumnarGroup materializes its child's entire output, assigns each row
/// a group id from its key columns, then computes one value per aggregate
/// per group (grounded on `columnar_group.cpp`'s `build_group_ids` +
/// `calculate_aggregates` pair). A plain whole-relation aggregation (no
/// GROUP BY) is the same algorithm with zero key columns — see
/// `Aggregation`.
pub struct ColumnarGroup {
    child: Box<dyn Operator>,
    group_keys: Vec<String>,
    aggregates: Vec<AggregateExpr>,
    state: OperatorState,
    output: Option<OperatorOutput>,
}

impl ColumnarGroup {
    pub fn new(child: Box<dyn Operator>, group_keys: Vec<String>, aggregates: Vec<AggregateExpr>) -> Self {
        ColumnarGroup { child, group_keys, aggregates, state: OperatorState::Created, output: None }
    }

    fn group(&self, input: &DataChunk) -> Result<DataChunk> {
        let key_cols: Vec<usize> = self
            .group_keys
            .iter()
            .map(|k| {
                input
                    .column_index(k)
                    .ok_or_else(|| Error::CreatePhysicalPlanError(format!("unknown group key {k}")))
            })
            .collect::<Result<_>>()?;
        let agg_cols: Vec<Option<usize>> = self
            .aggregates
            .iter()
            .map(|a| match &a.column {
                Some(name) => input
                    .column_index(name)
                    .map(Some)
                    .ok_or_else(|| Error::CreatePhysicalPlanError(format!("unknown aggregate column {name}"))),
                None => Ok(None),
            })
            .collect::<Result<_>>()?;

        let (group_ids, unique_keys) = build_group_ids(input, &key_cols);
        let num_groups = unique_keys.len();

        let mut out_types: Vec<ComplexLogicalType> = key_cols
            .iter()
            .zip(self.group_keys.iter())
            .map(|(&col, alias)| input.column(col).type_().clone().with_alias(alias.clone()))
            .collect();
        for (agg, &col) in self.aggregates.iter().zip(agg_cols.iter()) {
            let ty = match agg.kind {
                AggregateKind::CountStar | AggregateKind::Count | AggregateKind::CountDistinct => {
                    ComplexLogicalType::new(LogicalType::Bigint)
                }
                AggregateKind::Sum | AggregateKind::Avg => ComplexLogicalType::new(LogicalType::Double),
                AggregateKind::Min | AggregateKind::Max => col
                    .map(|c| input.column(c).type_().clone())
                    .unwrap_or_else(|| ComplexLogicalType::new(LogicalType::Bigint)),
            };
            out_types.push(ty.with_alias(agg.alias.clone()));
        }

        let mut out = DataChunk::new(&out_types, num_groups.max(1));
        out.set_cardinality(num_groups);
        for (group_id, key_values) in unique_keys.into_iter().enumerate() {
            for (k, value) in key_values.into_iter().enumerate() {
                out.set_value(k, group_id, value);
            }
        }

        calculate_aggregates(input, &group_ids, num_groups, &self.aggregates, &agg_cols, key_cols.len(), &mut out)?;
        Ok(out)
    }
}

impl Operator for ColumnarGroup {
    fn on_execute(&mut self, ctx: &mut PipelineContext) -> Result<OperatorState> {
        let input = drain_all(&mut *self.child, ctx)?;
        let result = self.group(&input)?;
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

/// Assigns each row a group id by concatenating its key columns' GROUP-BY
/// string rendering; rows with any null key column are excluded from every
/// group (grounded on `columnar_group.cpp`'s `build_group_ids`). With no
/// key columns, every row belongs to the single implicit group 0 — the
/// whole-relation aggregation case.
fn build_group_ids(input: &DataChunk, key_cols: &[usize]) -> (Vec<Option<u32>>, Vec<Vec<Value>>) {
    if key_cols.is_empty() {
        return (vec![Some(0u32); input.cardinality()], vec![Vec::new()]);
    }
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut unique_keys: Vec<Vec<Value>> = Vec::new();
    let mut ids = Vec::with_capacity(input.cardinality());
    for row in 0..input.cardinality() {
        let values: Vec<Value> = key_cols.iter().map(|&c| input.value(c, row)).collect();
        if values.iter().any(Value::is_null) {
            ids.push(None);
            continue;
        }
        let key: String = values.iter().map(Value::to_group_key).collect::<Vec<_>>().join("\u{0}");
        let id = *seen.entry(key).or_insert_with(|| {
            unique_keys.push(values.clone());
            (unique_keys.len() - 1) as u32
        });
        ids.push(Some(id));
    }
    (ids, unique_keys)
}

#[allow(clippy::too_many_arguments)]
fn calculate_aggregates(
    input: &DataChunk,
    group_ids: &[Option<u32>],
    num_groups: usize,
    aggregates: &[AggregateExpr],
    agg_cols: &[Option<usize>],
    key_col_count: usize,
    out: &mut DataChunk,
) -> Result<()> {
    for (agg_idx, agg) in aggregates.iter().enumerate() {
        let out_col = key_col_count + agg_idx;
        let src_col = agg_cols[agg_idx];
        match agg.kind {
            AggregateKind::CountStar => {
                let mut counts = vec![0i64; num_groups];
                for gid in group_ids.iter().flatten() {
                    counts[*gid as usize] += 1;
                }
                for (g, count) in counts.into_iter().enumerate() {
                    out.set_value(out_col, g, Value::from_i64(count));
                }
            }
            AggregateKind::Count => {
                let col = src_col.expect("COUNT(col) requires a source column");
                let mut counts = vec![0i64; num_groups];
                for (row, gid) in group_ids.iter().enumerate() {
                    let Some(gid) = gid else { continue };
                    if !input.value(col, row).is_null() {
                        counts[*gid as usize] += 1;
                    }
                }
                for (g, count) in counts.into_iter().enumerate() {
                    out.set_value(out_col, g, Value::from_i64(count));
                }
            }
            AggregateKind::CountDistinct => {
                let col = src_col.expect("COUNT(DISTINCT col) requires a source column");
                let mut seen: Vec<HashSet<String>> = vec![HashSet::new(); num_groups];
                for (row, gid) in group_ids.iter().enumerate() {
                    let Some(gid) = gid else { continue };
                    let v = input.value(col, row);
                    if !v.is_null() {
                        seen[*gid as usize].insert(v.to_group_key());
                    }
                }
                for (g, set) in seen.into_iter().enumerate() {
                    out.set_value(out_col, g, Value::from_i64(set.len() as i64));
                }
            }
            AggregateKind::Sum | AggregateKind::Avg => {
                let col = src_col.expect("SUM/AVG requires a source column");
                let mut sums = vec![0.0f64; num_groups];
                let mut counts = vec![0i64; num_groups];
                for (row, gid) in group_ids.iter().enumerate() {
                    let Some(gid) = gid else { continue };
                    if let Some(f) = input.value(col, row).as_f64() {
                        sums[*gid as usize] += f;
                        counts[*gid as usize] += 1;
                    }
                }
                for g in 0..num_groups {
                    let value = if agg.kind == AggregateKind::Sum {
                        sums[g]
                    } else if counts[g] > 0 {
                        sums[g] / counts[g] as f64
                    } else {
                        0.0
                    };
                    out.set_value(out_col, g, Value::from_f64(value));
                }
            }
            AggregateKind::Min | AggregateKind::Max => {
                let col = src_col.expect("MIN/MAX requires a source column");
                let mut best: Vec<Option<Value>> = vec![None; num_groups];
                for (row, gid) in group_ids.iter().enumerate() {
                    let Some(gid) = gid else { continue };
                    let v = input.value(col, row);
                    if v.is_null() {
                        continue;
                    }
                    let slot = &mut best[*gid as usize];
                    let replace = match slot {
                        None => true,
                        Some(current) => {
                            let cmp = v.compare(current)?;
                            if agg.kind == AggregateKind::Min { cmp == Ordering::Less } else { cmp == Ordering::Greater }
                        }
                    };
                    if replace {
                        *slot = Some(v);
                    }
                }
                for (g, slot) in best.into_iter().enumerate() {
                    out.set_value(out_col, g, slot.unwrap_or_else(Value::null));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::RawData;
    use expr::{AggregateKind, ParamStorage};
    use value::ComplexLogicalType;

    fn source_chunk() -> DataChunk {
        let types = vec![
            ComplexLogicalType::new(LogicalType::StringLiteral).with_alias("kind"),
            ComplexLogicalType::new(LogicalType::Bigint).with_alias("rating"),
        ];
        let mut chunk = DataChunk::new(&types, 4);
        chunk.set_cardinality(4);
        let rows = [("post", 5i64), ("post", 9), ("like", 1), ("like", 3)];
        for (i, (kind, rating)) in rows.iter().enumerate() {
            chunk.set_value(0, i, Value::from_string((*kind).to_string()));
            chunk.set_value(1, i, Value::from_i64(*rating));
        }
        chunk
    }

    #[test]
    fn groups_by_key_and_sums() {
        let child = Box::new(RawData::new(source_chunk()));
        let aggregates = vec![AggregateExpr::new(AggregateKind::Sum, Some("rating".into()), "total")];
        let mut group = ColumnarGroup::new(child, vec!["kind".into()], aggregates);
        let mut ctx = PipelineContext::new(1, ParamStorage::default());

        group.on_execute(&mut ctx).unwrap();
        let out = group.take_output().unwrap().into_chunk().unwrap();
        assert_eq!(out.cardinality(), 2);

        let mut totals = std::collections::HashMap::new();
        for row in 0..out.cardinality() {
            totals.insert(out.value(0, row).as_str().unwrap().to_string(), out.value(1, row).as_f64().unwrap());
        }
        assert_eq!(totals["post"], 14.0);
        assert_eq!(totals["like"], 4.0);
    }

    #[test]
    fn whole_relation_count_star_with_no_group_keys() {
        let child = Box::new(RawData::new(source_chunk()));
        let aggregates = vec![AggregateExpr::new(AggregateKind::CountStar, None, "n")];
        let mut group = ColumnarGroup::new(child, vec![], aggregates);
        let mut ctx = PipelineContext::new(1, ParamStorage::default());

        group.on_execute(&mut ctx).unwrap();
        let out = group.take_output().unwrap().into_chunk().unwrap();
        assert_eq!(out.cardinality(), 1);
        assert_eq!(out.value(0, 0).as_i64(), Some(4));
    }
}
