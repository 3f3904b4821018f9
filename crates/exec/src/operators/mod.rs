mod aggregation;
mod delete;
mod filter;
mod full_scan;
mod group;
mod insert;
mod join;
mod raw_data;
mod update;

pub use aggregation::Aggregation;
pub use delete::Delete;
pub use filter::Filter;
pub use full_scan::FullScan;
pub use group::ColumnarGroup;
pub use insert::Insert;
pub use join::OperatorJoin;
pub use raw_data::RawData;
pub use update::Update;

use crate::error::Result;
use crate::output::OperatorOutput;
use crate::pipeline::{Operator, OperatorState, PipelineContext};
use vector::DataChunk;

/// Drives `op` to `Executed`, concatenating every non-empty chunk it
/// produces along the way. Shared by the operators (`ColumnarGroup`,
/// `OperatorJoin`) that need their child's *entire* output materialized
/// before they can do their own work.
pub(crate) fn drain_all(op: &mut dyn Operator, ctx: &mut PipelineContext) -> Result<DataChunk> {
    let mut combined: Option<DataChunk> = None;
    loop {
        let state = op.on_execute(ctx)?;
        if let Some(chunk) = op.take_output().and_then(OperatorOutput::into_chunk) {
            if chunk.cardinality() > 0 {
                combined = Some(match combined.take() {
                    None => chunk,
                    Some(mut acc) => {
                        acc.append(&chunk, true)?;
                        acc
                    }
                });
            }
        }
        if state == OperatorState::Executed {
            break;
        }
    }
    Ok(combined.unwrap_or_else(|| DataChunk::new(&[], 0)))
}
