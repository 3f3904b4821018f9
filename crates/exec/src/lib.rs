mod error;
mod executor;
mod operators;
mod output;
mod pipeline;

pub use error::{Error, Result};
pub use executor::Executor;
pub use operators::{Aggregation, ColumnarGroup, Delete, Filter, FullScan, Insert, OperatorJoin, RawData, Update};
pub use output::OperatorOutput;
pub use pipeline::{Operator, OperatorState, PipelineContext};
