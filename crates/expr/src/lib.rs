//! The expression layer: compare-expression trees that back predicates and
//! update-expression trees that back SET clauses. Both run against either a
//! document (`serde_json::Value`) or a columnar `DataChunk` row without
//! duplicating their evaluation logic.

mod aggregate;
mod calc;
mod compare;
mod convert;
mod error;
mod params;
mod update;

pub use aggregate::{AggregateExpr, AggregateKind};
pub use calc::CalcOp;
pub use compare::{CompareNode, CompareOp, Operand, Side};
pub use error::{Error, Result};
pub use params::ParamStorage;
pub use update::{UpdateExprKind, UpdateNode};
