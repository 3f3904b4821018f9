//! Tagged value model: logical/physical types and the runtime `Value` they
//! describe, plus its binary wire encoding.

mod error;
mod ser;
mod types;
mod value;

pub use error::{Error, Result};
pub use ser::{deserialize, serialize};
pub use types::{ComplexLogicalType, LogicalType, PhysicalType, TypeExtension, TypeFamily};
pub use value::{Payload, Value};
