//! Shared document<->value conversions used by both the compare and update
//! expression trees when they address a `serde_json::Value` document.

use doc::{AsNode, Node};
use value::{Payload, Value};

pub(crate) fn json_to_value(node: &serde_json::Value) -> Value {
    match node.as_node() {
        Node::Null => Value::null(),
        Node::Bool(b) => Value::from_bool(b),
        Node::NegInt(v) => Value::from_i64(v),
        Node::PosInt(v) => Value::from_i64(v as i64),
        Node::Float(v) => Value::from_f64(v),
        Node::String(s) => Value::from_string(s.to_string()),
        Node::Bytes(b) => Value::from_blob(b.to_vec()),
        Node::Array(_) | Node::Object(_) => Value::from_string(node.to_string()),
    }
}

pub(crate) fn value_to_json(v: &Value) -> serde_json::Value {
    match v.payload() {
        Payload::Null | Payload::Pointer(_) => serde_json::Value::Null,
        Payload::Bool(b) => serde_json::Value::Bool(*b),
        Payload::Int8(n) => (*n as i64).into(),
        Payload::Int16(n) => (*n as i64).into(),
        Payload::Int32(n) => (*n as i64).into(),
        Payload::Int64(n) => (*n).into(),
        Payload::Int128(n) => json_from_f64(*n as f64),
        Payload::UInt8(n) => (*n as u64).into(),
        Payload::UInt16(n) => (*n as u64).into(),
        Payload::UInt32(n) => (*n as u64).into(),
        Payload::UInt64(n) => (*n).into(),
        Payload::UInt128(n) => json_from_f64(*n as f64),
        Payload::Float(f) => json_from_f64(*f as f64),
        Payload::Double(f) => json_from_f64(*f),
        Payload::String(s) => serde_json::Value::String((**s).clone()),
        Payload::Blob(b) => serde_json::Value::String(format!("{:?}", b)),
        Payload::Children(children) => serde_json::Value::Array(children.iter().map(value_to_json).collect()),
    }
}

fn json_from_f64(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null)
}
