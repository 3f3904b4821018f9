use super::{AsNode, Node};
use crate::Pointer;

/// PhysicalType is the native Rust shape a document leaf is stored as,
/// mirroring the type tags a JSON parser hands back before any column
/// type inference runs over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalType {
    Null,
    Bool,
    Int64,
    UInt64,
    Double,
    String,
    Blob,
    Array,
    Object,
}

/// Document is the narrow, read-only view the schema and storage layers
/// are built against: presence/type probes and typed getters addressed by
/// JSON pointer, with no knowledge of how the underlying tree was parsed.
pub struct Document<N: AsNode> {
    root: N,
}

impl<N: AsNode> Document<N> {
    pub fn new(root: N) -> Self {
        Document { root }
    }

    pub fn root(&self) -> &N {
        &self.root
    }

    fn locate(&self, path: &str) -> Option<&N> {
        Pointer::from_str(path).query_node(&self.root)
    }

    /// has reports whether `path` addresses a present location, including
    /// a location whose value is explicitly `null`.
    pub fn has(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }

    /// physical_type reports the native shape of the value at `path`, or
    /// `None` if the path does not resolve.
    pub fn physical_type(&self, path: &str) -> Option<PhysicalType> {
        self.locate(path).map(|n| match n.as_node() {
            Node::Null => PhysicalType::Null,
            Node::Bool(_) => PhysicalType::Bool,
            Node::NegInt(_) => PhysicalType::Int64,
            Node::PosInt(_) => PhysicalType::UInt64,
            Node::Float(_) => PhysicalType::Double,
            Node::String(_) => PhysicalType::String,
            Node::Bytes(_) => PhysicalType::Blob,
            Node::Array(_) => PhysicalType::Array,
            Node::Object(_) => PhysicalType::Object,
        })
    }

    pub fn is_null(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::Null))
    }
    pub fn is_bool(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::Bool))
    }
    pub fn is_i64(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::Int64))
    }
    pub fn is_u64(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::UInt64))
    }
    pub fn is_i32(&self, path: &str) -> bool {
        self.get_i64(path)
            .map(|v| i32::try_from(v).is_ok())
            .unwrap_or(false)
    }
    pub fn is_double(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::Double))
    }
    pub fn is_float(&self, path: &str) -> bool {
        self.is_double(path)
    }
    pub fn is_string(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::String))
    }
    pub fn is_array(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::Array))
    }
    pub fn is_object(&self, path: &str) -> bool {
        matches!(self.physical_type(path), Some(PhysicalType::Object))
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        match self.locate(path)?.as_node() {
            Node::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        match self.locate(path)?.as_node() {
            Node::NegInt(v) => Some(v),
            Node::PosInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        match self.locate(path)?.as_node() {
            Node::PosInt(v) => Some(v),
            Node::NegInt(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn get_i32(&self, path: &str) -> Option<i32> {
        self.get_i64(path).and_then(|v| i32::try_from(v).ok())
    }

    pub fn get_double(&self, path: &str) -> Option<f64> {
        match self.locate(path)?.as_node() {
            Node::Float(v) => Some(v),
            Node::PosInt(v) => Some(v as f64),
            Node::NegInt(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn get_float(&self, path: &str) -> Option<f32> {
        self.get_double(path).map(|v| v as f32)
    }

    pub fn get_string(&self, path: &str) -> Option<&str> {
        match self.locate(path)?.as_node() {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_blob(&self, path: &str) -> Option<&[u8]> {
        match self.locate(path)?.as_node() {
            Node::Bytes(b) => Some(b),
            _ => None,
        }
    }
}
