use crate::convert::json_to_value;
use crate::error::{Error, Result};
use crate::params::ParamStorage;
use doc::Pointer;
use regex::Regex;
use std::cmp::Ordering;
use value::Value;
use vector::DataChunk;

/// Side records which of two documents/chunks a field reference resolved
/// against. `Undefined` is probed dynamically the first time the node
/// runs — primary side first, secondary side as fallback — and the
/// outcome is cached on the node so later rows skip the probe (grounded
/// on `simple_predicate.cpp`'s `deduce_side`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Undefined,
}

/// CompareOp is the leaf comparison a `CompareNode::Leaf` applies between
/// its field and its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Matches the field's string value against `.*{operand}.*` — literal
    /// substring containment via regex interpolation, not full ECMAScript
    /// syntax (grounded on `compare_regex_documents`).
    Regex,
}

/// Operand is the right-hand side of a leaf comparison: another
/// document/chunk field, or a bound query parameter.
#[derive(Debug, Clone)]
pub enum Operand {
    Field { key: String, side: Side },
    Param(usize),
}

/// CompareNode is the predicate tree: leaf comparisons combined with the
/// union combinators (grounded on `simple_predicate.cpp`'s
/// `union_and`/`union_or`/`union_not`).
#[derive(Debug, Clone)]
pub enum CompareNode {
    Leaf { op: CompareOp, key: String, side: Side, operand: Operand },
    And(Vec<CompareNode>),
    Or(Vec<CompareNode>),
    Not(Box<CompareNode>),
}

impl CompareNode {
    pub fn leaf(op: CompareOp, key: impl Into<String>, operand: Operand) -> Self {
        CompareNode::Leaf { op, key: key.into(), side: Side::Undefined, operand }
    }

    /// Evaluates this predicate against a pair of documents. `primary` and
    /// `secondary` may be the same document for an ordinary single-table
    /// predicate; they differ for join-style predicates comparing two
    /// distinct documents.
    pub fn check_document(
        &mut self,
        primary: &serde_json::Value,
        secondary: &serde_json::Value,
        params: &ParamStorage,
    ) -> Result<bool> {
        match self {
            CompareNode::And(children) => {
                for child in children {
                    if !child.check_document(primary, secondary, params)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            CompareNode::Or(children) => {
                for child in children {
                    if child.check_document(primary, secondary, params)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CompareNode::Not(child) => Ok(!child.check_document(primary, secondary, params)?),
            CompareNode::Leaf { op, key, side, operand } => {
                let ptr = Pointer::from_str(key);
                let left = resolve_doc_operand(&ptr, primary, secondary, side)?;
                let right = match operand {
                    Operand::Param(id) => params.get(*id).cloned().ok_or(Error::UnboundParameter(*id))?,
                    Operand::Field { key, side } => {
                        let ptr = Pointer::from_str(key);
                        resolve_doc_operand(&ptr, primary, secondary, side)?
                    }
                };
                evaluate(*op, &left, &right)
            }
        }
    }

    /// Evaluates this predicate against a pair of chunk rows, identified
    /// independently so a join-style predicate can compare differing row
    /// indices on each side; pass the same chunk/row twice for an ordinary
    /// single-table predicate.
    pub fn check_chunk(
        &mut self,
        left_chunk: &DataChunk,
        right_chunk: &DataChunk,
        row_left: usize,
        row_right: usize,
        params: &ParamStorage,
    ) -> Result<bool> {
        match self {
            CompareNode::And(children) => {
                for child in children {
                    if !child.check_chunk(left_chunk, right_chunk, row_left, row_right, params)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            CompareNode::Or(children) => {
                for child in children {
                    if child.check_chunk(left_chunk, right_chunk, row_left, row_right, params)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CompareNode::Not(child) => Ok(!child.check_chunk(left_chunk, right_chunk, row_left, row_right, params)?),
            CompareNode::Leaf { op, key, side, operand } => {
                let left = resolve_chunk_operand(key, left_chunk, right_chunk, row_left, row_right, side)?;
                let right = match operand {
                    Operand::Param(id) => params.get(*id).cloned().ok_or(Error::UnboundParameter(*id))?,
                    Operand::Field { key, side } => {
                        resolve_chunk_operand(key, left_chunk, right_chunk, row_left, row_right, side)?
                    }
                };
                evaluate(*op, &left, &right)
            }
        }
    }
}

fn resolve_doc_operand(
    ptr: &Pointer,
    primary: &serde_json::Value,
    secondary: &serde_json::Value,
    side: &mut Side,
) -> Result<Value> {
    let found = match side {
        Side::Left => ptr.query(primary),
        Side::Right => ptr.query(secondary),
        Side::Undefined => {
            if let Some(v) = ptr.query(primary) {
                *side = Side::Left;
                Some(v)
            } else if let Some(v) = ptr.query(secondary) {
                *side = Side::Right;
                Some(v)
            } else {
                None
            }
        }
    };
    Ok(found.map(json_to_value).unwrap_or_else(Value::null))
}

fn resolve_chunk_operand(
    key: &str,
    left_chunk: &DataChunk,
    right_chunk: &DataChunk,
    row_left: usize,
    row_right: usize,
    side: &mut Side,
) -> Result<Value> {
    let found = match side {
        Side::Left => left_chunk.column_index(key).map(|c| left_chunk.value(c, row_left)),
        Side::Right => right_chunk.column_index(key).map(|c| right_chunk.value(c, row_right)),
        Side::Undefined => {
            if let Some(c) = left_chunk.column_index(key) {
                *side = Side::Left;
                Some(left_chunk.value(c, row_left))
            } else if let Some(c) = right_chunk.column_index(key) {
                *side = Side::Right;
                Some(right_chunk.value(c, row_right))
            } else {
                None
            }
        }
    };
    Ok(found.unwrap_or_else(Value::null))
}

fn evaluate(op: CompareOp, left: &Value, right: &Value) -> Result<bool> {
    match op {
        CompareOp::Eq => Ok(matches!(left.compare(right), Ok(Ordering::Equal))),
        CompareOp::Ne => Ok(!matches!(left.compare(right), Ok(Ordering::Equal))),
        CompareOp::Lt => Ok(matches!(left.compare(right), Ok(Ordering::Less))),
        CompareOp::Lte => Ok(matches!(left.compare(right), Ok(Ordering::Less) | Ok(Ordering::Equal))),
        CompareOp::Gt => Ok(matches!(left.compare(right), Ok(Ordering::Greater))),
        CompareOp::Gte => Ok(matches!(left.compare(right), Ok(Ordering::Greater) | Ok(Ordering::Equal))),
        CompareOp::Regex => {
            let haystack = left
                .as_str()
                .ok_or_else(|| Error::InvalidOperand("left side of a regex comparison must be a string".into()))?;
            let needle = right.as_str().unwrap_or_default();
            let pattern = format!(".*{}.*", regex::escape(needle));
            tracing::debug!(pattern = %pattern, "compiling literal-substring regex predicate");
            let re = Regex::new(&pattern).map_err(|e| Error::InvalidRegex(pattern.clone(), e.to_string()))?;
            Ok(re.is_match(haystack))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_against_bound_parameter() {
        let doc = json!({"flag": true});
        let params = ParamStorage::new(vec![Value::from_bool(true)]);
        let mut node = CompareNode::leaf(CompareOp::Eq, "/flag", Operand::Param(0));
        assert!(node.check_document(&doc, &doc, &params).unwrap());
    }

    #[test]
    fn and_short_circuits_on_first_false() {
        let doc = json!({"rating": 3, "flag": false});
        let mut node = CompareNode::And(vec![
            CompareNode::leaf(CompareOp::Gt, "/rating", Operand::Field { key: "/zzz".into(), side: Side::Undefined }),
            CompareNode::leaf(CompareOp::Eq, "/flag", Operand::Param(0)),
        ]);
        let params = ParamStorage::new(vec![Value::from_bool(true)]);
        assert!(!node.check_document(&doc, &doc, &params).unwrap());
    }

    #[test]
    fn not_negates_child() {
        let doc = json!({"flag": false});
        let params = ParamStorage::new(vec![Value::from_bool(false)]);
        let mut node = CompareNode::Not(Box::new(CompareNode::leaf(CompareOp::Eq, "/flag", Operand::Param(0))));
        assert!(!node.check_document(&doc, &doc, &params).unwrap());
    }

    #[test]
    fn regex_matches_substring() {
        let doc = json!({"name": "silver spoon"});
        let params = ParamStorage::new(vec![Value::from_string("spoon".into())]);
        let mut node = CompareNode::leaf(CompareOp::Regex, "/name", Operand::Param(0));
        assert!(node.check_document(&doc, &doc, &params).unwrap());
    }

    #[test]
    fn missing_field_compares_as_null() {
        let doc = json!({"other": 1});
        let params = ParamStorage::new(vec![Value::from_i64(5)]);
        let mut node = CompareNode::leaf(CompareOp::Eq, "/missing", Operand::Param(0));
        assert!(!node.check_document(&doc, &doc, &params).unwrap());
    }

    #[test]
    fn chunk_side_resolves_and_caches() {
        let types = vec![value::ComplexLogicalType::new(value::LogicalType::Bigint).with_alias("rating")];
        let mut chunk = DataChunk::new(&types, 2);
        chunk.set_cardinality(2);
        chunk.set_value(0, 0, Value::from_i64(5));
        chunk.set_value(0, 1, Value::from_i64(1));
        let params = ParamStorage::new(vec![Value::from_i64(5)]);
        let mut node = CompareNode::leaf(CompareOp::Eq, "rating", Operand::Param(0));
        assert!(node.check_chunk(&chunk, &chunk, 0, 0, &params).unwrap());
        assert!(!node.check_chunk(&chunk, &chunk, 1, 1, &params).unwrap());
        assert!(matches!(node, CompareNode::Leaf { side: Side::Left, .. }));
    }
}
