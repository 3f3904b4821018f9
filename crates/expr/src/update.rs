use crate::calc::CalcOp;
use crate::convert::{json_to_value, value_to_json};
use crate::error::{Error, Result};
use crate::params::ParamStorage;
use doc::Pointer;
use value::Value;
use vector::DataChunk;

/// Side mirrors the compare tree's: which document/chunk a field
/// reference resolves against, once probed and cached.
pub use crate::compare::Side;

/// UpdateExprKind tags the shape of one update-expression node (grounded
/// on `update_expression.hpp`'s class hierarchy: `update_expr_set_t`,
/// `update_expr_get_value_t`, `update_expr_get_const_value_t`,
/// `update_expr_calculate_t`).
#[derive(Debug, Clone)]
pub enum UpdateExprKind {
    /// Writes `left`'s evaluated value into `key` on the target document.
    Set { key: String },
    /// Reads a field by path, probing the target ("to") document first
    /// and falling back to the source ("from") document when `side` is
    /// still undecided.
    GetDocField { key: String, side: Side },
    /// Reads a bound query parameter by position.
    GetParam { id: usize },
    /// Applies `op` to `left`'s (and, if binary, `right`'s) value.
    Calc { op: CalcOp },
}

/// One node of the update-expression tree. Children evaluate left-then-
/// right before the node's own effect runs, and the result is cached in
/// `output` so a parent node can read it without re-evaluating
/// (`update_expression.cpp`'s recursive `execute` order).
#[derive(Debug, Clone)]
pub struct UpdateNode {
    pub kind: UpdateExprKind,
    pub left: Option<Box<UpdateNode>>,
    pub right: Option<Box<UpdateNode>>,
    output: Option<Value>,
}

impl UpdateNode {
    pub fn leaf(kind: UpdateExprKind) -> Self {
        UpdateNode { kind, left: None, right: None, output: None }
    }

    pub fn with_children(kind: UpdateExprKind, left: UpdateNode, right: Option<UpdateNode>) -> Self {
        UpdateNode { kind, left: Some(Box::new(left)), right: right.map(Box::new), output: None }
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    fn child_output(child: &Option<Box<UpdateNode>>) -> Value {
        child.as_ref().and_then(|n| n.output.clone()).unwrap_or_else(Value::null)
    }

    /// Runs this node (and its children) against a document pair: `to` is
    /// the mutable target the tree writes into, `from` is the read-only
    /// original. For a plain single-document UPDATE, pass the same
    /// document as both.
    pub fn execute_document(
        &mut self,
        to: &mut serde_json::Value,
        from: &serde_json::Value,
        params: &ParamStorage,
    ) -> Result<Value> {
        if let Some(left) = &mut self.left {
            left.execute_document(to, from, params)?;
        }
        if let Some(right) = &mut self.right {
            right.execute_document(to, from, params)?;
        }
        let result = match &mut self.kind {
            UpdateExprKind::Set { key } => {
                let value = Self::child_output(&self.left);
                let ptr = Pointer::from_str(key);
                let slot = ptr.create(to).ok_or_else(|| Error::UnwritablePath(key.clone()))?;
                *slot = value_to_json(&value);
                value
            }
            UpdateExprKind::GetDocField { key, side } => {
                let ptr = Pointer::from_str(key);
                resolve_doc_field(&ptr, to, from, side)
            }
            UpdateExprKind::GetParam { id } => params.get(*id).cloned().ok_or(Error::UnboundParameter(*id))?,
            UpdateExprKind::Calc { op } => {
                let left = Self::child_output(&self.left);
                if op.is_unary() {
                    op.apply_unary(&left)?
                } else {
                    let right = Self::child_output(&self.right);
                    op.apply_binary(&left, &right)?
                }
            }
        };
        self.output = Some(result.clone());
        Ok(result)
    }

    /// Runs this node against a chunk-row pair: `to`/`row_to` is the
    /// mutable target row, `from`/`row_from` the read-only original row.
    /// Pass the same chunk and row index twice for a plain single-table
    /// UPDATE.
    pub fn execute_chunk(
        &mut self,
        to: &mut DataChunk,
        from: &DataChunk,
        row_to: usize,
        row_from: usize,
        params: &ParamStorage,
    ) -> Result<Value> {
        if let Some(left) = &mut self.left {
            left.execute_chunk(to, from, row_to, row_from, params)?;
        }
        if let Some(right) = &mut self.right {
            right.execute_chunk(to, from, row_to, row_from, params)?;
        }
        let result = match &mut self.kind {
            UpdateExprKind::Set { key } => {
                let value = Self::child_output(&self.left);
                let idx = to.column_index(key).ok_or_else(|| Error::NoSuchColumn(key.clone()))?;
                to.set_value(idx, row_to, value.clone());
                value
            }
            UpdateExprKind::GetDocField { key, side } => {
                resolve_chunk_field(key, to, from, row_to, row_from, side)?
            }
            UpdateExprKind::GetParam { id } => params.get(*id).cloned().ok_or(Error::UnboundParameter(*id))?,
            UpdateExprKind::Calc { op } => {
                let left = Self::child_output(&self.left);
                if op.is_unary() {
                    op.apply_unary(&left)?
                } else {
                    let right = Self::child_output(&self.right);
                    op.apply_binary(&left, &right)?
                }
            }
        };
        self.output = Some(result.clone());
        Ok(result)
    }
}

fn resolve_doc_field(ptr: &Pointer, to: &serde_json::Value, from: &serde_json::Value, side: &mut Side) -> Value {
    let found = match side {
        Side::Left => ptr.query(to),
        Side::Right => ptr.query(from),
        Side::Undefined => {
            if let Some(v) = ptr.query(to) {
                *side = Side::Left;
                Some(v)
            } else if let Some(v) = ptr.query(from) {
                *side = Side::Right;
                Some(v)
            } else {
                None
            }
        }
    };
    found.map(json_to_value).unwrap_or_else(Value::null)
}

fn resolve_chunk_field(
    key: &str,
    to: &DataChunk,
    from: &DataChunk,
    row_to: usize,
    row_from: usize,
    side: &mut Side,
) -> Result<Value> {
    let found = match side {
        Side::Left => to.column_index(key).map(|i| to.value(i, row_to)),
        Side::Right => from.column_index(key).map(|i| from.value(i, row_from)),
        Side::Undefined => {
            if let Some(i) = to.column_index(key) {
                *side = Side::Left;
                Some(to.value(i, row_to))
            } else if let Some(i) = from.column_index(key) {
                *side = Side::Right;
                Some(from.value(i, row_from))
            } else {
                None
            }
        }
    };
    Ok(found.unwrap_or_else(Value::null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::{ComplexLogicalType, LogicalType};

    fn rating_plus_param(key: &str) -> UpdateNode {
        UpdateNode::with_children(
            UpdateExprKind::Set { key: key.to_string() },
            UpdateNode::with_children(
                UpdateExprKind::Calc { op: CalcOp::Sum },
                UpdateNode::leaf(UpdateExprKind::GetDocField { key: key.to_string(), side: Side::Undefined }),
                Some(UpdateNode::leaf(UpdateExprKind::GetParam { id: 0 })),
            ),
            None,
        )
    }

    #[test]
    fn set_rating_plus_two_on_document() {
        let mut to = serde_json::json!({"rating": 5, "flag": true});
        let from = to.clone();
        let params = ParamStorage::new(vec![Value::from_i64(2)]);
        let mut tree = rating_plus_param("/rating");
        tree.execute_document(&mut to, &from, &params).unwrap();
        assert_eq!(to["rating"], serde_json::json!(7));
    }

    #[test]
    fn set_rating_plus_two_on_chunk() {
        let types = vec![
            ComplexLogicalType::new(LogicalType::Bigint).with_alias("rating"),
            ComplexLogicalType::new(LogicalType::Boolean).with_alias("flag"),
        ];
        let mut chunk = DataChunk::new(&types, 1);
        chunk.set_cardinality(1);
        chunk.set_value(0, 0, Value::from_i64(5));
        chunk.set_value(1, 0, Value::from_bool(true));
        let original = chunk.clone();

        let params = ParamStorage::new(vec![Value::from_i64(2)]);
        let mut tree = rating_plus_param("rating");
        tree.execute_chunk(&mut chunk, &original, 0, 0, &params).unwrap();
        assert_eq!(chunk.value(0, 0).as_i64(), Some(7));
    }

    #[test]
    fn get_param_out_of_range_errors() {
        let mut to = serde_json::json!({});
        let from = to.clone();
        let params = ParamStorage::new(vec![]);
        let mut node = UpdateNode::leaf(UpdateExprKind::GetParam { id: 0 });
        assert!(node.execute_document(&mut to, &from, &params).is_err());
    }

    #[test]
    fn side_is_cached_after_first_resolution() {
        let mut to = serde_json::json!({"rating": 1});
        let from = to.clone();
        let params = ParamStorage::new(vec![]);
        let mut node = UpdateNode::leaf(UpdateExprKind::GetDocField { key: "/rating".into(), side: Side::Undefined });
        node.execute_document(&mut to, &from, &params).unwrap();
        match node.kind {
            UpdateExprKind::GetDocField { side, .. } => assert_eq!(side, Side::Left),
            _ => unreachable!(),
        }
    }
}
