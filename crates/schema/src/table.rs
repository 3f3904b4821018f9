use crate::error::{Error, Result};
use crate::extract::{extract_paths, ExtractConfig, ExtractedPath};
use doc::{AsNode, Field, Fields, Node, Pointer};
use std::collections::{HashMap, HashSet};
use storage::ColumnDefinition;
use value::{ComplexLogicalType, LogicalType, TypeFamily, Value};
use vector::DataChunk;

/// ColumnInfo is the schema-layer record for one column: its source JSON
/// path, its encoded name, its family/type (mutable until a non-null value
/// pins it), and its position in the owned table.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub json_path: String,
    pub column_name: String,
    pub family: TypeFamily,
    pub ty: LogicalType,
    pub column_index: usize,
    pub is_array_element: bool,
    pub array_index: Option<usize>,
}

/// TableStorage owns one columnar table, its ordered column-info list, and
/// the path-to-index map that lets path extraction land values in the
/// right column. `_id` is pre-registered at index 0 so every document gets
/// a stable row identity regardless of what fields it carries.
pub struct TableStorage {
    table: storage::DataTable,
    columns: Vec<ColumnInfo>,
    path_to_index: HashMap<String, usize>,
    name_to_index: HashMap<String, usize>,
    config: ExtractConfig,
}

impl TableStorage {
    pub fn new(config: ExtractConfig) -> Self {
        let id_def = ColumnDefinition::new("_id", ComplexLogicalType::new(LogicalType::StringLiteral));
        let table = storage::DataTable::new(vec![id_def]);
        let mut instance = TableStorage {
            table,
            columns: Vec::new(),
            path_to_index: HashMap::new(),
            name_to_index: HashMap::new(),
            config,
        };
        instance.columns.push(ColumnInfo {
            json_path: "/_id".to_string(),
            column_name: "_id".to_string(),
            family: TypeFamily::String,
            ty: LogicalType::StringLiteral,
            column_index: 0,
            is_array_element: false,
            array_index: None,
        });
        instance.path_to_index.insert("/_id".to_string(), 0);
        instance.name_to_index.insert("_id".to_string(), 0);
        instance
    }

    pub fn has_column(&self, path: &str) -> bool {
        self.path_to_index.contains_key(path)
    }

    pub fn get_column_info(&self, path: &str) -> Option<&ColumnInfo> {
        self.path_to_index.get(path).map(|&i| &self.columns[i])
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn table(&self) -> &storage::DataTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut storage::DataTable {
        &mut self.table
    }

    /// Extracts `doc`'s paths and returns only the ones not already present
    /// in the schema; does not mutate `self`.
    pub fn evolve_from_document<N: AsNode>(&self, doc: &N) -> Result<Vec<ExtractedPath>> {
        let extracted = extract_paths(doc, &self.config)?;
        Ok(extracted.into_iter().filter(|e| !self.path_to_index.contains_key(&e.path)).collect())
    }

    /// Adds `new_columns` to the schema in one evolution pass, deduplicating
    /// by path (first occurrence wins) and skipping anything already
    /// registered.
    pub fn evolve_schema(&mut self, new_columns: Vec<ExtractedPath>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for col in new_columns {
            if self.path_to_index.contains_key(&col.path) {
                continue;
            }
            if !seen.insert(col.path.clone()) {
                continue;
            }
            ordered.push(col);
        }
        if ordered.is_empty() {
            return Ok(());
        }
        tracing::info!(
            new_columns = ordered.len(),
            total_columns = self.columns.len() + ordered.len(),
            "evolving schema"
        );
        let defs: Vec<ColumnDefinition> = ordered
            .iter()
            .map(|c| ColumnDefinition::new(c.column_name.clone(), ComplexLogicalType::new(c.concrete_type)))
            .collect();
        let table = std::mem::replace(&mut self.table, storage::DataTable::new(Vec::new()));
        self.table = table.evolve(&defs);
        for c in ordered {
            let column_index = self.columns.len();
            self.path_to_index.insert(c.path.clone(), column_index);
            self.name_to_index.insert(c.column_name.clone(), column_index);
            self.columns.push(ColumnInfo {
                json_path: c.path,
                column_name: c.column_name,
                family: c.family,
                ty: c.concrete_type,
                column_index,
                is_array_element: c.is_array_element,
                array_index: c.array_index,
            });
        }
        Ok(())
    }

    /// Seeds the schema from an INSERT VALUES row: `(name, type)` pairs
    /// where `name` may carry a leading `/` or not — both are treated as
    /// the same flat root-level column.
    pub fn evolve_schema_from_types(&mut self, columns: &[(String, LogicalType)]) -> Result<()> {
        let mut new_cols = Vec::new();
        for (raw_name, ty) in columns {
            let trimmed = raw_name.trim_start_matches('/');
            let json_path = format!("/{trimmed}");
            if self.path_to_index.contains_key(&json_path) {
                continue;
            }
            new_cols.push(ExtractedPath {
                path: json_path,
                column_name: trimmed.replace('/', "_dot_"),
                family: ty.family(),
                concrete_type: *ty,
                is_array_element: false,
                array_index: None,
                is_nullable: true,
            });
        }
        self.evolve_schema(new_cols)
    }

    /// prepare_insert runs the full batch algorithm: evolve once for every
    /// newly-discovered path, check (and pin) types, then fill one chunk
    /// sized to `docs.len()`. A `None` entry stands for an invalid document
    /// — its row comes back all-null without affecting any other row.
    pub fn prepare_insert<N: AsNode>(&mut self, docs: &[Option<N>]) -> Result<DataChunk> {
        let mut per_doc: Vec<Option<Vec<ExtractedPath>>> = Vec::with_capacity(docs.len());
        let mut pending = Vec::new();
        let mut pending_seen = HashSet::new();
        for doc_opt in docs {
            match doc_opt {
                Some(doc) => {
                    let extracted = extract_paths(doc, &self.config)?;
                    for e in &extracted {
                        if !self.path_to_index.contains_key(&e.path) && pending_seen.insert(e.path.clone()) {
                            pending.push(e.clone());
                        }
                    }
                    per_doc.push(Some(extracted));
                }
                None => per_doc.push(None),
            }
        }
        self.evolve_schema(pending)?;

        for extracted in per_doc.iter().flatten() {
            for e in extracted {
                let idx = *self.path_to_index.get(&e.path).expect("path registered by evolve_schema above");
                let info = &mut self.columns[idx];
                match info.family.merge(e.family) {
                    Ok(merged) => {
                        if info.family == TypeFamily::None && merged != TypeFamily::None {
                            info.family = merged;
                            info.ty = e.concrete_type;
                        }
                    }
                    Err((existing, inferred)) => {
                        return Err(Error::TypeConflict {
                            path: e.path.clone(),
                            existing,
                            inferred,
                        });
                    }
                }
            }
        }

        let types = self.table.types();
        let mut chunk = DataChunk::new(&types, docs.len().max(1));
        chunk.set_cardinality(docs.len());
        let base_row = self.table.row_count();
        for (row, doc_opt) in docs.iter().enumerate() {
            match doc_opt {
                None => {
                    for col in 0..self.columns.len() {
                        chunk.set_value(col, row, Value::null());
                    }
                }
                Some(doc) => {
                    for (col, info) in self.columns.iter().enumerate() {
                        let located = Pointer::from_str(&info.json_path).query_node(doc);
                        let mut value = located.map(|n| node_to_value(n, info.ty)).unwrap_or_else(Value::null);
                        if col == 0 && info.column_name == "_id" && value.is_null() {
                            value = Value::from_string(synthesize_id(base_row + row));
                        }
                        chunk.set_value(col, row, value);
                    }
                }
            }
        }
        Ok(chunk)
    }
}

/// Standardizes `_id` synthesis where spec.md leaves it an open question:
/// a 24-char zero-padded decimal of the row's position in the table.
fn synthesize_id(row: usize) -> String {
    format!("{row:024}")
}

fn node_to_value<N: AsNode>(node: &N, ty: LogicalType) -> Value {
    let raw = match node.as_node() {
        Node::Null => Value::null(),
        Node::Bool(b) => Value::from_bool(b),
        Node::NegInt(v) => Value::from_i64(v),
        Node::PosInt(v) => Value::from_i64(v as i64),
        Node::Float(v) => Value::from_f64(v),
        Node::String(s) => Value::from_string(s.to_string()),
        Node::Bytes(b) => Value::from_blob(b.to_vec()),
        Node::Array(_) | Node::Object(_) => Value::from_string(stringify_node(node)),
    };
    let target = ComplexLogicalType::new(ty);
    raw.cast_as(&target).unwrap_or(raw)
}

fn stringify_node<N: AsNode>(node: &N) -> String {
    match node.as_node() {
        Node::Null => "null".to_string(),
        Node::Bool(b) => b.to_string(),
        Node::NegInt(v) => v.to_string(),
        Node::PosInt(v) => v.to_string(),
        Node::Float(v) => v.to_string(),
        Node::String(s) => s.to_string(),
        Node::Bytes(b) => format!("{:?}", b),
        Node::Array(items) => {
            let parts: Vec<String> = items.iter().map(stringify_node).collect();
            format!("[{}]", parts.join(","))
        }
        Node::Object(fields) => {
            let parts: Vec<String> = fields.iter().map(|f| format!("{}:{}", f.property(), stringify_node(f.value()))).collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}
