use crate::error::{Error, Result};
use doc::{AsNode, Field, Fields, Node};
use value::{LogicalType, TypeFamily};

/// ExtractConfig governs how a document's trie is flattened into columns.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub max_array_size: usize,
    pub flatten_arrays: bool,
    pub use_separate_array_table: bool,
    pub extract_nested_objects: bool,
    pub max_nesting_depth: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            max_array_size: 100,
            flatten_arrays: true,
            use_separate_array_table: false,
            extract_nested_objects: true,
            max_nesting_depth: 10,
        }
    }
}

/// One leaf discovered while walking a document: its JSON-pointer path, its
/// SQL-safe encoded column name, its inferred family/type, and whether it
/// came from flattening an array.
#[derive(Debug, Clone)]
pub struct ExtractedPath {
    pub path: String,
    pub column_name: String,
    pub family: TypeFamily,
    pub concrete_type: LogicalType,
    pub is_array_element: bool,
    pub array_index: Option<usize>,
    pub is_nullable: bool,
}

/// join_path is the encoder's object-nesting rule: empty parent returns the
/// child unchanged, otherwise the two are joined with a literal `_dot_`.
pub fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}_dot_{child}")
    }
}

/// join_array appends the array-flattening marker for element `index`.
pub fn join_array(parent: &str, index: usize) -> String {
    format!("{parent}_arr{index}_")
}

/// decode_column_name inverts `join_path`/`join_array` character by
/// character, reconstructing the original JSON-pointer path.
pub fn decode_column_name(name: &str) -> String {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < name.len() {
        if name[i..].starts_with("_dot_") {
            segments.push(std::mem::take(&mut current));
            i += "_dot_".len();
            continue;
        }
        if name[i..].starts_with("_arr") {
            let rest = &name[i + 4..];
            let digit_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            if digit_len > 0 && rest.as_bytes().get(digit_len) == Some(&b'_') {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                segments.push(rest[..digit_len].to_string());
                i += 4 + digit_len + 1;
                continue;
            }
        }
        let ch = name[i..].chars().next().unwrap();
        current.push(ch);
        i += ch.len_utf8();
    }
    if !current.is_empty() {
        segments.push(current);
    }
    format!("/{}", segments.join("/"))
}

/// extract_paths walks `root`'s trie and emits one `ExtractedPath` per leaf,
/// per the traversal rules in `config`.
pub fn extract_paths<N: AsNode>(root: &N, config: &ExtractConfig) -> Result<Vec<ExtractedPath>> {
    let mut out = Vec::new();
    walk(root, "", "", 0, None, config, &mut out)?;
    Ok(out)
}

fn walk<N: AsNode>(
    node: &N,
    json_path: &str,
    column_name: &str,
    depth: usize,
    array_ctx: Option<usize>,
    config: &ExtractConfig,
    out: &mut Vec<ExtractedPath>,
) -> Result<()> {
    if depth > config.max_nesting_depth {
        return Err(Error::SchemaLimitExceeded {
            kind: "nesting depth exceeded",
            path: json_path.to_string(),
        });
    }
    match node.as_node() {
        Node::Object(fields) => {
            if !config.extract_nested_objects && depth > 0 {
                return Ok(());
            }
            for field in fields.iter() {
                let prop = field.property();
                let child_json = format!("{json_path}/{prop}");
                let child_col = join_path(column_name, prop);
                walk(field.value(), &child_json, &child_col, depth + 1, array_ctx, config, out)?;
            }
            Ok(())
        }
        Node::Array(items) => {
            if config.flatten_arrays {
                for (i, elem) in items.iter().enumerate() {
                    if i >= config.max_array_size {
                        return Err(Error::SchemaLimitExceeded {
                            kind: "array size exceeded",
                            path: json_path.to_string(),
                        });
                    }
                    let child_json = format!("{json_path}/{i}");
                    let child_col = join_array(column_name, i);
                    walk(elem, &child_json, &child_col, depth + 1, Some(i), config, out)?;
                }
                Ok(())
            } else if config.use_separate_array_table {
                Ok(())
            } else {
                out.push(ExtractedPath {
                    path: json_path.to_string(),
                    column_name: column_name.to_string(),
                    family: TypeFamily::String,
                    concrete_type: LogicalType::StringLiteral,
                    is_array_element: false,
                    array_index: None,
                    is_nullable: true,
                });
                Ok(())
            }
        }
        leaf => {
            let (family, concrete_type) = leaf_type(&leaf);
            out.push(ExtractedPath {
                path: json_path.to_string(),
                column_name: column_name.to_string(),
                family,
                concrete_type,
                is_array_element: array_ctx.is_some(),
                array_index: array_ctx,
                is_nullable: matches!(leaf, Node::Null),
            });
            Ok(())
        }
    }
}

fn leaf_type<N: AsNode>(node: &Node<'_, N>) -> (TypeFamily, LogicalType) {
    match node {
        Node::Null => (TypeFamily::None, LogicalType::StringLiteral),
        Node::Bool(_) => (TypeFamily::Bool, LogicalType::Boolean),
        Node::NegInt(_) => (TypeFamily::Int, LogicalType::Bigint),
        Node::PosInt(v) => {
            if i64::try_from(*v).is_ok() {
                (TypeFamily::Int, LogicalType::Bigint)
            } else {
                (TypeFamily::Int, LogicalType::Ubigint)
            }
        }
        Node::Float(_) => (TypeFamily::Float, LogicalType::Double),
        Node::String(_) => (TypeFamily::String, LogicalType::StringLiteral),
        Node::Bytes(_) => (TypeFamily::String, LogicalType::Blob),
        Node::Array(_) | Node::Object(_) => unreachable!("composite nodes are handled by the caller"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn flat_object_infers_types() {
        let doc = json!({"did": "u1", "kind": "commit", "time_us": 12345, "active": true});
        let paths = extract_paths(&doc, &ExtractConfig::default()).unwrap();
        assert_eq!(paths.len(), 4);
        let did = paths.iter().find(|p| p.column_name == "did").unwrap();
        assert_eq!(did.family, TypeFamily::String);
        let active = paths.iter().find(|p| p.column_name == "active").unwrap();
        assert_eq!(active.family, TypeFamily::Bool);
        let time_us = paths.iter().find(|p| p.column_name == "time_us").unwrap();
        assert_eq!(time_us.family, TypeFamily::Int);
    }

    #[test]
    fn nested_object_joins_with_dot_marker() {
        let doc = json!({"did": "u1", "commit": {"collection": "app.bsky.feed.post", "rev": 42}});
        let paths = extract_paths(&doc, &ExtractConfig::default()).unwrap();
        let names: Vec<&str> = paths.iter().map(|p| p.column_name.as_str()).collect();
        assert!(names.contains(&"commit_dot_collection"));
        assert!(names.contains(&"commit_dot_rev"));
        let rev = paths.iter().find(|p| p.column_name == "commit_dot_rev").unwrap();
        assert_eq!(rev.path, "/commit/rev");
    }

    #[test]
    fn array_flattens_one_column_per_element() {
        let doc = json!({"tags": ["a", "b", "c"]});
        let paths = extract_paths(&doc, &ExtractConfig::default()).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().any(|p| p.column_name == "tags_arr1_" && p.array_index == Some(1)));
    }

    #[test]
    fn array_over_limit_is_rejected() {
        let items: Vec<i32> = (0..5).collect();
        let doc = json!({"xs": items});
        let mut config = ExtractConfig::default();
        config.max_array_size = 3;
        let err = extract_paths(&doc, &config).unwrap_err();
        assert!(matches!(err, Error::SchemaLimitExceeded { kind: "array size exceeded", .. }));
    }

    #[test]
    fn column_name_round_trips_through_decode() {
        for (path, expected_name) in [
            ("/commit/rev", "commit_dot_rev"),
            ("/tags/1", "tags_arr1_"),
            ("/did", "did"),
        ] {
            assert_eq!(decode_column_name(expected_name), path);
        }
    }

    #[test]
    fn null_leaf_has_none_family() {
        let doc = json!({"score": null});
        let paths = extract_paths(&doc, &ExtractConfig::default()).unwrap();
        assert_eq!(paths[0].family, TypeFamily::None);
        assert!(paths[0].is_nullable);
    }
}
