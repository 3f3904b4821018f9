/// Node is the generic form of a document node: an object, an array, or a
/// scalar leaf. It's implemented by whatever concrete representation a
/// collection's documents are parsed into; today that's `serde_json::Value`.
#[derive(Debug)]
pub enum Node<'a, N: AsNode> {
    Array(&'a [N]),
    Bool(bool),
    Bytes(&'a [u8]),
    Float(f64),
    NegInt(i64),
    Null,
    Object(&'a N::Fields),
    PosInt(u64),
    String(&'a str),
}

/// AsNode is the trait by which a specific document representation is
/// accessed through a generic Node. The JSON parser that produces the
/// concrete document tree is an external collaborator; this crate only
/// consumes the read-only trie it hands back.
pub trait AsNode: Sized {
    type Fields: Fields<Self> + ?Sized;

    /// Convert an AsNode into a Node.
    fn as_node<'a>(&'a self) -> Node<'a, Self>;
}

/// Fields is the generic form of a document object's field collection.
pub trait Fields<N: AsNode> {
    type Field<'a>: Field<'a, N>
    where
        Self: 'a;

    type Iter<'a>: ExactSizeIterator<Item = Self::Field<'a>>
    where
        Self: 'a;

    fn get<'a>(&'a self, property: &str) -> Option<Self::Field<'a>>;
    fn len(&self) -> usize;
    fn iter<'a>(&'a self) -> Self::Iter<'a>;
}

/// Field is the generic form of a single document object field.
pub trait Field<'a, N: AsNode> {
    fn property(&self) -> &'a str;
    fn value(&self) -> &'a N;
}

// serde_json::Value is the only AsNode implementation the engine needs: it's
// the shape documents take once the (out-of-scope) JSON parser hands them in.
mod value;

// All implementations of AsNode may be compared with one another.
mod compare;
pub use compare::compare;

mod varint;

// A JSON Pointer implementation used to address and query document locations.
pub mod ptr;
pub use ptr::Pointer;

// Document is the narrow read-only interface (has / is_<type> / get_<type>)
// that the path extractor and dynamic schema are built against.
mod document;
pub use document::{Document, PhysicalType};

#[cfg(test)]
mod test {
    use super::{compare, Document};
    use serde_json::json;
    use std::cmp::Ordering;

    #[test]
    fn test_document_probes() {
        let doc = Document::new(json!({
            "did": "u1",
            "commit": {"collection": "app.bsky.feed.post", "rev": 42},
            "tags": ["a", "b", "c"],
            "active": true,
            "score": null,
        }));

        assert!(doc.has("/did"));
        assert!(doc.is_string("/did"));
        assert_eq!(doc.get_string("/did"), Some("u1"));

        assert!(doc.has("/commit/rev"));
        assert!(doc.is_i64("/commit/rev"));
        assert_eq!(doc.get_i64("/commit/rev"), Some(42));

        assert!(doc.has("/tags/1"));
        assert_eq!(doc.get_string("/tags/1"), Some("b"));

        assert!(doc.is_bool("/active"));
        assert_eq!(doc.get_bool("/active"), Some(true));

        // Present but null: `has` is true, every typed probe is false.
        assert!(doc.has("/score"));
        assert!(!doc.is_i64("/score"));
        assert!(doc.get_i64("/score").is_none());

        assert!(!doc.has("/missing"));
    }

    #[test]
    fn test_compare_consistent_with_doc_ordering() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"a": 1, "b": 3});
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&b, &a), Ordering::Greater);
        assert_eq!(compare(&a, &a), Ordering::Equal);
    }
}
