mod id;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

pub use id::ResourceId;

/// One resource instance exactly as returned by the remote system.
///
/// A closed recursive tree of the five JSON shapes. Mappings keep their
/// insertion order so table and CSV columns follow the source payload.
#[derive(Debug, Clone, Default)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Document>),
    Mapping(Vec<(String, Document)>),
}

/// Coarse shape of a document, used when reporting type mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Bool => "bool",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
        }
    }
}

impl Document {
    pub fn shape(&self) -> Shape {
        match self {
            Document::Null => Shape::Null,
            Document::Bool(_) => Shape::Bool,
            Document::Number(_) => Shape::Number,
            Document::String(_) => Shape::String,
            Document::Sequence(_) => Shape::Sequence,
            Document::Mapping(_) => Shape::Mapping,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Document::Sequence(_) | Document::Mapping(_))
    }

    /// Looks up a top-level key of a mapping.
    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Document::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Document]> {
        match self {
            Document::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, Document)]> {
        match self {
            Document::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// The resource identifier held in the `id` field, if any.
    pub fn id(&self) -> Option<ResourceId> {
        self.get("id").and_then(ResourceId::from_document)
    }

    /// The `name` field rendered as text, if present and scalar.
    pub fn name(&self) -> Option<String> {
        match self.get("name")? {
            Document::String(s) => Some(s.clone()),
            Document::Number(n) => Some(n.to_string()),
            Document::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Compact single-line JSON text of this document.
    pub fn to_compact_json(&self) -> String {
        Value::from(self.clone()).to_string()
    }

    /// Builds a mapping from `(key, value)` pairs, keeping their order.
    /// A repeated key replaces the earlier value in place.
    pub fn mapping<K, I>(entries: I) -> Document
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Document)>,
    {
        let mut out: Vec<(String, Document)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            match out.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => out.push((key, value)),
            }
        }
        Document::Mapping(out)
    }
}

/// Numbers compare by value, so `1` and `1.0` are equal.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    if !a.is_f64() && !b.is_f64() {
        // A negative integer against one above i64::MAX.
        return false;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

// Mapping equality ignores key order.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Document::Null, Document::Null) => true,
            (Document::Bool(a), Document::Bool(b)) => a == b,
            (Document::Number(a), Document::Number(b)) => numbers_equal(a, b),
            (Document::String(a), Document::String(b)) => a == b,
            (Document::Sequence(a), Document::Sequence(b)) => a == b,
            (Document::Mapping(a), Document::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| other_key == key && other_value == value)
                    })
            }
            _ => false,
        }
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => Document::Number(n),
            Value::String(s) => Document::String(s),
            Value::Array(items) => Document::Sequence(items.into_iter().map(Document::from).collect()),
            Value::Object(map) => {
                Document::Mapping(map.into_iter().map(|(k, v)| (k, Document::from(v))).collect())
            }
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        match doc {
            Document::Null => Value::Null,
            Document::Bool(b) => Value::Bool(b),
            Document::Number(n) => Value::Number(n),
            Document::String(s) => Value::String(s),
            Document::Sequence(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Document::Mapping(entries) => {
                let mut map = serde_json::Map::new();
                for (k, v) in entries {
                    map.insert(k, Value::from(v));
                }
                Value::Object(map)
            }
        }
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

impl From<u64> for Document {
    fn from(n: u64) -> Self {
        Document::Number(n.into())
    }
}

impl From<i64> for Document {
    fn from(n: i64) -> Self {
        Document::Number(n.into())
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Number(n) => n.serialize(serializer),
            Document::String(s) => serializer.serialize_str(s),
            Document::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Document::from)
    }
}
