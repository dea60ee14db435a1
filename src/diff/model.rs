//! Delta tree produced by the diff engine.
//!
//! Children of a `Nested` node live in a `BTreeMap`, so every traversal
//! visits mapping keys in sorted order and sequence indices ascending.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::document::{Document, ResourceId};
use crate::resource::ResourceKind;

/// One step from a parent document into a child.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Appends this segment to a dotted path (`scope.computers[0].id`).
    ///
    /// Keys that are empty or contain path syntax are written in bracket
    /// form, `["a.b"]`, so every path names exactly one location.
    pub fn append_to(&self, prefix: &str) -> String {
        match self {
            PathSegment::Key(key) if needs_quoting(key) => format!("{}[\"{}\"]", prefix, escape_key(key)),
            PathSegment::Key(key) if prefix.is_empty() => key.clone(),
            PathSegment::Key(key) => format!("{}.{}", prefix, key),
            PathSegment::Index(index) => format!("{}[{}]", prefix, index),
        }
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"', '\\'])
}

fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let index = raw
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|digits| digits.parse::<usize>().ok());
        Ok(match index {
            Some(i) => PathSegment::Index(i),
            None => PathSegment::Key(raw),
        })
    }
}

/// Comparison result at one path of two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeltaNode {
    Unchanged,
    Added { value: Document },
    Removed { value: Document },
    Changed { old: Document, new: Document },
    /// Never empty; an empty nested diff is `Unchanged`.
    Nested { children: BTreeMap<PathSegment, DeltaNode> },
}

impl DeltaNode {
    /// Wraps child deltas, collapsing to `Unchanged` when there are none.
    pub fn nested(children: BTreeMap<PathSegment, DeltaNode>) -> Self {
        if children.is_empty() {
            DeltaNode::Unchanged
        } else {
            DeltaNode::Nested { children }
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, DeltaNode::Unchanged)
    }

    pub fn is_leaf_change(&self) -> bool {
        matches!(
            self,
            DeltaNode::Added { .. } | DeltaNode::Removed { .. } | DeltaNode::Changed { .. }
        )
    }

    /// The delta of the same comparison with its sides swapped.
    pub fn invert(&self) -> DeltaNode {
        match self {
            DeltaNode::Unchanged => DeltaNode::Unchanged,
            DeltaNode::Added { value } => DeltaNode::Removed { value: value.clone() },
            DeltaNode::Removed { value } => DeltaNode::Added { value: value.clone() },
            DeltaNode::Changed { old, new } => DeltaNode::Changed {
                old: new.clone(),
                new: old.clone(),
            },
            DeltaNode::Nested { children } => DeltaNode::Nested {
                children: children.iter().map(|(k, v)| (k.clone(), v.invert())).collect(),
            },
        }
    }

    /// Value on the left side, if the path existed there.
    pub fn old_value(&self) -> Option<&Document> {
        match self {
            DeltaNode::Removed { value } => Some(value),
            DeltaNode::Changed { old, .. } => Some(old),
            _ => None,
        }
    }

    /// Value on the right side, if the path exists there.
    pub fn new_value(&self) -> Option<&Document> {
        match self {
            DeltaNode::Added { value } => Some(value),
            DeltaNode::Changed { new, .. } => Some(new),
            _ => None,
        }
    }
}

/// A leaf-level change at a flattened path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub path: String,
    #[serde(flatten)]
    pub delta: DeltaNode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.added + self.removed + self.changed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub kind: ResourceKind,
    pub left: ResourceId,
    pub right: ResourceId,
    pub root: DeltaNode,
    /// Leaf changes only, depth-first in sorted key order.
    pub changes: Vec<Change>,
}

impl DiffResult {
    pub fn is_unchanged(&self) -> bool {
        self.root.is_unchanged()
    }

    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for change in &self.changes {
            match change.delta {
                DeltaNode::Added { .. } => summary.added += 1,
                DeltaNode::Removed { .. } => summary.removed += 1,
                DeltaNode::Changed { .. } => summary.changed += 1,
                DeltaNode::Unchanged | DeltaNode::Nested { .. } => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_append() {
        let path = PathSegment::Key("scope".into()).append_to("");
        let path = PathSegment::Key("computers".into()).append_to(&path);
        let path = PathSegment::Index(0).append_to(&path);
        assert_eq!(PathSegment::Key("id".into()).append_to(&path), "scope.computers[0].id");
        assert_eq!(PathSegment::Index(3).append_to(""), "[3]");
    }

    #[test]
    fn test_keys_with_path_syntax_are_quoted() {
        assert_eq!(PathSegment::Key("a.b".into()).append_to(""), r#"["a.b"]"#);
        assert_eq!(PathSegment::Key("x[0]".into()).append_to("attrs"), r#"attrs["x[0]"]"#);
        assert_eq!(PathSegment::Key(r#"say "hi""#.into()).append_to("p"), r#"p["say \"hi\""]"#);
        assert_eq!(PathSegment::Key(String::new()).append_to("p"), r#"p[""]"#);
        assert_eq!(PathSegment::Key("plain_key".into()).append_to("p"), "p.plain_key");
    }

    #[test]
    fn test_nested_collapses_when_empty() {
        assert_eq!(DeltaNode::nested(BTreeMap::new()), DeltaNode::Unchanged);
    }

    #[test]
    fn test_changed_serializes_as_tagged_object() {
        let node = DeltaNode::Changed {
            old: Document::from("Update"),
            new: Document::from("Update v2"),
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value, json!({"type": "changed", "old": "Update", "new": "Update v2"}));
    }

    #[test]
    fn test_nested_keys_serialize_as_strings() {
        let mut children = BTreeMap::new();
        children.insert(PathSegment::Index(1), DeltaNode::Added { value: Document::from(json!({"id": 2})) });
        let value = serde_json::to_value(DeltaNode::nested(children)).unwrap();
        assert_eq!(value, json!({"type": "nested", "children": {"[1]": {"type": "added", "value": {"id": 2}}}}));
    }

    #[test]
    fn test_change_flattens_delta_fields() {
        let change = Change {
            path: "packages[1]".into(),
            delta: DeltaNode::Removed { value: Document::from(1u64) },
        };
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value, json!({"path": "packages[1]", "type": "removed", "value": 1}));
    }

    #[test]
    fn test_path_segment_deserialize() {
        let seg: PathSegment = serde_json::from_str("\"[12]\"").unwrap();
        assert_eq!(seg, PathSegment::Index(12));
        let seg: PathSegment = serde_json::from_str("\"[x]\"").unwrap();
        assert_eq!(seg, PathSegment::Key("[x]".into()));
    }
}
