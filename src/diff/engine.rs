use std::collections::BTreeMap;
use tracing::debug;
use crate::document::Document;
use crate::error::{InterrogatorError, Result};
use crate::resource::FetchedDocument;
use super::model::{Change, DeltaNode, DiffResult, PathSegment};

/// Compares two resources fetched under the same kind.
pub fn diff(left: &FetchedDocument, right: &FetchedDocument) -> Result<DiffResult> {
    if left.kind != right.kind {
        return Err(InterrogatorError::KindMismatch {
            left: left.kind.to_string(),
            right: right.kind.to_string(),
        });
    }

    let root = diff_documents(&left.document, &right.document);
    let changes = flatten(&root);

    debug!(
        "diffed {} {} against {}: {} leaf changes",
        left.kind,
        left.id,
        right.id,
        changes.len()
    );

    Ok(DiffResult {
        kind: left.kind,
        left: left.id.clone(),
        right: right.id.clone(),
        root,
        changes,
    })
}

/// Structural, type-driven comparison of two documents.
///
/// Sequences are compared by index; mappings over the union of their keys.
/// Values of different shapes are `Changed` without recursing.
pub fn diff_documents(left: &Document, right: &Document) -> DeltaNode {
    match (left, right) {
        (Document::Sequence(a), Document::Sequence(b)) => diff_sequences(a, b),
        (Document::Mapping(a), Document::Mapping(b)) => diff_mappings(a, b),
        (a, b) if a == b => DeltaNode::Unchanged,
        (a, b) => DeltaNode::Changed {
            old: a.clone(),
            new: b.clone(),
        },
    }
}

fn diff_sequences(left: &[Document], right: &[Document]) -> DeltaNode {
    let mut children = BTreeMap::new();

    for index in 0..left.len().max(right.len()) {
        let delta = match (left.get(index), right.get(index)) {
            (Some(a), Some(b)) => diff_documents(a, b),
            (Some(a), None) => DeltaNode::Removed { value: a.clone() },
            (None, Some(b)) => DeltaNode::Added { value: b.clone() },
            (None, None) => DeltaNode::Unchanged,
        };
        if !delta.is_unchanged() {
            children.insert(PathSegment::Index(index), delta);
        }
    }

    DeltaNode::nested(children)
}

fn diff_mappings(left: &[(String, Document)], right: &[(String, Document)]) -> DeltaNode {
    let mut paired: BTreeMap<&str, (Option<&Document>, Option<&Document>)> = BTreeMap::new();
    for (key, value) in left {
        paired.entry(key.as_str()).or_default().0 = Some(value);
    }
    for (key, value) in right {
        paired.entry(key.as_str()).or_default().1 = Some(value);
    }

    let mut children = BTreeMap::new();
    for (key, sides) in paired {
        let delta = match sides {
            (Some(a), Some(b)) => diff_documents(a, b),
            (Some(a), None) => DeltaNode::Removed { value: a.clone() },
            (None, Some(b)) => DeltaNode::Added { value: b.clone() },
            (None, None) => DeltaNode::Unchanged,
        };
        if !delta.is_unchanged() {
            children.insert(PathSegment::Key(key.to_string()), delta);
        }
    }

    DeltaNode::nested(children)
}

/// Leaf changes of a delta tree, depth-first in sorted order.
pub fn flatten(root: &DeltaNode) -> Vec<Change> {
    let mut out = Vec::new();
    collect_changes(root, "", &mut out);
    out
}

fn collect_changes(node: &DeltaNode, path: &str, out: &mut Vec<Change>) {
    match node {
        DeltaNode::Unchanged => {}
        DeltaNode::Nested { children } => {
            for (segment, child) in children {
                collect_changes(child, &segment.append_to(path), out);
            }
        }
        leaf => out.push(Change {
            path: path.to_string(),
            delta: leaf.clone(),
        }),
    }
}
