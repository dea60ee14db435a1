use crate::document::{Document, Shape};
use crate::error::{InterrogatorError, Result};
use crate::resource::ResourceKind;

/// Column used when every record is a bare scalar or sequence.
pub const VALUE_COLUMN: &str = "value";

/// One flattened record: `(column, text)` pairs in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRow {
    pub cells: Vec<(String, String)>,
}

impl RenderRow {
    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|(_, v)| v.as_str()).collect()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v.as_str())
    }
}

/// Rows sharing one header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<RenderRow>,
}

/// How much of a cell survives flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// Full text; used for CSV.
    Full,
    /// First line of multi-line text only; used for tables.
    Compact,
}

/// Flattens documents of one kind into rows with a shared column set.
///
/// Columns are the union of top-level keys: the kind's hint columns first,
/// then the remaining keys in first-seen order. An empty input yields the
/// hint columns and no rows.
pub fn tabulate(kind: ResourceKind, documents: &[Document], style: CellStyle) -> Result<RowSet> {
    let mappings = documents.iter().filter(|d| d.as_mapping().is_some()).count();

    if documents.is_empty() {
        return Ok(RowSet {
            columns: kind.columns().iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        });
    }

    if mappings == 0 {
        let rows = documents
            .iter()
            .map(|d| RenderRow {
                cells: vec![(VALUE_COLUMN.to_string(), cell_text(d, style))],
            })
            .collect();
        return Ok(RowSet {
            columns: vec![VALUE_COLUMN.to_string()],
            rows,
        });
    }

    if mappings != documents.len() {
        let stray = documents
            .iter()
            .find(|d| d.as_mapping().is_none())
            .map(Document::shape)
            .unwrap_or(Shape::Null);
        return Err(InterrogatorError::UnrenderableMixedShape(format!(
            "{} records mix mappings with {} values; no common columns",
            kind,
            stray.as_str()
        )));
    }

    let columns = column_union(kind, documents);
    let rows = documents
        .iter()
        .map(|doc| RenderRow {
            cells: columns
                .iter()
                .map(|column| {
                    let text = doc.get(column).map(|v| cell_text(v, style)).unwrap_or_default();
                    (column.clone(), text)
                })
                .collect(),
        })
        .collect();

    Ok(RowSet { columns, rows })
}

fn column_union(kind: ResourceKind, documents: &[Document]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for doc in documents {
        for (key, _) in doc.as_mapping().unwrap_or_default() {
            if !seen.contains(key) {
                seen.push(key.clone());
            }
        }
    }

    if seen.is_empty() {
        return kind.columns().iter().map(|c| c.to_string()).collect();
    }

    let mut columns: Vec<String> = kind
        .columns()
        .iter()
        .filter(|hint| seen.iter().any(|k| k == *hint))
        .map(|hint| hint.to_string())
        .collect();
    for key in seen {
        if !columns.contains(&key) {
            columns.push(key);
        }
    }
    columns
}

/// Text of one cell. Nested values become a short placeholder.
pub fn cell_text(doc: &Document, style: CellStyle) -> String {
    match doc {
        Document::Null => String::new(),
        Document::Bool(b) => b.to_string(),
        Document::Number(n) => n.to_string(),
        Document::String(s) => text(s, style),
        Document::Sequence(items) => match items.len() {
            1 => "[1 item]".to_string(),
            n => format!("[{} items]", n),
        },
        Document::Mapping(entries) => match entries.len() {
            1 => "{1 key}".to_string(),
            n => format!("{{{} keys}}", n),
        },
    }
}

/// Text of one side of a change. Containers are shown as compact JSON.
pub fn value_text(doc: Option<&Document>, style: CellStyle) -> String {
    match doc {
        None => String::new(),
        Some(d) if d.is_container() => text(&d.to_compact_json(), style),
        Some(d) => cell_text(d, style),
    }
}

fn text(s: &str, style: CellStyle) -> String {
    match style {
        CellStyle::Full => s.to_string(),
        CellStyle::Compact => match s.split_once('\n') {
            Some((first, _)) => format!("{} …", first.trim_end()),
            None => s.to_string(),
        },
    }
}
