//! Table, JSON and CSV rendering of documents, diffs, audits and reports.
//!
//! Output is produced as a complete `String`; callers print or persist it
//! only after rendering succeeded.

mod delimited;
mod format;
mod rows;
mod table;

use std::path::Path;
use serde::Serialize;
use crate::audit::AuditReport;
use crate::diff::DiffResult;
use crate::document::Document;
use crate::error::Result;
use crate::report::InventoryReport;
use crate::resource::ResourceKind;

pub use format::OutputFormat;
pub use rows::{cell_text, tabulate, value_text, CellStyle, RenderRow, RowSet, VALUE_COLUMN};

/// What a command hands to the renderer.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// A collection from `list` or `search`.
    Documents { kind: ResourceKind, documents: &'a [Document] },
    /// A single record from `details`.
    Document { kind: ResourceKind, document: &'a Document },
    Diff(&'a DiffResult),
    Audit(&'a AuditReport),
    Inventory(&'a InventoryReport),
}

pub fn render(format: OutputFormat, payload: Payload<'_>) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(payload),
        OutputFormat::Table => match payload {
            Payload::Documents { kind, documents } => table::documents(kind, documents),
            Payload::Document { kind, document } => table::documents(kind, std::slice::from_ref(document)),
            Payload::Diff(result) => Ok(table::diff(result)),
            Payload::Audit(report) => Ok(table::audit(report)),
            Payload::Inventory(report) => Ok(table::inventory(report)),
        },
        OutputFormat::Csv => match payload {
            Payload::Documents { kind, documents } => delimited::documents(kind, documents),
            Payload::Document { kind, document } => delimited::documents(kind, std::slice::from_ref(document)),
            Payload::Diff(result) => delimited::diff(result),
            Payload::Audit(report) => delimited::audit(report),
            Payload::Inventory(report) => delimited::inventory(report),
        },
    }
}

fn render_json(payload: Payload<'_>) -> Result<String> {
    let text = match payload {
        Payload::Documents { documents, .. } => to_json(documents)?,
        Payload::Document { document, .. } => to_json(document)?,
        Payload::Diff(result) => to_json(result)?,
        Payload::Audit(report) => to_json(&report.findings)?,
        Payload::Inventory(report) => to_json(report)?,
    };
    Ok(format!("{}\n", text))
}

/// Writes rendered output to `path`, creating parent directories.
pub fn persist(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
