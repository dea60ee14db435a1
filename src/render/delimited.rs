use csv::Writer;
use crate::audit::{AuditReport, FindingTableRow};
use crate::diff::DiffResult;
use crate::document::Document;
use crate::error::{InterrogatorError, Result};
use crate::report::InventoryReport;
use crate::resource::ResourceKind;
use super::rows::{tabulate, value_text, CellStyle};

pub fn documents(kind: ResourceKind, docs: &[Document]) -> Result<String> {
    let set = tabulate(kind, docs, CellStyle::Full)?;
    let records = set
        .rows
        .into_iter()
        .map(|row| row.cells.into_iter().map(|(_, v)| v).collect());
    write(set.columns, records)
}

pub fn diff(result: &DiffResult) -> Result<String> {
    let records = result.changes.iter().map(|change| {
        vec![
            change.path.clone(),
            value_text(change.delta.old_value(), CellStyle::Full),
            value_text(change.delta.new_value(), CellStyle::Full),
        ]
    });
    write(vec!["path".into(), "old".into(), "new".into()], records)
}

pub fn audit(report: &AuditReport) -> Result<String> {
    let header = FindingTableRow::headers().iter().map(|h| h.to_string()).collect();
    let records = report
        .findings
        .iter()
        .map(|f| FindingTableRow::from(f).into_record());
    write(header, records)
}

pub fn inventory(report: &InventoryReport) -> Result<String> {
    let records = report.summary.iter().map(|entry| {
        vec![
            entry.kind.to_string(),
            entry.count.map(|c| c.to_string()).unwrap_or_default(),
            entry.error.clone().unwrap_or_default(),
        ]
    });
    write(vec!["kind".into(), "count".into(), "error".into()], records)
}

/// Header plus records, RFC 4180 quoting. Records of a different width
/// than the header are an error.
fn write(header: Vec<String>, records: impl Iterator<Item = Vec<String>>) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(&header)?;
    for record in records {
        wtr.write_record(&record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| InterrogatorError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))?;
    String::from_utf8(bytes)
        .map_err(|e| InterrogatorError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
