use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::Table;
use crate::audit::{AuditReport, FindingTableRow};
use crate::diff::DiffResult;
use crate::document::Document;
use crate::error::Result;
use crate::report::InventoryReport;
use crate::resource::ResourceKind;
use super::rows::{tabulate, value_text, CellStyle};

pub fn documents(kind: ResourceKind, docs: &[Document]) -> Result<String> {
    if docs.is_empty() {
        return Ok(format!("no {} found\n", kind));
    }

    let set = tabulate(kind, docs, CellStyle::Compact)?;
    let records = set
        .rows
        .iter()
        .map(|row| row.values().into_iter().map(str::to_string).collect());
    Ok(grid(set.columns, records))
}

pub fn diff(result: &DiffResult) -> String {
    if result.changes.is_empty() {
        return "no differences\n".to_string();
    }

    let records = result.changes.iter().map(|change| {
        vec![
            change.path.clone(),
            value_text(change.delta.old_value(), CellStyle::Compact),
            value_text(change.delta.new_value(), CellStyle::Compact),
        ]
    });
    grid(vec!["path".into(), "old".into(), "new".into()], records)
}

pub fn audit(report: &AuditReport) -> String {
    if report.findings.is_empty() {
        return "no findings\n".to_string();
    }

    let rows: Vec<FindingTableRow> = report.findings.iter().map(FindingTableRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    format!("{}\n", table)
}

pub fn inventory(report: &InventoryReport) -> String {
    let records = report.summary.iter().map(|entry| {
        vec![
            entry.kind.to_string(),
            entry.count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            entry.error.clone().unwrap_or_default(),
        ]
    });
    grid(vec!["kind".into(), "count".into(), "error".into()], records)
}

fn grid(header: Vec<String>, records: impl Iterator<Item = Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for record in records {
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::markdown());
    format!("{}\n", table)
}
