use serde::Serialize;
use tabled::Tabled;
use crate::document::{Document, ResourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Empty,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Empty => "empty",
        }
    }
}

/// A resource that qualified during an audit pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditFinding {
    pub id: ResourceId,
    pub name: String,
    pub kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Document>,
}

/// A group the audit could not classify.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedGroup {
    pub id: Option<ResourceId>,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditReport {
    pub scanned: usize,
    pub findings: Vec<AuditFinding>,
    pub skipped: Vec<SkippedGroup>,
}

impl AuditReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn finding_ids(&self) -> Vec<&ResourceId> {
        self.findings.iter().map(|f| &f.id).collect()
    }
}

#[derive(Debug, Clone, Tabled)]
pub struct FindingTableRow {
    #[tabled(rename = "id")]
    pub id: String,
    #[tabled(rename = "name")]
    pub name: String,
    #[tabled(rename = "finding")]
    pub finding: String,
    #[tabled(rename = "evidence")]
    pub evidence: String,
}

impl From<&AuditFinding> for FindingTableRow {
    fn from(finding: &AuditFinding) -> Self {
        FindingTableRow {
            id: finding.id.to_string(),
            name: finding.name.clone(),
            finding: finding.kind.as_str().to_string(),
            evidence: finding
                .evidence
                .as_ref()
                .map(Document::to_compact_json)
                .unwrap_or_default(),
        }
    }
}

impl FindingTableRow {
    pub fn headers() -> [&'static str; 4] {
        ["id", "name", "finding", "evidence"]
    }

    pub fn into_record(self) -> Vec<String> {
        vec![self.id, self.name, self.finding, self.evidence]
    }
}
