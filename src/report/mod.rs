//! Inventory summary across every resource kind.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use crate::document::Document;
use crate::resource::{ResourceClient, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryEntry {
    pub kind: ResourceKind,
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub summary: Vec<InventoryEntry>,
    pub details: BTreeMap<ResourceKind, Vec<Document>>,
}

impl InventoryReport {
    pub fn count(&self, kind: ResourceKind) -> Option<usize> {
        self.summary.iter().find(|e| e.kind == kind).and_then(|e| e.count)
    }

    pub fn failed_kinds(&self) -> Vec<ResourceKind> {
        self.summary.iter().filter(|e| e.error.is_some()).map(|e| e.kind).collect()
    }
}

/// Lists every requested kind; a kind that fails to list is reported with
/// its error instead of aborting the report.
pub async fn build_inventory<C>(client: &C, kinds: &[ResourceKind]) -> InventoryReport
where
    C: ResourceClient + ?Sized,
{
    let mut summary = Vec::with_capacity(kinds.len());
    let mut details = BTreeMap::new();

    for &kind in kinds {
        match client.list(kind).await {
            Ok(documents) => {
                debug!("added {} {} to report", documents.len(), kind);
                summary.push(InventoryEntry {
                    kind,
                    count: Some(documents.len()),
                    error: None,
                });
                details.insert(kind, documents);
            }
            Err(e) => {
                warn!("could not list {} for report: {}", kind, e);
                summary.push(InventoryEntry {
                    kind,
                    count: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    InventoryReport {
        generated_at: Utc::now(),
        summary,
        details,
    }
}
