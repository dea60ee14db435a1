pub mod error;
pub mod document;
pub mod resource;
pub mod diff;
pub mod render;
pub mod audit;
pub mod report;

pub use error::{InterrogatorError, FetchError, Result};
pub use document::{Document, ResourceId, Shape};
pub use resource::{ResourceKind, KindSpec, REGISTRY, ResourceClient, MembershipResolver, FetchedDocument, SnapshotClient, fetch_tagged};
pub use diff::{diff, diff_documents, Change, DeltaNode, DiffResult, DiffSummary, PathSegment, format_text_diff, multiline_changes};
pub use render::{render, OutputFormat, Payload, RenderRow, RowSet};
pub use audit::{audit_empty_groups, AuditOptions, AuditFinding, AuditReport, FindingKind, SkippedGroup};
pub use report::{build_inventory, InventoryEntry, InventoryReport};
