mod empty_groups;
mod finding;

pub use empty_groups::{audit_empty_groups, AuditOptions, DEFAULT_CONCURRENCY};
pub use finding::{AuditFinding, AuditReport, FindingKind, FindingTableRow, SkippedGroup};
