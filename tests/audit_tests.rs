use async_trait::async_trait;
use jamf_interrogator::{
    audit_empty_groups, render, AuditOptions, Document, FetchError, FindingKind, MembershipResolver,
    OutputFormat, Payload, ResourceClient, ResourceId, ResourceKind, SnapshotClient,
};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fixtures_path() -> &'static Path {
    Path::new("tests/fixtures/snapshot")
}

struct FixedResolver {
    counts: HashMap<ResourceId, Result<u64, FetchError>>,
}

impl FixedResolver {
    fn new(entries: Vec<(u64, Result<u64, FetchError>)>) -> Arc<Self> {
        Arc::new(Self {
            counts: entries.into_iter().map(|(id, r)| (ResourceId::from(id), r)).collect(),
        })
    }
}

#[async_trait]
impl MembershipResolver for FixedResolver {
    async fn resolve_membership(&self, group_id: &ResourceId) -> Result<u64, FetchError> {
        self.counts
            .get(group_id)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::not_found("groups", group_id)))
    }
}

/// Sleeps on every call and records the peak number of concurrent calls.
struct SlowResolver {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowResolver {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MembershipResolver for SlowResolver {
    async fn resolve_membership(&self, _group_id: &ResourceId) -> Result<u64, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(0)
    }
}

fn groups(ids: &[u64]) -> Vec<Document> {
    ids.iter()
        .map(|id| Document::from(json!({"id": id, "name": format!("group-{}", id)})))
        .collect()
}

#[tokio::test]
async fn test_only_empty_groups_are_reported() {
    let groups = vec![
        Document::from(json!({"id": 1, "name": "A"})),
        Document::from(json!({"id": 2, "name": "B"})),
    ];
    let resolver = FixedResolver::new(vec![(1, Ok(0)), (2, Ok(5))]);

    let report = audit_empty_groups(&groups, resolver, AuditOptions::default()).await;

    assert_eq!(report.scanned, 2);
    assert!(report.is_complete());
    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.id, ResourceId::from(1));
    assert_eq!(finding.name, "A");
    assert_eq!(finding.kind, FindingKind::Empty);
    assert_eq!(finding.evidence, Some(Document::from(json!({"member_count": 0}))));
}

#[tokio::test]
async fn test_every_empty_group_is_reported_in_id_order() {
    let ids = [9, 3, 7, 1, 5];
    let resolver = FixedResolver::new(ids.iter().map(|id| (*id, Ok(0))).collect());

    let report = audit_empty_groups(&groups(&ids), resolver, AuditOptions::new(2)).await;

    let found: Vec<String> = report.finding_ids().iter().map(|id| id.to_string()).collect();
    assert_eq!(found, vec!["1", "3", "5", "7", "9"]);
}

#[tokio::test]
async fn test_no_groups_yields_no_findings() {
    let resolver = FixedResolver::new(Vec::new());
    let report = audit_empty_groups(&[], resolver, AuditOptions::default()).await;

    assert_eq!(report.scanned, 0);
    assert!(report.findings.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(render(OutputFormat::Table, Payload::Audit(&report)).unwrap(), "no findings\n");
    assert_eq!(render(OutputFormat::Json, Payload::Audit(&report)).unwrap().trim(), "[]");
}

#[tokio::test]
async fn test_failed_resolution_skips_only_that_group() {
    let resolver = FixedResolver::new(vec![
        (1, Ok(0)),
        (2, Err(FetchError::RateLimited("retry after 30s".to_string()))),
        (3, Ok(0)),
    ]);

    let report = audit_empty_groups(&groups(&[1, 2, 3]), resolver, AuditOptions::default()).await;

    let found: Vec<String> = report.finding_ids().iter().map(|id| id.to_string()).collect();
    assert_eq!(found, vec!["1", "3"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, Some(ResourceId::from(2)));
    assert!(report.skipped[0].reason.contains("rate limited"));
}

#[tokio::test]
async fn test_group_without_id_is_skipped() {
    let groups = vec![
        Document::from(json!({"name": "nameless"})),
        Document::from(json!({"id": 4, "name": "D"})),
    ];
    let resolver = FixedResolver::new(vec![(4, Ok(0))]);

    let report = audit_empty_groups(&groups, resolver, AuditOptions::default()).await;

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, None);
    assert_eq!(report.skipped[0].name, "nameless");
    assert_eq!(report.skipped[0].reason, "missing id");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_is_bounded() {
    let resolver = SlowResolver::new(Duration::from_millis(20));
    let ids: Vec<u64> = (1..=12).collect();

    let report = audit_empty_groups(&groups(&ids), resolver.clone(), AuditOptions::new(3)).await;

    assert_eq!(report.findings.len(), 12);
    assert!(resolver.peak.load(Ordering::SeqCst) <= 3);
    assert!(resolver.peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_zero_concurrency_is_clamped() {
    assert_eq!(AuditOptions::new(0).concurrency, 1);

    let resolver = SlowResolver::new(Duration::from_millis(1));
    let report = audit_empty_groups(&groups(&[1, 2]), resolver.clone(), AuditOptions::new(0)).await;
    assert_eq!(report.findings.len(), 2);
    assert_eq!(resolver.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_deadline_skips_unresolved_groups() {
    let resolver = SlowResolver::new(Duration::from_secs(5));
    let options = AuditOptions::new(2).with_deadline(Duration::from_millis(50));

    let report = audit_empty_groups(&groups(&[1, 2, 3]), resolver, options).await;

    assert!(report.findings.is_empty());
    assert_eq!(report.skipped.len(), 3);
    assert!(report
        .skipped
        .iter()
        .all(|s| s.reason == "timed out before membership was resolved"));
}

/// Panics for group 1 and never answers for the rest.
struct PanickingResolver;

#[async_trait]
impl MembershipResolver for PanickingResolver {
    async fn resolve_membership(&self, group_id: &ResourceId) -> Result<u64, FetchError> {
        if *group_id == ResourceId::from(1) {
            panic!("resolver blew up");
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(0)
    }
}

#[tokio::test]
async fn test_panicked_task_keeps_its_own_reason_when_deadline_expires() {
    let options = AuditOptions::new(2).with_deadline(Duration::from_millis(200));

    let report = audit_empty_groups(&groups(&[1, 2]), Arc::new(PanickingResolver), options).await;

    assert!(report.findings.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].id, Some(ResourceId::from(1)));
    assert!(report.skipped[0].reason.starts_with("membership task failed"));
    assert_eq!(report.skipped[1].id, Some(ResourceId::from(2)));
    assert_eq!(report.skipped[1].reason, "timed out before membership was resolved");
}

#[tokio::test]
async fn test_audit_against_snapshot() {
    let client = Arc::new(SnapshotClient::new(fixtures_path()));
    let groups = client.list(ResourceKind::Groups).await.unwrap();

    let report = audit_empty_groups(&groups, client, AuditOptions::default()).await;

    assert_eq!(report.scanned, 3);
    let found: Vec<String> = report.finding_ids().iter().map(|id| id.to_string()).collect();
    assert_eq!(found, vec!["1"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, Some(ResourceId::from(3)));

    let csv = render(OutputFormat::Csv, Payload::Audit(&report)).unwrap();
    assert_eq!(csv, "id,name,finding,evidence\n1,A,empty,\"{\"\"member_count\"\":0}\"\n");
}
