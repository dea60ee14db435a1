use jamf_interrogator::{build_inventory, render, Document, OutputFormat, Payload, FetchError, MembershipResolver, ResourceClient, ResourceId, ResourceKind, SnapshotClient};
use std::path::Path;

fn fixtures_path() -> &'static Path {
    Path::new("tests/fixtures/snapshot")
}

fn client() -> SnapshotClient {
    SnapshotClient::new(fixtures_path())
}

#[tokio::test]
async fn test_list_unwraps_collection_envelope() {
    let policies = client().list(ResourceKind::Policies).await.unwrap();
    let names: Vec<String> = policies.iter().filter_map(Document::name).collect();
    assert_eq!(names, vec!["Update", "Update v2", "Cleanup, nightly"]);
}

#[tokio::test]
async fn test_list_reads_bare_array() {
    let computers = client().list(ResourceKind::Computers).await.unwrap();
    assert_eq!(computers.len(), 3);
    assert_eq!(computers[0].get("serial_number").and_then(Document::as_str), Some("C02ABC123"));
}

#[tokio::test]
async fn test_list_falls_back_to_detail_files() {
    let scripts = client().list(ResourceKind::Scripts).await.unwrap();
    let ids: Vec<ResourceId> = scripts.iter().filter_map(Document::id).collect();
    assert_eq!(ids, vec![ResourceId::from(1), ResourceId::from(2)]);
    assert!(scripts[0].get("script_contents").is_some());
}

#[tokio::test]
async fn test_list_missing_kind_is_not_found() {
    let err = client().list(ResourceKind::Packages).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_fetch_unwraps_detail_envelope() {
    let policy = client().fetch(ResourceKind::Policies, &ResourceId::from(11)).await.unwrap();
    assert_eq!(policy.name().as_deref(), Some("Update v2"));
    assert_eq!(policy.get("packages").and_then(Document::as_sequence).map(|p| p.len()), Some(2));
}

#[tokio::test]
async fn test_fetch_missing_id() {
    let err = client().fetch(ResourceKind::Policies, &ResourceId::from(999)).await.unwrap_err();
    assert_eq!(err, FetchError::not_found("policies", 999));
}

#[tokio::test]
async fn test_fetch_invalid_json_is_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("policies")).unwrap();
    std::fs::write(dir.path().join("policies/5.json"), "{not json").unwrap();

    let err = SnapshotClient::new(dir.path())
        .fetch(ResourceKind::Policies, &ResourceId::from(5))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn test_resolve_membership_counts_computers() {
    let client = client();
    assert_eq!(client.resolve_membership(&ResourceId::from(1)).await.unwrap(), 0);
    assert_eq!(client.resolve_membership(&ResourceId::from(2)).await.unwrap(), 5);
    assert!(client.resolve_membership(&ResourceId::from(3)).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_resolve_membership_rejects_non_sequence() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("computer_groups")).unwrap();
    std::fs::write(
        dir.path().join("computer_groups/7.json"),
        r#"{"computer_group": {"id": 7, "computers": "none"}}"#,
    )
    .unwrap();

    let err = SnapshotClient::new(dir.path())
        .resolve_membership(&ResourceId::from(7))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn test_inventory_reports_failed_kinds_without_aborting() {
    let kinds: Vec<ResourceKind> = ResourceKind::all().collect();
    let report = build_inventory(&client(), &kinds).await;

    assert_eq!(report.count(ResourceKind::Policies), Some(3));
    assert_eq!(report.count(ResourceKind::Scripts), Some(2));
    assert_eq!(report.count(ResourceKind::Groups), Some(3));
    assert_eq!(report.count(ResourceKind::Packages), None);
    assert_eq!(report.failed_kinds(), vec![ResourceKind::Packages]);
    assert!(!report.details.contains_key(&ResourceKind::Packages));

    let csv = render(OutputFormat::Csv, Payload::Inventory(&report)).unwrap();
    assert!(csv.starts_with("kind,count,error\npolicies,3,\n"));
    assert!(csv.contains("\npackages,,packages listing not found\n"));

    let json: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json, Payload::Inventory(&report)).unwrap()).unwrap();
    assert_eq!(json["summary"][0]["count"], 3);
    assert_eq!(json["details"]["groups"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_fetch_cannot_escape_the_collection_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("policies")).unwrap();
    std::fs::write(dir.path().join("secret.json"), r#"{"id": 1, "name": "outside"}"#).unwrap();
    let client = SnapshotClient::new(dir.path());

    let err = client
        .fetch(ResourceKind::Policies, &ResourceId::parse("../secret"))
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::not_found("policies", "../secret"));
}
