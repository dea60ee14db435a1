use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tracing::{debug, warn};
use crate::document::{Document, ResourceId};
use crate::error::FetchError;
use super::client::{MembershipResolver, ResourceClient};
use super::ResourceKind;

/// [`ResourceClient`] over an exported inventory directory.
///
/// Layout, per kind (using the registry's collection name):
///
/// ```text
/// <root>/<collection>.json        listing: [..] or {"<collection>": [..]}
/// <root>/<collection>/<id>.json   detail:  {..} or {"<envelope>": {..}}
/// ```
///
/// When the listing file is missing the listing is assembled from the
/// detail files.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    root: PathBuf,
}

impl SnapshotClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn listing_path(&self, kind: ResourceKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.spec().collection))
    }

    /// Path of one detail file. Text ids that could step outside the
    /// collection directory name no record and are reported as not found.
    pub fn detail_path(&self, kind: ResourceKind, id: &ResourceId) -> Result<PathBuf, FetchError> {
        if let ResourceId::Text(text) = id {
            if text.is_empty() || text.contains(['/', '\\']) || text.contains("..") {
                warn!("rejecting {} id '{}': not a plain file name", kind, text);
                return Err(FetchError::not_found(kind.as_str(), id));
            }
        }
        Ok(self.root.join(kind.spec().collection).join(format!("{}.json", id)))
    }

    async fn read_document(&self, path: &Path, kind: ResourceKind, label: &str) -> Result<Document, FetchError> {
        debug!("reading {}", path.display());

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::not_found(kind.as_str(), label),
            ErrorKind::PermissionDenied => {
                FetchError::Unauthorized(format!("{}: {}", path.display(), e))
            }
            _ => FetchError::Transport(format!("{}: {}", path.display(), e)),
        })?;

        serde_json::from_slice::<Document>(&bytes)
            .map_err(|e| FetchError::Transport(format!("{}: invalid JSON: {}", path.display(), e)))
    }

    async fn list_from_details(&self, kind: ResourceKind) -> Result<Vec<Document>, FetchError> {
        let dir = self.root.join(kind.spec().collection);
        if !dir.is_dir() {
            return Err(FetchError::not_found(kind.as_str(), "listing"));
        }

        let pattern = format!("{}/*.json", glob::Pattern::escape(&dir.to_string_lossy()));
        let paths = glob::glob(&pattern)
            .map_err(|e| FetchError::Transport(format!("bad snapshot path {}: {}", dir.display(), e)))?;

        let mut documents = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| FetchError::Transport(e.to_string()))?;
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let raw = self.read_document(&path, kind, &label).await?;
            documents.push(unwrap_detail(kind, raw));
        }

        documents.sort_by(|a, b| a.id().cmp(&b.id()));
        debug!("assembled {} {} from detail files", documents.len(), kind);
        Ok(documents)
    }
}

/// Strips the `{"<collection>": [...]}` envelope from a listing payload.
pub(crate) fn unwrap_listing(kind: ResourceKind, raw: Document) -> Result<Vec<Document>, FetchError> {
    let spec = kind.spec();
    match raw {
        Document::Sequence(items) => Ok(items),
        Document::Mapping(entries) => entries
            .into_iter()
            .find(|(key, _)| key == spec.collection || key == spec.name)
            .and_then(|(_, value)| match value {
                Document::Sequence(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                FetchError::Transport(format!("{} listing has no '{}' array", kind, spec.collection))
            }),
        other => Err(FetchError::Transport(format!(
            "{} listing is a {}, expected a sequence",
            kind,
            other.shape().as_str()
        ))),
    }
}

/// Strips the `{"<envelope>": {...}}` wrapper from a detail payload.
pub(crate) fn unwrap_detail(kind: ResourceKind, raw: Document) -> Document {
    let envelope = kind.spec().envelope;
    match raw {
        Document::Mapping(mut entries)
            if entries.len() == 1 && entries[0].0 == envelope && entries[0].1.as_mapping().is_some() =>
        {
            entries.remove(0).1
        }
        other => other,
    }
}

#[async_trait]
impl ResourceClient for SnapshotClient {
    async fn fetch(&self, kind: ResourceKind, id: &ResourceId) -> Result<Document, FetchError> {
        let path = self.detail_path(kind, id)?;
        let raw = self.read_document(&path, kind, &id.to_string()).await?;
        Ok(unwrap_detail(kind, raw))
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<Document>, FetchError> {
        let path = self.listing_path(kind);
        if !path.exists() {
            return self.list_from_details(kind).await;
        }
        let raw = self.read_document(&path, kind, "listing").await?;
        unwrap_listing(kind, raw)
    }
}

#[async_trait]
impl MembershipResolver for SnapshotClient {
    async fn resolve_membership(&self, group_id: &ResourceId) -> Result<u64, FetchError> {
        let group = self.fetch(ResourceKind::Groups, group_id).await?;
        match group.get("computers") {
            None | Some(Document::Null) => Ok(0),
            Some(Document::Sequence(members)) => Ok(members.len() as u64),
            Some(other) => Err(FetchError::Transport(format!(
                "group {} has a {} 'computers' field, expected a sequence",
                group_id,
                other.shape().as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_path_rejects_traversal() {
        let client = SnapshotClient::new("/snapshot");
        assert_eq!(
            client.detail_path(ResourceKind::Policies, &ResourceId::from(7)).unwrap(),
            PathBuf::from("/snapshot/policies/7.json")
        );
        assert_eq!(
            client.detail_path(ResourceKind::Scripts, &ResourceId::parse("cleanup-temp")).unwrap(),
            PathBuf::from("/snapshot/scripts/cleanup-temp.json")
        );
        for bad in ["../../x", "a/b", "a\\b", "..", "x..y"] {
            let err = client.detail_path(ResourceKind::Policies, &ResourceId::parse(bad)).unwrap_err();
            assert!(err.is_not_found(), "{} was accepted", bad);
        }
    }

    #[test]
    fn test_unwrap_listing_envelope() {
        let raw = Document::from(json!({"computer_groups": [{"id": 1, "name": "A"}]}));
        let items = unwrap_listing(ResourceKind::Groups, raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name().as_deref(), Some("A"));
    }

    #[test]
    fn test_unwrap_listing_bare_array() {
        let raw = Document::from(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(unwrap_listing(ResourceKind::Policies, raw).unwrap().len(), 2);
    }

    #[test]
    fn test_unwrap_listing_rejects_scalar() {
        let err = unwrap_listing(ResourceKind::Scripts, Document::from("nope")).unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn test_unwrap_detail_only_strips_matching_envelope() {
        let wrapped = Document::from(json!({"policy": {"id": 3, "name": "X"}}));
        assert_eq!(unwrap_detail(ResourceKind::Policies, wrapped), Document::from(json!({"id": 3, "name": "X"})));

        let other = Document::from(json!({"script": {"id": 3}}));
        assert_eq!(unwrap_detail(ResourceKind::Policies, other.clone()), other);
    }
}
