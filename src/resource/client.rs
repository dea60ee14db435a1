use async_trait::async_trait;
use crate::document::{Document, ResourceId};
use crate::error::FetchError;
use super::ResourceKind;

/// Read-only access to the remote inventory.
///
/// Implementations return normalized documents: envelopes are unwrapped and
/// pagination is already resolved.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn fetch(&self, kind: ResourceKind, id: &ResourceId) -> Result<Document, FetchError>;

    async fn list(&self, kind: ResourceKind) -> Result<Vec<Document>, FetchError>;
}

/// Resolves how many members a group currently has.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    async fn resolve_membership(&self, group_id: &ResourceId) -> Result<u64, FetchError>;
}

/// A document together with the kind and id it was fetched under.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub kind: ResourceKind,
    pub id: ResourceId,
    pub document: Document,
}

impl FetchedDocument {
    pub fn new(kind: ResourceKind, id: ResourceId, document: Document) -> Self {
        Self { kind, id, document }
    }
}

/// Fetches one resource and tags it with its kind and id.
pub async fn fetch_tagged<C>(client: &C, kind: ResourceKind, id: ResourceId) -> Result<FetchedDocument, FetchError>
where
    C: ResourceClient + ?Sized,
{
    let document = client.fetch(kind, &id).await?;
    Ok(FetchedDocument::new(kind, id, document))
}
