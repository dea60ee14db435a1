mod client;
mod kind;
mod snapshot;

pub use client::{fetch_tagged, FetchedDocument, MembershipResolver, ResourceClient};
pub use kind::{KindSpec, ResourceKind, REGISTRY};
pub use snapshot::SnapshotClient;
