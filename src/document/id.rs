use std::fmt;
use serde::{Deserialize, Serialize};
use super::Document;

/// Identifier of a remote resource.
///
/// Numeric ids order by value and sort before textual ids, so `2` comes
/// before `10` in every sorted listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Numeric(u64),
    Text(String),
}

impl ResourceId {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse::<u64>() {
                return ResourceId::Numeric(n);
            }
        }
        ResourceId::Text(trimmed.to_string())
    }

    /// Reads an identifier from a scalar document; empty strings and
    /// non-integral numbers are not identifiers.
    pub fn from_document(doc: &Document) -> Option<Self> {
        match doc {
            Document::Number(n) => n.as_u64().map(ResourceId::Numeric),
            Document::String(s) if !s.trim().is_empty() => Some(ResourceId::parse(s)),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Numeric(n) => write!(f, "{}", n),
            ResourceId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for ResourceId {
    fn from(n: u64) -> Self {
        ResourceId::Numeric(n)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResourceId::parse(s))
    }
}
