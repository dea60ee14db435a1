use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::InterrogatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Policies,
    Computers,
    Scripts,
    Packages,
    Groups,
}

/// Everything the rest of the crate needs to know about one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    pub kind: ResourceKind,
    /// Canonical command-line name.
    pub name: &'static str,
    pub singular: &'static str,
    /// Collection name used by the remote API for listings and endpoints.
    pub collection: &'static str,
    /// Key wrapping a single record in detail payloads.
    pub envelope: &'static str,
    /// Columns shown first in table and CSV output.
    pub columns: &'static [&'static str],
}

pub const REGISTRY: &[KindSpec] = &[
    KindSpec {
        kind: ResourceKind::Policies,
        name: "policies",
        singular: "policy",
        collection: "policies",
        envelope: "policy",
        columns: &["id", "name"],
    },
    KindSpec {
        kind: ResourceKind::Computers,
        name: "computers",
        singular: "computer",
        collection: "computers",
        envelope: "computer",
        columns: &["id", "name", "serial_number"],
    },
    KindSpec {
        kind: ResourceKind::Scripts,
        name: "scripts",
        singular: "script",
        collection: "scripts",
        envelope: "script",
        columns: &["id", "name"],
    },
    KindSpec {
        kind: ResourceKind::Packages,
        name: "packages",
        singular: "package",
        collection: "packages",
        envelope: "package",
        columns: &["id", "name", "filename"],
    },
    KindSpec {
        kind: ResourceKind::Groups,
        name: "groups",
        singular: "group",
        collection: "computer_groups",
        envelope: "computer_group",
        columns: &["id", "name", "is_smart"],
    },
];

impl ResourceKind {
    pub fn all() -> impl Iterator<Item = ResourceKind> {
        REGISTRY.iter().map(|spec| spec.kind)
    }

    pub fn spec(&self) -> &'static KindSpec {
        // REGISTRY is laid out in declaration order.
        &REGISTRY[*self as usize]
    }

    pub fn as_str(&self) -> &'static str {
        self.spec().name
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.spec().columns
    }

    /// Comma-separated list of accepted kind names, for help and errors.
    pub fn names() -> String {
        REGISTRY.iter().map(|spec| spec.name).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = InterrogatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        REGISTRY
            .iter()
            .find(|spec| {
                token == spec.name
                    || token == spec.singular
                    || token == spec.collection
                    || token == spec.envelope
            })
            .map(|spec| spec.kind)
            .ok_or_else(|| InterrogatorError::UnknownKind(s.to_string()))
    }
}
