//! Reference data sync types

use serde::{Deserialize, Serialize};

/// Remote-authoritative collections mirrored into the local cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Routes,
    Users,
}

impl CollectionKind {
    /// Collection name, shared by the remote store and the local cache
    pub fn name(&self) -> &'static str {
        match self {
            Self::Routes => "routes",
            Self::Users => "users",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one collection sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub collection: CollectionKind,
    /// Documents now held locally
    pub count: usize,
}
