//! Live-subscription change events.

#[cfg(test)]
#[path = "change_test.rs"]
mod change_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What happened to a document in a watched collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The document appeared (including the initial snapshot).
    Added,
    /// The document body changed.
    Modified,
    /// The document was deleted.
    Removed,
}

/// One entry of a subscription notification, in delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChange {
    pub kind: ChangeKind,
    /// Document id within the watched collection.
    pub id: String,
    /// Document body after the change; `Null` for removals.
    #[serde(default)]
    pub data: Value,
}

/// A document read from a collection listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub data: Value,
}

impl DocChange {
    #[must_use]
    pub fn added(id: &str, data: Value) -> Self {
        Self { kind: ChangeKind::Added, id: id.to_owned(), data }
    }

    #[must_use]
    pub fn modified(id: &str, data: Value) -> Self {
        Self { kind: ChangeKind::Modified, id: id.to_owned(), data }
    }

    #[must_use]
    pub fn removed(id: &str) -> Self {
        Self { kind: ChangeKind::Removed, id: id.to_owned(), data: Value::Null }
    }
}
