//! Hierarchical collection/document addressing.
//!
//! Paths alternate collection and document segments, mirroring the store's
//! own model: `sessions/{session}/drawings/{participant}`. Segments are trimmed
//! and must be non-empty and free of `/`, so a missing session id can never
//! silently address the parent collection.

#[cfg(test)]
#[path = "path_test.rs"]
mod path_test;

use std::fmt;

/// Top-level collection holding one document per play session.
pub const SESSIONS: &str = "sessions";

/// Per-session subcollection holding one layer document per participant.
pub const DRAWINGS: &str = "drawings";

/// Error returned when a path segment is unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The segment is empty after trimming.
    #[error("path segment is empty")]
    EmptySegment,
    /// The segment contains a `/` separator.
    #[error("path segment contains '/': {0}")]
    Separator(String),
}

/// Address of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Address of a single document within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl CollectionPath {
    /// A top-level collection.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if `name` is not a valid segment.
    pub fn root(name: &str) -> Result<Self, PathError> {
        Ok(Self { segments: vec![segment(name)?] })
    }

    /// The document `id` inside this collection.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if `id` is not a valid segment.
    pub fn doc(&self, id: &str) -> Result<DocPath, PathError> {
        Ok(DocPath { collection: self.clone(), id: segment(id)? })
    }

    /// Raw segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl DocPath {
    /// The collection containing this document.
    #[must_use]
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// The document id (last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A subcollection nested under this document.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if `name` is not a valid segment.
    pub fn subcollection(&self, name: &str) -> Result<CollectionPath, PathError> {
        let mut segments = self.collection.segments.clone();
        segments.push(self.id.clone());
        segments.push(segment(name)?);
        Ok(CollectionPath { segments })
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// `sessions/{session_id}`.
///
/// # Errors
///
/// Returns [`PathError`] for an empty or malformed session id.
pub fn session_doc(session_id: &str) -> Result<DocPath, PathError> {
    CollectionPath::root(SESSIONS)?.doc(session_id)
}

/// `sessions/{session_id}/drawings`.
///
/// # Errors
///
/// Returns [`PathError`] for an empty or malformed session id.
pub fn drawings_collection(session_id: &str) -> Result<CollectionPath, PathError> {
    session_doc(session_id)?.subcollection(DRAWINGS)
}

/// `sessions/{session_id}/drawings/{participant}`.
///
/// # Errors
///
/// Returns [`PathError`] for an empty or malformed session or participant id.
pub fn drawing_doc(session_id: &str, participant: &str) -> Result<DocPath, PathError> {
    drawings_collection(session_id)?.doc(participant)
}

fn segment(raw: &str) -> Result<String, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if trimmed.contains('/') {
        return Err(PathError::Separator(trimmed.to_owned()));
    }
    Ok(trimmed.to_owned())
}
