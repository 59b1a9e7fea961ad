//! Document-store capability: the external database the drawing syncs through.
//!
//! The overlay never talks to a concrete database. It depends on this small
//! interface, which the browser host implements over the JavaScript SDK and
//! which [`crate::memory::MemoryStore`] implements in-process for tests and
//! offline use.
//!
//! DESIGN
//! ======
//! All I/O is single-threaded (browser event loop), so async methods return
//! [`LocalBoxFuture`] and listeners are plain `FnMut` boxes without `Send`.
//! Futures are `'static`: implementations clone what they need up front so
//! callers can hand them straight to `spawn_local`.
//!
//! Live listeners are owned by a [`Subscription`]; dropping it unsubscribes,
//! so replacing a stored subscription can never leave a dangling listener.

use std::fmt;

use futures::future::LocalBoxFuture;
use records::{CollectionPath, DocChange, DocPath, Document, PathError};
use serde_json::{Map, Value};

/// Receives ordered change batches for a watched collection.
pub type ChangeListener = Box<dyn FnMut(Vec<DocChange>)>;

/// Receives the current body of a watched document (`None` once deleted).
pub type DocListener = Box<dyn FnMut(Option<Value>)>;

/// Error returned by document-store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("document store unavailable")]
    Unavailable,
    /// The backend rejected the call.
    #[error("document store error: {0}")]
    Backend(String),
    /// A document or collection address was malformed.
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Handle to a live listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap the backend's unsubscribe callback.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}

/// Hierarchical document database with live subscriptions.
pub trait DocumentStore {
    /// Merge `fields` into the document, creating it if needed.
    ///
    /// Fields not named in `fields` are left untouched.
    fn set_merge(&self, doc: &DocPath, fields: Map<String, Value>) -> LocalBoxFuture<'static, Result<(), StoreError>>;

    /// Delete a document. Deleting a missing document succeeds.
    fn delete(&self, doc: &DocPath) -> LocalBoxFuture<'static, Result<(), StoreError>>;

    /// Every document currently in `collection`.
    fn list(&self, collection: &CollectionPath) -> LocalBoxFuture<'static, Result<Vec<Document>, StoreError>>;

    /// Delete all of `docs` atomically.
    fn batch_delete(&self, docs: Vec<DocPath>) -> LocalBoxFuture<'static, Result<(), StoreError>>;

    /// Listen to `collection`. The first batch is the current contents as
    /// `added` changes; later batches arrive in commit order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the listener cannot be registered.
    fn subscribe(&self, collection: &CollectionPath, listener: ChangeListener) -> Result<Subscription, StoreError>;

    /// Listen to one document's body.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the listener cannot be registered.
    fn watch(&self, doc: &DocPath, listener: DocListener) -> Result<Subscription, StoreError>;
}
