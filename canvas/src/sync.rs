//! Sync bridge: layer snapshots out, remote snapshots in.
//!
//! Outbound, the bridge encodes the local participant's whole layer and
//! merge-writes it to `sessions/{session}/drawings/{participant}`. This
//! happens once per finished stroke, never per segment. Inbound, it opens a
//! live subscription on the session's drawing collection and hands change
//! batches to the host, which folds them into the layer store with
//! [`merge_remote_changes`].
//!
//! DESIGN
//! ======
//! Every participant writes only their own document, so there are no
//! write-write conflicts between participants. Updates to one document are
//! last-writer-wins: a snapshot replaces the stored layer wholesale.
//!
//! ERROR HANDLING
//! ==============
//! Outbound calls return `Result` so the host can log failures; nothing is
//! retried (the next stroke rewrites the full layer anyway). Inbound payloads
//! that cannot be decoded are logged and skipped.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use records::path::{drawing_doc, drawings_collection, session_doc};
use records::session::display_image_from;
use records::{ChangeKind, DocChange, LayerRecord, PathError};

use crate::codec::{CodecError, decode_layer, encode_layer};
use crate::layer::LayerStore;
use crate::store::{ChangeListener, DocumentStore, StoreError, Subscription};

/// Error returned by sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No display session is active.
    #[error("no active session")]
    NoSession,
    /// The participant has no layer to persist.
    #[error("no layer for participant {0}")]
    NoLayer(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Connection between the local layer store and the shared document store.
pub struct SyncBridge {
    store: Rc<dyn DocumentStore>,
    session: Option<String>,
    layers: Option<Subscription>,
    display: Option<Subscription>,
}

impl SyncBridge {
    #[must_use]
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self { store, session: None, layers: None, display: None }
    }

    /// The active display session.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Whether a remote-layer subscription is open.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.layers.is_some()
    }

    /// Switch the active session. Changing it tears down both live
    /// subscriptions; returns whether the session changed.
    pub fn set_session(&mut self, session_id: Option<&str>) -> bool {
        let next = session_id.map(str::trim).filter(|id| !id.is_empty()).map(str::to_owned);
        if next == self.session {
            return false;
        }
        self.unsubscribe();
        self.display = None;
        log::debug!("sync: session {:?} -> {next:?}", self.session);
        self.session = next;
        true
    }

    fn session_id(&self) -> Result<&str, SyncError> {
        self.session.as_deref().ok_or(SyncError::NoSession)
    }

    /// Encode `participant`'s layer and merge-write it.
    ///
    /// Encoding happens now, against the layer as it stands; the returned
    /// future only performs the write.
    pub fn persist_local_layer(&self, layers: &LayerStore, participant: &str) -> LocalBoxFuture<'static, Result<(), SyncError>> {
        let encoded = layers
            .get(participant)
            .ok_or_else(|| SyncError::NoLayer(participant.to_owned()))
            .and_then(|layer| encode_layer(layer).map_err(SyncError::from));
        match encoded {
            Ok(image_data) => self.persist_snapshot(participant, image_data),
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }

    /// Merge-write an already encoded layer for `participant`.
    pub fn persist_snapshot(&self, participant: &str, image_data: String) -> LocalBoxFuture<'static, Result<(), SyncError>> {
        let prepared = self.session_id().and_then(|session| {
            let record = LayerRecord::new(image_data);
            Ok((drawing_doc(session, participant)?, record.to_write_fields()))
        });
        match prepared {
            Ok((doc, fields)) => {
                let write = self.store.set_merge(&doc, fields);
                async move { write.await.map_err(SyncError::from) }.boxed_local()
            }
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }

    /// Delete `participant`'s drawing document.
    pub fn delete_layer(&self, participant: &str) -> LocalBoxFuture<'static, Result<(), SyncError>> {
        let doc = self
            .session_id()
            .and_then(|session| drawing_doc(session, participant).map_err(SyncError::from));
        match doc {
            Ok(doc) => {
                let delete = self.store.delete(&doc);
                async move { delete.await.map_err(SyncError::from) }.boxed_local()
            }
            Err(err) => future::ready(Err(err)).boxed_local(),
        }
    }

    /// Delete every drawing document in the session in one batch.
    ///
    /// Resolves to the number of documents deleted.
    pub fn clear_all(&self) -> LocalBoxFuture<'static, Result<usize, SyncError>> {
        let collection = match self.session_id().and_then(|session| drawings_collection(session).map_err(SyncError::from)) {
            Ok(collection) => collection,
            Err(err) => return future::ready(Err(err)).boxed_local(),
        };
        let store = Rc::clone(&self.store);
        async move {
            let docs = store.list(&collection).await?;
            let paths = docs.iter().map(|doc| collection.doc(&doc.id)).collect::<Result<Vec<_>, _>>()?;
            let count = paths.len();
            if count > 0 {
                store.batch_delete(paths).await?;
            }
            log::debug!("sync: cleared {count} drawings in {collection}");
            Ok::<usize, SyncError>(count)
        }
        .boxed_local()
    }

    /// Listen to the active session's drawing collection.
    ///
    /// Any previous layer subscription is closed first.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when no session is active or the store refuses
    /// the listener.
    pub fn subscribe_remote_layers(&mut self, listener: ChangeListener) -> Result<(), SyncError> {
        self.unsubscribe();
        let collection = drawings_collection(self.session_id()?)?;
        self.layers = Some(self.store.subscribe(&collection, listener)?);
        log::debug!("sync: subscribed to {collection}");
        Ok(())
    }

    /// Close the remote-layer subscription, if any.
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.layers.take() {
            subscription.cancel();
            log::debug!("sync: unsubscribed from remote layers");
        }
    }

    /// Follow the session document's reference image URL.
    ///
    /// `on_change` receives `None` when nothing is on display.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when no session is active or the store refuses
    /// the listener.
    pub fn watch_display_image(&mut self, mut on_change: Box<dyn FnMut(Option<String>)>) -> Result<(), SyncError> {
        self.display = None;
        let doc = session_doc(self.session_id()?)?;
        let watch = self.store.watch(
            &doc,
            Box::new(move |body| on_change(body.as_ref().and_then(display_image_from))),
        )?;
        self.display = Some(watch);
        Ok(())
    }
}

/// Fold a remote change batch into `layers`, in delivery order.
///
/// Added and modified snapshots replace the participant's layer wholesale,
/// including the local participant's (last writer wins). Removals drop the
/// entry. Entries for other participants are never touched. Returns whether
/// anything visible changed.
pub fn merge_remote_changes(layers: &mut LayerStore, changes: &[DocChange]) -> bool {
    let mut changed = false;
    for change in changes {
        match change.kind {
            ChangeKind::Added | ChangeKind::Modified => {
                let Some(size) = layers.size() else {
                    log::debug!("sync: no reference image yet; snapshot for {} deferred", change.id);
                    continue;
                };
                let decoded = LayerRecord::from_value(&change.data)
                    .map_err(CodecError::from)
                    .and_then(|record| decode_layer(&record.image_data, size));
                match decoded {
                    Ok(layer) => changed |= layers.set(&change.id, layer),
                    Err(err) => log::warn!("sync: ignoring layer for {}: {err}", change.id),
                }
            }
            ChangeKind::Removed => changed |= layers.remove(&change.id).is_some(),
        }
    }
    changed
}
