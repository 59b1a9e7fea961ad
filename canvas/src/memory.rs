//! In-process document store.
//!
//! Backs the overlay when the page provides no database host (drawing still
//! works, nothing is shared) and drives the sync tests. It honours the same
//! contract as the real backend: merge writes, server-timestamp
//! substitution, ordered change batches with an initial `added` snapshot,
//! and unsubscribe-on-drop.
//!
//! Operations take effect when their future is first polled. Listeners are
//! invoked synchronously after the write, with no internal borrow held, so
//! a listener may call back into the store.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use records::timestamp::resolve_server_timestamps;
use records::{CollectionPath, DocChange, DocPath, Document};
use serde_json::{Map, Value};

use crate::store::{ChangeListener, DocListener, DocumentStore, StoreError, Subscription};

/// A store call as seen by the memory backend, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    SetMerge(DocPath),
    Delete(DocPath),
    List(CollectionPath),
    BatchDelete(Vec<DocPath>),
}

type SharedChangeListener = Rc<RefCell<ChangeListener>>;
type SharedDocListener = Rc<RefCell<DocListener>>;

#[derive(Default)]
struct Inner {
    docs: BTreeMap<DocPath, Map<String, Value>>,
    collection_listeners: Vec<(u64, CollectionPath, SharedChangeListener)>,
    doc_listeners: Vec<(u64, DocPath, SharedDocListener)>,
    next_listener: u64,
    clock_ms: i64,
    offline: bool,
    journal: Vec<StoreOp>,
}

impl Inner {
    fn listener_id(&mut self) -> u64 {
        self.next_listener += 1;
        self.next_listener
    }

    fn tick(&mut self) -> i64 {
        self.clock_ms += 1;
        self.clock_ms
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline { Err(StoreError::Unavailable) } else { Ok(()) }
    }

    fn collection_docs(&self, collection: &CollectionPath) -> Vec<Document> {
        self.docs
            .iter()
            .filter(|(path, _)| path.collection() == collection)
            .map(|(path, body)| Document { id: path.id().to_owned(), data: Value::Object(body.clone()) })
            .collect()
    }
}

/// Pending notifications, delivered once the store borrow is released.
#[derive(Default)]
struct Outbox {
    changes: Vec<(SharedChangeListener, Vec<DocChange>)>,
    docs: Vec<(SharedDocListener, Option<Value>)>,
}

impl Outbox {
    fn collect(&mut self, inner: &Inner, doc: &DocPath, change: &DocChange) {
        for (_, collection, listener) in &inner.collection_listeners {
            if collection == doc.collection() {
                self.changes.push((Rc::clone(listener), vec![change.clone()]));
            }
        }
        let body = inner.docs.get(doc).map(|body| Value::Object(body.clone()));
        for (_, path, listener) in &inner.doc_listeners {
            if path == doc {
                self.docs.push((Rc::clone(listener), body.clone()));
            }
        }
    }

    fn deliver(self) {
        for (listener, changes) in self.changes {
            match listener.try_borrow_mut() {
                Ok(mut listener) => (*listener)(changes),
                Err(_) => log::warn!("change listener re-entered; batch dropped"),
            }
        }
        for (listener, body) in self.docs {
            match listener.try_borrow_mut() {
                Ok(mut listener) => (*listener)(body),
                Err(_) => log::warn!("document listener re-entered; update dropped"),
            }
        }
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    /// Current body of `doc`.
    #[must_use]
    pub fn get(&self, doc: &DocPath) -> Option<Value> {
        self.inner.borrow().docs.get(doc).map(|body| Value::Object(body.clone()))
    }

    /// Number of documents in `collection`.
    #[must_use]
    pub fn count(&self, collection: &CollectionPath) -> usize {
        self.inner.borrow().collection_docs(collection).len()
    }

    /// Every call made so far, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<StoreOp> {
        self.inner.borrow().journal.clone()
    }

    /// Number of live listeners of either kind.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.collection_listeners.len() + inner.doc_listeners.len()
    }

    fn apply_merge(&self, doc: &DocPath, mut fields: Map<String, Value>) -> Result<(), StoreError> {
        let mut outbox = Outbox::default();
        {
            let mut inner = self.inner.borrow_mut();
            inner.journal.push(StoreOp::SetMerge(doc.clone()));
            inner.check_online()?;
            let now = inner.tick();
            resolve_server_timestamps(&mut fields, now);
            let existed = inner.docs.contains_key(doc);
            let body = inner.docs.entry(doc.clone()).or_default();
            body.extend(fields);
            let data = Value::Object(body.clone());
            let change = if existed { DocChange::modified(doc.id(), data) } else { DocChange::added(doc.id(), data) };
            outbox.collect(&inner, doc, &change);
        }
        outbox.deliver();
        Ok(())
    }

    fn apply_delete(&self, docs: &[DocPath], op: StoreOp) -> Result<(), StoreError> {
        let mut outbox = Outbox::default();
        {
            let mut inner = self.inner.borrow_mut();
            inner.journal.push(op);
            inner.check_online()?;
            for doc in docs {
                if inner.docs.remove(doc).is_some() {
                    outbox.collect(&inner, doc, &DocChange::removed(doc.id()));
                }
            }
        }
        outbox.deliver();
        Ok(())
    }

    fn apply_list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.journal.push(StoreOp::List(collection.clone()));
        inner.check_online()?;
        Ok(inner.collection_docs(collection))
    }
}

impl DocumentStore for MemoryStore {
    fn set_merge(&self, doc: &DocPath, fields: Map<String, Value>) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let store = self.clone();
        let doc = doc.clone();
        async move { store.apply_merge(&doc, fields) }.boxed_local()
    }

    fn delete(&self, doc: &DocPath) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let store = self.clone();
        let doc = doc.clone();
        async move {
            let op = StoreOp::Delete(doc.clone());
            store.apply_delete(std::slice::from_ref(&doc), op)
        }
        .boxed_local()
    }

    fn list(&self, collection: &CollectionPath) -> LocalBoxFuture<'static, Result<Vec<Document>, StoreError>> {
        let store = self.clone();
        let collection = collection.clone();
        async move { store.apply_list(&collection) }.boxed_local()
    }

    fn batch_delete(&self, docs: Vec<DocPath>) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let store = self.clone();
        async move {
            let op = StoreOp::BatchDelete(docs.clone());
            store.apply_delete(&docs, op)
        }
        .boxed_local()
    }

    fn subscribe(&self, collection: &CollectionPath, listener: ChangeListener) -> Result<Subscription, StoreError> {
        let listener = Rc::new(RefCell::new(listener));
        let (id, snapshot) = {
            let mut inner = self.inner.borrow_mut();
            inner.check_online()?;
            let id = inner.listener_id();
            inner.collection_listeners.push((id, collection.clone(), Rc::clone(&listener)));
            let snapshot: Vec<DocChange> = inner
                .collection_docs(collection)
                .into_iter()
                .map(|doc| DocChange::added(&doc.id, doc.data))
                .collect();
            (id, snapshot)
        };
        if !snapshot.is_empty() {
            (*listener.borrow_mut())(snapshot);
        }
        let weak = Rc::downgrade(&self.inner);
        Ok(Subscription::new(move || remove_listener(&weak, id)))
    }

    fn watch(&self, doc: &DocPath, listener: DocListener) -> Result<Subscription, StoreError> {
        let listener = Rc::new(RefCell::new(listener));
        let (id, body) = {
            let mut inner = self.inner.borrow_mut();
            inner.check_online()?;
            let id = inner.listener_id();
            inner.doc_listeners.push((id, doc.clone(), Rc::clone(&listener)));
            (id, inner.docs.get(doc).map(|body| Value::Object(body.clone())))
        };
        (*listener.borrow_mut())(body);
        let weak = Rc::downgrade(&self.inner);
        Ok(Subscription::new(move || remove_listener(&weak, id)))
    }
}

fn remove_listener(inner: &Weak<RefCell<Inner>>, id: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Ok(mut inner) = inner.try_borrow_mut() else {
        log::warn!("listener {id} removed while the store was busy; left registered");
        return;
    };
    inner.collection_listeners.retain(|(listener, _, _)| *listener != id);
    inner.doc_listeners.retain(|(listener, _, _)| *listener != id);
}
