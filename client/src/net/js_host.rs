//! Store and identity capabilities backed by the page's JavaScript host.
//!
//! The page installs `window.rocketStore`, a thin adapter over the real-time
//! database SDK, before the wasm bundle starts:
//!
//! | Method | Returns |
//! |--------|---------|
//! | `setMerge(path, fieldsJson)` | `Promise<void>` |
//! | `delete(path)` | `Promise<void>` |
//! | `list(collectionPath)` | `Promise<string>` (JSON `[{id, data}]`) |
//! | `batchDelete(pathsJson)` | `Promise<void>` |
//! | `onCollection(path, cb(changesJson))` | unsubscribe function |
//! | `onDocument(path, cb(bodyJson \| null))` | unsubscribe function |
//! | `currentUser()` | JSON `{uid, email}` or `null` |
//!
//! ERROR HANDLING
//! ==============
//! Rejected promises and synchronous throws become [`StoreError::Backend`].
//! Without a host the overlay falls back to an in-memory store and a local
//! participant, so drawing still works but nothing is shared.

use std::rc::Rc;

use canvas::identity::{Identity, Participant};
use canvas::memory::MemoryStore;
use canvas::store::{ChangeListener, DocListener, DocumentStore, StoreError, Subscription};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use js_sys::{Function, Promise, Reflect};
use records::{CollectionPath, DocPath, Document};
use serde_json::{Map, Value};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::net::wire::{encode_fields, encode_paths, parse_body, parse_changes, parse_documents, parse_participant};

/// Global the page installs the store adapter under.
pub const HOST_GLOBAL: &str = "rocketStore";

/// Participant id used when no identity provider is available.
pub const OFFLINE_PARTICIPANT: &str = "local";

#[wasm_bindgen]
extern "C" {
    /// Page-provided adapter over the database SDK.
    #[derive(Clone)]
    pub type StoreHost;

    #[wasm_bindgen(method, catch, js_name = setMerge)]
    fn set_merge(this: &StoreHost, path: &str, fields: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn delete(this: &StoreHost, path: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn list(this: &StoreHost, path: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = batchDelete)]
    fn batch_delete(this: &StoreHost, paths: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = onCollection)]
    fn on_collection(this: &StoreHost, path: &str, listener: &Closure<dyn FnMut(String)>) -> Result<Function, JsValue>;

    #[wasm_bindgen(method, catch, js_name = onDocument)]
    fn on_document(
        this: &StoreHost,
        path: &str,
        listener: &Closure<dyn FnMut(Option<String>)>,
    ) -> Result<Function, JsValue>;

    #[wasm_bindgen(method, js_name = currentUser)]
    fn current_user(this: &StoreHost) -> Option<String>;
}

fn js_error(err: JsValue) -> StoreError {
    StoreError::Backend(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

async fn settle(call: Result<Promise, JsValue>) -> Result<JsValue, StoreError> {
    let promise = call.map_err(js_error)?;
    JsFuture::from(promise).await.map_err(js_error)
}

fn unsubscribe_with(unsubscribe: Function) -> impl FnOnce() {
    move || {
        if let Err(err) = unsubscribe.call0(&JsValue::NULL) {
            log::warn!("store host unsubscribe failed: {err:?}");
        }
    }
}

/// [`DocumentStore`] over the page's store host.
#[derive(Clone)]
pub struct JsStore {
    host: StoreHost,
}

impl DocumentStore for JsStore {
    fn set_merge(&self, doc: &DocPath, fields: Map<String, Value>) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let call = self.host.set_merge(&doc.to_string(), &encode_fields(&fields));
        async move { settle(call).await.map(|_| ()) }.boxed_local()
    }

    fn delete(&self, doc: &DocPath) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let call = self.host.delete(&doc.to_string());
        async move { settle(call).await.map(|_| ()) }.boxed_local()
    }

    fn list(&self, collection: &CollectionPath) -> LocalBoxFuture<'static, Result<Vec<Document>, StoreError>> {
        let call = self.host.list(&collection.to_string());
        async move {
            let raw = settle(call).await?;
            let raw = raw.as_string().ok_or_else(|| StoreError::Backend("listing is not a string".to_owned()))?;
            parse_documents(&raw)
        }
        .boxed_local()
    }

    fn batch_delete(&self, docs: Vec<DocPath>) -> LocalBoxFuture<'static, Result<(), StoreError>> {
        let call = self.host.batch_delete(&encode_paths(&docs));
        async move { settle(call).await.map(|_| ()) }.boxed_local()
    }

    fn subscribe(&self, collection: &CollectionPath, mut listener: ChangeListener) -> Result<Subscription, StoreError> {
        let path = collection.to_string();
        let callback = Closure::<dyn FnMut(String)>::new(move |raw: String| match parse_changes(&raw) {
            Ok(changes) => listener(changes),
            Err(err) => log::warn!("{err}"),
        });
        let unsubscribe = self.host.on_collection(&path, &callback).map_err(js_error)?;
        let cancel = unsubscribe_with(unsubscribe);
        Ok(Subscription::new(move || {
            cancel();
            drop(callback);
        }))
    }

    fn watch(&self, doc: &DocPath, mut listener: DocListener) -> Result<Subscription, StoreError> {
        let path = doc.to_string();
        let callback =
            Closure::<dyn FnMut(Option<String>)>::new(move |raw: Option<String>| listener(parse_body(raw.as_deref())));
        let unsubscribe = self.host.on_document(&path, &callback).map_err(js_error)?;
        let cancel = unsubscribe_with(unsubscribe);
        Ok(Subscription::new(move || {
            cancel();
            drop(callback);
        }))
    }
}

/// [`Identity`] over the page's store host.
pub struct JsIdentity {
    host: StoreHost,
}

impl Identity for JsIdentity {
    fn current_participant(&self) -> Option<Participant> {
        parse_participant(self.host.current_user().as_deref())
    }
}

/// The capabilities the overlay runs against.
pub struct HostConnection {
    pub store: Rc<dyn DocumentStore>,
    pub identity: Box<dyn Identity>,
    /// `false` when running on the in-memory fallback.
    pub shared: bool,
}

/// Bind to `window.rocketStore`, or fall back to a local in-memory store.
pub fn connect() -> HostConnection {
    let host = web_sys::window()
        .and_then(|window| Reflect::get(&window, &JsValue::from_str(HOST_GLOBAL)).ok())
        .filter(JsValue::is_object);
    match host {
        Some(host) => {
            let host: StoreHost = host.unchecked_into();
            log::debug!("connected to store host");
            HostConnection {
                store: Rc::new(JsStore { host: host.clone() }),
                identity: Box::new(JsIdentity { host }),
                shared: true,
            }
        }
        None => {
            log::warn!("no window.{HOST_GLOBAL}; drawings stay on this device");
            let local = Participant { id: OFFLINE_PARTICIPANT.to_owned(), email: String::new() };
            HostConnection {
                store: Rc::new(MemoryStore::new()),
                identity: Box::new(canvas::identity::StaticIdentity(Some(local))),
                shared: false,
            }
        }
    }
}
