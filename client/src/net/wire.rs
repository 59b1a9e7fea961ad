//! JSON payloads exchanged with the JavaScript store host.
//!
//! DESIGN
//! ======
//! Crossing the wasm boundary as JSON strings keeps the extern surface to
//! plain `&str`/`String` arguments. Paths travel in their `a/b/c` display
//! form; field maps, path lists, change batches and listings as JSON. The
//! server-timestamp sentinel passes through untouched for the host to
//! translate into the SDK's native value.

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use canvas::identity::Participant;
use canvas::store::StoreError;
use records::{DocChange, DocPath, Document};
use serde::Deserialize;
use serde_json::{Map, Value};

/// The identity provider's user record, as the host reports it.
#[derive(Debug, Deserialize)]
struct HostUser {
    #[serde(alias = "id")]
    uid: String,
    #[serde(default)]
    email: Option<String>,
}

fn malformed(what: &str, err: &serde_json::Error) -> StoreError {
    StoreError::Backend(format!("malformed {what} from store host: {err}"))
}

/// Parse a subscription batch.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] when the batch is not a change array.
pub fn parse_changes(raw: &str) -> Result<Vec<DocChange>, StoreError> {
    serde_json::from_str(raw).map_err(|err| malformed("change batch", &err))
}

/// Parse a collection listing.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] when the listing is not a document array.
pub fn parse_documents(raw: &str) -> Result<Vec<Document>, StoreError> {
    serde_json::from_str(raw).map_err(|err| malformed("listing", &err))
}

/// Parse a watched document body; `None` for deleted or unreadable bodies.
#[must_use]
pub fn parse_body(raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => None,
        Ok(body) => Some(body),
        Err(err) => {
            log::warn!("ignoring unreadable document body: {err}");
            None
        }
    }
}

/// Parse the signed-in user; `None` when signed out or unusable.
#[must_use]
pub fn parse_participant(raw: Option<&str>) -> Option<Participant> {
    let user = match serde_json::from_str::<Option<HostUser>>(raw?) {
        Ok(Some(user)) => user,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("ignoring unreadable user record: {err}");
            return None;
        }
    };
    let id = user.uid.trim();
    if id.is_empty() {
        return None;
    }
    Some(Participant { id: id.to_owned(), email: user.email.unwrap_or_default() })
}

/// Field map for a merge write.
#[must_use]
pub fn encode_fields(fields: &Map<String, Value>) -> String {
    Value::Object(fields.clone()).to_string()
}

/// Path list for a batch delete.
#[must_use]
pub fn encode_paths(docs: &[DocPath]) -> String {
    Value::Array(docs.iter().map(|doc| Value::String(doc.to_string())).collect()).to_string()
}
