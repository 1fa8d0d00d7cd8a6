use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::MediaResult;

/// Key under which a rendered document exposes its id
pub const ID_FIELD: &str = "_id";
/// Key under which a rendered document exposes its concurrency token
pub const ETAG_FIELD: &str = "_etag";

/// A persisted resource document
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub etag: String,
    pub fields: Map<String, Value>,
}

impl StoredDocument {
    /// Fields plus `_id` and `_etag`, as stored (media fields hold references).
    pub fn to_json(&self) -> Value {
        let mut out = self.fields.clone();
        out.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        out.insert(ETAG_FIELD.to_string(), Value::String(self.etag.clone()));
        Value::Object(out)
    }
}

/// Result of a token-guarded write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// Write applied; carries the document as it now stands (or stood, for removals)
    Written(StoredDocument),
    /// The concurrency token did not match
    Conflict,
    NotFound,
}

/// Structured-document store with atomic single-document writes.
///
/// Every write guarded by `match_token` succeeds only if the token equals
/// the document's current etag, and every successful write issues a new etag.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, fields: Map<String, Value>) -> MediaResult<StoredDocument>;

    async fn replace(
        &self,
        id: &str,
        fields: Map<String, Value>,
        match_token: &str,
    ) -> MediaResult<WriteOutcome>;

    /// Merge top-level keys of `partial` into the document.
    async fn patch(
        &self,
        id: &str,
        partial: Map<String, Value>,
        match_token: &str,
    ) -> MediaResult<WriteOutcome>;

    async fn remove(&self, id: &str, match_token: &str) -> MediaResult<WriteOutcome>;

    async fn find_one(&self, id: &str) -> MediaResult<Option<StoredDocument>>;
}

/// In-memory document store for tests and development
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    docs: Arc<RwLock<HashMap<String, StoredDocument>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn next_etag() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Apply `f` to the document if the token matches, under one write lock.
    fn guarded_write<F>(&self, id: &str, match_token: &str, f: F) -> WriteOutcome
    where
        F: FnOnce(&mut StoredDocument),
    {
        let mut docs = self.docs.write();
        let Some(doc) = docs.get_mut(id) else {
            return WriteOutcome::NotFound;
        };
        if doc.etag != match_token {
            return WriteOutcome::Conflict;
        }
        f(doc);
        doc.etag = Self::next_etag();
        WriteOutcome::Written(doc.clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, fields: Map<String, Value>) -> MediaResult<StoredDocument> {
        let doc = StoredDocument {
            id: Uuid::new_v4().simple().to_string(),
            etag: Self::next_etag(),
            fields,
        };
        self.docs.write().insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn replace(
        &self,
        id: &str,
        fields: Map<String, Value>,
        match_token: &str,
    ) -> MediaResult<WriteOutcome> {
        Ok(self.guarded_write(id, match_token, |doc| doc.fields = fields))
    }

    async fn patch(
        &self,
        id: &str,
        partial: Map<String, Value>,
        match_token: &str,
    ) -> MediaResult<WriteOutcome> {
        Ok(self.guarded_write(id, match_token, |doc| doc.fields.extend(partial)))
    }

    async fn remove(&self, id: &str, match_token: &str) -> MediaResult<WriteOutcome> {
        let mut docs = self.docs.write();
        match docs.get(id).map(|doc| doc.etag == match_token) {
            None => Ok(WriteOutcome::NotFound),
            Some(false) => Ok(WriteOutcome::Conflict),
            Some(true) => Ok(docs
                .remove(id)
                .map_or(WriteOutcome::NotFound, WriteOutcome::Written)),
        }
    }

    async fn find_one(&self, id: &str) -> MediaResult<Option<StoredDocument>> {
        Ok(self.docs.read().get(id).cloned())
    }
}
