//! Keeps documents and their blobs consistent across create, replace,
//! patch and remove.
//!
//! The document store and the media store cannot share a transaction, so
//! every write follows one ordering:
//!
//! 1. validate the body against the current document (nothing is stored
//!    for a rejected body)
//! 2. put new payloads
//! 3. write the document, guarded by its concurrency token
//! 4. only then delete blobs the document no longer references
//!
//! A write the document store rejects discards the blobs it stored in
//! step 2. Failures in step 4 are logged and leave orphans behind; they
//! never fail the request.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::validate::{validate_write, MediaChange, PreparedWrite, WriteMode};
use crate::{
    render_document, DocumentStore, MediaConfig, MediaError, MediaId, MediaResult, MediaStorage,
    ResourceSchema, StoredDocument, WriteBody, WriteOutcome,
};

pub struct MediaOrchestrator {
    storage: Arc<dyn MediaStorage>,
    documents: Arc<dyn DocumentStore>,
    schema: ResourceSchema,
    config: MediaConfig,
}

impl MediaOrchestrator {
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        documents: Arc<dyn DocumentStore>,
        schema: ResourceSchema,
        config: MediaConfig,
    ) -> Self {
        Self {
            storage,
            documents,
            schema,
            config,
        }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    #[instrument(skip(self, body), fields(resource = %self.schema.name()))]
    pub async fn create(&self, body: WriteBody) -> MediaResult<StoredDocument> {
        let prepared = self.prepare(body, WriteMode::Create, None)?;
        let (fields, stored) = self.store_media(prepared).await?;

        match self.documents.insert(fields).await {
            Ok(doc) => {
                info!(id = %doc.id, media = stored.len(), "created document");
                Ok(doc)
            }
            Err(e) => {
                self.discard(stored.values()).await;
                Err(e)
            }
        }
    }

    /// Full replacement. Media fields the body leaves out end up empty and
    /// their blobs are released.
    #[instrument(skip(self, body, match_token), fields(resource = %self.schema.name()))]
    pub async fn replace(
        &self,
        id: &str,
        body: WriteBody,
        match_token: &str,
    ) -> MediaResult<StoredDocument> {
        self.update(id, body, match_token, WriteMode::Replace).await
    }

    /// Partial update. Only media fields present in the body are touched.
    #[instrument(skip(self, body, match_token), fields(resource = %self.schema.name()))]
    pub async fn patch(
        &self,
        id: &str,
        body: WriteBody,
        match_token: &str,
    ) -> MediaResult<StoredDocument> {
        self.update(id, body, match_token, WriteMode::Patch).await
    }

    /// Remove a document, then every blob it referenced.
    #[instrument(skip(self, match_token), fields(resource = %self.schema.name()))]
    pub async fn remove(&self, id: &str, match_token: &str) -> MediaResult<StoredDocument> {
        let outcome = self.documents.remove(id, match_token).await;
        let doc = settle(id, outcome)?;

        let referenced: Vec<MediaId> = self
            .schema
            .media_fields()
            .filter_map(|field| doc.fields.get(field).and_then(MediaId::from_field))
            .collect();
        self.discard(referenced.iter()).await;

        info!(id, media = referenced.len(), "removed document");
        Ok(doc)
    }

    pub async fn find(&self, id: &str) -> MediaResult<Option<StoredDocument>> {
        self.documents.find_one(id).await
    }

    /// Render a stored document with its media materialized.
    pub async fn render(&self, doc: &StoredDocument) -> MediaResult<Value> {
        render_document(self.storage.as_ref(), &self.schema, &self.config, doc).await
    }

    async fn update(
        &self,
        id: &str,
        body: WriteBody,
        match_token: &str,
        mode: WriteMode,
    ) -> MediaResult<StoredDocument> {
        let prior = self.current(id, match_token).await?;
        let prepared = self.prepare(body, mode, Some(&prior.fields))?;

        let touched: Vec<String> = match mode {
            WriteMode::Patch => prepared.media.keys().cloned().collect(),
            _ => self.schema.media_fields().map(str::to_string).collect(),
        };

        let (fields, stored) = self.store_media(prepared).await?;
        let outcome = match mode {
            WriteMode::Patch => self.documents.patch(id, fields, match_token).await,
            _ => self.documents.replace(id, fields, match_token).await,
        };

        let doc = match settle(id, outcome) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(id, error = %e, "document write rejected, discarding new media");
                self.discard(stored.values()).await;
                return Err(e);
            }
        };

        let superseded: Vec<MediaId> = touched
            .iter()
            .filter_map(|field| {
                let old = prior.fields.get(field).and_then(MediaId::from_field)?;
                let new = doc.fields.get(field).and_then(MediaId::from_field);
                (new.as_ref() != Some(&old)).then_some(old)
            })
            .collect();
        self.discard(superseded.iter()).await;

        info!(
            id,
            stored = stored.len(),
            released = superseded.len(),
            "updated document"
        );
        Ok(doc)
    }

    fn prepare(
        &self,
        body: WriteBody,
        mode: WriteMode,
        prior: Option<&Map<String, Value>>,
    ) -> MediaResult<PreparedWrite> {
        validate_write(&self.schema, body, mode, &self.config, prior)
            .map_err(MediaError::Validation)
    }

    /// Fetch the document a guarded write targets and check its token
    /// before any blob is stored.
    async fn current(&self, id: &str, match_token: &str) -> MediaResult<StoredDocument> {
        let doc = self
            .documents
            .find_one(id)
            .await?
            .ok_or_else(|| MediaError::not_found(id))?;
        if doc.etag != match_token {
            return Err(MediaError::conflict(id));
        }
        Ok(doc)
    }

    /// Put every new payload and point its field at the new reference.
    ///
    /// If a put fails, blobs already stored for this write are discarded.
    async fn store_media(
        &self,
        prepared: PreparedWrite,
    ) -> MediaResult<(Map<String, Value>, BTreeMap<String, MediaId>)> {
        let PreparedWrite { mut fields, media } = prepared;
        let mut stored = BTreeMap::new();

        for (field, change) in media {
            match change {
                MediaChange::Store(upload) => {
                    let put = self
                        .storage
                        .put(upload.data, &upload.filename, upload.content_type.as_deref())
                        .await;
                    match put {
                        Ok(media_id) => {
                            fields.insert(field.clone(), media_id.to_field());
                            stored.insert(field, media_id);
                        }
                        Err(e) => {
                            warn!(field = %field, error = %e, "media put failed");
                            self.discard(stored.values()).await;
                            return Err(e);
                        }
                    }
                }
                MediaChange::Keep(held) => {
                    fields.insert(field, held.to_field());
                }
                MediaChange::Clear => {
                    fields.insert(field, Value::Null);
                }
            }
        }

        Ok((fields, stored))
    }

    /// Best-effort delete; failures only leave orphans.
    async fn discard<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a MediaId>,
    {
        for media_id in ids {
            if let Err(e) = self.storage.delete(media_id).await {
                warn!(%media_id, error = %e, "failed to delete media, leaving orphan");
            }
        }
    }
}

fn settle(id: &str, outcome: MediaResult<WriteOutcome>) -> MediaResult<StoredDocument> {
    match outcome? {
        WriteOutcome::Written(doc) => Ok(doc),
        WriteOutcome::Conflict => Err(MediaError::conflict(id)),
        WriteOutcome::NotFound => Err(MediaError::not_found(id)),
    }
}
