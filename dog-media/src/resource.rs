//! REST-facing verbs for a media-bearing resource.
//!
//! Every verb returns a rendered JSON document or an `anyhow::Error`
//! carrying a [`DogError`] the transport can serialize directly.

use dog_core::{bail_dog, DogError, DogResult};
use serde_json::{json, Value};
use tracing::error;

use crate::{MediaError, MediaOrchestrator, StoredDocument, WriteBody};

pub struct MediaResource {
    orchestrator: MediaOrchestrator,
}

impl MediaResource {
    pub fn new(orchestrator: MediaOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &MediaOrchestrator {
        &self.orchestrator
    }

    pub fn name(&self) -> &str {
        self.orchestrator.schema().name()
    }

    pub async fn get(&self, id: &str) -> DogResult<Value> {
        let found = self.orchestrator.find(id).await.map_err(|e| self.fail(e))?;
        let Some(doc) = found else {
            bail_dog!(not_found, "No record found for id '{}'", id);
        };
        self.render(&doc).await
    }

    pub async fn create(&self, body: WriteBody) -> DogResult<Value> {
        let doc = self
            .orchestrator
            .create(body)
            .await
            .map_err(|e| self.fail(e))?;
        self.render(&doc).await
    }

    /// Full replacement guarded by `if_match`.
    pub async fn update(&self, id: &str, body: WriteBody, if_match: &str) -> DogResult<Value> {
        let doc = self
            .orchestrator
            .replace(id, body, if_match)
            .await
            .map_err(|e| self.fail(e))?;
        self.render(&doc).await
    }

    pub async fn patch(&self, id: &str, body: WriteBody, if_match: &str) -> DogResult<Value> {
        let doc = self
            .orchestrator
            .patch(id, body, if_match)
            .await
            .map_err(|e| self.fail(e))?;
        self.render(&doc).await
    }

    /// Returns `{"_id": id}`; the removed document's media are already gone.
    pub async fn remove(&self, id: &str, if_match: &str) -> DogResult<Value> {
        let doc = self
            .orchestrator
            .remove(id, if_match)
            .await
            .map_err(|e| self.fail(e))?;
        Ok(json!({ "_id": doc.id }))
    }

    async fn render(&self, doc: &StoredDocument) -> DogResult<Value> {
        self.orchestrator
            .render(doc)
            .await
            .map_err(|e| self.fail(e))
    }

    fn fail(&self, err: MediaError) -> anyhow::Error {
        to_dog_error(self.name(), err).into_anyhow()
    }
}

/// Map a media failure onto the Feathers error classes.
///
/// Backend failures become a generic 500; the underlying error stays in
/// `source` for logs and is dropped by `sanitize_for_client`.
pub fn to_dog_error(resource: &str, err: MediaError) -> DogError {
    match err {
        MediaError::Validation(issues) => {
            DogError::unprocessable(format!("Validation failed for '{resource}'"))
                .with_errors(issues.to_value())
        }
        MediaError::NotFound { id } => DogError::not_found(format!("No record found for id '{id}'")),
        MediaError::Conflict { id } => DogError::conflict(format!(
            "Concurrency token does not match current version of '{id}'"
        )),
        err @ (MediaError::Invalid { .. }
        | MediaError::TooLarge { .. }
        | MediaError::Decode { .. }) => DogError::bad_request(err.to_string()),
        other => {
            error!(resource, error = %other, "media storage failure");
            DogError::general_error("Media storage error").with_source(anyhow::Error::new(other))
        }
    }
}
