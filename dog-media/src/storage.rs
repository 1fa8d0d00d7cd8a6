use async_trait::async_trait;
use bytes::Bytes;

use crate::{MediaBlob, MediaId, MediaInfo, MediaResult};

/// Capability set every media backend must provide.
///
/// The four core operations are required; there is no fallback body, so
/// an incomplete backend does not compile. `info` falls back to `get` and
/// should be overridden by backends that keep metadata apart from bytes.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `payload` and return a reference that has never been issued before.
    async fn put(
        &self,
        payload: Bytes,
        filename: &str,
        content_type: Option<&str>,
    ) -> MediaResult<MediaId>;

    /// Fetch a blob. An unknown reference yields `Ok(None)`.
    async fn get(&self, id: &MediaId) -> MediaResult<Option<MediaBlob>>;

    /// Remove a blob. Deleting an unknown reference is a no-op.
    async fn delete(&self, id: &MediaId) -> MediaResult<()>;

    /// Existence check that does not read the payload.
    async fn exists(&self, id: &MediaId) -> MediaResult<bool>;

    /// Metadata of a blob. An unknown reference yields `Ok(None)`.
    async fn info(&self, id: &MediaId) -> MediaResult<Option<MediaInfo>> {
        Ok(self.get(id).await?.map(|blob| blob.info))
    }
}
