use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::{
    ByteStream, ChunkRecord, ChunkRecordStore, FileRecord, MediaBlob, MediaConfig, MediaError,
    MediaId, MediaInfo, MediaResult, MediaStorage,
};

/// Media backend that splits payloads into fixed-size chunk records.
///
/// Layout per blob: one [`FileRecord`] holding the metadata and N
/// [`ChunkRecord`]s holding `(parent id, index, bytes)`. Chunks are never
/// edited in place; a new payload is always a new blob with a new id, so
/// writes need no locking.
pub struct ChunkedMediaStorage {
    records: Arc<dyn ChunkRecordStore>,
    chunk_size: usize,
    max_media_bytes: u64,
}

impl ChunkedMediaStorage {
    /// Create a chunked backend over a record store.
    ///
    /// # Panics
    ///
    /// Panics if `config.chunk_size` is zero.
    pub fn new<S: ChunkRecordStore + 'static>(records: S, config: &MediaConfig) -> Self {
        Self::with_records(Arc::new(records), config)
    }

    /// Same as [`ChunkedMediaStorage::new`] for an already shared store.
    ///
    /// # Panics
    ///
    /// Panics if `config.chunk_size` is zero.
    pub fn with_records(records: Arc<dyn ChunkRecordStore>, config: &MediaConfig) -> Self {
        assert!(config.chunk_size > 0, "media chunk size must be positive");
        Self {
            records,
            chunk_size: config.chunk_size,
            max_media_bytes: config.max_media_bytes,
        }
    }

    /// Store a payload delivered as a stream of arbitrarily sized pieces.
    pub async fn put_stream(
        &self,
        body: ByteStream,
        filename: &str,
        content_type: Option<&str>,
    ) -> MediaResult<MediaId> {
        let id = MediaId::new();

        let length = match self.write_chunks(&id, body).await {
            Ok(length) => length,
            Err(e) => {
                self.discard_chunks(&id).await;
                return Err(e);
            }
        };

        // Parent goes last: until it exists the blob is invisible to readers.
        let file = FileRecord {
            id: id.clone(),
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            length,
            chunk_size: self.chunk_size,
            uploaded_at: chrono::Utc::now(),
        };
        if let Err(e) = self.records.insert_file(file).await {
            self.discard_chunks(&id).await;
            return Err(e);
        }

        debug!(media_id = %id, length, filename, "stored media");
        Ok(id)
    }

    /// Open a blob for streaming; chunks are read lazily, in order.
    pub async fn open(&self, id: &MediaId) -> MediaResult<Option<(MediaInfo, ByteStream)>> {
        let Some(file) = self.records.find_file(id).await? else {
            return Ok(None);
        };

        let records = self.records.clone();
        let info = file.info();
        let stream = async_stream::stream! {
            for n in 0..file.chunk_count() {
                match records.find_chunk(&file.id, n).await {
                    Ok(Some(chunk)) => yield Ok(chunk.data),
                    Ok(None) => {
                        yield Err(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            format!("media {} is missing chunk {}", file.id, n),
                        ));
                        return;
                    }
                    Err(e) => {
                        yield Err(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            format!("failed to read chunk {} of media {}: {}", n, file.id, e),
                        ));
                        return;
                    }
                }
            }
        };

        let stream: ByteStream = Box::pin(stream);
        Ok(Some((info, stream)))
    }

    async fn write_chunks(&self, id: &MediaId, mut body: ByteStream) -> MediaResult<u64> {
        let mut buffer = BytesMut::with_capacity(self.chunk_size);
        let mut length = 0u64;
        let mut n = 0u32;

        while let Some(piece) = body.next().await {
            let mut piece = piece?;
            length += piece.len() as u64;
            if length > self.max_media_bytes {
                return Err(MediaError::TooLarge {
                    size: length,
                    max: self.max_media_bytes,
                });
            }

            while !piece.is_empty() {
                let take = (self.chunk_size - buffer.len()).min(piece.len());
                buffer.extend_from_slice(&piece.split_to(take));
                if buffer.len() == self.chunk_size {
                    self.write_chunk(id, n, buffer.split().freeze()).await?;
                    n += 1;
                }
            }
        }

        if !buffer.is_empty() {
            self.write_chunk(id, n, buffer.freeze()).await?;
            n += 1;
        }

        debug!(media_id = %id, chunks = n, "wrote media chunks");
        Ok(length)
    }

    async fn write_chunk(&self, id: &MediaId, n: u32, data: Bytes) -> MediaResult<()> {
        self.records
            .insert_chunk(ChunkRecord {
                files_id: id.clone(),
                n,
                data,
            })
            .await
    }

    /// Best effort; a leftover chunk set is an orphan, not a fault.
    async fn discard_chunks(&self, id: &MediaId) {
        if let Err(e) = self.records.remove_chunks(id).await {
            warn!(media_id = %id, error = %e, "failed to discard chunks of aborted upload");
        }
    }
}

#[async_trait]
impl MediaStorage for ChunkedMediaStorage {
    async fn put(
        &self,
        payload: Bytes,
        filename: &str,
        content_type: Option<&str>,
    ) -> MediaResult<MediaId> {
        let body = futures_util::stream::once(async move { Ok::<_, std::io::Error>(payload) });
        self.put_stream(Box::pin(body), filename, content_type).await
    }

    async fn get(&self, id: &MediaId) -> MediaResult<Option<MediaBlob>> {
        let Some(file) = self.records.find_file(id).await? else {
            return Ok(None);
        };

        let mut data = BytesMut::with_capacity(file.length as usize);
        for n in 0..file.chunk_count() {
            match self.records.find_chunk(id, n).await? {
                Some(chunk) => data.extend_from_slice(&chunk.data),
                None => {
                    // A delete racing this read removes the parent first.
                    if self.records.find_file(id).await?.is_none() {
                        return Ok(None);
                    }
                    return Err(MediaError::Corrupt {
                        id: id.to_string(),
                        reason: format!("missing chunk {} of {}", n, file.chunk_count()),
                    });
                }
            }
        }

        Ok(Some(MediaBlob {
            info: file.info(),
            data: data.freeze(),
        }))
    }

    async fn delete(&self, id: &MediaId) -> MediaResult<()> {
        let had_file = self.records.remove_file(id).await?;
        let chunks = self.records.remove_chunks(id).await?;
        debug!(media_id = %id, had_file, chunks, "deleted media");
        Ok(())
    }

    async fn exists(&self, id: &MediaId) -> MediaResult<bool> {
        Ok(self.records.find_file(id).await?.is_some())
    }

    /// Reads the parent record only; chunks are not touched.
    async fn info(&self, id: &MediaId) -> MediaResult<Option<MediaInfo>> {
        Ok(self.records.find_file(id).await?.map(|file| file.info()))
    }
}
