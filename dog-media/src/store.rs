use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MediaId, MediaInfo, MediaResult};

/// Parent record of a chunked blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: MediaId,
    pub filename: String,
    pub content_type: Option<String>,
    /// Total payload length in bytes
    pub length: u64,
    /// Chunk size the blob was written with
    pub chunk_size: usize,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    /// Number of chunk records that make up this blob.
    pub fn chunk_count(&self) -> u32 {
        if self.chunk_size == 0 {
            return 0;
        }
        self.length.div_ceil(self.chunk_size as u64) as u32
    }

    pub fn info(&self) -> MediaInfo {
        MediaInfo {
            id: self.id.clone(),
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            length: self.length,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// One fixed-size slice of a blob, addressed by (parent id, sequence index)
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub files_id: MediaId,
    pub n: u32,
    pub data: Bytes,
}

/// Document-oriented persistence for parent and chunk records.
///
/// Removal methods report whether anything was there; neither treats a
/// missing record as an error.
#[async_trait]
pub trait ChunkRecordStore: Send + Sync {
    async fn insert_file(&self, file: FileRecord) -> MediaResult<()>;

    async fn find_file(&self, id: &MediaId) -> MediaResult<Option<FileRecord>>;

    async fn remove_file(&self, id: &MediaId) -> MediaResult<bool>;

    async fn insert_chunk(&self, chunk: ChunkRecord) -> MediaResult<()>;

    async fn find_chunk(&self, id: &MediaId, n: u32) -> MediaResult<Option<ChunkRecord>>;

    /// Remove every chunk of a blob, returning how many were removed.
    async fn remove_chunks(&self, id: &MediaId) -> MediaResult<u64>;
}
