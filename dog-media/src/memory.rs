use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{ChunkRecord, ChunkRecordStore, FileRecord, MediaId, MediaResult};

/// In-memory record store for tests and development
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    files: Arc<RwLock<HashMap<MediaId, FileRecord>>>,
    /// Chunks keyed by (parent id, sequence index), so a parent's chunks sit together in order
    chunks: Arc<RwLock<BTreeMap<(MediaId, u32), Bytes>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// Chunks currently held for one blob
    pub fn chunk_count(&self, id: &MediaId) -> usize {
        self.chunk_keys(id).len()
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.read().len()
    }

    fn chunk_keys(&self, id: &MediaId) -> Vec<(MediaId, u32)> {
        let chunks = self.chunks.read();
        chunks
            .range((id.clone(), 0)..=(id.clone(), u32::MAX))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl ChunkRecordStore for MemoryRecordStore {
    async fn insert_file(&self, file: FileRecord) -> MediaResult<()> {
        self.files.write().insert(file.id.clone(), file);
        Ok(())
    }

    async fn find_file(&self, id: &MediaId) -> MediaResult<Option<FileRecord>> {
        Ok(self.files.read().get(id).cloned())
    }

    async fn remove_file(&self, id: &MediaId) -> MediaResult<bool> {
        Ok(self.files.write().remove(id).is_some())
    }

    async fn insert_chunk(&self, chunk: ChunkRecord) -> MediaResult<()> {
        self.chunks
            .write()
            .insert((chunk.files_id, chunk.n), chunk.data);
        Ok(())
    }

    async fn find_chunk(&self, id: &MediaId, n: u32) -> MediaResult<Option<ChunkRecord>> {
        let chunks = self.chunks.read();
        Ok(chunks.get(&(id.clone(), n)).map(|data| ChunkRecord {
            files_id: id.clone(),
            n,
            data: data.clone(),
        }))
    }

    async fn remove_chunks(&self, id: &MediaId) -> MediaResult<u64> {
        let keys = self.chunk_keys(id);
        let mut chunks = self.chunks.write();
        let removed = keys
            .iter()
            .filter(|key| chunks.remove(*key).is_some())
            .count();
        Ok(removed as u64)
    }
}
