//! # dog-media: media fields for DogRS resources
//!
//! `dog-media` lets a resource declare fields that hold binary media. Clients
//! send those fields as base64 in JSON bodies or as file parts in multipart
//! bodies; the document itself only ever stores an opaque [`MediaId`], and
//! the bytes live in a pluggable [`MediaStorage`] backend.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dog_media::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> dog_core::DogResult<()> {
//! let config = MediaConfig::default();
//! let storage = ChunkedMediaStorage::new(MemoryRecordStore::new(), &config);
//! let schema = ResourceSchema::new("contacts")
//!     .required_value("ref")
//!     .media("media");
//!
//! let contacts = MediaResource::new(MediaOrchestrator::new(
//!     Arc::new(storage),
//!     Arc::new(MemoryDocumentStore::new()),
//!     schema,
//!     config,
//! ));
//!
//! let body = WriteBody::from_value(json!({
//!     "ref": "1234567890123456789054321",
//!     "media": "bXkgZmlsZSBjb250ZW50cw=="
//! }))?;
//! let created = contacts.create(body).await?;
//!
//! // Media come back base64-encoded by default
//! assert_eq!(created["media"], "bXkgZmlsZSBjb250ZW50cw==");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │   MediaResource    │  ← REST verbs, DogError mapping
//! ├────────────────────┤
//! │  MediaOrchestrator │  ← validation, write ordering, cleanup
//! ├─────────┬──────────┤
//! │ Media   │ Document │
//! │ Storage │ Store    │  ← pluggable backends
//! └─────────┴──────────┘
//! ```
//!
//! [`ChunkedMediaStorage`] is the reference backend: it splits each blob
//! into fixed-size chunk records behind a [`ChunkRecordStore`], so any
//! record store (in memory, a document database, ...) can hold media.

pub mod body;
pub mod chunked;
pub mod codec;
mod config;
pub mod document;
mod error;
pub mod memory;
pub mod orchestrator;
mod render;
pub mod resource;
pub mod schema;
pub mod storage;
pub mod store;
mod types;
pub mod validate;

pub use body::{BodyFormat, WriteBody};
pub use chunked::ChunkedMediaStorage;
pub use config::{MediaConfig, MediaRendering};
pub use document::{DocumentStore, MemoryDocumentStore, StoredDocument, WriteOutcome};
pub use error::{MediaError, MediaResult};
pub use memory::MemoryRecordStore;
pub use orchestrator::MediaOrchestrator;
pub use render::render_document;
pub use resource::{to_dog_error, MediaResource};
pub use schema::{FieldKind, FieldSpec, ResourceSchema};
pub use storage::MediaStorage;
pub use store::{ChunkRecord, ChunkRecordStore, FileRecord};
pub use types::{ByteStream, MediaBlob, MediaId, MediaInfo, MediaUpload};
pub use validate::{is_file_like, validate_write, MediaChange, MediaIssues, PreparedWrite, WriteMode};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ChunkedMediaStorage, DocumentStore, MediaConfig, MediaError, MediaId, MediaOrchestrator,
        MediaRendering, MediaResource, MediaResult, MediaStorage, MediaUpload,
        MemoryDocumentStore, MemoryRecordStore, ResourceSchema, WriteBody,
    };
}
