use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for media content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Opaque reference to a stored blob.
///
/// This is the value a media field holds once its document is persisted.
/// Every put issues a fresh one; a reference is never reused for
/// different content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    /// Generate a new random media ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept `text` only if it has the shape [`MediaId::new`] issues:
    /// 32 lowercase hex digits.
    pub fn parse(text: &str) -> Option<Self> {
        let issued = text.len() == 32
            && text
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        issued.then(|| Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read a reference back out of a stored field value.
    ///
    /// Only non-empty strings are references; null or anything else means
    /// the field holds no media.
    pub fn from_field(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            _ => None,
        }
    }

    pub fn to_field(&self) -> serde_json::Value {
        serde_json::Value::String(self.0.clone())
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MediaId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A raw payload handed over by the request layer for one media field
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpload {
    pub data: Bytes,
    pub filename: String,
    pub content_type: Option<String>,
}

impl MediaUpload {
    pub fn new<B: Into<Bytes>, S: Into<String>>(data: B, filename: S) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
            content_type: None,
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Metadata captured when a blob is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: MediaId,
    pub filename: String,
    pub content_type: Option<String>,
    pub length: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// A stored blob: its metadata plus the full byte sequence
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlob {
    pub info: MediaInfo,
    pub data: Bytes,
}

impl MediaBlob {
    pub fn filename(&self) -> &str {
        &self.info.filename
    }

    pub fn content_type(&self) -> Option<&str> {
        self.info.content_type.as_deref()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}
