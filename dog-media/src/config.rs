use dog_core::DogConfigSnapshot;

use crate::{MediaError, MediaResult};

/// Configuration for media storage and rendering
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    /// Size of each stored chunk. Fixed per deployment; every blob records
    /// the size it was written with.
    pub chunk_size: usize,

    /// Absolute max size allowed for a single media payload
    pub max_media_bytes: u64,

    /// How media fields appear in outbound documents
    pub rendering: MediaRendering,

    /// Wrap rendered media in `{file, name, content_type, length}`
    pub extended_info: bool,
}

/// How a media field value is rendered in a response document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRendering {
    /// Base64 of the blob bytes
    Base64,
    /// The stored media reference, untouched
    Reference,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            chunk_size: 255 * 1024,
            max_media_bytes: 100 * 1024 * 1024, // 100MB
            rendering: MediaRendering::Base64,
            extended_info: false,
        }
    }
}

impl MediaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from application configuration.
    ///
    /// Recognized keys: `media.chunk_size`, `media.max_bytes`,
    /// `media.return_base64`, `media.extended_info`. Missing keys keep their
    /// defaults; a key that is present but does not parse is an error.
    pub fn from_snapshot(snapshot: &DogConfigSnapshot) -> MediaResult<Self> {
        let mut config = Self::default();

        if snapshot.get("media.chunk_size").is_some() {
            config.chunk_size = snapshot
                .get_usize("media.chunk_size")
                .filter(|size| *size > 0)
                .ok_or_else(|| invalid_key("media.chunk_size", "a positive integer"))?;
        }
        if snapshot.get("media.max_bytes").is_some() {
            config.max_media_bytes = snapshot
                .get_u64("media.max_bytes")
                .ok_or_else(|| invalid_key("media.max_bytes", "an integer"))?;
        }
        if snapshot.get("media.return_base64").is_some() {
            let base64 = snapshot
                .get_bool("media.return_base64")
                .ok_or_else(|| invalid_key("media.return_base64", "true or false"))?;
            config.rendering = if base64 {
                MediaRendering::Base64
            } else {
                MediaRendering::Reference
            };
        }
        if snapshot.get("media.extended_info").is_some() {
            config.extended_info = snapshot
                .get_bool("media.extended_info")
                .ok_or_else(|| invalid_key("media.extended_info", "true or false"))?;
        }

        Ok(config)
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    pub fn with_max_media_bytes(mut self, bytes: u64) -> Self {
        self.max_media_bytes = bytes;
        self
    }

    pub fn with_rendering(mut self, rendering: MediaRendering) -> Self {
        self.rendering = rendering;
        self
    }

    pub fn with_extended_info(mut self) -> Self {
        self.extended_info = true;
        self
    }
}

fn invalid_key(key: &str, expected: &str) -> MediaError {
    MediaError::invalid(format!("config key '{key}' must be {expected}"))
}
