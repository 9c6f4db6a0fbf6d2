//! Blob binding contract: key-addressed byte storage.

use crate::error::StorageError;
use async_trait::async_trait;

/// Media type of every object served from the audio store. The store holds
/// nothing else, so fetched objects carry it as a constant.
pub const AUDIO_MPEG: &str = "audio/mpeg";

/// A fetched blob: raw bytes plus the fixed media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    data: Vec<u8>,
}

impl StoredObject {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn content_type(&self) -> &'static str {
        AUDIO_MPEG
    }
}

/// Backend seam for the blob binding. The production backend maps keys to
/// files under a data directory; tests substitute in-memory fakes.
#[async_trait]
pub trait BlobBinding: Send + Sync {
    /// Fetch by composite key. `Ok(None)` means the key resolves to nothing,
    /// including keys whose shape the backend does not recognize; `Err` is
    /// reserved for real I/O failure.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError>;

    /// Store bytes under a composite key, replacing any previous object.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError>;
}
