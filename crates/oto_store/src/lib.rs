//! Oto Store: a directory tree behind the blob binding.
//!
//! Source audio lives in sibling `{source}_files` directories under one
//! data directory; cached synthesized speech lives in `tts_files`. The
//! binding surface resolves unrecognized keys to absence without touching
//! the disk, and keeps missing entries distinct from real I/O failures.

mod key;

use async_trait::async_trait;
use oto_env::{BlobBinding, StorageError, StoredObject};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

pub use key::ObjectKey;

const TTS_DIR: &str = "tts_files";

/// Blob store rooted at a data directory.
#[derive(Clone)]
pub struct DirBucket {
    data_dir: PathBuf,
}

impl DirBucket {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn source_path(&self, source: &str, file: &str) -> PathBuf {
        self.data_dir.join(format!("{source}_files")).join(file)
    }

    fn tts_path(&self, identifier: &str) -> PathBuf {
        self.data_dir.join(TTS_DIR).join(format!("{identifier}.mp3"))
    }

    /// Read provider audio. A missing entry is [`StorageError::NotFound`],
    /// never folded into the I/O kind.
    pub async fn read_source(&self, source: &str, file: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.source_path(source, file);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound {
                key: format!("{source}_files/{file}"),
            }),
            Err(err) => Err(StorageError::Io { path, source: err }),
        }
    }

    /// Read a cached synthesis. Absence is a cache miss, not an error.
    pub async fn read_tts(&self, identifier: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.tts_path(identifier);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io { path, source: err }),
        }
    }

    /// Cache a synthesis, creating the cache directory on first write.
    pub async fn write_tts(&self, identifier: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let dir = self.data_dir.join(TTS_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|err| StorageError::Io { path: dir.clone(), source: err })?;
        let path = self.tts_path(identifier);
        fs::write(&path, bytes)
            .await
            .map_err(|err| StorageError::Io { path, source: err })
    }
}

#[async_trait]
impl BlobBinding for DirBucket {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        match ObjectKey::parse(key) {
            None => Ok(None),
            Some(ObjectKey::Tts { identifier }) => {
                Ok(self.read_tts(&identifier).await?.map(StoredObject::new))
            }
            Some(ObjectKey::Source { source, file }) => {
                match self.read_source(&source, &file).await {
                    Ok(bytes) => Ok(Some(StoredObject::new(bytes))),
                    Err(StorageError::NotFound { .. }) => Ok(None),
                    Err(err) => Err(err),
                }
            }
        }
    }

    /// Only cache keys persist. Puts for other shapes are acknowledged
    /// and dropped; the source collections are read-only here.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        match ObjectKey::parse(key) {
            Some(ObjectKey::Tts { identifier }) => self.write_tts(&identifier, &data).await,
            _ => {
                warn!("put ignored for non-cache key: {key}");
                Ok(())
            }
        }
    }
}
