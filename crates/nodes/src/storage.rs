//! Internal storage accessors for `kestra://` artifacts.
//!
//! Tasks never touch the filesystem directly: they hand a storage URI to the
//! [`StorageAccessor`] on their context and read back a byte stream. The
//! stream is owned by the caller and released when it is dropped.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tracing::debug;
use url::Url;

use crate::StorageError;

/// URI scheme reserved for internally stored files.
pub const STORAGE_SCHEME: &str = "kestra";

/// A readable stream over one stored artifact.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Read access to the runtime's artifact store.
#[async_trait]
pub trait StorageAccessor: Send + Sync {
    /// Open the artifact referenced by `uri` for reading.
    async fn open(&self, uri: &Url) -> Result<ByteStream, StorageError>;
}

/// Split a storage URI into path segments, rejecting anything that would
/// escape the storage root.
fn storage_segments(uri: &Url) -> Result<Vec<String>, StorageError> {
    if !uri.scheme().eq_ignore_ascii_case(STORAGE_SCHEME) {
        return Err(StorageError::UnsupportedScheme(uri.scheme().to_owned()));
    }

    let host = uri.host_str().filter(|h| !h.is_empty());
    let path = uri.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let segments: Vec<String> = host.into_iter().chain(path).map(str::to_owned).collect();
    if segments.is_empty() || segments.iter().any(|s| s == ".." || s == ".") {
        return Err(StorageError::InvalidPath(uri.to_string()));
    }
    Ok(segments)
}

/// Normalized `a/b/c` key of a storage URI.
///
/// Fails with [`StorageError::InvalidPath`] when the URI names no file or
/// tries to leave the storage root.
pub fn storage_key(uri: &Url) -> Result<String, StorageError> {
    Ok(storage_segments(uri)?.join("/"))
}

// ---------------------------------------------------------------------------
// LocalStorage
// ---------------------------------------------------------------------------

/// Filesystem-backed storage: `kestra:///a/b.txt` lives at `<root>/a/b.txt`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path a URI maps to.
    pub fn resolve(&self, uri: &Url) -> Result<PathBuf, StorageError> {
        let segments = storage_segments(uri)?;
        Ok(segments.iter().fold(self.root.clone(), |path, s| path.join(s)))
    }
}

#[async_trait]
impl StorageAccessor for LocalStorage {
    async fn open(&self, uri: &Url) -> Result<ByteStream, StorageError> {
        let path = self.resolve(uri)?;
        debug!("opening {} from {}", uri, path.display());

        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(uri.to_string()))
            }
            Err(source) => Err(StorageError::Io { uri: uri.to_string(), source }),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage keyed by the normalized artifact path.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` under `uri`, replacing anything already there.
    pub fn put(&self, uri: &Url, content: impl Into<Vec<u8>>) -> Result<(), StorageError> {
        let key = storage_key(uri)?;
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, content.into());
        Ok(())
    }
}

#[async_trait]
impl StorageAccessor for MemoryStorage {
    async fn open(&self, uri: &Url) -> Result<ByteStream, StorageError> {
        let key = storage_key(uri)?;
        let files = self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let content = files
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(uri.to_string()))?;
        Ok(Box::pin(Cursor::new(content)))
    }
}
