use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// Write capability against the durable store. This is the whole contract
/// the ingestion path is granted: a single `put`, no read, list, or delete.
/// A failed put must leave nothing visible under `key`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;
}

/// Filesystem-backed store rooted at the configured bucket directory.
///
/// Writes go to a hidden `.part` file first and are renamed into place, so
/// the final key only ever holds complete content. Object expiry is the
/// store operator's policy; this backend never deletes.
pub struct FsStore {
    root: PathBuf,
}

// Disambiguates temp files when two puts race on the same key.
static PART_SEQ: AtomicU64 = AtomicU64::new(0);

impl FsStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.root.join(key);
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Unavailable("key has no parent directory".to_string()))?;
        tokio::fs::create_dir_all(dir).await.map_err(map_io)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::Unavailable("key has no file name".to_string()))?;
        let seq = PART_SEQ.fetch_add(1, Ordering::Relaxed);
        let part = dir.join(format!(".{file_name}.{seq}.part"));

        if let Err(err) = tokio::fs::write(&part, &data).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(map_io(err));
        }
        if let Err(err) = tokio::fs::rename(&part, &path).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(map_io(err));
        }
        Ok(())
    }
}

fn map_io(err: std::io::Error) -> StoreError {
    match err.kind() {
        ErrorKind::PermissionDenied => StoreError::Denied(err.to_string()),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

/// In-memory store for tests. Records put calls and contents so tests can
/// assert write counts and byte-equality.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Bytes>>,
    puts: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of put calls accepted, including overwrites of the same key.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of distinct visible objects.
    pub fn object_count(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.read().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        objects.insert(key.to_string(), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_writes_exact_bytes_under_nested_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path().to_path_buf());

        store
            .put("webhooks/20260828/abc.json", Bytes::from_static(b"{\"id\":42}"))
            .await
            .expect("put");

        let written = std::fs::read(dir.path().join("webhooks/20260828/abc.json")).expect("read");
        assert_eq!(written, b"{\"id\":42}");
    }

    #[tokio::test]
    async fn fs_store_leaves_no_part_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path().to_path_buf());

        store
            .put("webhooks/20260828/abc.json", Bytes::from_static(b"{}"))
            .await
            .expect("put");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("webhooks/20260828"))
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn fs_store_overwrite_replaces_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsStore::new(dir.path().to_path_buf());

        store
            .put("webhooks/k.json", Bytes::from_static(b"{\"v\":1}"))
            .await
            .expect("first put");
        store
            .put("webhooks/k.json", Bytes::from_static(b"{\"v\":1}"))
            .await
            .expect("second put");

        let written = std::fs::read(dir.path().join("webhooks/k.json")).expect("read");
        assert_eq!(written, b"{\"v\":1}");
    }

    #[tokio::test]
    async fn memory_store_counts_puts_and_objects() {
        let store = MemoryStore::new();
        store
            .put("a", Bytes::from_static(b"1"))
            .await
            .expect("put a");
        store
            .put("a", Bytes::from_static(b"1"))
            .await
            .expect("put a again");
        store
            .put("b", Bytes::from_static(b"2"))
            .await
            .expect("put b");

        assert_eq!(store.put_count(), 3);
        assert_eq!(store.object_count(), 2);
        assert_eq!(store.object("a"), Some(Bytes::from_static(b"1")));
    }
}
