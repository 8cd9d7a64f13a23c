//! Bucketed blob store backed by the local filesystem.
//!
//! Objects live at `<root>/<bucket>/<key>` where keys are `/`-separated
//! paths. The store imposes no semantics on keys beyond traversal safety;
//! prefixes map onto directories, which makes `delete_prefix` a single
//! recursive removal.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::StoreError;

/// Transient uploads and ingestion staging.
pub const UPLOADS_BUCKET: &str = "uploads";
/// Published comic artifacts: banners and episode documents.
pub const COMICS_BUCKET: &str = "comics";

#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a bucket + key pair to a filesystem path, rejecting empty
    /// or traversing key components.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty()
            || key.starts_with('/')
            || key.contains('\\')
            || key
                .split('/')
                .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(bucket).join(key))
    }

    pub fn put(&self, bucket: &str, key: &str, content: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        std::fs::write(&path, content).map_err(|e| StoreError::WriteObject { path, source: e })
    }

    pub fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::ReadObject { path, source: e }),
        }
    }

    pub fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let path = self.object_path(bucket, key)?;
        Ok(path.is_file())
    }

    /// Removes a single object. Deleting an absent object is not an error;
    /// the store exposes object-storage semantics, not POSIX ones.
    pub fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Delete { path, source: e }),
        }
    }

    /// Removes every object under the given prefix. Absent prefixes are a
    /// no-op.
    pub fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, prefix)?;
        if path.is_dir() {
            std::fs::remove_dir_all(&path).map_err(|e| StoreError::Delete { path, source: e })
        } else if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| StoreError::Delete { path, source: e })
        } else {
            Ok(())
        }
    }

    /// Lists object keys under a prefix, relative to the bucket.
    pub fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.object_path(bucket, prefix)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let bucket_root = self.root.join(bucket);
        let mut keys = Vec::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|e| StoreError::List {
                path: dir.clone(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&bucket_root) {
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, BlobStore) {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_put_and_get() {
        let (_dir, store) = test_store();
        store.put(COMICS_BUCKET, "c1/banner.jpg", b"jpeg bytes").unwrap();

        let bytes = store.get(COMICS_BUCKET, "c1/banner.jpg").unwrap();
        assert_eq!(bytes, b"jpeg bytes");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = test_store();
        match store.get(COMICS_BUCKET, "nope/banner.jpg") {
            Err(StoreError::NotFound { bucket, key }) => {
                assert_eq!(bucket, COMICS_BUCKET);
                assert_eq!(key, "nope/banner.jpg");
            }
            other => panic!("Expected NotFound, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_put_creates_nested_directories() {
        let (_dir, store) = test_store();
        store
            .put(COMICS_BUCKET, "c1/episodes/12/document.pdf", b"pdf")
            .unwrap();
        assert!(store.exists(COMICS_BUCKET, "c1/episodes/12/document.pdf").unwrap());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, store) = test_store();
        store.put(UPLOADS_BUCKET, "a.zip", b"zip").unwrap();
        store.delete(UPLOADS_BUCKET, "a.zip").unwrap();
        // Absent object: still Ok.
        store.delete(UPLOADS_BUCKET, "a.zip").unwrap();
        assert!(!store.exists(UPLOADS_BUCKET, "a.zip").unwrap());
    }

    #[test]
    fn test_delete_prefix() {
        let (_dir, store) = test_store();
        store.put(COMICS_BUCKET, "c1/banner.jpg", b"b").unwrap();
        store.put(COMICS_BUCKET, "c1/episodes/1/document.pdf", b"d1").unwrap();
        store.put(COMICS_BUCKET, "c1/episodes/2/document.pdf", b"d2").unwrap();
        store.put(COMICS_BUCKET, "c2/banner.jpg", b"other").unwrap();

        store.delete_prefix(COMICS_BUCKET, "c1").unwrap();

        assert!(store.list(COMICS_BUCKET, "c1").unwrap().is_empty());
        assert!(store.exists(COMICS_BUCKET, "c2/banner.jpg").unwrap());
    }

    #[test]
    fn test_delete_prefix_absent_is_noop() {
        let (_dir, store) = test_store();
        store.delete_prefix(COMICS_BUCKET, "ghost").unwrap();
    }

    #[test]
    fn test_list_returns_sorted_keys() {
        let (_dir, store) = test_store();
        store.put(UPLOADS_BUCKET, "staging/x/b.png", b"2").unwrap();
        store.put(UPLOADS_BUCKET, "staging/x/a.png", b"1").unwrap();
        store.put(UPLOADS_BUCKET, "staging/x/sub/c.png", b"3").unwrap();

        let keys = store.list(UPLOADS_BUCKET, "staging/x").unwrap();
        assert_eq!(
            keys,
            vec![
                "staging/x/a.png".to_string(),
                "staging/x/b.png".to_string(),
                "staging/x/sub/c.png".to_string(),
            ]
        );
    }

    #[test]
    fn test_traversal_keys_rejected() {
        let (_dir, store) = test_store();
        for key in ["../escape", "a/../../b", "/absolute", "a//b", ""] {
            assert!(
                matches!(store.put(UPLOADS_BUCKET, key, b"x"), Err(StoreError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
