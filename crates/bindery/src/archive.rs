//! Streams uploaded archives into blob-store staging.
//!
//! The unpacker imposes no semantics on entry paths; interpreting the
//! naming convention is the orchestrator's job. Partial staging copies
//! written before a failure are deliberately left in place for diagnosis;
//! the caller owns cleanup, as it owns deleting the original upload once
//! the archive is fully consumed.

use std::io::{Cursor, Read};

use uuid::Uuid;
use zip::ZipArchive;

use crate::error::{ArchiveError, BinderyError};
use crate::store::{BlobStore, UPLOADS_BUCKET};

/// One regular file extracted from an upload.
#[derive(Debug, Clone)]
pub struct UnpackedEntry {
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

pub struct ArchiveUnpacker {
    store: BlobStore,
}

impl ArchiveUnpacker {
    pub fn new(store: BlobStore) -> Self {
        Self { store }
    }

    /// Unpacks the archive, persisting every regular file under a fresh
    /// staging prefix in the uploads bucket. Returns the entries together
    /// with the prefix they were staged under. Directory entries are
    /// skipped.
    pub fn unpack(&self, archive: &[u8]) -> Result<(Vec<UnpackedEntry>, String), BinderyError> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(ArchiveError::Corrupt)?;

        let staging_prefix = format!("staging/{}", Uuid::new_v4());
        let mut entries = Vec::new();

        for index in 0..zip.len() {
            let mut file = zip.by_index(index).map_err(ArchiveError::Corrupt)?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)
                .map_err(|e| ArchiveError::EntryRead {
                    name: name.clone(),
                    source: e,
                })?;

            self.store.put(
                UPLOADS_BUCKET,
                &format!("{}/{}", staging_prefix, name),
                &bytes,
            )?;

            entries.push(UnpackedEntry {
                relative_path: name,
                bytes,
            });
        }

        tracing::debug!(
            entries = entries.len(),
            prefix = %staging_prefix,
            "Archive unpacked into staging"
        );

        Ok((entries, staging_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn make_store() -> (TempDir, BlobStore) {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());
        (dir, store)
    }

    pub(crate) fn make_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in files {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unpack_persists_and_returns_entries() {
        let (_dir, store) = make_store();
        let unpacker = ArchiveUnpacker::new(store.clone());

        let archive = make_zip(&[
            ("manifest.json", b"{}".as_slice()),
            ("banner.png", b"png".as_slice()),
            ("episodes/ep 1/001.png", b"page".as_slice()),
        ]);

        let (entries, prefix) = unpacker.unpack(&archive).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(prefix.starts_with("staging/"));

        let staged = store.list(UPLOADS_BUCKET, &prefix).unwrap();
        assert_eq!(staged.len(), 3);
        assert!(staged.contains(&format!("{}/episodes/ep 1/001.png", prefix)));
    }

    #[test]
    fn test_directory_entries_skipped() {
        let (_dir, store) = make_store();
        let unpacker = ArchiveUnpacker::new(store);

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("episodes/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file("manifest.json", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"{}").unwrap();
        let archive = writer.finish().unwrap().into_inner();

        let (entries, _prefix) = unpacker.unpack(&archive).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].relative_path, "manifest.json");
    }

    #[test]
    fn test_corrupt_archive_is_archive_error() {
        let (_dir, store) = make_store();
        let unpacker = ArchiveUnpacker::new(store);

        let result = unpacker.unpack(b"this is not a zip file");
        assert!(matches!(
            result,
            Err(BinderyError::Archive(ArchiveError::Corrupt(_)))
        ));
    }

    #[test]
    fn test_each_run_gets_unique_prefix() {
        let (_dir, store) = make_store();
        let unpacker = ArchiveUnpacker::new(store);
        let archive = make_zip(&[("a.txt", b"x".as_slice())]);

        let (_, p1) = unpacker.unpack(&archive).unwrap();
        let (_, p2) = unpacker.unpack(&archive).unwrap();
        assert_ne!(p1, p2);
    }
}
