//! Persistence port for the medication collection.
//!
//! The whole collection lives in a single serialized blob behind the
//! `BlobStore` trait, so the store can be wired to a file on disk in the
//! app and to plain memory in tests.

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the medication blob inside the data directory.
pub const BLOB_FILE_NAME: &str = "medicamentos.json";

/// Key-value style access to the single blob holding all medications.
///
/// `read_blob` distinguishes "never written" (`None`) from an existing blob
/// so the store can seed demo data on first run.
pub trait BlobStore {
    /// Read the blob; `None` when it has never been written.
    fn read_blob(&self) -> Result<Option<String>>;

    /// Replace the blob contents.
    fn write_blob(&mut self, contents: &str) -> Result<()>;
}

/// File-backed blob store with file locking.
///
/// Reads take a shared lock. Writes go through a locked temp file that is
/// synced and atomically renamed over the original, so a crash mid-write
/// never leaves a half-written collection behind.
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    /// Create a blob store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobStore for FileBlobStore {
    fn read_blob(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read_result = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        tracing::debug!("Read medication blob from {:?}", self.path);
        Ok(Some(contents))
    }

    fn write_blob(&mut self, contents: &str) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "blob path missing parent")
        })?)?;

        // Exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace the old blob
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote medication blob to {:?}", self.path);
        Ok(())
    }
}

/// In-memory blob store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    contents: Option<String>,
}

impl MemoryBlobStore {
    /// Create an empty store: the blob has never been written.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds blob contents.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn read_blob(&self) -> Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write_blob(&mut self, contents: &str) -> Result<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_blob_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut blob = FileBlobStore::new(temp_dir.path().join(BLOB_FILE_NAME));

        blob.write_blob("[]").unwrap();

        assert_eq!(blob.read_blob().unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blob = FileBlobStore::new(temp_dir.path().join("nonexistent.json"));

        assert_eq!(blob.read_blob().unwrap(), None);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/data").join(BLOB_FILE_NAME);
        let mut blob = FileBlobStore::new(&path);

        blob.write_blob("[]").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_write_leaves_no_stray_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut blob = FileBlobStore::new(temp_dir.path().join(BLOB_FILE_NAME));

        blob.write_blob("[]").unwrap();
        blob.write_blob("[1]").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != BLOB_FILE_NAME)
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only {}, found extras: {:?}",
            BLOB_FILE_NAME,
            extras
        );
    }

    #[test]
    fn test_memory_blob_distinguishes_absent_from_empty() {
        let mut blob = MemoryBlobStore::new();
        assert_eq!(blob.read_blob().unwrap(), None);

        blob.write_blob("").unwrap();
        assert_eq!(blob.read_blob().unwrap(), Some(String::new()));
    }

    #[test]
    fn test_memory_blob_with_contents() {
        let blob = MemoryBlobStore::with_contents("[]");

        assert_eq!(blob.read_blob().unwrap(), Some("[]".to_string()));
    }
}
