//! Durable file backend.
//!
//! No locking: concurrent writers race and the last rename wins. Writes go
//! through a temp file + rename so the file always holds one whole record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::StateBackend;
use crate::error::GateError;
use crate::fs_abstraction::{FileSystem, RealFileSystem};
use crate::record::MaintenanceRecord;

/// Stores the record as pretty JSON in `<dir>/<file_name>`.
pub struct FileStore<F: FileSystem = RealFileSystem> {
    fs: F,
    dir: PathBuf,
    path: PathBuf,
}

impl<F: FileSystem> FileStore<F> {
    pub fn new(fs: F, dir: impl AsRef<Path>, file_name: &str) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(file_name);
        Self { fs, dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: FileSystem> StateBackend for FileStore<F> {
    fn name(&self) -> &'static str {
        "file"
    }

    fn is_active(&self) -> bool {
        self.fs.exists(&self.path)
    }

    fn load(&self) -> Result<Option<MaintenanceRecord>, GateError> {
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }

        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            // Removed between the existence check and the read
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(GateError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        MaintenanceRecord::from_json(&content).map(Some)
    }

    fn store(&self, record: &MaintenanceRecord) -> Result<(), GateError> {
        if !self.fs.is_dir(&self.dir) {
            debug!("Creating maintenance directory {}", self.dir.display());
            self.fs.create_dir_all(&self.dir).map_err(|e| {
                GateError::Storage(format!(
                    "Failed to create maintenance directory {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;
        }

        let payload = record.to_json()?;
        self.fs
            .write_atomic(&self.path, payload.as_bytes())
            .map_err(|e| {
                GateError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
            })
    }

    fn delete(&self) -> Result<(), GateError> {
        if !self.fs.exists(&self.path) {
            return Ok(());
        }

        match self.fs.remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GateError::Storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_abstraction::MockFileSystem;
    use std::io;
    use tempfile::TempDir;

    fn record() -> MaintenanceRecord {
        MaintenanceRecord::new(Some("down".into()), vec!["10.0.0.0/8".into()], 15)
            .with_secret("abc")
            .with_cookie_name("Xy12Ab34")
    }

    #[test]
    fn test_store_creates_directory_and_roundtrips() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("writable/maintenance");
        let store = FileStore::new(RealFileSystem, &nested, "down");

        let stored = record();
        assert!(store.store(&stored).is_ok());
        assert!(nested.join("down").exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.secret(), Some("abc"));
        assert_eq!(loaded.bypass_cookie(), Some("Xy12Ab34"));
        assert_eq!(loaded, stored);
    }

    #[test]
    fn test_load_empty_file_is_corrupted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("down"), "").unwrap();
        let store = FileStore::new(RealFileSystem, dir.path(), "down");

        assert!(store.is_active());
        assert!(matches!(store.load(), Err(GateError::CorruptedRecord(_))));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(RealFileSystem, dir.path(), "down");
        assert!(store.delete().is_ok());
        store.store(&record()).unwrap();
        assert!(store.delete().is_ok());
        assert!(store.delete().is_ok());
        assert!(!store.is_active());
    }

    #[test]
    fn test_store_fails_when_directory_cannot_be_created() {
        let mut fs = MockFileSystem::new();
        fs.expect_is_dir().returning(|_| false);
        fs.expect_create_dir_all()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
        fs.expect_write_atomic().never();

        let store = FileStore::new(fs, "/srv/app/maintenance", "down");
        let err = store.store(&record()).unwrap_err();
        assert!(matches!(err, GateError::Storage(_)));
        assert!(err.to_string().contains("maintenance directory"));
    }

    #[test]
    fn test_store_write_failure() {
        let mut fs = MockFileSystem::new();
        fs.expect_is_dir().returning(|_| true);
        fs.expect_write_atomic()
            .withf(|p, _| p == Path::new("/srv/app/maintenance/down"))
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::Other, "disk full")));

        let store = FileStore::new(fs, "/srv/app/maintenance", "down");
        assert!(matches!(store.store(&record()), Err(GateError::Storage(_))));
    }

    #[test]
    fn test_load_vanished_file_is_none() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_read_to_string()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "gone")));

        let store = FileStore::new(fs, "/srv", "down");
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_load_permission_error_is_storage_error() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_read_to_string()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        let store = FileStore::new(fs, "/srv", "down");
        assert!(matches!(store.load(), Err(GateError::Storage(_))));
    }

    #[test]
    fn test_delete_failure() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| true);
        fs.expect_remove_file()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        let store = FileStore::new(fs, "/srv", "down");
        assert!(store.delete().is_err());
    }

    #[test]
    fn test_is_active_checks_existence_only() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().times(1).returning(|_| true);
        fs.expect_read_to_string().never();

        let store = FileStore::new(fs, "/srv", "down");
        assert!(store.is_active());
        assert_eq!(store.path(), Path::new("/srv/down"));
    }
}
