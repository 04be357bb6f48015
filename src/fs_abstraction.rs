//! Filesystem abstraction layer for testability
//!
//! The file storage backend goes through this trait so its failure paths
//! (unwritable directory, vanished file, permission errors) can be tested
//! with mockall without touching the real filesystem.

use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting filesystem operations for dependency injection.
///
/// # Example (testing)
/// ```ignore
/// use maintgate::fs_abstraction::MockFileSystem;
///
/// let mut mock_fs = MockFileSystem::new();
/// mock_fs.expect_exists().returning(|_| true);
/// mock_fs.expect_read_to_string()
///     .returning(|_| Ok("{\"time\": 1700000000}".to_string()));
/// ```
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's contents atomically (temp file + rename).
    ///
    /// Readers see either the old or the new contents, never a mix.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// Real filesystem implementation using std::fs.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(contents)?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_write_atomic_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("down");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"hello world").unwrap();
        assert_eq!(fs.read_to_string(&file_path).unwrap(), "hello world");

        fs.write_atomic(&file_path, b"replaced").unwrap();
        assert_eq!(fs.read_to_string(&file_path).unwrap(), "replaced");
    }

    #[test]
    fn test_real_fs_write_atomic_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let fs = RealFileSystem;
        fs.write_atomic(&temp_dir.path().join("down"), b"{}").unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_real_fs_write_atomic_missing_dir() {
        let fs = RealFileSystem;
        let result = fs.write_atomic(Path::new("/nonexistent/path/file.txt"), b"test");
        assert!(result.is_err());
    }

    #[test]
    fn test_real_fs_exists_and_is_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        let fs = RealFileSystem;

        assert!(!fs.exists(&file_path));
        fs.write_atomic(&file_path, b"test").unwrap();
        assert!(fs.exists(&file_path));
        assert!(!fs.is_dir(&file_path));
        assert!(fs.is_dir(temp_dir.path()));
    }

    #[test]
    fn test_real_fs_create_dir_all() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a/b/c");
        let fs = RealFileSystem;

        fs.create_dir_all(&nested_path).unwrap();
        assert!(fs.is_dir(&nested_path));
    }

    #[test]
    fn test_real_fs_remove_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("to_remove.txt");
        let fs = RealFileSystem;

        fs.write_atomic(&file_path, b"remove me").unwrap();
        fs.remove_file(&file_path).unwrap();
        assert!(!fs.exists(&file_path));

        let err = fs.remove_file(&file_path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RealFileSystem>();
    }

    #[test]
    fn test_mock_fs_error_simulation() {
        let mut mock = MockFileSystem::new();
        mock.expect_read_to_string().returning(|_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"))
        });

        let result = mock.read_to_string(Path::new("/any/path"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }
}
