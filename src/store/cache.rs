//! Cache backend: a key/value [`Cache`] trait with an in-process
//! [`MemoryCache`] and an on-disk [`FileCache`] shared between processes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use super::StateBackend;
use crate::error::GateError;
use crate::fs_abstraction::{FileSystem, RealFileSystem};
use crate::record::MaintenanceRecord;

/// Minimal key/value cache. Each call must be atomic on its own.
#[cfg_attr(test, automock)]
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, optionally expiring after `ttl`
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> bool;

    /// Delete a key; deleting a missing key succeeds
    fn delete(&self, key: &str) -> bool;

    fn contains(&self, key: &str) -> bool;
}

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process cache shared by every store of a process.
///
/// A poisoned lock reads as empty and fails writes instead of panicking.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        true
    }

    fn delete(&self, key: &str) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        entries.remove(key);
        true
    }

    fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .get(key)
                    .is_some_and(|entry| entry.is_live(Instant::now()))
            })
            .unwrap_or(false)
    }
}

/// On-disk entry written by [`FileCache`]
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    /// Unix milliseconds; absent means no expiration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<i64>,
}

impl StoredEntry {
    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms.map_or(true, |at| now_ms < at)
    }
}

/// Cache kept as one JSON file per key under a directory.
///
/// Every process pointing at the same directory sees the same entries, so
/// the CLI and the application can share it. Writes are atomic renames.
/// An entry whose envelope cannot be parsed is returned raw so the caller
/// sees the corruption instead of an empty cache.
pub struct FileCache<F: FileSystem = RealFileSystem> {
    fs: F,
    dir: PathBuf,
}

impl<F: FileSystem> FileCache<F> {
    pub fn new(fs: F, dir: impl AsRef<Path>) -> Self {
        Self {
            fs,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the entry file for `key`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    /// `None` when the entry is missing or unreadable.
    fn read_raw(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        match self.fs.read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                debug!("Failed to read cache entry {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl<F: FileSystem> Cache for FileCache<F> {
    fn get(&self, key: &str) -> Option<String> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str::<StoredEntry>(&raw) {
            Ok(entry) if entry.is_live(Utc::now().timestamp_millis()) => Some(entry.value),
            Ok(_) => None,
            Err(_) => Some(raw),
        }
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> bool {
        if !self.fs.is_dir(&self.dir) {
            if let Err(e) = self.fs.create_dir_all(&self.dir) {
                debug!("Failed to create cache directory {}: {}", self.dir.display(), e);
                return false;
            }
        }

        let expires_at_ms = ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            Utc::now().timestamp_millis().saturating_add(ttl_ms)
        });
        let entry = StoredEntry {
            value,
            expires_at_ms,
        };
        let Ok(payload) = serde_json::to_string(&entry) else {
            return false;
        };

        let path = self.entry_path(key);
        match self.fs.write_atomic(&path, payload.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                debug!("Failed to write cache entry {}: {}", path.display(), e);
                false
            }
        }
    }

    fn delete(&self, key: &str) -> bool {
        let path = self.entry_path(key);
        match self.fs.remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                debug!("Failed to delete cache entry {}: {}", path.display(), e);
                false
            }
        }
    }

    fn contains(&self, key: &str) -> bool {
        let Some(raw) = self.read_raw(key) else {
            return false;
        };
        match serde_json::from_str::<StoredEntry>(&raw) {
            Ok(entry) => entry.is_live(Utc::now().timestamp_millis()),
            Err(_) => true,
        }
    }
}

/// Stores the record as a JSON payload under one cache key.
pub struct CacheStore<C: Cache = MemoryCache> {
    cache: Arc<C>,
    key: String,
    ttl: Option<Duration>,
}

impl<C: Cache> CacheStore<C> {
    /// `ttl_secs == 0` means entries never expire.
    pub fn new(cache: Arc<C>, key: &str, ttl_secs: u64) -> Self {
        Self {
            cache,
            key: key.to_string(),
            ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
        }
    }
}

impl<C: Cache> StateBackend for CacheStore<C> {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn is_active(&self) -> bool {
        self.cache.contains(&self.key)
    }

    fn load(&self) -> Result<Option<MaintenanceRecord>, GateError> {
        match self.cache.get(&self.key) {
            Some(payload) => MaintenanceRecord::from_json(&payload).map(Some),
            None => Ok(None),
        }
    }

    fn store(&self, record: &MaintenanceRecord) -> Result<(), GateError> {
        let payload = record.to_json()?;
        if self.cache.set(&self.key, payload, self.ttl) {
            Ok(())
        } else {
            Err(GateError::Storage(format!(
                "Cache rejected write for key '{}'",
                self.key
            )))
        }
    }

    fn delete(&self) -> Result<(), GateError> {
        if self.cache.delete(&self.key) {
            Ok(())
        } else {
            Err(GateError::Storage(format!(
                "Cache rejected delete for key '{}'",
                self.key
            )))
        }
    }
}
