//! Directory blob store backend
//!
//! Each key is stored as `<key>.json` inside the store directory. Reads
//! and writes are guarded by an advisory lock on a `<key>.json.lock` file
//! so that two processes sharing a store do not interleave writes.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use super::traits::{validate_key, BackendType, BlobStore};

const BLOB_EXTENSION: &str = ".json";
const LOCK_EXTENSION: &str = ".json.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Directory backend implementation
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, BLOB_EXTENSION))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, LOCK_EXTENSION))
    }

    /// Waits up to the lock timeout for `mode` on `lock_file`
    fn wait_for_lock(&self, lock_file: &File, mode: LockMode, key: &str) -> Result<()> {
        let start = Instant::now();
        loop {
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(lock_file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(lock_file),
            };
            match attempt {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for lock on {:?} - another process may be writing",
                            self.blob_path(key)
                        );
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to acquire lock on {:?}", self.lock_path(key)))
                }
            }
        }
    }

    /// Acquires an exclusive lock for writing `key`
    /// The returned handle must be held for the duration of the write
    fn acquire_write_lock(&self, key: &str) -> Result<File> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create store directory: {:?}", self.dir))?;

        let lock_path = self.lock_path(key);
        let mut lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {:?}", lock_path))?;

        self.wait_for_lock(&lock_file, LockMode::Exclusive, key)?;

        // Holder info, for debugging stale locks
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        Ok(lock_file)
    }

    /// Acquires a shared lock for reading `key`, if a lock file exists
    fn acquire_read_lock(&self, key: &str) -> Result<Option<File>> {
        let lock_path = self.lock_path(key);
        if !lock_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {:?}", lock_path))?;

        self.wait_for_lock(&lock_file, LockMode::Shared, key)?;
        Ok(Some(lock_file))
    }
}

impl BlobStore for FileBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::File
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let _lock = self.acquire_read_lock(key)?;
        let value = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read blob: {:?}", path))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let _lock = self.acquire_write_lock(key)?;

        // Write to a sibling file and rename so readers never see a partial blob
        let path = self.blob_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value).with_context(|| format!("Failed to write blob: {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path).with_context(|| format!("Failed to replace blob: {:?}", path))?;

        debug!(key, bytes = value.len(), "blob written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(false);
        }

        let _lock = self.acquire_write_lock(key)?;
        fs::remove_file(&path).with_context(|| format!("Failed to remove blob: {:?}", path))?;
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).with_context(|| format!("Failed to list {:?}", self.dir))? {
            let name = entry?.file_name();
            if let Some(key) = name.to_str().and_then(|n| n.strip_suffix(BLOB_EXTENSION)) {
                if validate_key(key).is_ok() {
                    keys.push(key.to_string());
                }
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

    #[test]
    fn test_file_backend_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("store"));
        assert_eq!(backend.get("proposalData").unwrap(), None);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_backend_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("store"));

        backend.set("proposalData", r#"{"clientName":"Acme"}"#).unwrap();
        assert_eq!(
            backend.get("proposalData").unwrap().as_deref(),
            Some(r#"{"clientName":"Acme"}"#)
        );
        assert!(temp_dir.path().join("store/proposalData.json").exists());

        backend.set("proposalData", "{}").unwrap();
        assert_eq!(backend.get("proposalData").unwrap().as_deref(), Some("{}"));

        assert!(backend.remove("proposalData").unwrap());
        assert!(!backend.remove("proposalData").unwrap());
        assert_eq!(backend.get("proposalData").unwrap(), None);
    }

    #[test]
    fn test_file_backend_keys_skip_lock_files() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());

        backend.set("b", "2").unwrap();
        backend.set("a", "1").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["a", "b"]);

        let stats = backend.stats().unwrap();
        assert_eq!(stats.blob_count, 2);
        assert_eq!(stats.total_bytes, 2);
    }

    #[test]
    fn test_file_backend_rejects_path_keys() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());
        assert!(backend.set("../escape", "x").is_err());
        assert!(backend.get("a/b").is_err());
    }

    #[test]
    fn test_file_backend_waits_for_held_lock() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());
        backend.set("proposalData", "{}").unwrap();

        let holder = File::open(backend.lock_path("proposalData")).unwrap();
        FileExt::lock_exclusive(&holder).unwrap();
        let release = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            FileExt::unlock(&holder).unwrap();
        });

        let start = Instant::now();
        assert_eq!(backend.get("proposalData").unwrap().as_deref(), Some("{}"));
        assert!(start.elapsed() >= Duration::from_millis(150));
        release.join().unwrap();

        backend.set("proposalData", r#"{"clientName":"Acme"}"#).unwrap();
    }
}
