//! In-memory blob store, for tests and dry runs

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::traits::{validate_key, BackendType, BlobStore};

#[derive(Default)]
pub struct MemoryBackend {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_blobs<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> Result<T> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(f(&mut blobs))
    }
}

impl BlobStore for MemoryBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Memory
    }

    fn location(&self) -> String {
        ":memory:".to_string()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        self.with_blobs(|blobs| blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.with_blobs(|blobs| {
            blobs.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.with_blobs(|blobs| blobs.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.with_blobs(|blobs| blobs.keys().cloned().collect())
    }
}
