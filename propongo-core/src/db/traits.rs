//! Blob store abstraction
//!
//! Every backend stores opaque string values under string keys. The
//! proposal itself is one such blob; the store knows nothing about its shape.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Types of blob store backends available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// One JSON file per key in a directory
    File,
    /// SQLite database file
    Sqlite,
    /// Process memory, nothing persisted
    Memory,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::File => write!(f, "File"),
            BackendType::Sqlite => write!(f, "SQLite"),
            BackendType::Memory => write!(f, "Memory"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "dir" | "directory" => Ok(BackendType::File),
            "sqlite" | "db" => Ok(BackendType::Sqlite),
            "memory" => Ok(BackendType::Memory),
            other => anyhow::bail!("Unknown backend type: {}", other),
        }
    }
}

/// Checks that a key is usable by every backend, including as a file name
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        anyhow::bail!("Invalid blob key: {:?}", key);
    }
    Ok(())
}

/// String-keyed persistence shared by all backends
///
/// Writes are last-write-wins; there is no versioning or merge.
pub trait BlobStore: Send + Sync {
    /// Returns the backend type
    fn backend_type(&self) -> BackendType;

    /// Human-readable location of the store (a path, or `:memory:`)
    fn location(&self) -> String;

    /// Reads the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`; returns whether it existed
    fn remove(&self, key: &str) -> Result<bool>;

    /// All keys, sorted
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Returns statistics about the store
    fn stats(&self) -> Result<StoreStats> {
        let keys = self.keys()?;
        let mut total_bytes = 0;
        for key in &keys {
            total_bytes += self.get(key)?.map_or(0, |v| v.len());
        }
        Ok(StoreStats {
            blob_count: keys.len(),
            total_bytes,
            backend_type: self.backend_type(),
        })
    }
}

/// Statistics about a blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub blob_count: usize,
    pub total_bytes: usize,
    pub backend_type: BackendType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("proposalData").is_ok());
        assert!(validate_key("backup-2024.01").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("with space").is_err());
    }

    #[test]
    fn test_backend_type_from_str() {
        assert_eq!("sqlite".parse::<BackendType>().unwrap(), BackendType::Sqlite);
        assert_eq!("File".parse::<BackendType>().unwrap(), BackendType::File);
        assert!("yaml".parse::<BackendType>().is_err());
        assert_eq!(BackendType::Sqlite.to_string(), "SQLite");
    }
}
