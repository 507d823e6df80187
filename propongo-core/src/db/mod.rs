//! Blob store layer
//!
//! The proposal is persisted as a string blob under a fixed key. This
//! module provides the trait every backend implements and the backends
//! themselves: a directory of JSON files, a SQLite database, and an
//! in-memory map.

mod file_backend;
mod memory_backend;
mod migration;
mod sqlite_backend;
mod traits;

pub use file_backend::FileBackend;
pub use memory_backend::MemoryBackend;
pub use migration::{migrate_backend, migrate_path};
pub use sqlite_backend::SqliteBackend;
pub use traits::{validate_key, BackendType, BlobStore, StoreStats};

use anyhow::Result;
use std::path::Path;

/// Infers the backend from a path: SQLite for `.db`, `.sqlite` and
/// `.sqlite3` files, a directory store for anything else
pub fn infer_backend_type(path: &Path) -> BackendType {
    match path.extension().and_then(|e| e.to_str()) {
        Some("db") | Some("sqlite") | Some("sqlite3") => BackendType::Sqlite,
        _ => BackendType::File,
    }
}

/// Creates a blob store backend based on the path or an explicit type
pub fn create_backend(path: &Path, backend_type: Option<BackendType>) -> Result<Box<dyn BlobStore>> {
    let bt = backend_type.unwrap_or_else(|| infer_backend_type(path));

    match bt {
        BackendType::File => Ok(Box::new(FileBackend::new(path))),
        BackendType::Sqlite => Ok(Box::new(SqliteBackend::new(path)?)),
        BackendType::Memory => Ok(Box::new(MemoryBackend::new())),
    }
}
