//! Moving blobs between storage backends

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::create_backend;
use super::traits::{BackendType, BlobStore};

/// Copies every blob from `source` into `destination`
///
/// Existing keys in the destination are overwritten; keys that exist only
/// in the destination are left alone.
///
/// # Returns
/// The number of blobs copied
pub fn migrate_backend(source: &dyn BlobStore, destination: &dyn BlobStore) -> Result<usize> {
    let keys = source
        .keys()
        .with_context(|| format!("Failed to list blobs in {}", source.location()))?;

    for key in &keys {
        let Some(value) = source.get(key)? else {
            continue;
        };
        destination
            .set(key, &value)
            .with_context(|| format!("Failed to copy blob {:?} to {}", key, destination.location()))?;
    }

    info!(
        count = keys.len(),
        from = %source.location(),
        to = %destination.location(),
        "blob store migrated"
    );
    Ok(keys.len())
}

/// Migrates between two stores given by path
///
/// # Arguments
/// * `source_path` - Path of the existing store
/// * `destination_path` - Path of the target store, created if missing
/// * `destination_type` - Backend for the target; inferred from the extension when `None`
///
/// # Returns
/// The number of blobs copied
pub fn migrate_path<P1: AsRef<Path>, P2: AsRef<Path>>(
    source_path: P1,
    destination_path: P2,
    destination_type: Option<BackendType>,
) -> Result<usize> {
    let source_path = source_path.as_ref();
    if !source_path.exists() {
        anyhow::bail!("Source store does not exist: {:?}", source_path);
    }

    let source = create_backend(source_path, None)?;
    let destination = create_backend(destination_path.as_ref(), destination_type)?;
    migrate_backend(source.as_ref(), destination.as_ref())
}
