use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::db::{create_backend, BackendType, BlobStore};
use crate::error::ProposalResult;
use crate::models::ProposalDocument;
use crate::upgrade::{load_blob, LoadOutcome};

/// Key under which the proposal blob is stored
pub const PROPOSAL_KEY: &str = "proposalData";

/// Loads and saves the proposal document through a blob store
///
/// Saving is last-write-wins: the whole document replaces the stored blob.
pub struct ProposalStorage {
    store: Box<dyn BlobStore>,
}

impl ProposalStorage {
    /// Wraps an existing blob store
    pub fn new(store: Box<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Opens the store at `path`, inferring the backend when `backend_type` is `None`
    pub fn open(path: &Path, backend_type: Option<BackendType>) -> Result<Self> {
        let store = create_backend(path, backend_type)
            .with_context(|| format!("Failed to open proposal store at {:?}", path))?;
        Ok(Self::new(store))
    }

    /// Returns the underlying blob store
    pub fn backend(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// True when a proposal has been saved
    pub fn exists(&self) -> Result<bool> {
        self.store.contains(PROPOSAL_KEY)
    }

    /// Loads the document and reports how the stored blob was interpreted
    ///
    /// An older blob is upgraded and written back immediately. A missing or
    /// unreadable blob yields a fresh document; the unreadable blob is left
    /// in place until the next save replaces it.
    pub fn load_with_outcome(&self) -> Result<(ProposalDocument, Option<LoadOutcome>)> {
        let raw = match self.store.get(PROPOSAL_KEY)? {
            Some(raw) => raw,
            None => {
                debug!(location = %self.store.location(), "no stored proposal");
                return Ok((ProposalDocument::default(), None));
            }
        };

        let (doc, outcome) = load_blob(&raw);
        if outcome == LoadOutcome::Upgraded {
            self.save(&doc).context("Failed to save upgraded proposal")?;
            info!("upgraded proposal saved");
        }
        Ok((doc, Some(outcome)))
    }

    /// Loads the document, or a fresh one when nothing usable is stored
    pub fn load(&self) -> Result<ProposalDocument> {
        Ok(self.load_with_outcome()?.0)
    }

    /// Saves the document
    pub fn save(&self, doc: &ProposalDocument) -> Result<()> {
        let raw = serde_json::to_string(doc).context("Failed to serialize proposal")?;
        self.store
            .set(PROPOSAL_KEY, &raw)
            .with_context(|| format!("Failed to save proposal to {}", self.store.location()))
    }

    /// Loads the document, applies `update_fn`, and saves if anything changed
    ///
    /// Nothing is saved when `update_fn` fails.
    pub fn update<T, F>(&self, update_fn: F) -> Result<T>
    where
        F: FnOnce(&mut ProposalDocument) -> ProposalResult<T>,
    {
        let mut doc = self.load()?;
        let before = doc.clone();
        let value = update_fn(&mut doc)?;
        if doc != before {
            self.save(&doc)?;
        }
        Ok(value)
    }

    /// Deletes the stored proposal; returns whether one existed
    pub fn reset(&self) -> Result<bool> {
        self.store.remove(PROPOSAL_KEY)
    }
}
