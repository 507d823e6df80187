//! Errors raised by document operations.
//!
//! Only conditions the caller can act on are represented here. Dangling
//! group references, malformed dates and unreadable blobs are handled in
//! place by the aggregation engine, the timeline deriver and the storage
//! layer respectively, and never reach the caller.

use thiserror::Error;

/// Errors returned by ledger, registry and section operations.
///
/// Every operation that returns one of these leaves the document exactly
/// as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    /// The input failed validation; nothing was changed
    #[error("rejected: {0}")]
    ValidationRejected(String),

    /// A positional index did not address an existing entry
    #[error("index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// No deliverable group with this id exists
    #[error("deliverable group not found: {0}")]
    UnknownGroup(String),

    /// No custom section with this id exists
    #[error("custom section not found: {0}")]
    UnknownSection(String),
}

impl ProposalError {
    pub(crate) fn rejected(reason: impl Into<String>) -> Self {
        ProposalError::ValidationRejected(reason.into())
    }

    /// Checks `index` against `len`, returning `IndexOutOfRange` when it is past the end
    pub(crate) fn check_index(index: usize, len: usize) -> Result<(), Self> {
        if index < len {
            Ok(())
        } else {
            Err(ProposalError::IndexOutOfRange { index, len })
        }
    }
}

/// Result type for document operations
pub type ProposalResult<T> = Result<T, ProposalError>;
