//! Errors surfaced by the patch service.

use placebreak_store::StoreError;
use placebreak_types::DisplacementError;

/// Errors that can occur in patch operations.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The tag store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A displacement batch was malformed.
    #[error("invalid displacement: {0}")]
    Displacement(#[from] DisplacementError),

    /// A dispatched task panicked or was cancelled before finishing.
    #[error("{operation} task did not complete: {reason}")]
    Task {
        /// Name of the dispatched operation.
        operation: &'static str,
        /// Why the task did not produce a result.
        reason: String,
    },
}

impl PatchError {
    /// Whether retrying the same operation later could succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Displacement(_) | Self::Task { .. } => false,
        }
    }
}
