//! Error types for the simulation store

use thiserror::Error;

use crate::record::RecordId;

/// Errors that can occur while mutating or exporting the store.
///
/// Reads never produce these: malformed or unreadable persisted state is
/// treated as an empty collection.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Simulation {0} already exists")]
    DuplicateId(RecordId),
}

pub type StoreResult<T> = Result<T, StoreError>;
