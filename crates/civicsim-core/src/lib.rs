//! CivicSim Core - Saved Simulation Store
//!
//! Persistence for budget simulations: immutable [`record::SimulationRecord`]
//! snapshots, a [`store::SimulationStore`] that owns the saved collection,
//! pluggable [`storage::Storage`] backends, and JSON export files.
//!
//! # Architecture
//!
//! - **Records**: one evaluated budget plan (allocations, metrics, score)
//! - **Storage**: a string key-value layer (in-memory or a directory of files)
//! - **Store**: list / append / remove / export / import over one storage key
//!
//! The store is constructed once per session and passed to whoever needs it;
//! there is no global instance.
//!
//! # Example
//!
//! ```rust,no_run
//! use civicsim_core::prelude::*;
//! use civicsim_logic::budget::Allocations;
//!
//! let mut store = SimulationStore::new(DirStorage::new("./civicsim-data"));
//! store.append(SimulationRecord::new(&Allocations::defaults()))?;
//!
//! let blob = store.export_all()?;
//! let report = store.import_merge(&blob)?;
//! assert_eq!(report.skipped, store.len());
//! # Ok::<(), civicsim_core::error::StoreError>(())
//! ```

pub mod error;
pub mod export;
pub mod record;
pub mod storage;
pub mod store;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::record::{RecordId, SimulationRecord};
    pub use crate::storage::{DirStorage, MemoryStorage, Storage};
    pub use crate::store::{ImportReport, MergePolicy, SimulationStore, DEFAULT_STORAGE_KEY};
}
