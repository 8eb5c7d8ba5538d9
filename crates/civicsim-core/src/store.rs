//! Simulation store - the saved collection and every mutation of it
//!
//! The whole collection is persisted as one JSON array under a single
//! storage key. Every operation reads the current value, and every mutation
//! writes the complete new collection back. There is one logical writer.
//!
//! ```
//! use civicsim_core::prelude::*;
//! use civicsim_logic::budget::Allocations;
//!
//! let mut store = SimulationStore::new(MemoryStorage::new());
//! let record = SimulationRecord::new(&Allocations::defaults());
//! store.append(record.clone()).unwrap();
//! assert_eq!(store.list(), vec![record]);
//! ```

use civicsim_logic::stats::CollectionStats;

use crate::error::{StoreError, StoreResult};
use crate::record::{RecordId, SimulationRecord};
use crate::storage::Storage;

/// Storage key the collection lives under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "civicsim-simulations";

/// What to do when an imported record's id is already in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Keep the existing record and skip the incoming one.
    #[default]
    KeepExisting,
    /// Overwrite the existing record in place (last write wins).
    ReplaceExisting,
}

/// Outcome of one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    /// Records appended to the end of the collection.
    pub imported: usize,
    /// Existing records overwritten under [`MergePolicy::ReplaceExisting`].
    pub replaced: usize,
    /// Incoming records dropped because their id was already present.
    pub skipped: usize,
    /// The payload was not an array of records; nothing was applied.
    pub rejected: bool,
}

impl ImportReport {
    fn rejected() -> Self {
        Self {
            rejected: true,
            ..Self::default()
        }
    }

    /// Whether the collection changed.
    pub fn changed(&self) -> bool {
        self.imported + self.replaced > 0
    }
}

/// Owner of the persisted simulation collection.
pub struct SimulationStore<S: Storage> {
    storage: S,
    key: String,
    merge_policy: MergePolicy,
}

impl<S: Storage> SimulationStore<S> {
    /// Store over `storage` using [`DEFAULT_STORAGE_KEY`].
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            merge_policy: MergePolicy::default(),
        }
    }

    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// The full collection in insertion order.
    ///
    /// A missing key, an unreadable backend, or a payload that is not an
    /// array of records all read as an empty collection.
    pub fn list(&self) -> Vec<SimulationRecord> {
        match self.storage.read(&self.key) {
            Ok(Some(raw)) => self.decode(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Reading '{}' failed, treating as empty: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Current collection for a mutation. Backend errors propagate so a
    /// failed read is never written back as an empty collection.
    fn load(&self) -> StoreResult<Vec<SimulationRecord>> {
        Ok(match self.storage.read(&self.key)? {
            Some(raw) => self.decode(&raw),
            None => Vec::new(),
        })
    }

    fn decode(&self, raw: &str) -> Vec<SimulationRecord> {
        match serde_json::from_str(raw) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Stored '{}' is malformed, treating as empty: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Look up one record by id.
    pub fn get(&self, id: &RecordId) -> Option<SimulationRecord> {
        self.list().into_iter().find(|r| &r.id == id)
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Add a record at the end of the collection.
    ///
    /// Fails with [`StoreError::DuplicateId`] if the id is already present;
    /// the collection is left unchanged in that case.
    pub fn append(&mut self, record: SimulationRecord) -> StoreResult<()> {
        let mut records = self.load()?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        log::debug!("Appending simulation {} ({})", record.id, record.name);
        records.push(record);
        self.persist(&records)
    }

    /// Remove the record with `id`. Returns whether one was removed.
    ///
    /// An absent id is a no-op and nothing is written.
    pub fn remove(&mut self, id: &RecordId) -> StoreResult<bool> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        log::debug!("Removed simulation {}", id);
        self.persist(&records)?;
        Ok(true)
    }

    /// Pretty-printed JSON array of the whole collection.
    pub fn export_all(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.list())?)
    }

    /// Merge an exported collection into this one.
    ///
    /// `blob` must decode as a JSON array of records; anything else is
    /// rejected without touching the collection. Accepted records are placed
    /// after the existing ones, with id collisions resolved by the store's
    /// [`MergePolicy`]. Collisions within `blob` itself resolve the same way.
    pub fn import_merge(&mut self, blob: &[u8]) -> StoreResult<ImportReport> {
        let incoming: Vec<SimulationRecord> = match serde_json::from_slice(blob) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Import ignored, payload is not a record array: {}", e);
                return Ok(ImportReport::rejected());
            }
        };

        let mut records = self.load()?;
        let mut report = ImportReport::default();
        for record in incoming {
            match records.iter().position(|r| r.id == record.id) {
                Some(idx) => match self.merge_policy {
                    MergePolicy::KeepExisting => report.skipped += 1,
                    MergePolicy::ReplaceExisting => {
                        records[idx] = record;
                        report.replaced += 1;
                    }
                },
                None => {
                    records.push(record);
                    report.imported += 1;
                }
            }
        }

        if report.changed() {
            self.persist(&records)?;
        }
        log::info!(
            "Import merged: {} new, {} replaced, {} skipped",
            report.imported,
            report.replaced,
            report.skipped
        );
        Ok(report)
    }

    /// Dashboard statistics over the current collection.
    pub fn stats(&self) -> CollectionStats {
        CollectionStats::from_scores(self.list().iter().map(|r| r.total_score))
    }

    fn persist(&mut self, records: &[SimulationRecord]) -> StoreResult<()> {
        let payload = serde_json::to_string(records)?;
        self.storage.write(&self.key, &payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use std::cell::Cell;
    use civicsim_logic::budget::Allocations;

    fn record(education: f64) -> SimulationRecord {
        let mut alloc = Allocations::defaults();
        alloc.set("education", education);
        SimulationRecord::evaluated_at(&alloc, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
    }

    fn store() -> SimulationStore<MemoryStorage> {
        SimulationStore::new(MemoryStorage::new())
    }

    fn ids(records: &[SimulationRecord]) -> Vec<RecordId> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let store = store();
        assert!(store.list().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_then_list() {
        let mut store = store();
        let r = record(25.0);
        store.append(r.clone()).unwrap();
        assert_eq!(store.list(), vec![r]);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = store();
        let records: Vec<_> = (0..5).map(|i| record(i as f64)).collect();
        for r in &records {
            store.append(r.clone()).unwrap();
        }
        assert_eq!(ids(&store.list()), ids(&records));
    }

    #[test]
    fn test_append_duplicate_rejected() {
        let mut store = store();
        let r = record(10.0);
        store.append(r.clone()).unwrap();
        let err = store.append(r.clone()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(ref id) if *id == r.id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = store();
        let a = record(1.0);
        let b = record(2.0);
        store.append(a.clone()).unwrap();
        store.append(b.clone()).unwrap();

        assert!(store.remove(&a.id).unwrap());
        assert_eq!(store.list(), vec![b.clone()]);
        assert!(store.get(&a.id).is_none());
        assert_eq!(store.get(&b.id), Some(b));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = store();
        store.append(record(1.0)).unwrap();
        assert!(!store.remove(&RecordId::from("missing")).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_malformed_state_reads_empty() {
        let mut storage = MemoryStorage::new();
        storage.write(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let mut store = SimulationStore::new(storage);
        assert!(store.list().is_empty());

        // Next write replaces the bad payload with a fresh collection.
        let r = record(3.0);
        store.append(r.clone()).unwrap();
        assert_eq!(store.list(), vec![r]);
    }

    #[test]
    fn test_wrong_shape_state_reads_empty() {
        let mut storage = MemoryStorage::new();
        storage.write(DEFAULT_STORAGE_KEY, r#"{"id": "x"}"#).unwrap();
        assert!(SimulationStore::new(storage).list().is_empty());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut source = store();
        for i in 0..3 {
            source.append(record(i as f64 * 10.0)).unwrap();
        }
        let blob = source.export_all().unwrap();

        let mut target = store();
        let report = target.import_merge(&blob).unwrap();
        assert_eq!(report.imported, 3);
        assert!(!report.rejected);
        assert_eq!(target.list(), source.list());
    }

    #[test]
    fn test_export_is_pretty_json_array() {
        let mut store = store();
        store.append(record(1.0)).unwrap();
        let text = String::from_utf8(store.export_all().unwrap()).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"totalScore\""));
    }

    #[test]
    fn test_import_appends_after_existing() {
        let mut store = store();
        let existing = record(1.0);
        store.append(existing.clone()).unwrap();
        let incoming = vec![record(2.0), record(3.0)];
        let blob = serde_json::to_vec(&incoming).unwrap();

        store.import_merge(&blob).unwrap();
        let mut expected = vec![existing];
        expected.extend(incoming);
        assert_eq!(store.list(), expected);
    }

    #[test]
    fn test_import_non_array_is_noop() {
        let mut store = store();
        let r = record(1.0);
        store.append(r.clone()).unwrap();

        let blobs: [&[u8]; 5] = [
            br#"{"id": "single"}"#,
            b"42",
            b"not json at all",
            br#"[{"id": "half a record"}]"#,
            b"",
        ];
        for blob in blobs {
            let report = store.import_merge(blob).unwrap();
            assert!(report.rejected);
            assert!(!report.changed());
            assert_eq!(store.list(), vec![r.clone()]);
        }
    }

    #[test]
    fn test_import_empty_array() {
        let mut store = store();
        let report = store.import_merge(b"[]").unwrap();
        assert_eq!(report, ImportReport::default());
        assert_eq!(store.storage().read(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_import_keep_existing_skips_collisions() {
        let mut store = store();
        let original = record(1.0).with_name("original");
        store.append(original.clone()).unwrap();

        let mut clash = record(50.0).with_name("incoming");
        clash.id = original.id.clone();
        let fresh = record(2.0);
        let blob = serde_json::to_vec(&vec![clash, fresh.clone()]).unwrap();

        let report = store.import_merge(&blob).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.list(), vec![original, fresh]);
    }

    #[test]
    fn test_import_twice_is_idempotent() {
        let mut store = store();
        let blob = serde_json::to_vec(&vec![record(1.0), record(2.0)]).unwrap();
        store.import_merge(&blob).unwrap();
        let report = store.import_merge(&blob).unwrap();
        assert_eq!(report.skipped, 2);
        assert!(!report.changed());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_import_replace_existing_overwrites_in_place() {
        let mut store = store().with_merge_policy(MergePolicy::ReplaceExisting);
        let first = record(1.0);
        let second = record(2.0);
        store.append(first.clone()).unwrap();
        store.append(second.clone()).unwrap();

        let mut update = record(40.0).with_name("updated");
        update.id = first.id.clone();
        let blob = serde_json::to_vec(&vec![update.clone()]).unwrap();
        let report = store.import_merge(&blob).unwrap();
        assert_eq!(report.replaced, 1);
        assert_eq!(store.list(), vec![update, second]);
    }

    #[test]
    fn test_duplicates_within_blob() {
        let dup = record(5.0);
        let blob = serde_json::to_vec(&vec![dup.clone(), dup.clone()]).unwrap();

        let mut keep = store();
        let report = keep.import_merge(&blob).unwrap();
        assert_eq!((report.imported, report.skipped), (1, 1));
        assert_eq!(keep.len(), 1);

        let mut replace = store().with_merge_policy(MergePolicy::ReplaceExisting);
        let report = replace.import_merge(&blob).unwrap();
        assert_eq!((report.imported, report.replaced), (1, 1));
        assert_eq!(replace.len(), 1);
    }

    #[test]
    fn test_stats() {
        let mut store = store();
        assert_eq!(store.stats().total_simulations, 0);
        store.append(record(25.0)).unwrap();
        store.append(record(0.0)).unwrap();
        let stats = store.stats();
        assert_eq!(stats.total_simulations, 2);
        assert_eq!(stats.best_score, 87);
    }

    #[test]
    fn test_custom_key() {
        let mut store = SimulationStore::with_key(MemoryStorage::new(), "other");
        store.append(record(1.0)).unwrap();
        assert!(store.storage().read("other").unwrap().is_some());
        assert!(store.storage().read(DEFAULT_STORAGE_KEY).unwrap().is_none());
        assert_eq!(store.key(), "other");
    }

    /// Memory storage whose next `fail_reads` reads return an I/O error.
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_reads: Cell<usize>,
    }

    impl Storage for FlakyStorage {
        fn read(&self, key: &str) -> std::io::Result<Option<String>> {
            let remaining = self.fail_reads.get();
            if remaining > 0 {
                self.fail_reads.set(remaining - 1);
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable"));
            }
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> std::io::Result<()> {
            self.inner.write(key, value)
        }
    }

    fn flaky_store_with(records: &[SimulationRecord]) -> SimulationStore<FlakyStorage> {
        let mut store = SimulationStore::new(FlakyStorage {
            inner: MemoryStorage::new(),
            fail_reads: Cell::new(0),
        });
        for r in records {
            store.append(r.clone()).unwrap();
        }
        store
    }

    #[test]
    fn test_read_error_fails_mutations_without_data_loss() {
        let existing: Vec<_> = (0..3).map(|i| record(i as f64)).collect();
        let mut store = flaky_store_with(&existing);

        store.storage.fail_reads.set(1);
        let err = store.append(record(9.0)).unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(store.list(), existing);

        store.storage.fail_reads.set(1);
        assert!(matches!(store.remove(&existing[0].id), Err(StoreError::Storage(_))));
        assert_eq!(store.len(), 3);

        store.storage.fail_reads.set(1);
        let blob = serde_json::to_vec(&vec![record(4.0)]).unwrap();
        assert!(matches!(store.import_merge(&blob), Err(StoreError::Storage(_))));
        assert_eq!(store.list(), existing);
    }

    #[test]
    fn test_read_error_lists_empty() {
        let store = flaky_store_with(&[record(1.0)]);
        store.storage.fail_reads.set(1);
        assert!(store.list().is_empty());
        assert_eq!(store.len(), 1);
    }
}
