//! Export files - downloadable JSON snapshots of one record or the collection
//!
//! File names embed a millisecond timestamp so repeated exports don't clash.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::record::SimulationRecord;
use crate::storage::Storage;
use crate::store::SimulationStore;

/// `civicsim-budget-<millis>.json`
pub fn record_file_name(at: DateTime<Utc>) -> String {
    format!("civicsim-budget-{}.json", at.timestamp_millis())
}

/// `civicsim-all-simulations-<millis>.json`
pub fn collection_file_name(at: DateTime<Utc>) -> String {
    format!("civicsim-all-simulations-{}.json", at.timestamp_millis())
}

/// Pretty-printed JSON for a single record.
pub fn record_to_json(record: &SimulationRecord) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(record)?)
}

/// Write a single record to `dir`, returning the path written.
pub fn write_record(dir: &Path, record: &SimulationRecord) -> StoreResult<PathBuf> {
    let path = dir.join(record_file_name(Utc::now()));
    write_file(&path, &record_to_json(record)?)?;
    Ok(path)
}

/// Write the whole collection to `dir`, returning the path written.
pub fn write_collection<S: Storage>(
    dir: &Path,
    store: &SimulationStore<S>,
) -> StoreResult<PathBuf> {
    let path = dir.join(collection_file_name(Utc::now()));
    write_file(&path, &store.export_all()?)?;
    Ok(path)
}

/// Write export bytes to an explicit path, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    log::info!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;
    use civicsim_logic::budget::Allocations;

    #[test]
    fn test_file_names() {
        let at = Utc.timestamp_millis_opt(1_717_171_717_171).unwrap();
        assert_eq!(record_file_name(at), "civicsim-budget-1717171717171.json");
        assert_eq!(
            collection_file_name(at),
            "civicsim-all-simulations-1717171717171.json"
        );
    }

    #[test]
    fn test_single_record_roundtrip() {
        let record = SimulationRecord::new(&Allocations::defaults());
        let bytes = record_to_json(&record).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with("{\n"));
        let decoded: SimulationRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_single_record_file_is_not_importable() {
        let record = SimulationRecord::new(&Allocations::defaults());
        let mut store = SimulationStore::new(MemoryStorage::new());
        let report = store.import_merge(&record_to_json(&record).unwrap()).unwrap();
        assert!(report.rejected);
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_collection_and_reimport() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SimulationStore::new(MemoryStorage::new());
        store.append(SimulationRecord::new(&Allocations::defaults())).unwrap();
        store.append(SimulationRecord::new(&Allocations::new())).unwrap();

        let path = write_collection(dir.path(), &store).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("civicsim-all-simulations-"));

        let mut fresh = SimulationStore::new(MemoryStorage::new());
        fresh.import_merge(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(fresh.list(), store.list());
    }

    #[test]
    fn test_write_record_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let record = SimulationRecord::new(&Allocations::defaults());
        let path = write_record(&target, &record).unwrap();
        assert!(path.starts_with(&target));
        assert!(path.exists());
    }
}
