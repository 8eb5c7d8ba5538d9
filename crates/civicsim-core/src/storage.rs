//! Key-value storage backends
//!
//! The store persists its whole collection as one string value under one
//! key. Backends only need to read and replace whole values.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// String-keyed persistence layer.
///
/// Reading a missing key yields `Ok(None)`, never an error.
pub trait Storage {
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace the value under `key` in one step.
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// In-process storage, lost when dropped. Used by tests and the harness.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key inside a directory: key `K` lives in `<dir>/K.json`.
///
/// Writes go to a temporary sibling file that is then renamed over the
/// target, so readers see either the old value or the new one.
#[derive(Debug, Clone)]
pub struct DirStorage {
    base_dir: PathBuf,
}

impl DirStorage {
    /// Storage rooted at `base_dir`. The directory is created on first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// File backing `key`.
    pub fn entry_path(&self, key: &str) -> io::Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_dir.join(format!("{}.json", key)))
    }
}

fn validate_key(key: &str) -> io::Result<()> {
    let bad = key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.starts_with('.');
    if bad {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid storage key '{}'", key),
        ));
    }
    Ok(())
}

impl Storage for DirStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.entry_path(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.base_dir)?;
        let tmp_path = path.with_extension("json.tmp");
        let staged = fs::write(&tmp_path, value).and_then(|()| fs::rename(&tmp_path, &path));
        if let Err(e) = staged {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
                }
            }
            return Err(e);
        }
        log::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}
