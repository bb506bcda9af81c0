use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{format, PersistenceError, SectorStore, StoredSector};

/// In-memory sector store used by tests and headless sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Vec<StoredSector>,
}

impl MemoryStore {
    /// Creates a store pre-populated with the provided records.
    #[must_use]
    pub fn with_records(records: Vec<StoredSector>) -> Self {
        Self { records }
    }

    /// Records currently held by the store.
    #[must_use]
    pub fn records(&self) -> &[StoredSector] {
        &self.records
    }
}

impl SectorStore for MemoryStore {
    fn read(&self) -> Result<Vec<StoredSector>, PersistenceError> {
        Ok(self.records.clone())
    }

    fn write(&mut self, records: &[StoredSector]) -> Result<(), PersistenceError> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// Sector store backed by a single bincode file.
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// readers observe either the previous or the new collection.
#[derive(Clone, Debug)]
pub struct BincodeFileStore {
    path: PathBuf,
}

impl BincodeFileStore {
    /// Creates a store reading and writing the provided file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing the store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SectorStore for BincodeFileStore {
    fn read(&self) -> Result<Vec<StoredSector>, PersistenceError> {
        match fs::read(&self.path) {
            Ok(bytes) => format::decode(&bytes),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(PersistenceError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&mut self, records: &[StoredSector]) -> Result<(), PersistenceError> {
        let bytes = format::encode(&records)?;
        write_atomically(&self.path, &bytes)
    }
}

/// Replaces `path` with `bytes` through a temporary sibling file.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let temporary = path.with_extension("tmp");
    fs::write(&temporary, bytes).map_err(io_error(&temporary))?;
    fs::rename(&temporary, path).map_err(io_error(path))
}

/// Attaches the failing path to an I/O error.
pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PersistenceError {
    let path = path.to_path_buf();
    move |source| PersistenceError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("sector-atlas-store-{label}-{nanos}"))
    }

    fn record(x: i32) -> StoredSector {
        StoredSector {
            x,
            y: 0,
            width: 1,
            height: 1,
            complete: x == 0,
            completed_missions: 0,
            save_slot: None,
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = scratch_dir("missing");
        let store = BincodeFileStore::new(dir.join("sectors.bin"));
        assert!(store.read().expect("read").is_empty());
    }

    #[test]
    fn written_records_are_read_back() {
        let dir = scratch_dir("round-trip");
        let mut store = BincodeFileStore::new(dir.join("nested").join("sectors.bin"));
        let records = vec![record(0), record(1), record(-1)];

        store.write(&records).expect("write");
        assert_eq!(store.read().expect("read"), records);
        assert!(!store.path().with_extension("tmp").exists());

        store.write(&records[..1]).expect("overwrite");
        assert_eq!(store.read().expect("read"), records[..1].to_vec());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn garbage_file_is_reported() {
        let dir = scratch_dir("garbage");
        fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("sectors.bin");
        fs::write(&path, b"not a sector file").expect("write garbage");

        let store = BincodeFileStore::new(&path);
        assert!(matches!(
            store.read(),
            Err(PersistenceError::InvalidMagic(_))
        ));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn memory_store_replaces_records() {
        let mut store = MemoryStore::with_records(vec![record(3)]);
        store.write(&[record(4)]).expect("write");
        assert_eq!(store.records(), &[record(4)]);
    }
}
