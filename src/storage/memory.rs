//! In-memory scan store

use parking_lot::RwLock;

use super::{ScanRecord, ScanStore, StoreError};

/// Volatile store, lost when the process exits
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<ScanRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScanStore for InMemoryStore {
    fn insert(&self, record: &ScanRecord) -> Result<(), StoreError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    fn all(&self) -> Result<Vec<ScanRecord>, StoreError> {
        Ok(self.records.read().clone())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().len())
    }
}
