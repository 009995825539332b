use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use spdlog::debug;
use uuid::Uuid;

use crate::report::{Report, StoredReport};
use crate::store::{DocumentStore, StoreError, check_name};

type Collections = HashMap<String, Vec<StoredReport>>;

/// In-process store. Everything is lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl DocumentStore for MemoryStore {
    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        check_name(name)?;
        let mut guard = self.lock()?;

        if guard.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        guard.insert(name.to_string(), Vec::new());

        Ok(())
    }

    async fn insert_many(&self, name: &str, reports: &[Report]) -> Result<usize, StoreError> {
        check_name(name)?;
        debug!("MemoryStore.insert_many(): {} into {}", reports.len(), name);

        let mut guard = self.lock()?;
        let collection = guard.entry(name.to_string()).or_default();
        collection.extend(
            reports
                .iter()
                .map(|report| StoredReport::new(Uuid::new_v4().simple().to_string(), report.clone())),
        );

        Ok(reports.len())
    }

    async fn find_all(&self, name: &str) -> Result<Vec<StoredReport>, StoreError> {
        check_name(name)?;

        self.lock()?
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn drop_collection(&self, name: &str) -> Result<bool, StoreError> {
        check_name(name)?;

        Ok(self.lock()?.remove(name).is_some())
    }
}
