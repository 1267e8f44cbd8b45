use crate::record::{Entity, RecordStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tf_core::error::{Result, TfError};

/// In-memory store with ids starting at 1, listed in id order.
pub struct MemoryStore<T> {
    records: RwLock<BTreeMap<u64, T>>,
    next_id: AtomicU64,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self { records: RwLock::new(BTreeMap::new()), next_id: AtomicU64::new(1) }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> RecordStore<T> for MemoryStore<T> {
    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.records.read().values().cloned().collect())
    }

    async fn get(&self, id: u64) -> Result<T> {
        self.records.read().get(&id).cloned().ok_or_else(|| TfError::not_found(T::KIND, id))
    }

    async fn create(&self, mut record: T) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        record.set_id(id);
        self.records.write().insert(id, record.clone());
        tracing::debug!(kind = T::KIND, id, "record created");
        Ok(record)
    }

    async fn update(&self, id: u64, mut record: T) -> Result<T> {
        let mut records = self.records.write();
        match records.get_mut(&id) {
            Some(slot) => {
                record.set_id(id);
                *slot = record.clone();
                Ok(record)
            }
            None => Err(TfError::not_found(T::KIND, id)),
        }
    }

    async fn delete(&self, id: u64) -> Result<()> {
        self.records
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| TfError::not_found(T::KIND, id))
    }
}
