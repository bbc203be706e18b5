use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    PairKey, RecordEnvelope, RecordQuery, Result, StoreError,
    store::Persistor,
};

type StorageKey = (String, PairKey);

/// In-memory persistor implementation for testing.
///
/// This implementation stores all records in memory and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryPersistor {
    records: Arc<RwLock<HashMap<StorageKey, RecordEnvelope>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryPersistor {
    /// Creates a new empty in-memory persistor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Makes every subsequent insert, update and delete fail with `Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Persistor for InMemoryPersistor {
    async fn load(&self, kind: &str, key: PairKey) -> Result<Option<RecordEnvelope>> {
        let records = self.records.read().await;
        Ok(records.get(&(kind.to_string(), key)).cloned())
    }

    async fn insert(&self, envelope: RecordEnvelope) -> Result<()> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        let storage_key = (envelope.kind.clone(), envelope.key);
        if records.contains_key(&storage_key) {
            return Err(StoreError::AlreadyExists {
                kind: envelope.kind,
                key: envelope.key,
            });
        }
        records.insert(storage_key, envelope);
        Ok(())
    }

    async fn update(&self, envelope: RecordEnvelope) -> Result<()> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        match records.get_mut(&(envelope.kind.clone(), envelope.key)) {
            Some(existing) => {
                *existing = envelope;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: envelope.kind,
                key: envelope.key,
            }),
        }
    }

    async fn delete(&self, kind: &str, key: PairKey) -> Result<bool> {
        self.check_writable()?;
        let mut records = self.records.write().await;
        Ok(records.remove(&(kind.to_string(), key)).is_some())
    }

    async fn query(&self, query: RecordQuery) -> Result<Vec<RecordEnvelope>> {
        let records = self.records.read().await;
        let mut matched: Vec<_> = records
            .values()
            .filter(|envelope| query.matches(envelope))
            .cloned()
            .collect();

        // Most recent first, key as tie-breaker for a stable order
        matched.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(a.key.cmp(&b.key))
        });

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }
}
