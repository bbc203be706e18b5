//! Cache-aside access to one record kind.

use std::marker::PhantomData;

use common::MemberId;

use crate::{
    CacheSlot, KeyedCache, PairKey, Persistor, Record, RecordEnvelope, RecordQuery, Result,
    StoreError,
};

/// Cache-aside repository for records of kind `R`.
///
/// Reads consult the cache first and fall back to the persistor on a miss,
/// remembering both hits and absences. Writes go to the persistor first; the
/// cache slot is invalidated or refreshed only after the persistor accepted
/// the write, so a failed write never leaves the cache ahead of the store.
///
/// A load that misses fills the cache only if no write touched the key while
/// it was reading the persistor, so a slow read never puts back a slot older
/// than the last write.
pub struct Repository<R, P, C> {
    persistor: P,
    cache: C,
    _record: PhantomData<fn() -> R>,
}

impl<R, P: Clone, C: Clone> Clone for Repository<R, P, C> {
    fn clone(&self) -> Self {
        Self {
            persistor: self.persistor.clone(),
            cache: self.cache.clone(),
            _record: PhantomData,
        }
    }
}

impl<R, P, C> Repository<R, P, C>
where
    R: Record,
    P: Persistor,
    C: KeyedCache,
{
    /// Creates a repository over the given persistor and cache.
    pub fn new(persistor: P, cache: C) -> Self {
        Self {
            persistor,
            cache,
            _record: PhantomData,
        }
    }

    /// Loads the record for `key`, or None if nothing is persisted.
    pub async fn load(&self, key: PairKey) -> Result<Option<R>> {
        if let Some(slot) = self.cache.get(R::KIND, key).await {
            metrics::counter!("relation_cache_hits", "kind" => R::KIND).increment(1);
            return match slot {
                CacheSlot::Present(envelope) => envelope.to_record().map(Some),
                CacheSlot::Absent => Ok(None),
            };
        }

        metrics::counter!("relation_cache_misses", "kind" => R::KIND).increment(1);
        let generation = self.cache.generation(R::KIND, key).await;
        let loaded = self.persistor.load(R::KIND, key).await?;
        let record = loaded.as_ref().map(RecordEnvelope::to_record).transpose()?;

        let slot = match loaded {
            Some(envelope) => CacheSlot::Present(envelope),
            None => CacheSlot::Absent,
        };
        if !self.cache.fill(R::KIND, key, slot, generation).await {
            tracing::debug!(kind = R::KIND, %key, "cache fill skipped after concurrent write");
        }

        Ok(record)
    }

    /// Persists a new record, then invalidates its cache slot.
    pub async fn insert(&self, record: &R) -> Result<()> {
        let envelope = RecordEnvelope::from_record(record)?;
        let key = envelope.key;
        self.persistor.insert(envelope).await?;
        self.cache.invalidate(R::KIND, key).await;
        tracing::debug!(kind = R::KIND, %key, "record inserted");
        Ok(())
    }

    /// Persists a change to an existing record, then refreshes its cache slot.
    pub async fn update(&self, record: &R) -> Result<()> {
        let envelope = RecordEnvelope::from_record(record)?;
        let key = envelope.key;
        self.persistor.update(envelope.clone()).await?;
        self.cache.put(R::KIND, key, CacheSlot::Present(envelope)).await;
        tracing::debug!(kind = R::KIND, %key, "record updated");
        Ok(())
    }

    /// Updates the record if one is persisted, inserts it otherwise.
    pub async fn upsert(&self, record: &R) -> Result<()> {
        match self.update(record).await {
            Err(StoreError::NotFound { .. }) => self.insert(record).await,
            other => other,
        }
    }

    /// Deletes the record for `key`, then invalidates its cache slot.
    ///
    /// Returns true if a record was removed.
    pub async fn delete(&self, key: PairKey) -> Result<bool> {
        let removed = self.persistor.delete(R::KIND, key).await?;
        self.cache.invalidate(R::KIND, key).await;
        tracing::debug!(kind = R::KIND, %key, removed, "record deleted");
        Ok(removed)
    }

    /// Lists records involving `member`, bypassing the cache.
    pub async fn list_for_member(&self, member: MemberId, limit: Option<usize>) -> Result<Vec<R>> {
        let mut query = RecordQuery::for_kind(R::KIND).member(member);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.persistor
            .query(query)
            .await?
            .iter()
            .map(RecordEnvelope::to_record)
            .collect()
    }
}
