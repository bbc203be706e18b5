//! Keyed cache in front of the persistor.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{PairKey, RecordEnvelope};

/// A cached lookup result.
///
/// `Absent` remembers that the persistor had nothing under the key, so
/// repeated misses for pairs without records do not reach the store.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheSlot {
    Present(RecordEnvelope),
    Absent,
}

/// Cache of record envelopes keyed by record kind and pair key.
///
/// Every `put` and `invalidate` advances the key's write generation. A read
/// that missed observes the generation before going to the persistor and
/// hands it back to `fill`, which stores nothing if a write happened since.
#[async_trait]
pub trait KeyedCache: Send + Sync {
    /// Returns the cached slot, or None on a miss.
    async fn get(&self, kind: &str, key: PairKey) -> Option<CacheSlot>;

    /// Returns the current write generation of the key.
    async fn generation(&self, kind: &str, key: PairKey) -> u64;

    /// Stores a slot read from the persistor if the key is still at
    /// `generation`. Returns true if the slot was stored.
    async fn fill(&self, kind: &str, key: PairKey, slot: CacheSlot, generation: u64) -> bool;

    /// Stores a slot after a write, replacing any previous one.
    async fn put(&self, kind: &str, key: PairKey, slot: CacheSlot);

    /// Drops the slot so the next read goes to the persistor.
    async fn invalidate(&self, kind: &str, key: PairKey);
}

type SlotKey = (String, PairKey);

#[derive(Default)]
struct Slots {
    entries: HashMap<SlotKey, CacheSlot>,
    generations: HashMap<SlotKey, u64>,
}

impl Slots {
    fn bump(&mut self, slot_key: &SlotKey) {
        *self.generations.entry(slot_key.clone()).or_default() += 1;
    }
}

/// Unbounded in-process cache.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    slots: Arc<RwLock<Slots>>,
}

impl InMemoryCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached slots, negative ones included.
    pub async fn len(&self) -> usize {
        self.slots.read().await.entries.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.entries.is_empty()
    }
}

#[async_trait]
impl KeyedCache for InMemoryCache {
    async fn get(&self, kind: &str, key: PairKey) -> Option<CacheSlot> {
        self.slots
            .read()
            .await
            .entries
            .get(&(kind.to_string(), key))
            .cloned()
    }

    async fn generation(&self, kind: &str, key: PairKey) -> u64 {
        self.slots
            .read()
            .await
            .generations
            .get(&(kind.to_string(), key))
            .copied()
            .unwrap_or_default()
    }

    async fn fill(&self, kind: &str, key: PairKey, slot: CacheSlot, generation: u64) -> bool {
        let slot_key = (kind.to_string(), key);
        let mut slots = self.slots.write().await;
        let current = slots.generations.get(&slot_key).copied().unwrap_or_default();
        if current != generation {
            return false;
        }
        slots.entries.insert(slot_key, slot);
        true
    }

    async fn put(&self, kind: &str, key: PairKey, slot: CacheSlot) {
        let slot_key = (kind.to_string(), key);
        let mut slots = self.slots.write().await;
        slots.bump(&slot_key);
        slots.entries.insert(slot_key, slot);
    }

    async fn invalidate(&self, kind: &str, key: PairKey) {
        let slot_key = (kind.to_string(), key);
        let mut slots = self.slots.write().await;
        slots.bump(&slot_key);
        slots.entries.remove(&slot_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemberId;
    use chrono::Utc;

    fn key() -> PairKey {
        PairKey::new(MemberId::new(1), MemberId::new(2))
    }

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache = InMemoryCache::new();
        assert!(cache.get("Relationship", key()).await.is_none());

        let envelope = RecordEnvelope {
            kind: "Relationship".to_string(),
            key: key(),
            payload: serde_json::json!({}),
            updated_at: Utc::now(),
        };
        cache
            .put("Relationship", key(), CacheSlot::Present(envelope.clone()))
            .await;
        assert_eq!(
            cache.get("Relationship", key()).await,
            Some(CacheSlot::Present(envelope))
        );

        cache.invalidate("Relationship", key()).await;
        assert!(cache.get("Relationship", key()).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_absent_slot_is_a_hit() {
        let cache = InMemoryCache::new();
        cache.put("Relationship", key(), CacheSlot::Absent).await;
        assert_eq!(cache.get("Relationship", key()).await, Some(CacheSlot::Absent));
        assert!(cache.get("PendingApplication", key()).await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_fill_skipped_after_write() {
        let cache = InMemoryCache::new();
        let seen = cache.generation("Relationship", key()).await;

        cache.invalidate("Relationship", key()).await;

        assert!(
            !cache
                .fill("Relationship", key(), CacheSlot::Absent, seen)
                .await
        );
        assert!(cache.get("Relationship", key()).await.is_none());

        let seen = cache.generation("Relationship", key()).await;
        assert!(
            cache
                .fill("Relationship", key(), CacheSlot::Absent, seen)
                .await
        );
        assert_eq!(cache.get("Relationship", key()).await, Some(CacheSlot::Absent));
    }
}
