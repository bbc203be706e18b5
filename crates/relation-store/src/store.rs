use async_trait::async_trait;

use crate::{PairKey, RecordEnvelope, RecordQuery, Result};

/// Core trait for persistent store implementations.
///
/// Records are addressed by `(kind, key)`. The persistor is the source of
/// truth; caches are layered on top by [`crate::Repository`].
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Persistor: Send + Sync {
    /// Loads a record by kind and key.
    ///
    /// Returns None if no record is stored.
    async fn load(&self, kind: &str, key: PairKey) -> Result<Option<RecordEnvelope>>;

    /// Inserts a new record.
    ///
    /// Fails with `AlreadyExists` if a record with the same kind and key is stored.
    async fn insert(&self, envelope: RecordEnvelope) -> Result<()>;

    /// Replaces an existing record.
    ///
    /// Fails with `NotFound` if nothing is stored under the kind and key.
    async fn update(&self, envelope: RecordEnvelope) -> Result<()>;

    /// Deletes a record. Returns true if a record was removed.
    async fn delete(&self, kind: &str, key: PairKey) -> Result<bool>;

    /// Retrieves records matching a query, most recently updated first.
    async fn query(&self, query: RecordQuery) -> Result<Vec<RecordEnvelope>>;
}
