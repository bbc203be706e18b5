//! Storage for relation records.
//!
//! The persistent store is authoritative; the cache in front of it is only
//! written after the store accepted a mutation. [`Repository`] is the
//! cache-aside entry point used by the saga layer.

pub mod cache;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod repository;
pub mod store;

pub use cache::{CacheSlot, InMemoryCache, KeyedCache};
pub use common::{MemberId, PairKey};
pub use error::{Result, StoreError};
pub use memory::InMemoryPersistor;
pub use postgres::PostgresPersistor;
pub use query::RecordQuery;
pub use record::{Record, RecordEnvelope};
pub use repository::Repository;
pub use store::Persistor;
