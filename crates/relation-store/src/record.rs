use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{PairKey, Result, StoreError};

/// A record type owned by the relation service.
///
/// Every record is addressed by its kind and the pair key of the two members
/// it describes; at most one record of a kind exists per pair.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable name of the record kind, used as part of the storage key.
    const KIND: &'static str;

    /// The pair this record belongs to.
    fn key(&self) -> PairKey;
}

/// The stored form of a record: its address plus a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEnvelope {
    /// The record kind (e.g., "PendingApplication", "Relationship").
    pub kind: String,

    /// The pair key the record is stored under.
    pub key: PairKey,

    /// The serialized record.
    pub payload: serde_json::Value,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl RecordEnvelope {
    /// Wraps a record for storage, stamping the current time.
    pub fn from_record<R: Record>(record: &R) -> Result<Self> {
        Ok(Self {
            kind: R::KIND.to_string(),
            key: record.key(),
            payload: serde_json::to_value(record)?,
            updated_at: Utc::now(),
        })
    }

    /// Decodes the payload back into a record of kind `R`.
    pub fn to_record<R: Record>(&self) -> Result<R> {
        if self.kind != R::KIND {
            return Err(StoreError::KindMismatch {
                expected: R::KIND.to_string(),
                actual: self.kind.clone(),
            });
        }
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}
