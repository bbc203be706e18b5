//! Shared identifier types for the relation service.

pub mod types;

pub use types::{MemberId, PairKey};
