//! Profile snapshot lookup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::MemberId;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};

/// Read-only snapshot of a member's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub member_id: MemberId,
    pub nickname: String,
    pub avatar: Option<String>,
}

impl ProfileSnapshot {
    pub fn new(member_id: MemberId, nickname: impl Into<String>) -> Self {
        Self {
            member_id,
            nickname: nickname.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Batch lookup of profile snapshots.
///
/// Members without a profile are absent from the returned map.
#[async_trait]
pub trait ProfileCache: Send + Sync {
    async fn get_profiles(&self, members: &[MemberId]) -> Result<HashMap<MemberId, ProfileSnapshot>>;
}

#[derive(Debug, Default)]
struct InMemoryProfileState {
    profiles: HashMap<MemberId, ProfileSnapshot>,
    lookups: usize,
    unavailable: bool,
    generate_missing: bool,
}

/// In-memory profile cache for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileCache {
    state: Arc<RwLock<InMemoryProfileState>>,
}

impl InMemoryProfileCache {
    /// Creates an empty profile cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache that answers every lookup, generating a
    /// `member-<id>` snapshot for members without a stored profile.
    pub fn generating() -> Self {
        let cache = Self::default();
        cache.state.write().unwrap().generate_missing = true;
        cache
    }

    /// Adds or replaces a profile.
    pub fn insert(&self, profile: ProfileSnapshot) {
        self.state
            .write()
            .unwrap()
            .profiles
            .insert(profile.member_id, profile);
    }

    /// Makes lookups fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Returns the number of batch lookups served.
    pub fn lookup_count(&self) -> usize {
        self.state.read().unwrap().lookups
    }
}

#[async_trait]
impl ProfileCache for InMemoryProfileCache {
    async fn get_profiles(&self, members: &[MemberId]) -> Result<HashMap<MemberId, ProfileSnapshot>> {
        let mut state = self.state.write().unwrap();

        if state.unavailable {
            return Err(SagaError::Unavailable("profile cache".to_string()));
        }
        state.lookups += 1;

        Ok(members
            .iter()
            .filter_map(|id| match state.profiles.get(id) {
                Some(profile) => Some((*id, profile.clone())),
                None if state.generate_missing => {
                    Some((*id, ProfileSnapshot::new(*id, format!("member-{id}"))))
                }
                None => None,
            })
            .collect())
    }
}
