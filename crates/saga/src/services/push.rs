//! Push delivery channel.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{MemberId, PairKey};
use serde::{Deserialize, Serialize};

use super::profile::ProfileSnapshot;
use crate::error::{Result, SagaError};

/// Event pushed to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// `requester` applied to become a friend of the recipient.
    NewApplication {
        requester: MemberId,
        profile: Option<ProfileSnapshot>,
    },
    /// `friend` is now a friend of the recipient.
    NewFriend {
        friend: MemberId,
        profile: Option<ProfileSnapshot>,
    },
}

impl Notice {
    pub fn name(&self) -> &'static str {
        match self {
            Notice::NewApplication { .. } => "new_application",
            Notice::NewFriend { .. } => "new_friend",
        }
    }
}

/// External channel delivering notices to members.
///
/// `routing` is the pair key of the relationship the notice is about;
/// deliveries with the same routing key are ordered by the channel.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn push(&self, routing: PairKey, recipient: MemberId, notice: Notice) -> Result<()>;
}

/// A notice accepted by [`InMemoryPushChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub routing: PairKey,
    pub recipient: MemberId,
    pub notice: Notice,
}

#[derive(Debug, Default)]
struct InMemoryPushState {
    deliveries: Vec<Delivery>,
    fail_on_push: bool,
}

/// In-memory push channel for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPushChannel {
    state: Arc<RwLock<InMemoryPushState>>,
}

impl InMemoryPushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every push fail.
    pub fn set_fail_on_push(&self, fail: bool) {
        self.state.write().unwrap().fail_on_push = fail;
    }

    /// Returns all deliveries, in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.read().unwrap().deliveries.clone()
    }

    /// Returns the notices delivered to `member`, in order.
    pub fn notices_for(&self, member: MemberId) -> Vec<Notice> {
        self.state
            .read()
            .unwrap()
            .deliveries
            .iter()
            .filter(|d| d.recipient == member)
            .map(|d| d.notice.clone())
            .collect()
    }

    pub fn delivery_count(&self) -> usize {
        self.state.read().unwrap().deliveries.len()
    }
}

#[async_trait]
impl PushChannel for InMemoryPushChannel {
    async fn push(&self, routing: PairKey, recipient: MemberId, notice: Notice) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_push {
            return Err(SagaError::Unavailable("push channel".to_string()));
        }

        state.deliveries.push(Delivery {
            routing,
            recipient,
            notice,
        });
        Ok(())
    }
}
