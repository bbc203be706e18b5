//! Peer service RPC contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::MemberId;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};

/// Requests sent to the services owning member state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerRequest {
    /// Asks whether `requester` may apply to `target`.
    ApplyEligibility {
        requester: MemberId,
        target: MemberId,
    },
    /// Records `friend` as a friend of `member`.
    AcceptFriend { member: MemberId, friend: MemberId },
    /// Removes `friend` from the friends of `member`.
    DeleteFriend { member: MemberId, friend: MemberId },
    /// Adds `target` to the block list of `member`.
    BlockMember { member: MemberId, target: MemberId },
    /// Removes `target` from the block list of `member`.
    UnblockMember { member: MemberId, target: MemberId },
}

impl PeerRequest {
    /// Call name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            PeerRequest::ApplyEligibility { .. } => "apply_eligibility",
            PeerRequest::AcceptFriend { .. } => "accept_friend",
            PeerRequest::DeleteFriend { .. } => "delete_friend",
            PeerRequest::BlockMember { .. } => "block_member",
            PeerRequest::UnblockMember { .. } => "unblock_member",
        }
    }
}

/// Reply from a peer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReply {
    pub success: bool,
    pub code: i32,
    pub message: Option<String>,
}

impl PeerReply {
    /// A successful reply.
    pub fn ok() -> Self {
        Self {
            success: true,
            code: 0,
            message: None,
        }
    }

    /// A failing reply with the peer's code.
    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: Some(message.into()),
        }
    }
}

/// Request/response calls to peer services.
///
/// `routing` selects the peer instance that owns the member's state. Each
/// call is issued exactly once; the implementation must not retry.
#[async_trait]
pub trait RemoteCaller: Send + Sync {
    /// Sends `request` to the peer owning `routing` and awaits its reply.
    ///
    /// `Err` means no reply was obtained; a reply reporting failure is `Ok`.
    async fn ask(&self, request: PeerRequest, routing: MemberId) -> Result<PeerReply>;
}

/// A call observed by [`InMemoryPeerService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub request: PeerRequest,
    pub routing: MemberId,
}

#[derive(Debug, Default)]
struct InMemoryPeerState {
    calls: Vec<RecordedCall>,
    // (call name, routing member or any) -> failure code
    failures: HashMap<(&'static str, Option<MemberId>), i32>,
    unavailable: bool,
}

/// In-memory peer service for testing.
///
/// Accepts every request unless told to fail it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPeerService {
    state: Arc<RwLock<InMemoryPeerState>>,
}

impl InMemoryPeerService {
    /// Creates a new in-memory peer service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call named `call` fail with `code`.
    pub fn set_fail_on(&self, call: &'static str, code: i32) {
        self.state.write().unwrap().failures.insert((call, None), code);
    }

    /// Makes calls named `call` routed to `member` fail with `code`.
    pub fn set_fail_on_member(&self, call: &'static str, member: MemberId, code: i32) {
        self.state
            .write()
            .unwrap()
            .failures
            .insert((call, Some(member)), code);
    }

    /// Removes all configured failures.
    pub fn clear_failures(&self) {
        self.state.write().unwrap().failures.clear();
    }

    /// Makes every call return an error instead of a reply.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Returns the calls received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// Returns the number of calls named `call`.
    pub fn call_count(&self, call: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.request.name() == call)
            .count()
    }
}

#[async_trait]
impl RemoteCaller for InMemoryPeerService {
    async fn ask(&self, request: PeerRequest, routing: MemberId) -> Result<PeerReply> {
        let mut state = self.state.write().unwrap();

        if state.unavailable {
            return Err(SagaError::Unavailable("peer service".to_string()));
        }

        let name = request.name();
        let failure = state
            .failures
            .get(&(name, Some(routing)))
            .or_else(|| state.failures.get(&(name, None)))
            .copied();

        state.calls.push(RecordedCall { request, routing });

        Ok(match failure {
            Some(code) => PeerReply::failed(code, format!("{name} refused")),
            None => PeerReply::ok(),
        })
    }
}
