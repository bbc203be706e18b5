//! System chat messages.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::MemberId;

use crate::error::{Result, SagaError};

/// Chat service used to open a conversation between new friends.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Sends the first message of a conversation from `from` to `to`.
    async fn send_first_message(&self, from: MemberId, to: MemberId, text: &str) -> Result<()>;
}

/// A message accepted by [`InMemoryChatService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub from: MemberId,
    pub to: MemberId,
    pub text: String,
}

#[derive(Debug, Default)]
struct InMemoryChatState {
    messages: Vec<SentMessage>,
    fail_on_send: bool,
}

/// In-memory chat service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatService {
    state: Arc<RwLock<InMemoryChatState>>,
}

impl InMemoryChatService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.state.read().unwrap().messages.clone()
    }
}

#[async_trait]
impl ChatService for InMemoryChatService {
    async fn send_first_message(&self, from: MemberId, to: MemberId, text: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(SagaError::Unavailable("chat service".to_string()));
        }

        state.messages.push(SentMessage {
            from,
            to,
            text: text.to_string(),
        });
        Ok(())
    }
}
