//! Collaborator contracts and in-memory implementations.

pub mod chat;
pub mod peer;
pub mod profile;
pub mod push;

pub use chat::{ChatService, InMemoryChatService, SentMessage};
pub use peer::{InMemoryPeerService, PeerReply, PeerRequest, RecordedCall, RemoteCaller};
pub use profile::{InMemoryProfileCache, ProfileCache, ProfileSnapshot};
pub use push::{Delivery, InMemoryPushChannel, Notice, PushChannel};
