//! Relationship saga coordination.
//!
//! Every relationship-affecting operation follows the same shape:
//! 1. Validate the request against the stored records
//! 2. Confirm with the peer services owning member state
//! 3. Mutate the local records on the pair's affinity lane
//! 4. Notify the affected members
//!
//! A failed peer confirmation aborts the remaining steps. Steps that already
//! completed against a peer are not compensated.

pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod scheduler;
pub mod services;
pub mod store;

pub use coordinator::{
    BlockOutcome, Collaborators, CoordinatorConfig, DEFAULT_FIRST_MESSAGE, MarkOutcome,
    RelationCoordinator,
};
pub use dispatcher::NotificationDispatcher;
pub use error::{Result, SagaError};
pub use orchestrator::{CallChain, PeerCall};
pub use scheduler::AffinityScheduler;
pub use services::{
    ChatService, InMemoryChatService, InMemoryPeerService, InMemoryProfileCache,
    InMemoryPushChannel, Notice, PeerReply, PeerRequest, ProfileCache, ProfileSnapshot,
    PushChannel, RemoteCaller,
};
pub use store::RelationStore;
