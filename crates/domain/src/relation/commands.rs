//! Relation commands.
//!
//! Each command names the member it claims to act for (`user_id`); the
//! validator checks that claim against the authenticated caller.

use common::{MemberId, PairKey};
use serde::{Deserialize, Serialize};

/// The relation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Apply,
    Accept,
    Reject,
    Delete,
    Block,
    Unblock,
    Mark,
}

impl Operation {
    /// Returns the operation name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Apply => "apply",
            Operation::Accept => "accept",
            Operation::Reject => "reject",
            Operation::Delete => "delete",
            Operation::Block => "block",
            Operation::Unblock => "unblock",
            Operation::Mark => "mark",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for commands acting on the relation between two members.
pub trait RelationCommand: Send + Sync {
    /// The operation this command requests.
    const OPERATION: Operation;

    /// The member the request claims to act for.
    fn user_id(&self) -> MemberId;

    /// The other member of the pair.
    fn other_id(&self) -> MemberId;

    /// The key of the pair the command touches.
    fn pair_key(&self) -> PairKey {
        PairKey::new(self.user_id(), self.other_id())
    }
}

/// Command to send a friend application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyFriend {
    /// The applicant.
    pub user_id: MemberId,

    /// The member being asked.
    pub friend_id: MemberId,
}

impl ApplyFriend {
    /// Creates a new ApplyFriend command.
    pub fn new(user_id: MemberId, friend_id: MemberId) -> Self {
        Self { user_id, friend_id }
    }
}

impl RelationCommand for ApplyFriend {
    const OPERATION: Operation = Operation::Apply;

    fn user_id(&self) -> MemberId {
        self.user_id
    }

    fn other_id(&self) -> MemberId {
        self.friend_id
    }
}

/// Command to accept a pending friend application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptFriend {
    /// The member answering the application.
    pub user_id: MemberId,

    /// The applicant.
    pub friend_id: MemberId,
}

impl AcceptFriend {
    /// Creates a new AcceptFriend command.
    pub fn new(user_id: MemberId, friend_id: MemberId) -> Self {
        Self { user_id, friend_id }
    }
}

impl RelationCommand for AcceptFriend {
    const OPERATION: Operation = Operation::Accept;

    fn user_id(&self) -> MemberId {
        self.user_id
    }

    fn other_id(&self) -> MemberId {
        self.friend_id
    }
}

/// Command to reject a pending friend application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectFriend {
    /// The member answering the application.
    pub user_id: MemberId,

    /// The applicant.
    pub friend_id: MemberId,
}

impl RejectFriend {
    /// Creates a new RejectFriend command.
    pub fn new(user_id: MemberId, friend_id: MemberId) -> Self {
        Self { user_id, friend_id }
    }
}

impl RelationCommand for RejectFriend {
    const OPERATION: Operation = Operation::Reject;

    fn user_id(&self) -> MemberId {
        self.user_id
    }

    fn other_id(&self) -> MemberId {
        self.friend_id
    }
}

/// Command to end a friendship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFriend {
    pub user_id: MemberId,
    pub friend_id: MemberId,
}

impl DeleteFriend {
    /// Creates a new DeleteFriend command.
    pub fn new(user_id: MemberId, friend_id: MemberId) -> Self {
        Self { user_id, friend_id }
    }
}

impl RelationCommand for DeleteFriend {
    const OPERATION: Operation = Operation::Delete;

    fn user_id(&self) -> MemberId {
        self.user_id
    }

    fn other_id(&self) -> MemberId {
        self.friend_id
    }
}

/// Command to block another member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMember {
    pub user_id: MemberId,
    pub target_id: MemberId,
}

impl BlockMember {
    /// Creates a new BlockMember command.
    pub fn new(user_id: MemberId, target_id: MemberId) -> Self {
        Self { user_id, target_id }
    }
}

impl RelationCommand for BlockMember {
    const OPERATION: Operation = Operation::Block;

    fn user_id(&self) -> MemberId {
        self.user_id
    }

    fn other_id(&self) -> MemberId {
        self.target_id
    }
}

/// Command to lift a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnblockMember {
    pub user_id: MemberId,
    pub target_id: MemberId,
}

impl UnblockMember {
    /// Creates a new UnblockMember command.
    pub fn new(user_id: MemberId, target_id: MemberId) -> Self {
        Self { user_id, target_id }
    }
}

impl RelationCommand for UnblockMember {
    const OPERATION: Operation = Operation::Unblock;

    fn user_id(&self) -> MemberId {
        self.user_id
    }

    fn other_id(&self) -> MemberId {
        self.target_id
    }
}

/// Command to label a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkFriend {
    pub user_id: MemberId,
    pub friend_id: MemberId,

    /// The label; must not be blank.
    pub tag: String,
}

impl MarkFriend {
    /// Creates a new MarkFriend command.
    pub fn new(user_id: MemberId, friend_id: MemberId, tag: impl Into<String>) -> Self {
        Self {
            user_id,
            friend_id,
            tag: tag.into(),
        }
    }
}

impl RelationCommand for MarkFriend {
    const OPERATION: Operation = Operation::Mark;

    fn user_id(&self) -> MemberId {
        self.user_id
    }

    fn other_id(&self) -> MemberId {
        self.friend_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_matches_both_directions() {
        let apply = ApplyFriend::new(MemberId::new(10), MemberId::new(20));
        let accept = AcceptFriend::new(MemberId::new(20), MemberId::new(10));
        assert_eq!(apply.pair_key(), accept.pair_key());
    }

    #[test]
    fn test_block_deserializes_target_id() {
        let cmd: BlockMember =
            serde_json::from_str(r#"{"user_id": 10, "target_id": 20}"#).unwrap();
        assert_eq!(cmd.other_id(), MemberId::new(20));
        assert_eq!(BlockMember::OPERATION, Operation::Block);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Apply.to_string(), "apply");
        assert_eq!(Operation::Unblock.to_string(), "unblock");
    }
}
