use common::MemberId;
use serde::Serialize;

use super::Relationship;

/// A relationship as seen by one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationView {
    pub member_id: MemberId,
    pub other_id: MemberId,
    pub connected: bool,
    pub blocked_by_me: bool,
    pub blocked_by_other: bool,
    pub tag: Option<String>,
}

impl RelationView {
    /// The view of a pair with no relationship record.
    pub fn empty(member_id: MemberId, other_id: MemberId) -> Self {
        Self {
            member_id,
            other_id,
            connected: false,
            blocked_by_me: false,
            blocked_by_other: false,
            tag: None,
        }
    }

    /// Builds the view `member` has of `relationship`.
    ///
    /// Returns None if `member` is not part of the relationship.
    pub fn of(relationship: &Relationship, member: MemberId) -> Option<Self> {
        let own = relationship.side(member)?;
        let other = relationship.other_side(member)?;
        Some(Self {
            member_id: member,
            other_id: other.member,
            connected: relationship.is_connected(),
            blocked_by_me: own.blocked,
            blocked_by_other: other.blocked,
            tag: own.tag.clone(),
        })
    }
}

/// An entry of a member's friend list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendView {
    pub friend_id: MemberId,
    pub tag: Option<String>,
}

impl FriendView {
    /// Builds the friend-list entry of `member` for a connected relationship.
    pub fn of(relationship: &Relationship, member: MemberId) -> Option<Self> {
        if !relationship.is_connected() {
            return None;
        }
        let other = relationship.other_side(member)?;
        Some(Self {
            friend_id: other.member,
            tag: relationship.tag_of(member).map(str::to_string),
        })
    }
}
