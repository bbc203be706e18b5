use common::{MemberId, PairKey};
use relation_store::Record;
use serde::{Deserialize, Serialize};

use crate::code::ResultCode;
use crate::error::DomainError;

/// One member's side of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSide {
    /// The member owning this side.
    pub member: MemberId,
    /// Whether this member has blocked the other one.
    pub blocked: bool,
    /// Label this member gave the other one.
    pub tag: Option<String>,
}

impl RelationSide {
    fn new(member: MemberId) -> Self {
        Self {
            member,
            blocked: false,
            tag: None,
        }
    }
}

/// The relationship record between two members.
///
/// `connected` and the per-side block flags are independent: blocking does
/// not disconnect, and disconnecting keeps blocks and tags. The record is
/// created lazily and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    low: RelationSide,
    high: RelationSide,
    connected: bool,
}

impl Relationship {
    /// Creates an unconnected relationship with no blocks or tags.
    pub fn new(a: MemberId, b: MemberId) -> Self {
        let key = PairKey::new(a, b);
        Self {
            low: RelationSide::new(key.low()),
            high: RelationSide::new(key.high()),
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connect(&mut self) {
        self.connected = true;
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Returns the side owned by `member`.
    pub fn side(&self, member: MemberId) -> Option<&RelationSide> {
        if self.low.member == member {
            Some(&self.low)
        } else if self.high.member == member {
            Some(&self.high)
        } else {
            None
        }
    }

    fn side_mut(&mut self, member: MemberId) -> Result<&mut RelationSide, DomainError> {
        if self.low.member == member {
            Ok(&mut self.low)
        } else if self.high.member == member {
            Ok(&mut self.high)
        } else {
            Err(DomainError::Parameter(ResultCode::ParameterError))
        }
    }

    /// Returns the side opposite to `member`.
    pub fn other_side(&self, member: MemberId) -> Option<&RelationSide> {
        self.key().other(member).and_then(|other| self.side(other))
    }

    /// Returns true if `member` has blocked the other side.
    pub fn is_blocked_by(&self, member: MemberId) -> bool {
        self.side(member).is_some_and(|side| side.blocked)
    }

    /// Returns true if either member has blocked the other.
    pub fn has_block(&self) -> bool {
        self.low.blocked || self.high.blocked
    }

    /// Marks the other side as blocked by `by`.
    pub fn block(&mut self, by: MemberId) -> Result<(), DomainError> {
        self.side_mut(by)?.blocked = true;
        Ok(())
    }

    /// Clears the block set by `by`; the other side's block is untouched.
    pub fn unblock(&mut self, by: MemberId) -> Result<(), DomainError> {
        self.side_mut(by)?.blocked = false;
        Ok(())
    }

    /// Sets the label `by` gives the other side.
    pub fn mark_tag(&mut self, by: MemberId, tag: impl Into<String>) -> Result<(), DomainError> {
        self.side_mut(by)?.tag = Some(tag.into());
        Ok(())
    }

    /// Returns the label `member` gave the other side.
    pub fn tag_of(&self, member: MemberId) -> Option<&str> {
        self.side(member).and_then(|side| side.tag.as_deref())
    }
}

impl Record for Relationship {
    const KIND: &'static str = "Relationship";

    fn key(&self) -> PairKey {
        PairKey::new(self.low.member, self.high.member)
    }
}
