//! Request validation.
//!
//! The validator is a pure decision function: it receives the request, the
//! authenticated caller and the records currently stored for the pair, and
//! either lets the request through or names the reason it is rejected.
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the caller claimed in the request is the authenticated caller
//! 2. the other member is a valid id and not the caller
//! 3. the operation's precondition on the stored records

use common::MemberId;

use crate::code::ResultCode;
use crate::error::DomainError;
use crate::member::MemberIdRange;
use crate::relation::{
    AcceptFriend, ApplyFriend, BlockMember, DeleteFriend, MarkFriend, Operation,
    PendingApplication, RejectFriend, RelationCommand, Relationship, UnblockMember,
};

/// Validates relation requests against business rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    member_ids: MemberIdRange,
}

impl Validator {
    /// Creates a validator accepting member ids in `member_ids`.
    pub fn new(member_ids: MemberIdRange) -> Self {
        Self { member_ids }
    }

    /// Runs the checks shared by every operation (identity, then target).
    pub fn check_request<C: RelationCommand>(
        &self,
        caller: MemberId,
        cmd: &C,
    ) -> Result<(), DomainError> {
        if cmd.user_id() != caller {
            return Err(DomainError::Parameter(ResultCode::ParameterError));
        }

        let target = cmd.other_id();
        if !self.member_ids.contains(target) || target == caller {
            let code = match C::OPERATION {
                Operation::Apply => ResultCode::UserNotExist,
                _ => ResultCode::ParameterEmpty,
            };
            return Err(DomainError::Parameter(code));
        }

        Ok(())
    }

    /// Apply: not connected, not blocked in either direction, no identical
    /// application already pending.
    pub fn validate_apply(
        &self,
        caller: MemberId,
        cmd: &ApplyFriend,
        relationship: Option<&Relationship>,
        pending: Option<&PendingApplication>,
    ) -> Result<(), DomainError> {
        self.check_request(caller, cmd)?;

        if let Some(rel) = relationship {
            if rel.is_connected() {
                return Err(DomainError::StateConflict(ResultCode::FriendAlreadyAdded));
            }
            if rel.has_block() {
                return Err(DomainError::StateConflict(ResultCode::FriendRejectMessage));
            }
        }

        if pending.is_some_and(|app| app.is_pending_from(cmd.user_id, cmd.friend_id)) {
            return Err(DomainError::StateConflict(ResultCode::FriendAlreadyApply));
        }

        Ok(())
    }

    /// Accept: not connected yet, and an application addressed to the caller
    /// is pending. Returns that application.
    pub fn validate_accept<'a>(
        &self,
        caller: MemberId,
        cmd: &AcceptFriend,
        relationship: Option<&Relationship>,
        pending: Option<&'a PendingApplication>,
    ) -> Result<&'a PendingApplication, DomainError> {
        self.check_request(caller, cmd)?;

        if relationship.is_some_and(Relationship::is_connected) {
            return Err(DomainError::StateConflict(ResultCode::FriendAlreadyAdded));
        }

        Self::addressed_to(pending, caller)
    }

    /// Reject: an application addressed to the caller is pending. Returns it.
    pub fn validate_reject<'a>(
        &self,
        caller: MemberId,
        cmd: &RejectFriend,
        pending: Option<&'a PendingApplication>,
    ) -> Result<&'a PendingApplication, DomainError> {
        self.check_request(caller, cmd)?;
        Self::addressed_to(pending, caller)
    }

    /// Delete: a relationship record exists. Returns it.
    pub fn validate_delete<'a>(
        &self,
        caller: MemberId,
        cmd: &DeleteFriend,
        relationship: Option<&'a Relationship>,
    ) -> Result<&'a Relationship, DomainError> {
        self.check_request(caller, cmd)?;
        Self::existing(relationship)
    }

    /// Block: allowed from any state.
    pub fn validate_block(&self, caller: MemberId, cmd: &BlockMember) -> Result<(), DomainError> {
        self.check_request(caller, cmd)
    }

    /// Unblock: a relationship record exists. Returns it.
    pub fn validate_unblock<'a>(
        &self,
        caller: MemberId,
        cmd: &UnblockMember,
        relationship: Option<&'a Relationship>,
    ) -> Result<&'a Relationship, DomainError> {
        self.check_request(caller, cmd)?;
        Self::existing(relationship)
    }

    /// Mark: the tag is not blank and the pair is connected. Returns the
    /// relationship.
    pub fn validate_mark<'a>(
        &self,
        caller: MemberId,
        cmd: &MarkFriend,
        relationship: Option<&'a Relationship>,
    ) -> Result<&'a Relationship, DomainError> {
        self.check_request(caller, cmd)?;

        if cmd.tag.trim().is_empty() {
            return Err(DomainError::Parameter(ResultCode::ParameterEmptyOne));
        }

        match relationship {
            Some(rel) if rel.is_connected() => Ok(rel),
            _ => Err(DomainError::StateConflict(ResultCode::FriendNotAdded)),
        }
    }

    fn addressed_to(
        pending: Option<&PendingApplication>,
        caller: MemberId,
    ) -> Result<&PendingApplication, DomainError> {
        match pending {
            Some(app) if app.target() == caller => Ok(app),
            _ => Err(DomainError::NotFound(ResultCode::ParameterErrorOne)),
        }
    }

    fn existing(relationship: Option<&Relationship>) -> Result<&Relationship, DomainError> {
        relationship.ok_or(DomainError::NotFound(ResultCode::ParameterErrorOne))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: i64) -> MemberId {
        MemberId::new(id)
    }

    fn validator() -> Validator {
        Validator::default()
    }

    fn connected(a: i64, b: i64) -> Relationship {
        let mut rel = Relationship::new(m(a), m(b));
        rel.connect();
        rel
    }

    #[test]
    fn test_identity_mismatch_is_checked_first() {
        // Also self-referential, but the identity check wins
        let cmd = ApplyFriend::new(m(10), m(10));
        let result = validator().validate_apply(m(11), &cmd, None, None);
        assert_eq!(result, Err(DomainError::Parameter(ResultCode::ParameterError)));
    }

    #[test]
    fn test_self_reference_code_depends_on_operation() {
        let apply = validator().validate_apply(m(10), &ApplyFriend::new(m(10), m(10)), None, None);
        assert_eq!(apply, Err(DomainError::Parameter(ResultCode::UserNotExist)));

        let block = validator().validate_block(m(10), &BlockMember::new(m(10), m(10)));
        assert_eq!(block, Err(DomainError::Parameter(ResultCode::ParameterEmpty)));
    }

    #[test]
    fn test_out_of_range_target() {
        let v = Validator::new(MemberIdRange::new(1, 100));
        let result = v.validate_apply(m(10), &ApplyFriend::new(m(10), m(101)), None, None);
        assert_eq!(result, Err(DomainError::Parameter(ResultCode::UserNotExist)));

        let result = v.validate_delete(m(10), &DeleteFriend::new(m(10), m(0)), None);
        assert_eq!(result, Err(DomainError::Parameter(ResultCode::ParameterEmpty)));
    }

    #[test]
    fn test_apply_passes_without_records() {
        let cmd = ApplyFriend::new(m(10), m(20));
        assert!(validator().validate_apply(m(10), &cmd, None, None).is_ok());
    }

    #[test]
    fn test_apply_rejected_when_connected() {
        let cmd = ApplyFriend::new(m(10), m(20));
        let rel = connected(10, 20);
        let result = validator().validate_apply(m(10), &cmd, Some(&rel), None);
        assert_eq!(
            result,
            Err(DomainError::StateConflict(ResultCode::FriendAlreadyAdded))
        );
    }

    #[test]
    fn test_apply_rejected_when_blocked_either_way() {
        let cmd = ApplyFriend::new(m(20), m(10));

        let mut blocked_by_target = Relationship::new(m(10), m(20));
        blocked_by_target.block(m(10)).unwrap();
        let result = validator().validate_apply(m(20), &cmd, Some(&blocked_by_target), None);
        assert_eq!(
            result,
            Err(DomainError::StateConflict(ResultCode::FriendRejectMessage))
        );

        let mut blocked_by_caller = Relationship::new(m(10), m(20));
        blocked_by_caller.block(m(20)).unwrap();
        let result = validator().validate_apply(m(20), &cmd, Some(&blocked_by_caller), None);
        assert_eq!(
            result,
            Err(DomainError::StateConflict(ResultCode::FriendRejectMessage))
        );
    }

    #[test]
    fn test_duplicate_apply_same_direction() {
        let cmd = ApplyFriend::new(m(10), m(20));
        let pending = PendingApplication::new(m(10), m(20));
        let result = validator().validate_apply(m(10), &cmd, None, Some(&pending));
        assert_eq!(
            result,
            Err(DomainError::StateConflict(ResultCode::FriendAlreadyApply))
        );
    }

    #[test]
    fn test_reverse_apply_is_allowed() {
        let cmd = ApplyFriend::new(m(20), m(10));
        let pending = PendingApplication::new(m(10), m(20));
        assert!(validator().validate_apply(m(20), &cmd, None, Some(&pending)).is_ok());
    }

    #[test]
    fn test_accept_requires_application_to_caller() {
        let pending = PendingApplication::new(m(10), m(20));

        let ok = validator().validate_accept(m(20), &AcceptFriend::new(m(20), m(10)), None, Some(&pending));
        assert_eq!(ok, Ok(&pending));

        let own = validator().validate_accept(m(10), &AcceptFriend::new(m(10), m(20)), None, Some(&pending));
        assert_eq!(own, Err(DomainError::NotFound(ResultCode::ParameterErrorOne)));

        let missing = validator().validate_accept(m(20), &AcceptFriend::new(m(20), m(10)), None, None);
        assert_eq!(missing, Err(DomainError::NotFound(ResultCode::ParameterErrorOne)));
    }

    #[test]
    fn test_accept_rejected_when_already_connected() {
        let pending = PendingApplication::new(m(10), m(20));
        let rel = connected(10, 20);
        let result = validator().validate_accept(
            m(20),
            &AcceptFriend::new(m(20), m(10)),
            Some(&rel),
            Some(&pending),
        );
        assert_eq!(
            result,
            Err(DomainError::StateConflict(ResultCode::FriendAlreadyAdded))
        );
    }

    #[test]
    fn test_reject_requires_pending() {
        let pending = PendingApplication::new(m(10), m(20));
        let cmd = RejectFriend::new(m(20), m(10));
        assert!(validator().validate_reject(m(20), &cmd, Some(&pending)).is_ok());
        assert_eq!(
            validator().validate_reject(m(20), &cmd, None),
            Err(DomainError::NotFound(ResultCode::ParameterErrorOne))
        );
    }

    #[test]
    fn test_delete_and_unblock_require_record() {
        let rel = Relationship::new(m(10), m(20));
        let delete = DeleteFriend::new(m(10), m(20));
        assert!(validator().validate_delete(m(10), &delete, Some(&rel)).is_ok());
        assert_eq!(
            validator().validate_delete(m(10), &delete, None),
            Err(DomainError::NotFound(ResultCode::ParameterErrorOne))
        );

        let unblock = UnblockMember::new(m(10), m(20));
        assert!(validator().validate_unblock(m(10), &unblock, Some(&rel)).is_ok());
        assert!(validator().validate_unblock(m(10), &unblock, None).is_err());
    }

    #[test]
    fn test_mark_checks_tag_then_connection() {
        let rel = connected(10, 20);
        let blank = MarkFriend::new(m(10), m(20), "   ");
        assert_eq!(
            validator().validate_mark(m(10), &blank, Some(&rel)),
            Err(DomainError::Parameter(ResultCode::ParameterEmptyOne))
        );

        let cmd = MarkFriend::new(m(10), m(20), "mentor");
        assert!(validator().validate_mark(m(10), &cmd, Some(&rel)).is_ok());

        let unconnected = Relationship::new(m(10), m(20));
        assert_eq!(
            validator().validate_mark(m(10), &cmd, Some(&unconnected)),
            Err(DomainError::StateConflict(ResultCode::FriendNotAdded))
        );
        assert_eq!(
            validator().validate_mark(m(10), &cmd, None),
            Err(DomainError::StateConflict(ResultCode::FriendNotAdded))
        );
    }
}
