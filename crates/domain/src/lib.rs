//! Domain layer for pairwise member relations.
//!
//! This crate provides:
//! - The two records owned by the relation service: [`PendingApplication`]
//!   and [`Relationship`], both keyed by the pair of members they describe
//! - Request commands for every relation operation
//! - The [`ResultCode`] taxonomy returned to callers
//! - A pure [`Validator`] deciding whether a request may proceed

pub mod code;
pub mod error;
pub mod member;
pub mod relation;
pub mod validator;

pub use code::ResultCode;
pub use common::{MemberId, PairKey};
pub use error::{DomainError, ErrorKind};
pub use member::MemberIdRange;
pub use relation::{
    AcceptFriend, ApplicationStatus, ApplyFriend, BlockMember, DeleteFriend, FriendView,
    MarkFriend, Operation, PendingApplication, RejectFriend, RelationCommand, RelationSide,
    RelationView, Relationship, UnblockMember,
};
pub use validator::Validator;
