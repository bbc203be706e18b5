//! Records and commands for pairwise member relations.
//!
//! Per pair of members the service keeps at most one [`PendingApplication`]
//! and at most one [`Relationship`], both stored under the pair's
//! order-independent key:
//!
//! ```text
//! NONE ──apply──► PENDING ──accept──► CONNECTED ──delete──► (connected = false)
//!                    └──reject──► NONE
//!
//! block/unblock: per-member flag on the Relationship, orthogonal to the above
//! ```

mod application;
mod commands;
mod relationship;
mod view;

pub use application::{ApplicationStatus, PendingApplication};
pub use commands::{
    AcceptFriend, ApplyFriend, BlockMember, DeleteFriend, MarkFriend, Operation, RejectFriend,
    RelationCommand, UnblockMember,
};
pub use relationship::{RelationSide, Relationship};
pub use view::{FriendView, RelationView};
