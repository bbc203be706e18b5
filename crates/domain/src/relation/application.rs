use chrono::{DateTime, Utc};
use common::{MemberId, PairKey};
use relation_store::Record;
use serde::{Deserialize, Serialize};

/// Status of a friend application.
///
/// Only pending applications are stored; accepted and rejected ones are
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ApplicationStatus {
    #[default]
    Pending,
}

impl ApplicationStatus {
    /// Returns the numeric status reported to clients.
    pub fn as_i32(&self) -> i32 {
        match self {
            ApplicationStatus::Pending => 0,
        }
    }
}

/// A friend application from `requester` to `target` awaiting an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApplication {
    requester: MemberId,
    target: MemberId,
    status: ApplicationStatus,
    updated_at: DateTime<Utc>,
}

impl PendingApplication {
    /// Creates a pending application stamped with the current time.
    pub fn new(requester: MemberId, target: MemberId) -> Self {
        Self {
            requester,
            target,
            status: ApplicationStatus::Pending,
            updated_at: Utc::now(),
        }
    }

    pub fn requester(&self) -> MemberId {
        self.requester
    }

    pub fn target(&self) -> MemberId {
        self.target
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if this is a live application from `requester` to `target`.
    pub fn is_pending_from(&self, requester: MemberId, target: MemberId) -> bool {
        self.requester == requester
            && self.target == target
            && self.status == ApplicationStatus::Pending
    }

    /// Re-arms the application for a new apply, possibly flipping its direction.
    pub fn refresh(&mut self, requester: MemberId, target: MemberId) {
        self.requester = requester;
        self.target = target;
        self.status = ApplicationStatus::Pending;
        self.updated_at = Utc::now();
    }
}

impl Record for PendingApplication {
    const KIND: &'static str = "PendingApplication";

    fn key(&self) -> PairKey {
        PairKey::new(self.requester, self.target)
    }
}
