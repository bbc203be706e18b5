use crate::{MemberId, PairKey, RecordEnvelope};

/// Secondary lookup over stored records.
///
/// Used for listings (friends of a member, applications addressed to a
/// member); point access by pair key goes through [`crate::Persistor::load`].
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// Filter by record kind.
    pub kind: Option<String>,

    /// Filter by member appearing on either side of the pair.
    pub member: Option<MemberId>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for records of a specific kind.
    pub fn for_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// Filters by member.
    pub fn member(mut self, member: MemberId) -> Self {
        self.member = Some(member);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the envelope satisfies the kind and member filters.
    pub fn matches(&self, envelope: &RecordEnvelope) -> bool {
        if let Some(ref kind) = self.kind
            && &envelope.kind != kind
        {
            return false;
        }
        if let Some(member) = self.member
            && !envelope.key.contains(member)
        {
            return false;
        }
        true
    }

    /// Returns true if the given key satisfies the member filter.
    pub fn matches_key(&self, key: &PairKey) -> bool {
        self.member.is_none_or(|member| key.contains(member))
    }
}
