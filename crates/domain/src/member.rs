use common::MemberId;

/// Inclusive range of member ids issued by the account service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberIdRange {
    pub min: i64,
    pub max: i64,
}

impl MemberIdRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Returns true if `member` lies inside the range.
    pub fn contains(&self, member: MemberId) -> bool {
        (self.min..=self.max).contains(&member.as_i64())
    }
}

impl Default for MemberIdRange {
    fn default() -> Self {
        Self {
            min: 1,
            max: i64::MAX,
        }
    }
}
