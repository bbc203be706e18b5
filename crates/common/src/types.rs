use serde::{Deserialize, Serialize};

/// Identifier of a member of the service mesh.
///
/// Member ids are assigned by the account service; this crate only wraps
/// them to keep them apart from other integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(i64);

impl MemberId {
    /// Creates a member ID from its raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MemberId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MemberId> for i64 {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

/// Order-independent key for the relation between two members.
///
/// `PairKey::new(a, b) == PairKey::new(b, a)`. The key anchors every record
/// about the pair and selects the scheduler lane that serializes mutations
/// of those records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    low: MemberId,
    high: MemberId,
}

impl PairKey {
    /// Creates the key for the pair `(a, b)` in either order.
    pub fn new(a: MemberId, b: MemberId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The smaller member id of the pair.
    pub fn low(&self) -> MemberId {
        self.low
    }

    /// The larger member id of the pair.
    pub fn high(&self) -> MemberId {
        self.high
    }

    /// Returns true if `member` is one of the two sides.
    pub fn contains(&self, member: MemberId) -> bool {
        self.low == member || self.high == member
    }

    /// Returns the side opposite to `member`, or None if `member` is not part
    /// of the pair.
    pub fn other(&self, member: MemberId) -> Option<MemberId> {
        if member == self.low {
            Some(self.high)
        } else if member == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    /// Stable 64-bit FNV-1a hash of the key.
    ///
    /// Unlike `std::hash::Hash` this value does not depend on the hasher
    /// implementation, so every process maps a pair to the same lane.
    pub fn stable_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        self.low
            .as_i64()
            .to_le_bytes()
            .iter()
            .chain(self.high.as_i64().to_le_bytes().iter())
            .fold(OFFSET_BASIS, |hash, byte| {
                (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
            })
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.low, self.high)
    }
}
