//! Result codes returned to callers.

/// Closed set of result codes carried by every response.
///
/// The numeric values are part of the client contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Ok = 0,
    Fail = 1,
    ParameterError = 100,
    ParameterEmpty = 101,
    ParameterEmptyOne = 102,
    ParameterErrorOne = 103,
    UserNotExist = 200,
    FriendAlreadyAdded = 300,
    FriendNotAdded = 301,
    FriendRejectMessage = 302,
    FriendAlreadyApply = 303,
}

impl ResultCode {
    /// Returns the numeric code sent on the wire.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Looks up a code by its numeric value.
    pub fn from_i32(value: i32) -> Option<Self> {
        let code = match value {
            0 => ResultCode::Ok,
            1 => ResultCode::Fail,
            100 => ResultCode::ParameterError,
            101 => ResultCode::ParameterEmpty,
            102 => ResultCode::ParameterEmptyOne,
            103 => ResultCode::ParameterErrorOne,
            200 => ResultCode::UserNotExist,
            300 => ResultCode::FriendAlreadyAdded,
            301 => ResultCode::FriendNotAdded,
            302 => ResultCode::FriendRejectMessage,
            303 => ResultCode::FriendAlreadyApply,
            _ => return None,
        };
        Some(code)
    }

    /// Returns the code name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Ok => "OK",
            ResultCode::Fail => "FAIL",
            ResultCode::ParameterError => "PARAMETER_ERROR",
            ResultCode::ParameterEmpty => "PARAMETER_EMPTY",
            ResultCode::ParameterEmptyOne => "PARAMETER_EMPTY_ONE",
            ResultCode::ParameterErrorOne => "PARAMETER_ERROR_ONE",
            ResultCode::UserNotExist => "USER_NOT_EXIST",
            ResultCode::FriendAlreadyAdded => "FRIEND_ALREADY_ADDED",
            ResultCode::FriendNotAdded => "FRIEND_NOT_ADDED",
            ResultCode::FriendRejectMessage => "FRIEND_REJECT_MESSAGE",
            ResultCode::FriendAlreadyApply => "FRIEND_ALREADY_APPLY",
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ResultCode; 11] = [
        ResultCode::Ok,
        ResultCode::Fail,
        ResultCode::ParameterError,
        ResultCode::ParameterEmpty,
        ResultCode::ParameterEmptyOne,
        ResultCode::ParameterErrorOne,
        ResultCode::UserNotExist,
        ResultCode::FriendAlreadyAdded,
        ResultCode::FriendNotAdded,
        ResultCode::FriendRejectMessage,
        ResultCode::FriendAlreadyApply,
    ];

    #[test]
    fn test_numeric_values_are_stable() {
        assert_eq!(ResultCode::Ok.as_i32(), 0);
        assert_eq!(ResultCode::Fail.as_i32(), 1);
        assert_eq!(ResultCode::FriendAlreadyApply.as_i32(), 303);
    }

    #[test]
    fn test_lookup_matches_discriminant() {
        for code in ALL {
            assert_eq!(ResultCode::from_i32(code.as_i32()), Some(code));
        }
        assert_eq!(ResultCode::from_i32(-1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ResultCode::FriendRejectMessage.to_string(), "FRIEND_REJECT_MESSAGE");
        assert_eq!(ResultCode::Ok.to_string(), "OK");
    }
}
