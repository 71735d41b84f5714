//! User identifier type.

use std::fmt;

/// Opaque stable identifier of the remote party, as assigned by the
/// messaging provider.
///
/// Unlike locally generated identifiers this value is never minted by
/// us; it arrives on every inbound event and keys the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw provider user id.
    pub fn from_raw(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw i64 value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
