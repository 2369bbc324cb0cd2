use serde::{Deserialize, Serialize};

/// Access level of a user. Stored as an integer in the `users.role` column
/// and sent as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Role {
    Guest = -1,
    User = 0,
    Moderator = 1,
    Admin = 2,
}

impl Role {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Self::Guest),
            0 => Some(Self::User),
            1 => Some(Self::Moderator),
            2 => Some(Self::Admin),
            _ => None,
        }
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> i32 {
        role.as_i32()
    }
}

impl TryFrom<i32> for Role {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Role::from_i32(value).ok_or_else(|| format!("unknown role: {}", value))
    }
}

/// Review state of a post. New posts wait for a moderator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    Pending,
    Approved,
    Banned,
}

impl PostState {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Banned => 2,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Pending),
            1 => Some(Self::Approved),
            2 => Some(Self::Banned),
            _ => None,
        }
    }
}

/// Public view of a user. Never carries the password hash or session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: i64,
    pub last_active: i64,
}
