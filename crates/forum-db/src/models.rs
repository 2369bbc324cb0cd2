//! Row types as stored in SQLite. The API crate maps these onto the wire
//! types in `forum-types`.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: i32,
    pub session_id: String,
    pub expires_at: i64,
    pub created_at: i64,
    pub last_active: i64,
}

pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub edited_at: i64,
    /// 0 pending, 1 approved, 2 banned.
    pub state: i32,
    pub ban_reason: String,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: i64,
    pub edited_at: i64,
}

/// The author and parent post of something that can be rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRow {
    pub author_id: i64,
    pub post_id: i64,
}

/// Notification to insert. Unused trigger ids are 0.
#[derive(Debug, Clone, Default)]
pub struct NewNotification {
    pub receiver_id: i64,
    pub post_id: i64,
    pub rate_id: i64,
    pub comment_id: i64,
    pub comment_rate_id: i64,
}

pub struct NotificationRow {
    pub id: i64,
    pub receiver_id: i64,
    pub post_id: i64,
    pub rate_id: i64,
    pub comment_id: i64,
    pub comment_rate_id: i64,
    pub created_at: i64,
    pub reaction: Option<i64>,
}

pub struct RoleRequestRow {
    pub id: i64,
    pub user_id: i64,
    pub created_at: i64,
}

pub struct PostReportRow {
    pub id: i64,
    pub moderator_id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub created_at: i64,
}
