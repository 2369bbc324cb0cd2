use serde::{Deserialize, Serialize};

use crate::models::{PostState, UserProfile};

// -- Envelope --

/// Every response body, success or failure, has this shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: bool,
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(code: u16, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: true,
            code,
            message: message.into(),
            data,
        }
    }
}

impl Envelope<()> {
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            status: false,
            code,
            message: message.into(),
            data: None,
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub admin_auth_token: Option<String>,
    #[serde(default)]
    pub register_as_moderator: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    /// Post id or comment id, depending on the endpoint.
    pub id: i64,
    pub reaction: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: i64,
    pub user_rating: i64,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditPostRequest {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub edited_at: i64,
    pub state: PostState,
    /// Empty unless the post is banned.
    pub ban_reason: String,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditCommentRequest {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: i64,
    pub edited_at: i64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    pub receiver_id: i64,
    pub post_id: i64,
    pub rate_id: i64,
    pub comment_id: i64,
    pub comment_rate_id: i64,
    pub created_at: i64,
    /// The +1/-1 of the triggering rating, when the trigger is a vote.
    pub reaction: Option<i64>,
}

// -- Moderation --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BanPostRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReportRequest {
    pub post_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequestResponse {
    pub id: i64,
    pub user_id: i64,
    pub created_at: i64,
    /// The requesting user; absent in the requester's own view.
    pub user: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReportResponse {
    pub id: i64,
    pub moderator_id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub created_at: i64,
}
