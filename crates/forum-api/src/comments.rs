use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::info;

use forum_db::models::{CommentRow, NewNotification};
use forum_db::{Database, RatingKind};
use forum_types::api::{CommentResponse, CreateCommentRequest, EditCommentRequest};
use forum_types::models::Role;

use crate::auth::AppState;
use crate::error::{ApiError, ApiJson, ApiResult, respond};
use crate::middleware::CurrentUser;
use crate::{run_blocking, unix_now};

fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: row.id,
        post_id: row.post_id,
        author_id: row.author_id,
        content: row.content,
        created_at: row.created_at,
        edited_at: row.edited_at,
    }
}

fn validate_content(content: &str) -> ApiResult<()> {
    if content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".into()));
    }
    Ok(())
}

/// Stores a comment and tells the post's author about it.
pub(crate) fn add_comment(
    db: &Database,
    post_id: i64,
    author_id: i64,
    content: &str,
    now: i64,
) -> ApiResult<CommentRow> {
    let post = db
        .get_post(post_id)?
        .ok_or_else(|| ApiError::NotFound("post not found".into()))?;

    let comment = db.create_comment(post_id, author_id, content, now)?;

    if post.author_id != author_id {
        db.create_notification(
            &NewNotification {
                receiver_id: post.author_id,
                post_id,
                comment_id: comment.id,
                ..Default::default()
            },
            now,
        )?;
    }
    Ok(comment)
}

/// Removes a comment, its ratings, and every notification pointing at either.
pub(crate) fn remove_comment(db: &Database, comment_id: i64) -> ApiResult<()> {
    db.delete_notifications_by_comment_id(comment_id)?;
    db.delete_notifications_for_comment_ratings(comment_id)?;
    db.delete_ratings_by_target(RatingKind::Comment, comment_id)?;
    if !db.delete_comment(comment_id)? {
        return Err(ApiError::NotFound("comment not found".into()));
    }
    Ok(())
}

/// POST /api/comment/create
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> ApiResult<Response> {
    validate_content(&req.content)?;

    let db = state.db.clone();
    let comment = run_blocking(move || {
        let now = unix_now();
        let comment = add_comment(&db, req.post_id, user.id, &req.content, now)?;
        db.touch_last_active(user.id, now)?;
        Ok(comment)
    })
    .await?;

    info!("Comment {} created on post {}", comment.id, comment.post_id);
    Ok(respond(StatusCode::CREATED, "comment has been created", Some(comment_response(comment))))
}

/// PUT /api/comment/edit
pub async fn edit_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<EditCommentRequest>,
) -> ApiResult<Response> {
    current.require_owner(req.author_id, "comment")?;
    validate_content(&req.content)?;
    let user_id = current.0.id;

    let db = state.db.clone();
    let comment = run_blocking(move || {
        let existing = db
            .get_comment(req.id)?
            .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;
        if existing.author_id != user_id {
            return Err(ApiError::Forbidden("can't modify another user's comment".into()));
        }

        let now = unix_now();
        let comment = db
            .update_comment(req.id, &req.content, now)?
            .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;
        db.touch_last_active(user_id, now)?;
        Ok(comment)
    })
    .await?;

    Ok(respond(StatusCode::OK, "comment has been edited", Some(comment_response(comment))))
}

/// DELETE /api/comment/delete/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let user_id = user.id;
    let db = state.db.clone();
    run_blocking(move || {
        let comment = db
            .get_comment(comment_id)?
            .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;
        if comment.author_id != user_id {
            return Err(ApiError::Forbidden("can't delete another user's comment".into()));
        }
        remove_comment(&db, comment_id)?;
        db.touch_last_active(user_id, unix_now())?;
        Ok(())
    })
    .await?;

    info!("Comment {} deleted by user {}", comment_id, user_id);
    Ok(respond::<()>(StatusCode::OK, "comment has been deleted", None))
}

/// DELETE /api/admin/comment/delete/{id}
pub async fn admin_delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;
    let admin_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || {
        remove_comment(&db, comment_id)?;
        db.touch_last_active(admin_id, unix_now())?;
        Ok(())
    })
    .await?;

    info!("Comment {} deleted by admin {}", comment_id, admin_id);
    Ok(respond::<()>(StatusCode::OK, "comment has been deleted", None))
}
