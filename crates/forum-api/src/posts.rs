use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::info;

use forum_db::models::PostRow;
use forum_db::{Database, RatingKind};
use forum_types::api::{CreatePostRequest, EditPostRequest, PostResponse};
use forum_types::models::{PostState, Role};

use crate::auth::AppState;
use crate::error::{ApiError, ApiJson, ApiResult, respond};
use crate::middleware::CurrentUser;
use crate::{run_blocking, unix_now};

const MAX_TITLE_LEN: usize = 200;

pub(crate) fn post_response(row: PostRow) -> PostResponse {
    PostResponse {
        id: row.id,
        author_id: row.author_id,
        title: row.title,
        content: row.content,
        created_at: row.created_at,
        edited_at: row.edited_at,
        state: PostState::from_i32(row.state).unwrap_or(PostState::Pending),
        ban_reason: row.ban_reason,
    }
}

fn validate_post(title: &str, content: &str) -> ApiResult<()> {
    if title.is_empty() || title.len() > MAX_TITLE_LEN {
        return Err(ApiError::Validation("title must be 1 to 200 characters".into()));
    }
    if content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".into()));
    }
    Ok(())
}

/// Removes a post with everything hanging off it. Dependants go first so
/// foreign keys hold at every step.
pub(crate) fn delete_post_cascade(db: &Database, post_id: i64) -> ApiResult<()> {
    db.delete_post_reports_by_post_id(post_id)?;
    db.delete_notifications_by_post_id(post_id)?;
    db.delete_ratings_by_target(RatingKind::Post, post_id)?;
    db.delete_comment_ratings_by_post_id(post_id)?;
    db.delete_comments_by_post_id(post_id)?;
    if !db.delete_post(post_id)? {
        return Err(ApiError::NotFound("post not found".into()));
    }
    Ok(())
}

/// POST /api/post/create
pub async fn create_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> ApiResult<Response> {
    let title = req.title.trim().to_string();
    validate_post(&title, &req.content)?;

    let db = state.db.clone();
    let post = run_blocking(move || {
        let now = unix_now();
        let post = db.create_post(user.id, &title, &req.content, now)?;
        db.touch_last_active(user.id, now)?;
        Ok(post)
    })
    .await?;

    info!("Post {} created by user {}", post.id, post.author_id);
    Ok(respond(StatusCode::CREATED, "post has been created", Some(post_response(post))))
}

/// PUT /api/post/edit
pub async fn edit_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<EditPostRequest>,
) -> ApiResult<Response> {
    current.require_owner(req.author_id, "post")?;
    let title = req.title.trim().to_string();
    validate_post(&title, &req.content)?;
    let user_id = current.0.id;

    let db = state.db.clone();
    let post = run_blocking(move || {
        let existing = db
            .get_post(req.id)?
            .ok_or_else(|| ApiError::NotFound("post not found".into()))?;
        if existing.author_id != user_id {
            return Err(ApiError::Forbidden("can't modify another user's post".into()));
        }

        let now = unix_now();
        let post = db
            .update_post(req.id, &title, &req.content, now)?
            .ok_or_else(|| ApiError::NotFound("post not found".into()))?;
        db.touch_last_active(user_id, now)?;
        Ok(post)
    })
    .await?;

    Ok(respond(StatusCode::OK, "post has been edited", Some(post_response(post))))
}

/// DELETE /api/post/delete/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let db = state.db.clone();
    run_blocking(move || {
        let post = db
            .get_post(post_id)?
            .ok_or_else(|| ApiError::NotFound("post not found".into()))?;
        if post.author_id != user.id {
            return Err(ApiError::Forbidden("can't delete another user's post".into()));
        }
        delete_post_cascade(&db, post_id)?;
        db.touch_last_active(user.id, unix_now())?;
        Ok(())
    })
    .await?;

    info!("Post {} deleted by its author", post_id);
    Ok(respond::<()>(StatusCode::OK, "post has been deleted", None))
}

async fn staff_delete_post(
    state: AppState,
    post_id: i64,
    current: CurrentUser,
    minimum: Role,
) -> ApiResult<Response> {
    current.require_role(minimum)?;
    let staff_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || {
        delete_post_cascade(&db, post_id)?;
        db.touch_last_active(staff_id, unix_now())?;
        Ok(())
    })
    .await?;

    info!("Post {} deleted by {:?} {}", post_id, minimum, staff_id);
    Ok(respond::<()>(StatusCode::OK, "post has been deleted", None))
}

/// DELETE /api/moderator/post/delete/{id}
pub async fn moderator_delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    staff_delete_post(state, post_id, current, Role::Moderator).await
}

/// DELETE /api/admin/post/delete/{id}
pub async fn admin_delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    staff_delete_post(state, post_id, current, Role::Admin).await
}
