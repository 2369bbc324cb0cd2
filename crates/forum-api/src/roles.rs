//! Role requests and moderator management.
//!
//! A regular user may file one request to become a moderator. Admins list,
//! dismiss or accept requests, and can demote moderators back to users.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::info;

use forum_db::Database;
use forum_db::models::RoleRequestRow;
use forum_types::api::RoleRequestResponse;
use forum_types::models::{Role, UserProfile};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, respond};
use crate::middleware::CurrentUser;
use crate::session::profile;
use crate::{run_blocking, unix_now};

fn role_request_response(row: RoleRequestRow, user: Option<UserProfile>) -> RoleRequestResponse {
    RoleRequestResponse {
        id: row.id,
        user_id: row.user_id,
        created_at: row.created_at,
        user,
    }
}

/// Files a moderator request for `user`. Only regular users may ask.
pub(crate) fn file_role_request(db: &Database, user: &UserProfile, now: i64) -> ApiResult<i64> {
    if user.role != Role::User {
        return Err(ApiError::Conflict("user already holds an elevated role".into()));
    }
    if db.get_role_request_by_user(user.id)?.is_some() {
        return Err(ApiError::Conflict("role request already exists".into()));
    }
    db.create_role_request(user.id, now).map_err(|e| {
        if forum_db::is_constraint_violation(&e) {
            ApiError::Conflict("role request already exists".into())
        } else {
            ApiError::Storage(e)
        }
    })
}

/// POST /api/request/add
pub async fn create_role_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let db = state.db.clone();
    let user_id = user.id;
    let request_id = run_blocking(move || {
        let now = unix_now();
        let id = file_role_request(&db, &user, now)?;
        db.touch_last_active(user.id, now)?;
        Ok(id)
    })
    .await?;

    info!("Role request {} filed by user {}", request_id, user_id);
    Ok(respond::<()>(StatusCode::CREATED, "new role request created", None))
}

/// DELETE /api/request/delete
pub async fn delete_role_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let db = state.db.clone();
    run_blocking(move || {
        if !db.delete_role_request_by_user(user.id)? {
            return Err(ApiError::NotFound("role request not found".into()));
        }
        db.touch_last_active(user.id, unix_now())?;
        Ok(())
    })
    .await?;

    Ok(respond::<()>(StatusCode::OK, "role request has been removed", None))
}

/// GET /api/request
pub async fn get_role_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let db = state.db.clone();
    let request = run_blocking(move || {
        db.get_role_request_by_user(user.id)?
            .ok_or_else(|| ApiError::NotFound("role request not found".into()))
    })
    .await?;

    Ok(respond(
        StatusCode::OK,
        "get role request by user id",
        Some(role_request_response(request, None)),
    ))
}

/// GET /api/admin/requests
pub async fn list_role_requests(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;

    let db = state.db.clone();
    let requests = run_blocking(move || {
        let mut out = Vec::new();
        for row in db.list_role_requests()? {
            let user = db.get_user_by_id(row.user_id)?.map(|u| profile(&u));
            out.push(role_request_response(row, user));
        }
        Ok(out)
    })
    .await?;

    Ok(respond(StatusCode::OK, "get role requests", Some(requests)))
}

/// DELETE /api/admin/request/dismiss/{id}
pub async fn dismiss_role_request(
    State(state): State<AppState>,
    Path(request_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;
    let admin_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || {
        if !db.delete_role_request(request_id)? {
            return Err(ApiError::NotFound("role request not found".into()));
        }
        db.touch_last_active(admin_id, unix_now())?;
        Ok(())
    })
    .await?;

    info!("Role request {} dismissed by admin {}", request_id, admin_id);
    Ok(respond::<()>(StatusCode::OK, "role request has been dismissed", None))
}

/// PUT /api/admin/request/accept/{id}
pub async fn accept_role_request(
    State(state): State<AppState>,
    Path(request_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;
    let admin_id = current.0.id;

    let db = state.db.clone();
    let promoted = run_blocking(move || {
        let promoted = db
            .accept_role_request(request_id, Role::Moderator.as_i32())?
            .ok_or_else(|| ApiError::NotFound("role request not found".into()))?;
        db.touch_last_active(admin_id, unix_now())?;
        Ok(promoted)
    })
    .await?;

    info!("User {} promoted to moderator by admin {}", promoted, admin_id);
    Ok(respond::<()>(StatusCode::OK, "role request has been accepted", None))
}

/// GET /api/admin/moderators
pub async fn list_moderators(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;

    let db = state.db.clone();
    let moderators = run_blocking(move || {
        let rows = db.list_users_by_role(Role::Moderator.as_i32())?;
        Ok(rows.iter().map(profile).collect::<Vec<_>>())
    })
    .await?;

    Ok(respond(StatusCode::OK, "get all moderators", Some(moderators)))
}

/// PUT /api/admin/demote/moderator/{id}
pub async fn demote_moderator(
    State(state): State<AppState>,
    Path(moderator_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;
    let admin_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || {
        let demoted = db.change_role(moderator_id, Role::Moderator.as_i32(), Role::User.as_i32())?;
        if !demoted {
            return Err(ApiError::NotFound("moderator not found".into()));
        }
        db.touch_last_active(admin_id, unix_now())?;
        Ok(())
    })
    .await?;

    info!("Moderator {} demoted by admin {}", moderator_id, admin_id);
    Ok(respond::<()>(StatusCode::OK, "moderator has been demoted", None))
}
