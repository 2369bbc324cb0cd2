//! Post review and post reports.
//!
//! Moderators approve or ban pending posts and report posts they want gone.
//! Admins settle reports: dismissing drops the report, accepting deletes the
//! reported post with everything hanging off it.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::info;

use forum_db::Database;
use forum_db::models::PostReportRow;
use forum_types::api::{BanPostRequest, CreateReportRequest, PostReportResponse};
use forum_types::models::{PostState, Role};

use crate::auth::AppState;
use crate::error::{ApiError, ApiJson, ApiResult, respond};
use crate::middleware::CurrentUser;
use crate::posts::{delete_post_cascade, post_response};
use crate::{run_blocking, unix_now};

fn report_response(row: PostReportRow) -> PostReportResponse {
    PostReportResponse {
        id: row.id,
        moderator_id: row.moderator_id,
        post_id: row.post_id,
        post_title: row.post_title,
        created_at: row.created_at,
    }
}

pub(crate) fn file_report(
    db: &Database,
    moderator_id: i64,
    post_id: i64,
    now: i64,
) -> ApiResult<i64> {
    if db.get_post(post_id)?.is_none() {
        return Err(ApiError::NotFound("post not found".into()));
    }
    db.create_post_report(moderator_id, post_id, now).map_err(|e| {
        if forum_db::is_constraint_violation(&e) {
            ApiError::Conflict("post already reported".into())
        } else {
            ApiError::Storage(e)
        }
    })
}

/// Deletes the reported post; its other reports go with it.
pub(crate) fn settle_report(db: &Database, report_id: i64) -> ApiResult<i64> {
    let report = db
        .get_post_report(report_id)?
        .ok_or_else(|| ApiError::NotFound("post report not found".into()))?;
    delete_post_cascade(db, report.post_id)?;
    Ok(report.post_id)
}

fn set_state(
    db: &Database,
    post_id: i64,
    state: PostState,
    reason: &str,
    staff_id: i64,
) -> ApiResult<()> {
    if !db.set_post_state(post_id, state.as_i32(), reason)? {
        return Err(ApiError::NotFound("post not found".into()));
    }
    db.touch_last_active(staff_id, unix_now())?;
    Ok(())
}

// -- Moderator --

/// POST /api/moderator/report/post/create
pub async fn create_report(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateReportRequest>,
) -> ApiResult<Response> {
    current.require_role(Role::Moderator)?;
    let moderator_id = current.0.id;

    let db = state.db.clone();
    let report_id = run_blocking(move || {
        let now = unix_now();
        let id = file_report(&db, moderator_id, req.post_id, now)?;
        db.touch_last_active(moderator_id, now)?;
        Ok(id)
    })
    .await?;

    info!("Post report {} filed by moderator {}", report_id, moderator_id);
    Ok(respond::<()>(StatusCode::CREATED, "post report created", None))
}

/// DELETE /api/moderator/report/post/delete/{id}
pub async fn delete_report(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Moderator)?;
    let moderator_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || {
        let report = db
            .get_post_report(report_id)?
            .ok_or_else(|| ApiError::NotFound("post report not found".into()))?;
        if report.moderator_id != moderator_id {
            return Err(ApiError::Forbidden("can't remove another moderator's report".into()));
        }
        db.delete_post_report(report_id)?;
        db.touch_last_active(moderator_id, unix_now())?;
        Ok(())
    })
    .await?;

    Ok(respond::<()>(StatusCode::OK, "post report has been removed", None))
}

/// GET /api/moderator/reports
pub async fn my_reports(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Moderator)?;
    let moderator_id = current.0.id;

    let db = state.db.clone();
    let reports = run_blocking(move || {
        let rows = db.list_post_reports_by_moderator(moderator_id)?;
        Ok(rows.into_iter().map(report_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(respond(StatusCode::OK, "fetched all post reports by moderator id", Some(reports)))
}

/// GET /api/moderator/posts/unapproved
pub async fn unapproved_posts(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Moderator)?;

    let db = state.db.clone();
    let posts = run_blocking(move || {
        let rows = db.list_posts_by_state(PostState::Pending.as_i32())?;
        Ok(rows.into_iter().map(post_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(respond(StatusCode::OK, "all unapproved posts", Some(posts)))
}

/// PUT /api/moderator/post/approve/{id}
pub async fn approve_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Moderator)?;
    let staff_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || set_state(&db, post_id, PostState::Approved, "", staff_id)).await?;

    info!("Post {} approved by {}", post_id, staff_id);
    Ok(respond::<()>(StatusCode::OK, "post has been approved", None))
}

/// POST /api/moderator/post/ban/{id}
pub async fn ban_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<BanPostRequest>,
) -> ApiResult<Response> {
    current.require_role(Role::Moderator)?;
    let reason = req.reason.trim().to_string();
    if reason.is_empty() {
        return Err(ApiError::Validation("ban reason must not be empty".into()));
    }
    let staff_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || set_state(&db, post_id, PostState::Banned, &reason, staff_id)).await?;

    info!("Post {} banned by {}", post_id, staff_id);
    Ok(respond::<()>(StatusCode::OK, "post has been banned", None))
}

// -- Admin --

/// GET /api/admin/post/reports
pub async fn all_reports(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;

    let db = state.db.clone();
    let reports = run_blocking(move || {
        let rows = db.list_post_reports()?;
        Ok(rows.into_iter().map(report_response).collect::<Vec<_>>())
    })
    .await?;

    Ok(respond(StatusCode::OK, "get all post reports", Some(reports)))
}

/// DELETE /api/admin/post/report/dismiss/{id}
pub async fn dismiss_report(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;
    let admin_id = current.0.id;

    let db = state.db.clone();
    run_blocking(move || {
        if !db.delete_post_report(report_id)? {
            return Err(ApiError::NotFound("post report not found".into()));
        }
        db.touch_last_active(admin_id, unix_now())?;
        Ok(())
    })
    .await?;

    Ok(respond::<()>(StatusCode::OK, "post report has been dismissed", None))
}

/// PUT /api/admin/post/report/accept/{id}
pub async fn accept_report(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    current.require_role(Role::Admin)?;
    let admin_id = current.0.id;

    let db = state.db.clone();
    let post_id = run_blocking(move || {
        let post_id = settle_report(&db, report_id)?;
        db.touch_last_active(admin_id, unix_now())?;
        Ok(post_id)
    })
    .await?;

    info!("Report {} accepted by admin {}, post {} deleted", report_id, admin_id, post_id);
    Ok(respond::<()>(StatusCode::OK, "post report has been accepted", None))
}
