use axum::{Extension, extract::State, http::StatusCode, response::Response};
use tracing::debug;

use forum_db::models::NotificationRow;
use forum_types::api::NotificationResponse;

use crate::auth::AppState;
use crate::error::{ApiResult, respond};
use crate::middleware::CurrentUser;
use crate::run_blocking;

fn notification_response(row: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: row.id,
        receiver_id: row.receiver_id,
        post_id: row.post_id,
        rate_id: row.rate_id,
        comment_id: row.comment_id,
        comment_rate_id: row.comment_rate_id,
        created_at: row.created_at,
        reaction: row.reaction,
    }
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let db = state.db.clone();
    let rows = run_blocking(move || Ok(db.get_notifications_for_receiver(user.id)?)).await?;

    let notifications: Vec<NotificationResponse> =
        rows.into_iter().map(notification_response).collect();
    Ok(respond(StatusCode::OK, "all notifications", Some(notifications)))
}

/// DELETE /api/notifications/delete
pub async fn clear_notifications(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let db = state.db.clone();
    let user_id = user.id;
    let removed = run_blocking(move || Ok(db.delete_all_notifications(user_id)?)).await?;

    debug!("Cleared {} notifications for user {}", removed, user_id);
    Ok(respond::<()>(StatusCode::OK, "notifications have been deleted", None))
}
