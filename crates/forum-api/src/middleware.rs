use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use forum_types::models::{Role, UserProfile};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::run_blocking;
use crate::session::SESSION_COOKIE;

/// The user behind a validated session, placed in request extensions by
/// [`require_session`]. Handlers take identity from here, never from the body.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

impl CurrentUser {
    pub fn require_role(&self, minimum: Role) -> ApiResult<()> {
        if self.0.role < minimum {
            return Err(ApiError::Forbidden("insufficient role".into()));
        }
        Ok(())
    }

    /// Ownership check for bodies that name an author.
    pub fn require_owner(&self, claimed_author_id: i64, what: &str) -> ApiResult<()> {
        if claimed_author_id != self.0.id {
            return Err(ApiError::Forbidden(format!("can't modify another user's {}", what)));
        }
        Ok(())
    }
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
}

/// Rejects the request with 403 unless it carries a valid session cookie.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("session not found, user not authorized".into()))?;

    if token.is_empty() {
        return Err(ApiError::Unauthorized("user not authorized".into()));
    }

    let sessions = state.sessions.clone();
    let user = run_blocking(move || sessions.validate(&token))
        .await
        .map_err(|e| match e {
            ApiError::Storage(_) => e,
            other => {
                debug!("Rejected session: {}", other);
                ApiError::Unauthorized("session not valid, user not authorized".into())
            }
        })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
