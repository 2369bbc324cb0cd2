use std::sync::Arc;

use axum::{
    Extension,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::info;

use forum_db::Database;
use forum_types::api::{SignInRequest, SignUpRequest};
use forum_types::models::Role;

use crate::error::{ApiError, ApiJson, ApiResult, respond};
use crate::middleware::CurrentUser;
use crate::password::{hash_password, verify_password};
use crate::session::{SessionManager, clear_cookie, profile};
use crate::votes::{CommentVotes, PostVotes, VoteCoordinator};
use crate::{run_blocking, unix_now};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub sessions: SessionManager,
    pub post_votes: VoteCoordinator<PostVotes>,
    pub comment_votes: VoteCoordinator<CommentVotes>,
    /// Sign-ups presenting this token are created as Admin.
    pub admin_token: Option<String>,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, admin_token: Option<String>) -> Self {
        Self {
            sessions: SessionManager::new(db.clone()),
            post_votes: VoteCoordinator::new(db.clone()),
            comment_votes: VoteCoordinator::new(db.clone()),
            db,
            admin_token,
        }
    }
}

fn validate_sign_up(req: &SignUpRequest) -> ApiResult<()> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation("username must be 3 to 32 characters".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("password must be at least 8 characters".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("invalid email".into()));
    }
    Ok(())
}

/// Role granted at sign-up. Moderator requests are not honored here.
fn role_for(req: &SignUpRequest, admin_token: Option<&str>) -> Role {
    match (req.admin_auth_token.as_deref(), admin_token) {
        (Some(presented), Some(expected)) if !expected.is_empty() && presented == expected => {
            Role::Admin
        }
        _ => Role::User,
    }
}

/// Insert the account, turning a lost race on username or email into the
/// same conflict the pre-check reports.
fn insert_user(
    db: &Database,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> ApiResult<i64> {
    db.create_user(username, email, password_hash, role.as_i32(), unix_now())
        .map_err(|e| {
            if forum_db::is_constraint_violation(&e) {
                ApiError::Conflict("username or email already taken".into())
            } else {
                ApiError::Storage(e)
            }
        })
}

/// POST /api/auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> ApiResult<Response> {
    validate_sign_up(&req)?;
    let role = role_for(&req, state.admin_token.as_deref());

    let db = state.db.clone();
    let user = run_blocking(move || {
        let (username_taken, email_taken) = db.username_or_email_taken(&req.username, &req.email)?;
        if username_taken {
            return Err(ApiError::Conflict("username already taken".into()));
        }
        if email_taken {
            return Err(ApiError::Conflict("email already taken".into()));
        }

        let password_hash = hash_password(&req.password)?;
        let id = insert_user(&db, &req.username, &req.email, &password_hash, role)?;
        db.get_user_by_id(id)?
            .ok_or_else(|| ApiError::Storage(anyhow::anyhow!("user {} vanished after insert", id)))
    })
    .await?;

    info!("User registered: {} ({}) as {:?}", user.username, user.id, role);
    Ok(respond(StatusCode::CREATED, "new user has been created", Some(profile(&user))))
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignInRequest>,
) -> ApiResult<Response> {
    let db = state.db.clone();
    let sessions = state.sessions.clone();
    let (user, session) = run_blocking(move || {
        let user = db
            .get_user_by_username(&req.username)?
            .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

        if !verify_password(&user.password, &req.password)? {
            return Err(ApiError::Validation("wrong password".into()));
        }

        sessions.enforce_single_session(&user.username)?;
        let session = sessions.issue(user.id)?;
        Ok((user, session))
    })
    .await?;

    info!("User logged in: {} ({})", user.username, user.id);
    let body = respond(StatusCode::OK, "user logged in", Some(profile(&user)));
    Ok(([(header::SET_COOKIE, session.cookie())], body).into_response())
}

/// GET /api/auth/signout
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let sessions = state.sessions.clone();
    run_blocking(move || sessions.invalidate(user.id)).await?;

    info!("User logged out: {} ({})", user.username, user.id);
    let body = respond::<()>(StatusCode::OK, "user logged out", None);
    Ok(([(header::SET_COOKIE, clear_cookie())], body).into_response())
}

/// GET /api/auth/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    respond(StatusCode::OK, "get user info successfully", Some(user))
}
