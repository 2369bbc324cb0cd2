//! Server-side sessions stored on the user row.
//!
//! A user holds at most one session: `session_id` plus `expires_at` (unix
//! seconds). Signing in while a session is held is refused rather than
//! refreshed, so the only transitions are NONE -> ACTIVE on sign-in and
//! ACTIVE -> NONE on sign-out, expiry sweep, or process restart.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use forum_db::Database;
use forum_db::models::UserRow;
use forum_types::models::{Role, UserProfile};

use crate::error::{ApiError, ApiResult};
use crate::unix_now;

pub const SESSION_COOKIE: &str = "forum_session";

/// Session lifetime in seconds.
pub const SESSION_TTL: i64 = 60 * 60;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// A freshly issued session, ready to be handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: i64,
}

impl IssuedSession {
    /// `Set-Cookie` value binding the token to the client.
    pub fn cookie(&self) -> String {
        let expires = DateTime::from_timestamp(self.expires_at, 0)
            .unwrap_or_default()
            .format("%a, %d %b %Y %H:%M:%S GMT");
        format!(
            "{}={}; Path=/; Expires={}; HttpOnly",
            SESSION_COOKIE, self.token, expires
        )
    }
}

/// `Set-Cookie` value that makes the client drop its session cookie.
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly", SESSION_COOKIE)
}

/// Converts a stored user row into its public profile.
pub fn profile(row: &UserRow) -> UserProfile {
    UserProfile {
        id: row.id,
        username: row.username.clone(),
        email: row.email.clone(),
        role: Role::from_i32(row.role).unwrap_or(Role::Guest),
        created_at: row.created_at,
        last_active: row.last_active,
    }
}

/// The only writer of `users.session_id` / `users.expires_at`.
#[derive(Clone)]
pub struct SessionManager {
    db: Arc<Database>,
}

impl SessionManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn issue(&self, user_id: i64) -> ApiResult<IssuedSession> {
        self.issue_at(user_id, unix_now())
    }

    pub fn issue_at(&self, user_id: i64, now: i64) -> ApiResult<IssuedSession> {
        let session = IssuedSession {
            token: Uuid::new_v4().to_string(),
            expires_at: now + SESSION_TTL,
        };

        if !self.db.set_session(user_id, &session.token, session.expires_at, now)? {
            return Err(ApiError::NotFound("user not found".into()));
        }

        debug!("Issued session for user {} until {}", user_id, session.expires_at);
        Ok(session)
    }

    pub fn validate(&self, token: &str) -> ApiResult<UserProfile> {
        self.validate_at(token, unix_now())
    }

    /// A session is valid iff the token is non-empty, belongs to a user,
    /// and `now < expires_at`.
    pub fn validate_at(&self, token: &str, now: i64) -> ApiResult<UserProfile> {
        if token.is_empty() {
            return Err(ApiError::Unauthorized("user not authorized".into()));
        }

        let user = self
            .db
            .get_user_by_session(token)?
            .ok_or_else(|| ApiError::Unauthorized("user not authorized".into()))?;

        if now >= user.expires_at {
            return Err(ApiError::Unauthorized("session expired".into()));
        }

        Ok(profile(&user))
    }

    pub fn invalidate(&self, user_id: i64) -> ApiResult<()> {
        if !self.db.clear_session(user_id)? {
            return Err(ApiError::NotFound("user not found".into()));
        }
        debug!("Invalidated session for user {}", user_id);
        Ok(())
    }

    /// Refuses a second concurrent session. Only checked at sign-in.
    pub fn enforce_single_session(&self, username: &str) -> ApiResult<()> {
        let user = self
            .db
            .get_user_by_username(username)?
            .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

        if !user.session_id.is_empty() {
            return Err(ApiError::Conflict("user already authorized".into()));
        }
        Ok(())
    }

    /// Drops every session. Run once at startup, before the sweep.
    pub fn reset_all(&self) -> anyhow::Result<usize> {
        let cleared = self.db.clear_all_sessions()?;
        info!("Session reset: cleared {} sessions from previous run", cleared);
        Ok(cleared)
    }

    pub fn sweep_expired(&self) -> anyhow::Result<usize> {
        self.sweep_expired_at(unix_now())
    }

    pub fn sweep_expired_at(&self, now: i64) -> anyhow::Result<usize> {
        self.db.clear_expired_sessions(now)
    }
}

/// Background task that expires stale sessions.
///
/// Sweeps once per `interval`, starting one interval after launch. A storage
/// error ends the loop; the server keeps running without it. Cancelling
/// `shutdown` stops the loop between sweeps.
pub async fn run_sweep_loop(
    sessions: SessionManager,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Session sweep stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        let sweeper = sessions.clone();
        match tokio::task::spawn_blocking(move || sweeper.sweep_expired()).await {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Session sweep: expired {} sessions", count);
                }
            }
            Ok(Err(e)) => {
                error!("Session sweep failed, stopping sweep: {:#}", e);
                return;
            }
            Err(e) => {
                error!("Session sweep task panicked, stopping sweep: {}", e);
                return;
            }
        }
    }
}
