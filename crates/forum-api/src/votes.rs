//! Vote toggle/replace protocol, shared by post and comment ratings.
//!
//! Resubmitting the reaction a user already holds removes it (toggle-off).
//! Any other valid reaction is upserted on the (user, target) pair, so a
//! user flips from -1 to +1 by simply voting again. Each applied vote
//! replaces the notification addressed to the target's author.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{Extension, extract::State, http::StatusCode, response::Response};
use tracing::debug;

use forum_db::{Database, RatingKind};
use forum_types::api::{RatingSummary, VoteRequest};

use crate::auth::AppState;
use crate::error::{ApiError, ApiJson, ApiResult, respond};
use crate::middleware::CurrentUser;
use crate::{run_blocking, unix_now};

pub const CANCELLED_MESSAGE: &str = "rate cancelled due to re-voting";

/// Something users can vote on.
pub trait VoteTarget: Send + Sync + 'static {
    const KIND: RatingKind;
    const RATED_MESSAGE: &'static str;
}

pub struct PostVotes;

impl VoteTarget for PostVotes {
    const KIND: RatingKind = RatingKind::Post;
    const RATED_MESSAGE: &'static str = "post has been rated";
}

pub struct CommentVotes;

impl VoteTarget for CommentVotes {
    const KIND: RatingKind = RatingKind::Comment;
    const RATED_MESSAGE: &'static str = "comment has been rated";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Applied {
        summary: RatingSummary,
        rate_id: i64,
        notification_id: Option<i64>,
    },
    /// The same reaction was submitted again and the rating was removed.
    Cancelled,
}

/// Sole writer of one rating ledger and of the notifications its ratings
/// trigger.
pub struct VoteCoordinator<T: VoteTarget> {
    db: Arc<Database>,
    _target: PhantomData<T>,
}

impl<T: VoteTarget> Clone for VoteCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _target: PhantomData,
        }
    }
}

impl<T: VoteTarget> VoteCoordinator<T> {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            _target: PhantomData,
        }
    }

    pub fn vote(&self, target_id: i64, user_id: i64, reaction: i32) -> ApiResult<VoteOutcome> {
        self.vote_at(target_id, user_id, reaction, unix_now())
    }

    pub fn vote_at(
        &self,
        target_id: i64,
        user_id: i64,
        reaction: i32,
        now: i64,
    ) -> ApiResult<VoteOutcome> {
        if reaction != 1 && reaction != -1 {
            return Err(ApiError::Validation("only 1 or -1 values accepted".into()));
        }

        let target = self
            .db
            .resolve_target(T::KIND, target_id)?
            .ok_or_else(|| ApiError::NotFound(format!("{} not found", target_noun(T::KIND))))?;

        if self.db.is_rated_before(T::KIND, target_id, user_id, reaction)? {
            // Removes the rating and its notifications in one transaction.
            let removed = self.db.delete_rating(T::KIND, target_id, user_id, reaction)?;
            debug!(
                "User {} cancelled {:?} rating {:?} on {}",
                user_id, T::KIND, removed, target_id
            );
            return Ok(VoteOutcome::Cancelled);
        }

        let receiver = (target.author_id != user_id).then_some(target.author_id);
        let (rate_id, notification_id) = self.db.apply_rating(
            T::KIND,
            target_id,
            target.post_id,
            user_id,
            reaction,
            receiver,
            now,
        )?;

        let (rating, user_rating) = self.db.rating_summary(T::KIND, target_id, user_id)?;

        // The vote is already committed; a failure here is reported, not undone.
        self.db.touch_last_active(user_id, now)?;

        Ok(VoteOutcome::Applied {
            summary: RatingSummary { rating, user_rating },
            rate_id,
            notification_id,
        })
    }
}

fn target_noun(kind: RatingKind) -> &'static str {
    match kind {
        RatingKind::Post => "post",
        RatingKind::Comment => "comment",
    }
}

async fn apply_vote<T: VoteTarget>(
    coordinator: VoteCoordinator<T>,
    user_id: i64,
    req: VoteRequest,
) -> ApiResult<Response> {
    let outcome = run_blocking(move || coordinator.vote(req.id, user_id, req.reaction)).await?;

    Ok(match outcome {
        VoteOutcome::Applied { summary, .. } => {
            respond(StatusCode::OK, T::RATED_MESSAGE, Some(summary))
        }
        VoteOutcome::Cancelled => respond::<()>(StatusCode::OK, CANCELLED_MESSAGE, None),
    })
}

/// POST /api/post/rate
pub async fn rate_post(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<VoteRequest>,
) -> ApiResult<Response> {
    apply_vote(state.post_votes.clone(), user.id, req).await
}

/// POST /api/comment/rate
pub async fn rate_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ApiJson(req): ApiJson<VoteRequest>,
) -> ApiResult<Response> {
    apply_vote(state.comment_votes.clone(), user.id, req).await
}
