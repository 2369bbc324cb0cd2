use anyhow::Result;

use rusqlite::Connection;

use crate::models::{NewNotification, TargetRow};
use crate::notifications::insert_notification;
use crate::{Database, OptionalExt};

/// Which rating ledger an operation addresses. Both ledgers share one set of
/// queries; only table and column names differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingKind {
    Post,
    Comment,
}

impl RatingKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::Post => "post_rating",
            Self::Comment => "comment_rating",
        }
    }

    /// Column holding the rated entity's id.
    pub fn target_column(self) -> &'static str {
        match self {
            Self::Post => "post_id",
            Self::Comment => "comment_id",
        }
    }

    /// Column of `notifications` that points back at a rating of this kind.
    pub fn notification_column(self) -> &'static str {
        match self {
            Self::Post => "rate_id",
            Self::Comment => "comment_rate_id",
        }
    }
}

impl Database {
    /// Author and parent post of a rating target, or `None` if it is gone.
    pub fn resolve_target(&self, kind: RatingKind, target_id: i64) -> Result<Option<TargetRow>> {
        let sql = match kind {
            RatingKind::Post => "SELECT author_id, id FROM posts WHERE id = ?1",
            RatingKind::Comment => "SELECT author_id, post_id FROM comments WHERE id = ?1",
        };
        self.with_conn(|conn| {
            conn.query_row(sql, [target_id], |row| {
                Ok(TargetRow {
                    author_id: row.get(0)?,
                    post_id: row.get(1)?,
                })
            })
            .optional()
        })
    }

    /// True only if the user already holds a rating with this exact value.
    pub fn is_rated_before(
        &self,
        kind: RatingKind,
        target_id: i64,
        user_id: i64,
        rate: i32,
    ) -> Result<bool> {
        let held = self.get_user_rating(kind, target_id, user_id)?;
        Ok(matches!(held, Some((_, held_rate)) if held_rate == rate))
    }

    /// Upsert the rating and replace the notification it triggers, all in
    /// one transaction, so a rating never ends up with two notifications.
    /// `receiver_id` is `None` when nobody should be notified.
    /// Returns the rating id and the new notification id.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_rating(
        &self,
        kind: RatingKind,
        target_id: i64,
        post_id: i64,
        user_id: i64,
        rate: i32,
        receiver_id: Option<i64>,
        now: i64,
    ) -> Result<(i64, Option<i64>)> {
        let column = kind.notification_column();
        let delete_stale = format!("DELETE FROM notifications WHERE {} = ?1", column);

        self.with_tx(|conn| {
            let rate_id = upsert(conn, kind, target_id, post_id, user_id, rate)?;
            conn.execute(&delete_stale, [rate_id])?;

            let notification_id = match receiver_id {
                Some(receiver_id) => {
                    let mut notification = NewNotification {
                        receiver_id,
                        post_id,
                        ..Default::default()
                    };
                    match kind {
                        RatingKind::Post => notification.rate_id = rate_id,
                        RatingKind::Comment => notification.comment_rate_id = rate_id,
                    }
                    Some(insert_notification(conn, &notification, now)?)
                }
                None => None,
            };
            Ok((rate_id, notification_id))
        })
    }

    /// Remove the user's rating with this exact value together with every
    /// notification it triggered. Returns the removed rating id, if any.
    pub fn delete_rating(
        &self,
        kind: RatingKind,
        target_id: i64,
        user_id: i64,
        rate: i32,
    ) -> Result<Option<i64>> {
        let select = format!(
            "SELECT id FROM {} WHERE {} = ?1 AND user_id = ?2 AND rate = ?3",
            kind.table(),
            kind.target_column()
        );
        let delete_notifications = format!(
            "DELETE FROM notifications WHERE {} = ?1",
            kind.notification_column()
        );
        let delete_rating = format!("DELETE FROM {} WHERE id = ?1", kind.table());

        self.with_tx(|conn| {
            let rate_id: Option<i64> = conn
                .query_row(&select, rusqlite::params![target_id, user_id, rate], |row| row.get(0))
                .optional()?;

            if let Some(id) = rate_id {
                conn.execute(&delete_notifications, [id])?;
                conn.execute(&delete_rating, [id])?;
            }
            Ok(rate_id)
        })
    }

    /// Returns (aggregate score, the user's own rate). Both are 0 when absent.
    pub fn rating_summary(
        &self,
        kind: RatingKind,
        target_id: i64,
        user_id: i64,
    ) -> Result<(i64, i64)> {
        let sql = format!(
            "SELECT CAST(TOTAL(rate) AS INTEGER),
                    IFNULL((SELECT rate FROM {table} WHERE user_id = ?1 AND {col} = ?2), 0)
             FROM {table}
             WHERE {col} = ?2",
            table = kind.table(),
            col = kind.target_column()
        );
        self.with_conn(|conn| {
            let summary = conn.query_row(&sql, rusqlite::params![user_id, target_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            Ok(summary)
        })
    }

    /// The user's rating on a target as (rating id, rate).
    pub fn get_user_rating(
        &self,
        kind: RatingKind,
        target_id: i64,
        user_id: i64,
    ) -> Result<Option<(i64, i32)>> {
        let sql = format!(
            "SELECT id, rate FROM {} WHERE {} = ?1 AND user_id = ?2",
            kind.table(),
            kind.target_column()
        );
        self.with_conn(|conn| {
            conn.query_row(&sql, rusqlite::params![target_id, user_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
        })
    }

    pub fn delete_ratings_by_target(&self, kind: RatingKind, target_id: i64) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", kind.table(), kind.target_column());
        self.with_tx(|conn| Ok(conn.execute(&sql, [target_id])?))
    }

    /// Ratings on every comment under a post.
    pub fn delete_comment_ratings_by_post_id(&self, post_id: i64) -> Result<usize> {
        self.with_tx(|conn| {
            Ok(conn.execute("DELETE FROM comment_rating WHERE post_id = ?1", [post_id])?)
        })
    }
}

fn upsert(
    conn: &Connection,
    kind: RatingKind,
    target_id: i64,
    post_id: i64,
    user_id: i64,
    rate: i32,
) -> Result<i64> {
    let id: i64 = match kind {
        RatingKind::Post => conn.query_row(
            "INSERT INTO post_rating (user_id, post_id, rate) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, post_id) DO UPDATE SET rate = excluded.rate
             RETURNING id",
            rusqlite::params![user_id, target_id, rate],
            |row| row.get(0),
        )?,
        RatingKind::Comment => conn.query_row(
            "INSERT INTO comment_rating (user_id, post_id, comment_id, rate)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, comment_id) DO UPDATE SET rate = excluded.rate
             RETURNING id",
            rusqlite::params![user_id, post_id, target_id, rate],
            |row| row.get(0),
        )?,
    };
    Ok(id)
}
