use anyhow::Result;
use rusqlite::Connection;

use crate::Database;
use crate::models::{NewNotification, NotificationRow};

impl Database {
    pub fn create_notification(&self, n: &NewNotification, now: i64) -> Result<i64> {
        self.with_conn(|conn| insert_notification(conn, n, now))
    }

    /// Newest first. Vote notifications carry the triggering rate value.
    pub fn get_notifications_for_receiver(&self, receiver_id: i64) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT n.id, n.receiver_id, n.post_id, n.rate_id, n.comment_id, n.comment_rate_id,
                        n.created_at, COALESCE(pr.rate, cr.rate)
                 FROM notifications n
                 LEFT JOIN post_rating pr ON n.rate_id != 0 AND pr.id = n.rate_id
                 LEFT JOIN comment_rating cr ON n.comment_rate_id != 0 AND cr.id = n.comment_rate_id
                 WHERE n.receiver_id = ?1
                 ORDER BY n.created_at DESC, n.id DESC",
            )?;

            let rows = stmt
                .query_map([receiver_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        receiver_id: row.get(1)?,
                        post_id: row.get(2)?,
                        rate_id: row.get(3)?,
                        comment_id: row.get(4)?,
                        comment_rate_id: row.get(5)?,
                        created_at: row.get(6)?,
                        reaction: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn delete_all_notifications(&self, receiver_id: i64) -> Result<usize> {
        self.delete_notifications_where("receiver_id", receiver_id)
    }

    pub fn delete_notifications_by_post_id(&self, post_id: i64) -> Result<usize> {
        self.delete_notifications_where("post_id", post_id)
    }

    pub fn delete_notifications_by_comment_id(&self, comment_id: i64) -> Result<usize> {
        self.delete_notifications_where("comment_id", comment_id)
    }

    /// Notifications triggered by any rating of the given comment.
    pub fn delete_notifications_for_comment_ratings(&self, comment_id: i64) -> Result<usize> {
        self.with_tx(|conn| {
            Ok(conn.execute(
                "DELETE FROM notifications
                 WHERE comment_rate_id IN (SELECT id FROM comment_rating WHERE comment_id = ?1)",
                [comment_id],
            )?)
        })
    }

    fn delete_notifications_where(&self, column: &'static str, id: i64) -> Result<usize> {
        // 0 marks an unused trigger column and must never match.
        if id == 0 {
            return Ok(0);
        }
        let sql = format!("DELETE FROM notifications WHERE {} = ?1", column);
        self.with_tx(|conn| Ok(conn.execute(&sql, [id])?))
    }
}

pub(crate) fn insert_notification(conn: &Connection, n: &NewNotification, now: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO notifications
             (receiver_id, post_id, rate_id, comment_id, comment_rate_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            n.receiver_id,
            n.post_id,
            n.rate_id,
            n.comment_id,
            n.comment_rate_id,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
