use anyhow::Result;
use rusqlite::Row;

use crate::models::{PostReportRow, RoleRequestRow};
use crate::{Database, OptionalExt};

const REPORT_SELECT: &str = "SELECT r.id, r.moderator_id, r.post_id, p.title, r.created_at
     FROM post_reports r
     JOIN posts p ON p.id = r.post_id";

impl Database {
    // -- Role requests --

    /// A user holds at most one pending request; a second insert fails on
    /// the UNIQUE constraint.
    pub fn create_role_request(&self, user_id: i64, now: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO role_requests (user_id, created_at) VALUES (?1, ?2)",
                rusqlite::params![user_id, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_role_request_by_user(&self, user_id: i64) -> Result<Option<RoleRequestRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, created_at FROM role_requests WHERE user_id = ?1",
                [user_id],
                map_role_request,
            )
            .optional()
        })
    }

    /// Oldest first.
    pub fn list_role_requests(&self) -> Result<Vec<RoleRequestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, created_at FROM role_requests ORDER BY created_at, id",
            )?;
            let rows = stmt.query_map([], map_role_request)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn delete_role_request(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM role_requests WHERE id = ?1", [id])? > 0)
        })
    }

    pub fn delete_role_request_by_user(&self, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM role_requests WHERE user_id = ?1", [user_id])? > 0)
        })
    }

    /// Promotes the requester to `role` and consumes the request in one
    /// transaction. Returns the promoted user's id, or `None` if there is no
    /// such request.
    pub fn accept_role_request(&self, id: i64, role: i32) -> Result<Option<i64>> {
        self.with_tx(|conn| {
            let user_id: Option<i64> = conn
                .query_row("SELECT user_id FROM role_requests WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;

            if let Some(user_id) = user_id {
                conn.execute(
                    "UPDATE users SET role = ?1 WHERE id = ?2",
                    rusqlite::params![role, user_id],
                )?;
                conn.execute("DELETE FROM role_requests WHERE id = ?1", [id])?;
            }
            Ok(user_id)
        })
    }

    // -- Post reports --

    /// One report per (moderator, post); a repeat fails on the UNIQUE
    /// constraint.
    pub fn create_post_report(&self, moderator_id: i64, post_id: i64, now: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post_reports (moderator_id, post_id, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![moderator_id, post_id, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_post_report(&self, id: i64) -> Result<Option<PostReportRow>> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{} WHERE r.id = ?1", REPORT_SELECT), [id], map_report)
                .optional()
        })
    }

    /// Oldest first.
    pub fn list_post_reports(&self) -> Result<Vec<PostReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY r.created_at, r.id", REPORT_SELECT))?;
            let rows = stmt.query_map([], map_report)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn list_post_reports_by_moderator(&self, moderator_id: i64) -> Result<Vec<PostReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE r.moderator_id = ?1 ORDER BY r.created_at, r.id",
                REPORT_SELECT
            ))?;
            let rows = stmt.query_map([moderator_id], map_report)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn delete_post_report(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM post_reports WHERE id = ?1", [id])? > 0)
        })
    }

    pub fn delete_post_reports_by_post_id(&self, post_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM post_reports WHERE post_id = ?1", [post_id])?)
        })
    }
}

fn map_role_request(row: &Row<'_>) -> rusqlite::Result<RoleRequestRow> {
    Ok(RoleRequestRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn map_report(row: &Row<'_>) -> rusqlite::Result<PostReportRow> {
    Ok(PostReportRow {
        id: row.get(0)?,
        moderator_id: row.get(1)?,
        post_id: row.get(2)?,
        post_title: row.get(3)?,
        created_at: row.get(4)?,
    })
}
