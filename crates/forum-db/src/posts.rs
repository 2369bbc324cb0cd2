use anyhow::Result;
use rusqlite::Row;

use crate::models::{CommentRow, PostRow};
use crate::{Database, OptionalExt};

const POST_COLUMNS: &str =
    "id, author_id, title, content, created_at, edited_at, state, ban_reason";

impl Database {
    // -- Posts --

    pub fn create_post(
        &self,
        author_id: i64,
        title: &str,
        content: &str,
        now: i64,
    ) -> Result<PostRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (author_id, title, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![author_id, title, content, now],
            )?;
            Ok(PostRow {
                id: conn.last_insert_rowid(),
                author_id,
                title: title.to_string(),
                content: content.to_string(),
                created_at: now,
                edited_at: 0,
                state: 0,
                ban_reason: String::new(),
            })
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
                [id],
                map_post,
            )
            .optional()
        })
    }

    pub fn update_post(
        &self,
        id: i64,
        title: &str,
        content: &str,
        now: i64,
    ) -> Result<Option<PostRow>> {
        let updated = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE posts SET title = ?1, content = ?2, edited_at = ?3 WHERE id = ?4",
                rusqlite::params![title, content, now, id],
            )?)
        })?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_post(id)
    }

    /// Oldest first.
    pub fn list_posts_by_state(&self, state: i32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM posts WHERE state = ?1 ORDER BY created_at, id",
                POST_COLUMNS
            ))?;
            let rows = stmt.query_map([state], map_post)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Returns false if the post does not exist.
    pub fn set_post_state(&self, id: i64, state: i32, ban_reason: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE posts SET state = ?1, ban_reason = ?2 WHERE id = ?3",
                rusqlite::params![state, ban_reason, id],
            )?;
            Ok(updated > 0)
        })
    }

    /// Deletes only the post row; dependants must be removed first.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_tx(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0))
    }

    // -- Comments --

    pub fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        content: &str,
        now: i64,
    ) -> Result<CommentRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, author_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![post_id, author_id, content, now],
            )?;
            Ok(CommentRow {
                id: conn.last_insert_rowid(),
                post_id,
                author_id,
                content: content.to_string(),
                created_at: now,
                edited_at: 0,
            })
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, post_id, author_id, content, created_at, edited_at
                 FROM comments WHERE id = ?1",
                [id],
                map_comment,
            )
            .optional()
        })
    }

    pub fn update_comment(&self, id: i64, content: &str, now: i64) -> Result<Option<CommentRow>> {
        let updated = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE comments SET content = ?1, edited_at = ?2 WHERE id = ?3",
                rusqlite::params![content, now, id],
            )?)
        })?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_comment(id)
    }

    /// Deletes only the comment row; dependants must be removed first.
    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_tx(|conn| Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [id])? > 0))
    }

    pub fn delete_comments_by_post_id(&self, post_id: i64) -> Result<usize> {
        self.with_tx(|conn| Ok(conn.execute("DELETE FROM comments WHERE post_id = ?1", [post_id])?))
    }
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        edited_at: row.get(5)?,
        state: row.get(6)?,
        ban_reason: row.get(7)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        edited_at: row.get(5)?,
    })
}
