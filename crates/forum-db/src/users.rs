use anyhow::Result;
use rusqlite::{Connection, Row};

use crate::models::UserRow;
use crate::{Database, OptionalExt};

const USER_COLUMNS: &str =
    "id, username, email, password, role, session_id, expires_at, created_at, last_active";

impl Database {
    // -- Accounts --

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: i32,
        now: i64,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, role, created_at, last_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![username, email, password_hash, role, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Returns (username_taken, email_taken).
    pub fn username_or_email_taken(&self, username: &str, email: &str) -> Result<(bool, bool)> {
        self.with_conn(|conn| {
            let username_taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            let email_taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok((username_taken, email_taken))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    /// Looks up the holder of a session token. An empty token never matches.
    pub fn get_user_by_session(&self, session_id: &str) -> Result<Option<UserRow>> {
        if session_id.is_empty() {
            return Ok(None);
        }
        self.with_conn(|conn| query_user(conn, "session_id = ?1", session_id))
    }

    pub fn touch_last_active(&self, user_id: i64, now: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET last_active = ?1 WHERE id = ?2",
                rusqlite::params![now, user_id],
            )?;
            Ok(updated > 0)
        })
    }

    /// Oldest account first.
    pub fn list_users_by_role(&self, role: i32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE role = ?1 ORDER BY id", USER_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([role], map_user)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Moves a user from `from` to `to`. Returns false unless the user
    /// currently holds `from`.
    pub fn change_role(&self, user_id: i64, from: i32, to: i32) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET role = ?1 WHERE id = ?2 AND role = ?3",
                rusqlite::params![to, user_id, from],
            )?;
            Ok(updated > 0)
        })
    }

    // -- Sessions --

    /// Stores a session on the user row. Returns false if the user is gone.
    pub fn set_session(
        &self,
        user_id: i64,
        session_id: &str,
        expires_at: i64,
        now: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET session_id = ?1, expires_at = ?2, last_active = ?3 WHERE id = ?4",
                rusqlite::params![session_id, expires_at, now, user_id],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn clear_session(&self, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET session_id = '', expires_at = 0 WHERE id = ?1",
                [user_id],
            )?;
            Ok(updated > 0)
        })
    }

    /// Drops every session. Returns how many users were signed in.
    pub fn clear_all_sessions(&self) -> Result<usize> {
        self.with_tx(|conn| {
            let cleared = conn.execute(
                "UPDATE users SET session_id = '', expires_at = 0 WHERE session_id != ''",
                [],
            )?;
            Ok(cleared)
        })
    }

    /// Drops every session with `expires_at < now`.
    pub fn clear_expired_sessions(&self, now: i64) -> Result<usize> {
        self.with_tx(|conn| {
            let cleared = conn.execute(
                "UPDATE users SET session_id = '', expires_at = 0
                 WHERE session_id != '' AND expires_at < ?1",
                [now],
            )?;
            Ok(cleared)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    filter: &str,
    param: P,
) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, filter);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([param], map_user).optional()?;

    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        session_id: row.get(5)?,
        expires_at: row.get(6)?,
        created_at: row.get(7)?,
        last_active: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{T0, db, user};

    #[test]
    fn new_user_has_no_session() {
        let db = db();
        let id = user(&db, "alice");

        let row = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(row.username, "alice");
        assert_eq!(row.session_id, "");
        assert_eq!(row.expires_at, 0);
        assert_eq!(row.last_active, T0);
    }

    #[test]
    fn duplicate_username_and_email_are_reported() {
        let db = db();
        user(&db, "alice");

        assert_eq!(db.username_or_email_taken("alice", "x@example.com").unwrap(), (true, false));
        assert_eq!(db.username_or_email_taken("bob", "alice@example.com").unwrap(), (false, true));
        assert_eq!(db.username_or_email_taken("bob", "bob@example.com").unwrap(), (false, false));
    }

    #[test]
    fn empty_token_never_matches_a_user() {
        let db = db();
        user(&db, "alice");

        assert!(db.get_user_by_session("").unwrap().is_none());
    }

    #[test]
    fn session_round_trips_through_user_row() {
        let db = db();
        let id = user(&db, "alice");

        assert!(db.set_session(id, "tok", T0 + 3600, T0 + 5).unwrap());
        let row = db.get_user_by_session("tok").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.expires_at, T0 + 3600);
        assert_eq!(row.last_active, T0 + 5);

        assert!(db.clear_session(id).unwrap());
        assert!(db.get_user_by_session("tok").unwrap().is_none());
    }

    #[test]
    fn expired_sweep_respects_boundary() {
        let db = db();
        let stale = user(&db, "stale");
        let edge = user(&db, "edge");
        let fresh = user(&db, "fresh");

        db.set_session(stale, "a", T0 - 1, T0).unwrap();
        db.set_session(edge, "b", T0, T0).unwrap();
        db.set_session(fresh, "c", T0 + 60, T0).unwrap();

        assert_eq!(db.clear_expired_sessions(T0).unwrap(), 1);
        assert_eq!(db.get_user_by_id(stale).unwrap().unwrap().session_id, "");
        assert_eq!(db.get_user_by_id(edge).unwrap().unwrap().session_id, "b");
        assert_eq!(db.get_user_by_id(fresh).unwrap().unwrap().session_id, "c");
    }

    #[test]
    fn clear_all_sessions_resets_everyone() {
        let db = db();
        let a = user(&db, "a");
        let b = user(&db, "b");
        user(&db, "c");
        db.set_session(a, "a", T0 + 60, T0).unwrap();
        db.set_session(b, "b", T0 + 60, T0).unwrap();

        assert_eq!(db.clear_all_sessions().unwrap(), 2);
        let row = db.get_user_by_id(a).unwrap().unwrap();
        assert_eq!((row.session_id.as_str(), row.expires_at), ("", 0));
    }

    #[test]
    fn role_changes_only_from_expected_role() {
        let db = db();
        let a = user(&db, "a");
        let b = user(&db, "b");

        assert!(db.change_role(a, 0, 1).unwrap());
        assert!(!db.change_role(a, 0, 1).unwrap());
        assert!(!db.change_role(b, 1, 0).unwrap());

        let moderators: Vec<i64> = db.list_users_by_role(1).unwrap().iter().map(|u| u.id).collect();
        assert_eq!(moderators, vec![a]);
        assert!(db.change_role(a, 1, 0).unwrap());
        assert!(db.list_users_by_role(1).unwrap().is_empty());
    }
}
