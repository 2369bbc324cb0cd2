use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role        INTEGER NOT NULL DEFAULT 0,
                session_id  TEXT NOT NULL DEFAULT '',
                expires_at  INTEGER NOT NULL DEFAULT 0,
                created_at  INTEGER NOT NULL,
                last_active INTEGER NOT NULL
            );

            CREATE INDEX idx_users_session ON users(session_id);

            CREATE TABLE posts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id   INTEGER NOT NULL REFERENCES users(id),
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                edited_at   INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id     INTEGER NOT NULL REFERENCES posts(id),
                author_id   INTEGER NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                edited_at   INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_comments_post ON comments(post_id);

            CREATE TABLE post_rating (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                post_id     INTEGER NOT NULL REFERENCES posts(id),
                rate        INTEGER NOT NULL CHECK (rate IN (-1, 1)),
                UNIQUE(user_id, post_id)
            );

            CREATE INDEX idx_post_rating_post ON post_rating(post_id);

            CREATE TABLE comment_rating (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                post_id     INTEGER NOT NULL REFERENCES posts(id),
                comment_id  INTEGER NOT NULL REFERENCES comments(id),
                rate        INTEGER NOT NULL CHECK (rate IN (-1, 1)),
                UNIQUE(user_id, comment_id)
            );

            CREATE INDEX idx_comment_rating_comment ON comment_rating(comment_id);

            -- Trigger columns hold 0 when unused, so they carry no FKs.
            CREATE TABLE notifications (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                receiver_id     INTEGER NOT NULL REFERENCES users(id),
                post_id         INTEGER NOT NULL,
                rate_id         INTEGER NOT NULL DEFAULT 0,
                comment_id      INTEGER NOT NULL DEFAULT 0,
                comment_rate_id INTEGER NOT NULL DEFAULT 0,
                created_at      INTEGER NOT NULL
            );

            CREATE INDEX idx_notifications_receiver
                ON notifications(receiver_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (moderation)");
        conn.execute_batch(
            "
            -- 0 pending, 1 approved, 2 banned
            ALTER TABLE posts ADD COLUMN state INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE posts ADD COLUMN ban_reason TEXT NOT NULL DEFAULT '';

            CREATE INDEX idx_posts_state ON posts(state);

            CREATE TABLE role_requests (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id),
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE post_reports (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                moderator_id INTEGER NOT NULL REFERENCES users(id),
                post_id      INTEGER NOT NULL REFERENCES posts(id),
                created_at   INTEGER NOT NULL,
                UNIQUE(moderator_id, post_id)
            );

            CREATE INDEX idx_post_reports_post ON post_reports(post_id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
