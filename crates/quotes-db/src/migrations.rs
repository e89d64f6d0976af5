use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE categories (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT ''
            );

            -- Categories cannot be removed while quotes still point at them.
            CREATE TABLE quotes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                content         TEXT NOT NULL,
                author          TEXT NOT NULL,
                user_id         INTEGER REFERENCES users(id) ON DELETE SET NULL,
                category_id     INTEGER REFERENCES categories(id) ON DELETE RESTRICT,
                likes_count     INTEGER NOT NULL DEFAULT 0 CHECK (likes_count >= 0),
                dislikes_count  INTEGER NOT NULL DEFAULT 0 CHECK (dislikes_count >= 0),
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_quotes_category ON quotes(category_id);
            CREATE INDEX idx_quotes_created ON quotes(created_at);

            CREATE TABLE quote_likes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                quote_id    INTEGER NOT NULL REFERENCES quotes(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                kind        TEXT NOT NULL CHECK (kind IN ('like', 'dislike')),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE(quote_id, user_id)
            );

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                content     TEXT NOT NULL,
                quote_id    INTEGER NOT NULL REFERENCES quotes(id) ON DELETE CASCADE,
                user_id     INTEGER REFERENCES users(id) ON DELETE SET NULL,
                likes_count INTEGER NOT NULL DEFAULT 0 CHECK (likes_count >= 0),
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX idx_comments_quote ON comments(quote_id, created_at);

            CREATE TABLE comment_likes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                comment_id  INTEGER NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE(comment_id, user_id)
            );

            -- Seed categories
            INSERT INTO categories (name, description) VALUES
                ('Motivation', 'Quotes that push you forward'),
                ('Wisdom', 'Lessons worth remembering'),
                ('Humor', 'Quotes that make you smile'),
                ('Love', 'On love and friendship'),
                ('Life', 'Reflections on everyday life');

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = memory_conn();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);

        let categories: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(categories, 5);
    }

    #[test]
    fn category_in_use_cannot_be_deleted() {
        let conn = memory_conn();
        run(&conn).unwrap();

        conn.execute(
            "INSERT INTO quotes (content, author, category_id) VALUES ('c', 'a', 1)",
            [],
        )
        .unwrap();

        assert!(conn.execute("DELETE FROM categories WHERE id = 1", []).is_err());
        assert!(conn.execute("DELETE FROM categories WHERE id = 2", []).is_ok());
    }

    #[test]
    fn reaction_kind_is_constrained() {
        let conn = memory_conn();
        run(&conn).unwrap();

        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('u', 'u@x.io', 'h')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO quotes (content, author, category_id) VALUES ('c', 'a', 1)",
            [],
        )
        .unwrap();

        let bad = conn.execute(
            "INSERT INTO quote_likes (quote_id, user_id, kind) VALUES (1, 1, 'love')",
            [],
        );
        assert!(bad.is_err());
    }
}
