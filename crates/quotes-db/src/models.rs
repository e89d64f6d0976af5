//! Database row types. These map directly to SQLite rows and stay distinct
//! from the quotes-types API models so the DB layer owns its own shape.

use chrono::{DateTime, NaiveDateTime, Utc};
use quotes_types::models::{Category, Comment, Quote, User};
use rusqlite::Row;
use tracing::warn;

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

pub struct QuoteRow {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub user_id: Option<i64>,
    pub category_id: Option<i64>,
    pub likes_count: i64,
    pub dislikes_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub user: Option<UserRow>,
    pub category: Option<CategoryRow>,
}

pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub quote_id: i64,
    pub user_id: Option<i64>,
    pub likes_count: i64,
    pub created_at: String,
    pub user: Option<UserRow>,
}

/// Column list shared by every user lookup; keep in sync with [`UserRow::from_row`].
pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, created_at, updated_at";

/// Quote columns joined with their owner and category.
pub(crate) const QUOTE_SELECT: &str = "SELECT q.id, q.content, q.author, q.user_id, q.category_id,
        q.likes_count, q.dislikes_count, q.created_at, q.updated_at,
        u.id, u.username, u.email, u.password_hash, u.created_at, u.updated_at,
        c.id, c.name, c.description
     FROM quotes q
     LEFT JOIN users u ON q.user_id = u.id
     LEFT JOIN categories c ON q.category_id = c.id";

pub(crate) const COMMENT_SELECT: &str = "SELECT cm.id, cm.content, cm.quote_id, cm.user_id, cm.likes_count, cm.created_at,
        u.id, u.username, u.email, u.password_hash, u.created_at, u.updated_at
     FROM comments cm
     LEFT JOIN users u ON cm.user_id = u.id";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Self::from_row_at(row, 0)
    }

    fn from_row_at(row: &Row<'_>, start: usize) -> rusqlite::Result<Self> {
        Ok(UserRow {
            id: row.get(start)?,
            username: row.get(start + 1)?,
            email: row.get(start + 2)?,
            password_hash: row.get(start + 3)?,
            created_at: row.get(start + 4)?,
            updated_at: row.get(start + 5)?,
        })
    }

    /// A LEFT JOIN yields all-NULL user columns when the owner is gone.
    fn joined_at(row: &Row<'_>, start: usize) -> rusqlite::Result<Option<Self>> {
        match row.get::<_, Option<i64>>(start)? {
            Some(_) => Self::from_row_at(row, start).map(Some),
            None => Ok(None),
        }
    }

    pub fn into_user(self) -> User {
        User {
            created_at: parse_timestamp(&self.created_at, "user", self.id),
            updated_at: parse_timestamp(&self.updated_at, "user", self.id),
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }
}

impl CategoryRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CategoryRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }

    pub fn into_category(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            description: self.description,
        }
    }
}

impl QuoteRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let category = match row.get::<_, Option<i64>>(15)? {
            Some(id) => Some(CategoryRow {
                id,
                name: row.get(16)?,
                description: row.get(17)?,
            }),
            None => None,
        };

        Ok(QuoteRow {
            id: row.get(0)?,
            content: row.get(1)?,
            author: row.get(2)?,
            user_id: row.get(3)?,
            category_id: row.get(4)?,
            likes_count: row.get(5)?,
            dislikes_count: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            user: UserRow::joined_at(row, 9)?,
            category,
        })
    }

    pub fn into_quote(self, comments: Option<Vec<Comment>>) -> Quote {
        Quote {
            created_at: parse_timestamp(&self.created_at, "quote", self.id),
            updated_at: parse_timestamp(&self.updated_at, "quote", self.id),
            id: self.id,
            content: self.content,
            author: self.author,
            user_id: self.user_id,
            user: self.user.map(UserRow::into_user),
            category_id: self.category_id,
            category: self.category.map(CategoryRow::into_category),
            likes_count: self.likes_count,
            dislikes_count: self.dislikes_count,
            comments,
        }
    }
}

impl CommentRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CommentRow {
            id: row.get(0)?,
            content: row.get(1)?,
            quote_id: row.get(2)?,
            user_id: row.get(3)?,
            likes_count: row.get(4)?,
            created_at: row.get(5)?,
            user: UserRow::joined_at(row, 6)?,
        })
    }

    pub fn into_comment(self) -> Comment {
        Comment {
            created_at: parse_timestamp(&self.created_at, "comment", self.id),
            id: self.id,
            content: self.content,
            quote_id: self.quote_id,
            user_id: self.user_id,
            user: self.user.map(UserRow::into_user),
            likes_count: self.likes_count,
        }
    }
}

/// Schema defaults write RFC 3339 with milliseconds. Rows inserted by hand
/// may use SQLite's `datetime('now')` shape instead, so fall back to that.
fn parse_timestamp(raw: &str, entity: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {} {}: {}", raw, entity, id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_schema_default_format() {
        let ts = parse_timestamp("2024-03-01T10:15:30.250Z", "quote", 1);
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:30.250+00:00");
    }

    #[test]
    fn parses_sqlite_datetime_format() {
        let ts = parse_timestamp("2024-03-01 10:15:30", "quote", 1);
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:30+00:00");
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        assert_eq!(parse_timestamp("yesterday", "quote", 1), DateTime::<Utc>::default());
    }
}
