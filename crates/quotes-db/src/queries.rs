use crate::models::{
    COMMENT_SELECT, CategoryRow, CommentRow, QUOTE_SELECT, QuoteRow, USER_COLUMNS, UserRow,
};
use crate::{Database, OptionalExt};
use anyhow::Result;
use quotes_types::api::{QuoteListQuery, SortField, SortOrder, TableCounts};
use rusqlite::Connection;
use rusqlite::types::ToSql;

/// Fields for a freshly posted quote.
pub struct NewQuote<'a> {
    pub content: &'a str,
    pub author: &'a str,
    pub user_id: i64,
    pub category_id: i64,
}

/// Partial quote update. Only the `Some` fields are written.
#[derive(Default)]
pub struct QuoteChanges<'a> {
    pub content: Option<&'a str>,
    pub author: Option<&'a str>,
    pub category_id: Option<i64>,
}

impl QuoteChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.author.is_none() && self.category_id.is_none()
    }
}

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, "id = ?1", &id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", id))
        })
    }

    /// Whether any user already holds this email or username.
    pub fn user_exists(&self, email: &str, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 OR username = ?2)",
                (email, username),
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", &email))
    }

    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, description FROM categories ORDER BY name")?;
            let rows = stmt
                .query_map([], CategoryRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn category_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| row_exists(conn, "categories", id))
    }

    // -- Quotes --

    pub fn create_quote(&self, quote: &NewQuote<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO quotes (content, author, user_id, category_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![quote.content, quote.author, quote.user_id, quote.category_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_quote(&self, id: i64) -> Result<Option<QuoteRow>> {
        self.with_conn(|conn| query_quote(conn, id))
    }

    pub fn quote_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| row_exists(conn, "quotes", id))
    }

    /// One page of quotes matching `query`, plus the total number of matches.
    pub fn list_quotes(&self, query: &QuoteListQuery) -> Result<(Vec<QuoteRow>, u64)> {
        self.with_conn(|conn| {
            let mut clauses: Vec<&str> = Vec::new();
            let mut params: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(category_id) = query.category_id {
                clauses.push("q.category_id = ?");
                params.push(Box::new(category_id));
            }
            if let Some(author) = non_blank(query.author.as_deref()) {
                clauses.push("LOWER(q.author) LIKE LOWER(?) ESCAPE '\\'");
                params.push(Box::new(like_pattern(author)));
            }
            if let Some(content) = non_blank(query.content.as_deref()) {
                clauses.push("LOWER(q.content) LIKE LOWER(?) ESCAPE '\\'");
                params.push(Box::new(like_pattern(content)));
            }

            let where_sql = if clauses.is_empty() {
                String::new()
            } else {
                format!(" WHERE {}", clauses.join(" AND "))
            };

            // Count and page from one snapshot.
            let tx = conn.unchecked_transaction()?;

            let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let total: i64 = tx.query_row(
                &format!("SELECT COUNT(*) FROM quotes q{}", where_sql),
                param_refs.as_slice(),
                |row| row.get(0),
            )?;

            let direction = order_keyword(query.order);
            let sql = format!(
                "{}{} ORDER BY {} {}, q.id {} LIMIT ? OFFSET ?",
                QUOTE_SELECT,
                where_sql,
                sort_column(query.sort),
                direction,
                direction
            );
            let limit = i64::from(query.limit);
            let offset = i64::try_from(query.offset())?;
            let mut page_params = param_refs;
            page_params.push(&limit);
            page_params.push(&offset);

            let rows = {
                let mut stmt = tx.prepare(&sql)?;
                stmt.query_map(page_params.as_slice(), QuoteRow::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            tx.finish()?;

            Ok((rows, u64::try_from(total)?))
        })
    }

    /// Applies `changes` to a quote. Returns false if the quote does not exist.
    pub fn update_quote(&self, id: i64, changes: &QuoteChanges<'_>) -> Result<bool> {
        if changes.is_empty() {
            return self.quote_exists(id);
        }

        self.with_conn_mut(|conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut params: Vec<&dyn ToSql> = Vec::new();

            if let Some(content) = &changes.content {
                sets.push("content = ?");
                params.push(content);
            }
            if let Some(author) = &changes.author {
                sets.push("author = ?");
                params.push(author);
            }
            if let Some(category_id) = &changes.category_id {
                sets.push("category_id = ?");
                params.push(category_id);
            }
            params.push(&id);

            let sql = format!(
                "UPDATE quotes SET {}, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
                sets.join(", ")
            );
            let updated = conn.execute(&sql, params.as_slice())?;
            Ok(updated > 0)
        })
    }

    /// Deletes a quote; its comments and reactions go with it.
    pub fn delete_quote(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM quotes WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Comments --

    pub fn create_comment(&self, quote_id: i64, user_id: i64, content: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (content, quote_id, user_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![content, quote_id, user_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE cm.id = ?1", COMMENT_SELECT);
            conn.query_row(&sql, [id], CommentRow::from_row).optional()
        })
    }

    /// Comments on a quote, newest first.
    pub fn list_comments(&self, quote_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE cm.quote_id = ?1 ORDER BY cm.created_at DESC, cm.id DESC",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([quote_id], CommentRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_comment(&self, id: i64, content: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                rusqlite::params![content, id],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Probes --

    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    pub fn table_counts(&self) -> Result<TableCounts> {
        self.with_conn(|conn| {
            let counts = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM users),
                        (SELECT COUNT(*) FROM quotes),
                        (SELECT COUNT(*) FROM categories)",
                [],
                |row| {
                    Ok(TableCounts {
                        users_count: row.get(0)?,
                        quotes_count: row.get(1)?,
                        categories_count: row.get(2)?,
                    })
                },
            )?;
            Ok(counts)
        })
    }
}

fn query_user(conn: &Connection, predicate: &str, value: &dyn ToSql) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, predicate);
    conn.query_row(&sql, [value], UserRow::from_row).optional()
}

fn query_quote(conn: &Connection, id: i64) -> Result<Option<QuoteRow>> {
    let sql = format!("{} WHERE q.id = ?1", QUOTE_SELECT);
    conn.query_row(&sql, [id], QuoteRow::from_row).optional()
}

fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table);
    let exists = conn.query_row(&sql, [id], |row| row.get(0))?;
    Ok(exists)
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "q.id",
        SortField::CreatedAt => "q.created_at",
        SortField::UpdatedAt => "q.updated_at",
        SortField::LikesCount => "q.likes_count",
        SortField::DislikesCount => "q.dislikes_count",
        SortField::Author => "q.author",
        SortField::Content => "q.content",
    }
}

fn order_keyword(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Substring pattern for `LIKE ... ESCAPE '\'`, with wildcards in the input escaped.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
