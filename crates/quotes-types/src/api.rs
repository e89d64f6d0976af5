use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Quote, ReactionKind, User};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 6;
pub const QUOTE_CONTENT_MAX: usize = 1000;
pub const QUOTE_AUTHOR_MAX: usize = 100;
pub const COMMENT_CONTENT_MAX: usize = 500;
pub const PAGE_LIMIT_MAX: u32 = 100;

// -- JWT Claims --

/// Claims carried by every bearer token. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_length("username", &self.username, USERNAME_MIN, USERNAME_MAX)?;
        check_email(&self.email)?;
        if self.password.chars().count() < PASSWORD_MIN {
            return Err(format!(
                "password must be at least {} characters",
                PASSWORD_MIN
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_email(&self.email)?;
        if self.password.is_empty() {
            return Err("password is required".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// -- Quotes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateQuoteRequest {
    pub content: String,
    pub author: String,
    pub category_id: i64,
}

impl CreateQuoteRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_length("content", &self.content, 1, QUOTE_CONTENT_MAX)?;
        check_length("author", &self.author, 1, QUOTE_AUTHOR_MAX)?;
        Ok(())
    }
}

/// Partial quote edit. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateQuoteRequest {
    pub content: Option<String>,
    pub author: Option<String>,
    pub category_id: Option<i64>,
}

impl UpdateQuoteRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(content) = &self.content {
            check_length("content", content, 1, QUOTE_CONTENT_MAX)?;
        }
        if let Some(author) = &self.author {
            check_length("author", author, 1, QUOTE_AUTHOR_MAX)?;
        }
        Ok(())
    }
}

/// Columns a quote listing may be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    #[default]
    CreatedAt,
    UpdatedAt,
    LikesCount,
    DislikesCount,
    Author,
    Content,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteListQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category_id: Option<i64>,
    pub author: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// `?category_id=` means no filter, same as leaving it out.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl Default for QuoteListQuery {
    fn default() -> Self {
        Self {
            category_id: None,
            author: None,
            content: None,
            sort: SortField::default(),
            order: SortOrder::default(),
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl QuoteListQuery {
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be at least 1".into());
        }
        if self.limit < 1 || self.limit > PAGE_LIMIT_MAX {
            return Err(format!("limit must be between 1 and {}", PAGE_LIMIT_MAX));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteListResponse {
    pub quotes: Vec<Quote>,
    pub pagination: Pagination,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub content: String,
}

impl CommentRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_length("content", &self.content, 1, COMMENT_CONTENT_MAX)
    }
}

// -- Reactions --

#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteReactionResponse {
    pub message: String,
    /// The caller's reaction after the update, `None` if it was toggled off.
    pub reaction: Option<ReactionKind>,
    pub likes_count: i64,
    pub dislikes_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentLikeResponse {
    pub message: String,
    pub liked: bool,
    pub likes_count: i64,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TableCounts {
    pub users_count: i64,
    pub quotes_count: i64,
    pub categories_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DbCheckResponse {
    pub status: String,
    pub data: TableCounts,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    if min > 0 && value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    let len = value.chars().count();
    if len < min || len > max {
        return Err(format!(
            "{} must be between {} and {} characters",
            field, min, max
        ));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), String> {
    if email.chars().count() > EMAIL_MAX {
        return Err(format!("email must be at most {} characters", EMAIL_MAX));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err("email is not a valid address".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn register_bounds() {
        assert!(register("ann", "ann@example.com", "secret").validate().is_ok());
        assert!(register("an", "ann@example.com", "secret").validate().is_err());
        assert!(register(&"a".repeat(51), "ann@example.com", "secret").validate().is_err());
        assert!(register("ann", "ann@example.com", "short").validate().is_err());
    }

    #[test]
    fn email_shape() {
        assert!(check_email("a@b.co").is_ok());
        assert!(check_email("no-at-sign.com").is_err());
        assert!(check_email("@example.com").is_err());
        assert!(check_email("a@localhost").is_err());
        assert!(check_email("a b@example.com").is_err());
        assert!(check_email("a@b@example.com").is_err());
    }

    #[test]
    fn blank_quote_content_is_rejected() {
        let req = CreateQuoteRequest {
            content: "   ".into(),
            author: "Seneca".into(),
            category_id: 1,
        };
        assert_eq!(req.validate(), Err("content is required".to_string()));
    }

    #[test]
    fn update_only_checks_present_fields() {
        let req = UpdateQuoteRequest {
            author: Some("Marcus Aurelius".into()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let req = UpdateQuoteRequest {
            content: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
        assert!(UpdateQuoteRequest::default().validate().is_ok());
    }

    #[test]
    fn comment_length_is_capped() {
        let ok = CommentRequest { content: "x".repeat(COMMENT_CONTENT_MAX) };
        let too_long = CommentRequest { content: "x".repeat(COMMENT_CONTENT_MAX + 1) };
        assert!(ok.validate().is_ok());
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(Pagination::new(2, 10, 15).pages, 2);
        assert_eq!(Pagination::new(1, 10, 20).pages, 2);
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 3, 10).pages, 4);
    }

    #[test]
    fn list_query_limits() {
        let mut query = QuoteListQuery::default();
        assert!(query.validate().is_ok());
        assert_eq!(query.offset(), 0);

        query.page = 3;
        query.limit = 20;
        assert_eq!(query.offset(), 40);

        query.limit = PAGE_LIMIT_MAX + 1;
        assert!(query.validate().is_err());

        query.limit = 10;
        query.page = 0;
        assert!(query.validate().is_err());
    }

    #[test]
    fn blank_category_filter_is_ignored() {
        let parse = |value: serde_json::Value| serde_json::from_value::<QuoteListQuery>(value);

        assert_eq!(parse(serde_json::json!({ "category_id": "" })).unwrap().category_id, None);
        assert_eq!(parse(serde_json::json!({ "category_id": "  " })).unwrap().category_id, None);
        assert_eq!(parse(serde_json::json!({})).unwrap().category_id, None);
        assert_eq!(parse(serde_json::json!({ "category_id": "3" })).unwrap().category_id, Some(3));
        assert!(parse(serde_json::json!({ "category_id": "three" })).is_err());
    }
}
