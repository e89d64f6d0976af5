use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A quote with its author and category attached.
///
/// `comments` is only populated on the single-quote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub content: String,
    pub author: String,
    pub user_id: Option<i64>,
    pub user: Option<User>,
    pub category_id: Option<i64>,
    pub category: Option<Category>,
    pub likes_count: i64,
    pub dislikes_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub quote_id: i64,
    pub user_id: Option<i64>,
    pub user: Option<User>,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// The two reactions a user can leave on a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            other => Err(format!("unknown reaction kind '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_kind_parses_stored_values() {
        assert_eq!("like".parse::<ReactionKind>(), Ok(ReactionKind::Like));
        assert_eq!("dislike".parse::<ReactionKind>(), Ok(ReactionKind::Dislike));
        assert!("love".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn quote_omits_comments_unless_loaded() {
        let now = Utc::now();
        let quote = Quote {
            id: 1,
            content: "Stay hungry".into(),
            author: "Steve Jobs".into(),
            user_id: None,
            user: None,
            category_id: None,
            category: None,
            likes_count: 0,
            dislikes_count: 0,
            comments: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&quote).unwrap();
        assert!(json.get("comments").is_none());
        assert_eq!(json["likes_count"], 0);
    }
}
