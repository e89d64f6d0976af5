use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::info;

use quotes_db::{Database, NewQuote, QuoteChanges};
use quotes_db::models::CommentRow;
use quotes_types::api::{
    CreateQuoteRequest, MessageResponse, Pagination, QuoteListQuery, QuoteListResponse,
    UpdateQuoteRequest,
};
use quotes_types::models::Quote;

use crate::error::{ApiError, path_id};
use crate::middleware::AuthUser;
use crate::state::AppState;

const QUOTE_NOT_FOUND: &str = "Quote not found";
const CATEGORY_NOT_FOUND: &str = "Category not found";

/// GET /quotes — filtered, sorted, paginated listing.
pub async fn list_quotes(
    State(state): State<AppState>,
    query: Result<Query<QuoteListQuery>, QueryRejection>,
) -> Result<Json<QuoteListResponse>, ApiError> {
    let Query(query) = query?;
    query.validate().map_err(ApiError::Validation)?;

    let (page, limit) = (query.page, query.limit);
    let (rows, total) = state.db_call(move |db| db.list_quotes(&query)).await?;

    Ok(Json(QuoteListResponse {
        quotes: rows.into_iter().map(|row| row.into_quote(None)).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /quotes/{id} — the quote with its comments, newest first.
pub async fn get_quote(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Quote>, ApiError> {
    let id = path_id(path, "quote")?;

    let found = state
        .db_call(move |db| {
            let Some(quote) = db.get_quote(id)? else {
                return Ok(None);
            };
            let comments = db.list_comments(id)?;
            Ok(Some((quote, comments)))
        })
        .await?;

    let (quote, comments) = found.ok_or_else(|| ApiError::NotFound(QUOTE_NOT_FOUND.into()))?;
    let comments = comments.into_iter().map(CommentRow::into_comment).collect();
    Ok(Json(quote.into_quote(Some(comments))))
}

pub async fn create_quote(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateQuoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::Validation)?;

    let user_id = user.id;
    let quote = state
        .db_call(move |db| {
            if !db.category_exists(req.category_id)? {
                return Ok(None);
            }
            let id = db.create_quote(&NewQuote {
                content: &req.content,
                author: &req.author,
                user_id,
                category_id: req.category_id,
            })?;
            fetch_quote(db, id).map(Some)
        })
        .await?
        .ok_or_else(|| ApiError::Validation(CATEGORY_NOT_FOUND.into()))?;

    info!("User {} created quote {}", user.id, quote.id);
    Ok((StatusCode::CREATED, Json(quote)))
}

/// PUT /quotes/{id} — owner-only partial update.
pub async fn update_quote(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateQuoteRequest>, JsonRejection>,
) -> Result<Json<Quote>, ApiError> {
    let id = path_id(path, "quote")?;

    let owner = quote_owner(&state, id).await?;
    user.ensure_owns(owner, "You can only update your own quotes")?;

    let Json(req) = payload?;
    req.validate().map_err(ApiError::Validation)?;

    let quote = state
        .db_call(move |db| {
            if let Some(category_id) = req.category_id {
                if !db.category_exists(category_id)? {
                    return Ok(Err(ApiError::Validation(CATEGORY_NOT_FOUND.into())));
                }
            }

            let changes = QuoteChanges {
                content: req.content.as_deref(),
                author: req.author.as_deref(),
                category_id: req.category_id,
            };
            if !db.update_quote(id, &changes)? {
                return Ok(Err(ApiError::NotFound(QUOTE_NOT_FOUND.into())));
            }
            fetch_quote(db, id).map(Ok)
        })
        .await??;

    Ok(Json(quote))
}

/// DELETE /quotes/{id} — owner-only; comments and reactions cascade.
pub async fn delete_quote(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = path_id(path, "quote")?;

    let owner = quote_owner(&state, id).await?;
    user.ensure_owns(owner, "You can only delete your own quotes")?;

    if !state.db_call(move |db| db.delete_quote(id)).await? {
        return Err(ApiError::NotFound(QUOTE_NOT_FOUND.into()));
    }

    info!("User {} deleted quote {}", user.id, id);
    Ok(Json(MessageResponse::new("Quote deleted successfully")))
}

/// The quote's recorded owner, or NotFound if the quote does not exist.
async fn quote_owner(state: &AppState, id: i64) -> Result<Option<i64>, ApiError> {
    state
        .db_call(move |db| db.get_quote(id))
        .await?
        .map(|quote| quote.user_id)
        .ok_or_else(|| ApiError::NotFound(QUOTE_NOT_FOUND.into()))
}

fn fetch_quote(db: &Database, id: i64) -> anyhow::Result<Quote> {
    db.get_quote(id)?
        .map(|row| row.into_quote(None))
        .ok_or_else(|| anyhow::anyhow!("Quote {} vanished after write", id))
}
