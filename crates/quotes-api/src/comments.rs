use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use quotes_db::Database;
use quotes_db::models::CommentRow;
use quotes_types::api::{CommentRequest, MessageResponse};
use quotes_types::models::Comment;

use crate::error::{ApiError, path_id};
use crate::middleware::AuthUser;
use crate::state::AppState;

const QUOTE_NOT_FOUND: &str = "Quote not found";
const COMMENT_NOT_FOUND: &str = "Comment not found";

/// GET /quotes/{id}/comments — newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let quote_id = path_id(path, "quote")?;

    let rows = state
        .db_call(move |db| {
            if !db.quote_exists(quote_id)? {
                return Ok(None);
            }
            db.list_comments(quote_id).map(Some)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(QUOTE_NOT_FOUND.into()))?;

    Ok(Json(rows.into_iter().map(CommentRow::into_comment).collect()))
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let quote_id = path_id(path, "quote")?;
    let Json(req) = payload?;
    req.validate().map_err(ApiError::Validation)?;

    let user_id = user.id;
    let comment = state
        .db_call(move |db| {
            if !db.quote_exists(quote_id)? {
                return Ok(None);
            }
            let id = db.create_comment(quote_id, user_id, &req.content)?;
            fetch_comment(db, id).map(Some)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(QUOTE_NOT_FOUND.into()))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /comments/{id} — owner-only content edit.
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Json<Comment>, ApiError> {
    let id = path_id(path, "comment")?;

    let owner = comment_owner(&state, id).await?;
    user.ensure_owns(owner, "You can only update your own comments")?;

    let Json(req) = payload?;
    req.validate().map_err(ApiError::Validation)?;

    let comment = state
        .db_call(move |db| {
            if !db.update_comment(id, &req.content)? {
                return Ok(None);
            }
            fetch_comment(db, id).map(Some)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(COMMENT_NOT_FOUND.into()))?;

    Ok(Json(comment))
}

/// DELETE /comments/{id} — owner-only; the comment's likes go with it.
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = path_id(path, "comment")?;

    let owner = comment_owner(&state, id).await?;
    user.ensure_owns(owner, "You can only delete your own comments")?;

    if !state.db_call(move |db| db.delete_comment(id)).await? {
        return Err(ApiError::NotFound(COMMENT_NOT_FOUND.into()));
    }

    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

async fn comment_owner(state: &AppState, id: i64) -> Result<Option<i64>, ApiError> {
    state
        .db_call(move |db| db.get_comment(id))
        .await?
        .map(|comment| comment.user_id)
        .ok_or_else(|| ApiError::NotFound(COMMENT_NOT_FOUND.into()))
}

fn fetch_comment(db: &Database, id: i64) -> anyhow::Result<Comment> {
    db.get_comment(id)?
        .map(CommentRow::into_comment)
        .ok_or_else(|| anyhow::anyhow!("Comment {} vanished after write", id))
}
