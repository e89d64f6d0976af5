use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};

use quotes_types::api::{CommentLikeResponse, QuoteReactionResponse};
use quotes_types::models::ReactionKind;

use crate::error::{ApiError, path_id};
use crate::middleware::AuthUser;
use crate::state::AppState;

pub async fn like_quote(
    state: State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<QuoteReactionResponse>, ApiError> {
    react(state, user, path, ReactionKind::Like).await
}

pub async fn dislike_quote(
    state: State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<QuoteReactionResponse>, ApiError> {
    react(state, user, path, ReactionKind::Dislike).await
}

async fn react(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    kind: ReactionKind,
) -> Result<Json<QuoteReactionResponse>, ApiError> {
    let quote_id = path_id(path, "quote")?;

    let reaction = state
        .db_call(move |db| db.react_to_quote(quote_id, user.id, kind))
        .await?
        .ok_or_else(|| ApiError::NotFound("Quote not found".into()))?;

    Ok(Json(QuoteReactionResponse {
        message: "Reaction updated successfully".into(),
        reaction: reaction.outcome.current(),
        likes_count: reaction.likes_count,
        dislikes_count: reaction.dislikes_count,
    }))
}

pub async fn like_comment(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CommentLikeResponse>, ApiError> {
    let comment_id = path_id(path, "comment")?;

    let toggle = state
        .db_call(move |db| db.toggle_comment_like(comment_id, user.id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;

    Ok(Json(CommentLikeResponse {
        message: "Like updated successfully".into(),
        liked: toggle.liked,
        likes_count: toggle.likes_count,
    }))
}
