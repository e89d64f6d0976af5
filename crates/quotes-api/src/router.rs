use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, categories, comments, health, quotes, reactions};

/// All routes. Mutations sit behind the bearer-token middleware.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/quotes", get(quotes::list_quotes))
        .route("/quotes/{id}", get(quotes::get_quote))
        .route("/quotes/{id}/comments", get(comments::list_comments))
        .route("/categories", get(categories::list_categories))
        .route("/health", get(health::health))
        .route("/db-check", get(health::db_check));

    let protected_routes = Router::new()
        .route("/quotes", post(quotes::create_quote))
        .route(
            "/quotes/{id}",
            put(quotes::update_quote).delete(quotes::delete_quote),
        )
        .route("/quotes/{id}/like", post(reactions::like_quote))
        .route("/quotes/{id}/dislike", post(reactions::dislike_quote))
        .route("/quotes/{id}/comments", post(comments::add_comment))
        .route(
            "/comments/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/comments/{id}/like", post(reactions::like_comment))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
